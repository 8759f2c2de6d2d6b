//! Tile-to-raster aggregation: projecting a fused tile directory's per-tile
//! predictions back onto raster-sized outputs, and comparing two tile
//! directories for accuracy.
//!
//! [`project`] implements pixel-projection (back-projecting tile pixels
//! through a tile→raster affine directly onto a grayscale/color/grid-overlay
//! output). [`polygon`] implements polygon-projection (vectorizing each
//! tile's mask into world-coordinate polygons via
//! [`geoseg_geometry::GeoSegmentation`] and merging across tiles).
//! [`aggregate`] is the top-level orchestration that drives both strategies
//! per raster. [`comparison`] produces per-category TP/FP/FN/TN confusion
//! masks between a reference and a fused tile directory.

mod aggregate;
mod comparison;
mod error;
mod polygon;
mod project;

pub use aggregate::{aggregate_tiles, AggregationOptions};
pub use comparison::{
	compare_tiles, confusion_categories, confusion_mask, difference_categories, difference_mask, CompareFormat, FALSE_NEGATIVE, FALSE_POSITIVE, TRUE_NEGATIVE, TRUE_POSITIVE,
};
pub use error::AggregationError;
pub use polygon::{tile_to_world_affine, PolygonAccumulator};
pub use project::{draw_tile_boundary, project_tile, tile_to_raster_affine, Accumulators};
