//! Geometric data structures and utilities shared across the segmentation engine.
//!
//! It includes modules for:
//! - `geo`: core geometry primitives and traits (e.g., `Point`, `Polygon`, etc.).
//! - `geojson`: parsing and serialization for GeoJSON and NDGeoJSON.
//! - `json`: a small JSON value tree used to serialize geometries to GeoJSON text.
//! - `segmentation`: `GeoSegmentation`, the polygon collection the
//!   Tile-to-Raster Aggregation Engine's polygon-projection strategy
//!   vectorizes tile masks into and rasterizes back from.

pub mod geo;
pub mod geojson;
pub mod json;
pub mod segmentation;

pub use segmentation::GeoSegmentation;
