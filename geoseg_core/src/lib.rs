//! Shared primitives for the geoseg engine: affine transforms and geographic
//! bounding boxes, tile identity and canonical path encoding, tiling schemes,
//! dataset category tables, the tiling manifest, and a small progress-reporting
//! abstraction used by every long-running stage.
//!
//! Downstream crates (`geoseg_raster`, `geoseg_tiling`, `geoseg_fusion`,
//! `geoseg_geometry`, `geoseg_aggregate`) depend on this crate for the value
//! types that cross their boundaries; none of them own their own copy of a
//! tile identity or a bounding box.

pub mod category;
pub mod geo;
pub mod manifest;
pub mod progress;
pub mod scheme;
pub mod tile;

pub use category::{CategoryError, DatasetCategory, DatasetCategories};
pub use geo::{Affine, GeoBBox};
pub use manifest::{RasterTilingResult, RasterTilingResults, TilingInfo, TilingStatistic};
pub use progress::{NoProgress, ProgressTrait, TerminalProgress, get_progress};
pub use scheme::{TileAlignment, TilingScheme};
pub use tile::{PathError, Tile};
