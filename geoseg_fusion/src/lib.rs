//! Prediction fusion: classifying a raster's predicted tiles into a
//! non-overlapping base grid plus auxiliary tiles, and substituting each
//! auxiliary tile's reliable center pixels into the base tile it overlaps.

mod classify;
mod error;
mod fuse;
mod index;
mod reliable;
mod substitute;

pub use classify::{classify_tiles, Classification, BASE_TILE_OFFSET_BUG_THRESHOLD_PX, BASE_TILE_OFFSET_TOLERANCE_PX};
pub use error::FusionError;
pub use fuse::{copy_tiling_result_file, fuse_tiles, FusionOptions, TileFormat};
pub use index::AuxiliaryIndex;
pub use reliable::{disk_stride, reliable_offsets};
pub use substitute::substitute_pixels;
