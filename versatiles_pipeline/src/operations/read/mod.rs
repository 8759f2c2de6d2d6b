pub mod from_color;
pub mod from_container;
pub mod from_debug;
#[cfg(feature = "gdal")]
pub mod from_gdal;
pub mod from_merged_vector;
pub mod from_stacked;
pub mod from_stacked_raster;
pub mod from_tile;

mod traits;
