//! GDAL-backed raster adapter. The rest of the engine reads rasters only
//! through the [`RasterSource`] trait; this crate is the one place `gdal`
//! types are allowed to appear.

mod band_mapping;
mod error;
mod gdal_source;
mod resample;
mod source;

pub use error::RasterError;
pub use gdal_source::GdalRasterSource;
pub use resample::ResampleAlg;
pub use source::{PixelWindow, RasterSource, RasterWindow};
