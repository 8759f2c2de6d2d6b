use geoseg_core::CategoryError;
use geoseg_raster::RasterError;
use std::fmt;

/// Errors from tile layout computation, tile data I/O, and manifest writing.
#[derive(Debug)]
pub enum TilingError {
	/// A `LocalMeter`/`LocalPixel` scheme produced zero tiles on at least one axis.
	NoTilesFit { raster_fn: String, axis: &'static str },
	/// `Optimized` alignment combined with `aligned_to_base` (§9 Open Question 2).
	OptimizedAlignmentUnsupported,
	/// The raster's stride does not evenly divide its tile size where the scheme requires it to.
	StrideQuantization { tile_size: u32, stride: u32, axis: &'static str },
	Raster(RasterError),
	Category(CategoryError),
	Image { context: &'static str, message: String },
	Io { context: &'static str, message: String },
}

impl fmt::Display for TilingError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			TilingError::NoTilesFit { raster_fn, axis } => {
				write!(f, "no tiles fit on the {axis} axis of raster '{raster_fn}'")
			}
			TilingError::OptimizedAlignmentUnsupported => {
				write!(f, "Optimized alignment combined with aligned_to_base_tile_area is not supported")
			}
			TilingError::StrideQuantization { tile_size, stride, axis } => {
				write!(f, "tile_size {tile_size} is not a multiple of stride {stride} on the {axis} axis")
			}
			TilingError::Raster(err) => write!(f, "raster error: {err}"),
			TilingError::Category(err) => write!(f, "category error: {err}"),
			TilingError::Image { context, message } => write!(f, "image encoding error ({context}): {message}"),
			TilingError::Io { context, message } => write!(f, "I/O error ({context}): {message}"),
		}
	}
}

impl std::error::Error for TilingError {}

impl From<RasterError> for TilingError {
	fn from(err: RasterError) -> Self {
		TilingError::Raster(err)
	}
}

impl From<CategoryError> for TilingError {
	fn from(err: CategoryError) -> Self {
		TilingError::Category(err)
	}
}
