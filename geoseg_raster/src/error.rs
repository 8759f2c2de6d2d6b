use std::fmt;

/// Raster adapter failures. `OutOfBounds` is the one sentinel the rest of this
/// crate explicitly matches on and recovers from locally (zero-filled reads);
/// every other variant propagates to the caller.
#[derive(Debug)]
pub enum RasterError {
	Open { path: String, message: String },
	InvalidGeoReference { path: String },
	MissingSpatialReference { path: String },
	RotatedTransformUnsupported { path: String },
	OutOfBounds,
	Gdal { context: &'static str, message: String },
}

impl fmt::Display for RasterError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			RasterError::Open { path, message } => write!(f, "failed to open raster '{path}': {message}"),
			RasterError::InvalidGeoReference { path } => {
				write!(f, "raster '{path}' has no valid transform/CRS and no usable GCPs")
			}
			RasterError::MissingSpatialReference { path } => {
				write!(f, "raster '{path}' has no spatial reference defined")
			}
			RasterError::RotatedTransformUnsupported { path } => {
				write!(f, "raster '{path}' has a rotated geo-transform, which is not supported")
			}
			RasterError::OutOfBounds => write!(f, "requested window lies entirely outside the raster"),
			RasterError::Gdal { context, message } => write!(f, "{context}: {message}"),
		}
	}
}

impl std::error::Error for RasterError {}
