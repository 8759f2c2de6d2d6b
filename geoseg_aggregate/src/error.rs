use std::fmt;

/// Failures from projecting tile masks back onto a raster, or from comparing
/// two tile directories.
#[derive(Debug)]
pub enum AggregationError {
	/// The raster's pixel→world transform could not be inverted (singular
	/// determinant), so no tile→raster affine can be built.
	SingularTransform { raster_fn: String },
	/// A tile read back from disk was not single-band, so it cannot be a
	/// label/palette tile.
	NotLabelTile { relative_path: String },
	/// Comparison was asked to compare a fused tile against a reference tile
	/// of a different identity; the two directories must line up by identity.
	TileIdentityMismatch { relative_path: String },
	/// The fused tile set is not a subset by identity of the reference tile
	/// set (SPEC_FULL §4.4's invariant).
	FusedSetNotSubset { extra_relative_path: String },
	Category(geoseg_core::CategoryError),
	Tiling(geoseg_tiling::TilingError),
	Io { context: &'static str, message: String },
}

impl fmt::Display for AggregationError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			AggregationError::SingularTransform { raster_fn } => {
				write!(f, "raster '{raster_fn}' has a singular transform; cannot build a tile-to-raster affine")
			}
			AggregationError::NotLabelTile { relative_path } => {
				write!(f, "tile '{relative_path}' is not a single-band label tile")
			}
			AggregationError::TileIdentityMismatch { relative_path } => {
				write!(f, "no matching tile for '{relative_path}' in the other directory")
			}
			AggregationError::FusedSetNotSubset { extra_relative_path } => {
				write!(f, "fused tile '{extra_relative_path}' has no counterpart in the reference tile set")
			}
			AggregationError::Category(err) => write!(f, "category error: {err}"),
			AggregationError::Tiling(err) => write!(f, "{err}"),
			AggregationError::Io { context, message } => write!(f, "{context}: {message}"),
		}
	}
}

impl std::error::Error for AggregationError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			AggregationError::Tiling(err) => Some(err),
			AggregationError::Category(err) => Some(err),
			_ => None,
		}
	}
}

impl From<geoseg_tiling::TilingError> for AggregationError {
	fn from(err: geoseg_tiling::TilingError) -> AggregationError {
		AggregationError::Tiling(err)
	}
}

impl From<geoseg_core::CategoryError> for AggregationError {
	fn from(err: geoseg_core::CategoryError) -> AggregationError {
		AggregationError::Category(err)
	}
}
