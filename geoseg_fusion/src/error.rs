use std::fmt;

/// Failures from classifying, indexing, or substituting tile predictions.
#[derive(Debug)]
pub enum FusionError {
	/// No tile in a raster's prediction set was classified as a base tile
	/// (misconfigured tiling origin, or the raster's tiles were all dropped
	/// as auxiliary).
	NoBaseTiles { raster_fn: String },
	/// A `consistent_for_varying_tile_strides` run was requested against a
	/// scheme using `TileAlignment::Optimized`, which has no stable base
	/// grid across stride choices.
	OptimizedAlignmentUnsupported,
	/// A `consistent_for_varying_tile_strides` run was requested against a
	/// scheme that does not use overhanging tiles, so the comparison across
	/// stride choices would not be fair (see SPEC_FULL §4.2).
	OverhangRequired,
	/// A tile's offset from the tiling origin fell strictly between the
	/// tolerance and the bug threshold along one axis: neither a clean base
	/// tile nor an unambiguous auxiliary tile.
	AmbiguousOffset { raster_fn: String, axis: &'static str, remainder: f64 },
	/// A base tile carried no `ImagePixel` source size (e.g. it was a
	/// Mercator tile); fusion only classifies local-scheme tiles.
	NotImagePixelTile,
	Tiling(geoseg_tiling::TilingError),
	Io { context: &'static str, message: String },
}

impl fmt::Display for FusionError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			FusionError::NoBaseTiles { raster_fn } => write!(f, "no base tiles identified for raster '{raster_fn}'"),
			FusionError::OptimizedAlignmentUnsupported => {
				write!(f, "Optimized alignment is not supported for fusion of base tiles")
			}
			FusionError::OverhangRequired => {
				write!(f, "overhanging tiles are required to perform a fair comparison of different stride values")
			}
			FusionError::AmbiguousOffset { raster_fn, axis, remainder } => write!(
				f,
				"ambiguous base/auxiliary offset for raster '{raster_fn}' on {axis} axis: remainder {remainder} is neither a clean base offset nor an unambiguous auxiliary one"
			),
			FusionError::NotImagePixelTile => write!(f, "fusion requires ImagePixel tiles, found a Mercator tile"),
			FusionError::Tiling(err) => write!(f, "{err}"),
			FusionError::Io { context, message } => write!(f, "{context}: {message}"),
		}
	}
}

impl std::error::Error for FusionError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			FusionError::Tiling(err) => Some(err),
			_ => None,
		}
	}
}

impl From<geoseg_tiling::TilingError> for FusionError {
	fn from(err: geoseg_tiling::TilingError) -> FusionError {
		FusionError::Tiling(err)
	}
}
