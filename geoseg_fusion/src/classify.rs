//! Splits a raster's prediction tiles into a *base* set (the non-overlapping
//! reference grid) and an *auxiliary* set (strided tiles used only to supply
//! reliable center pixels to their overlapping base tile).
//!
//! A tile is base iff its offset from the tiling origin is, on both axes, an
//! integer multiple of the *base stride* — the tile stride rounded up to the
//! smallest multiple that is at least as large as the tile size, so that base
//! tiles never overlap each other. The offset check tolerates up to
//! [`BASE_TILE_OFFSET_TOLERANCE_PX`] of quantization slop; anything beyond
//! [`BASE_TILE_OFFSET_BUG_THRESHOLD_PX`] but below the next multiple signals a
//! tiling inconsistency rather than legitimate auxiliary placement.

use crate::error::FusionError;
use geoseg_core::manifest::TilingInfo;
use geoseg_core::tile::TileKind;
use geoseg_core::Tile;

/// Tolerated offset slop, in disk-independent source pixels, for a tile to
/// still count as aligned to the base grid. Originally a magic `1` in the
/// source tool; named here per SPEC_FULL §9's Open Question decision.
pub const BASE_TILE_OFFSET_TOLERANCE_PX: f64 = 1.0;

/// Remainders at or above this threshold (but below a full base-stride
/// multiple) indicate a tiling bug rather than a legitimate auxiliary tile.
/// Originally a magic `16` in the source tool.
pub const BASE_TILE_OFFSET_BUG_THRESHOLD_PX: f64 = 16.0;

/// The result of splitting one raster's tiles into base and auxiliary sets.
#[derive(Clone, Debug, Default)]
pub struct Classification {
	pub base: Vec<Tile>,
	pub aux: Vec<Tile>,
}

fn image_pixel_fields(tile: &Tile) -> Result<(i64, i64, u64, u64), FusionError> {
	match &tile.kind {
		TileKind::ImagePixel { src_x, src_y, src_w, src_h, .. } => Ok((*src_x, *src_y, *src_w, *src_h)),
		TileKind::Mercator { .. } => Err(FusionError::NotImagePixelTile),
	}
}

fn check_remainder(raster_fn: &str, axis: &'static str, remainder: f64) -> Result<(), FusionError> {
	let magnitude = remainder.abs();
	if magnitude > BASE_TILE_OFFSET_TOLERANCE_PX && magnitude < BASE_TILE_OFFSET_BUG_THRESHOLD_PX {
		return Err(FusionError::AmbiguousOffset {
			raster_fn: raster_fn.to_string(),
			axis,
			remainder,
		});
	}
	Ok(())
}

/// Classifies `tiles` (all belonging to the same raster) into base and
/// auxiliary sets using `tiling_info` and the raster's pixel size.
///
/// # Errors
///
/// Returns [`FusionError::NotImagePixelTile`] if any tile is a Mercator tile,
/// [`FusionError::AmbiguousOffset`] if a tile's offset remainder falls in the
/// bug zone on either axis, or [`FusionError::NoBaseTiles`] if no tile
/// classifies as base.
pub fn classify_tiles(
	tiles: &[Tile],
	raster_fn: &str,
	raster_width: u32,
	raster_height: u32,
	tiling_info: &TilingInfo,
) -> Result<Classification, FusionError> {
	let (size_w, size_h) = tiling_info.source_size;
	let (stride_x, stride_y) = tiling_info.source_stride;
	let (offset_x, offset_y) = tiling_info.source_offset;

	let base_stride_x = stride_x * (f64::from(size_w) / stride_x).round();
	let base_stride_y = stride_y * (f64::from(size_h) / stride_y).round();

	let mut classification = Classification::default();

	for tile in tiles {
		let (src_x, src_y, src_w, src_h) = image_pixel_fields(tile)?;

		let relative_x = (src_x - offset_x) as f64;
		let relative_y = (src_y - offset_y) as f64;

		let multiple_x = (relative_x / base_stride_x).round();
		let multiple_y = (relative_y / base_stride_y).round();
		let remainder_x = relative_x - multiple_x * base_stride_x;
		let remainder_y = relative_y - multiple_y * base_stride_y;

		check_remainder(raster_fn, "x", remainder_x)?;
		check_remainder(raster_fn, "y", remainder_y)?;

		let x_is_base = remainder_x.abs() <= BASE_TILE_OFFSET_TOLERANCE_PX;
		let y_is_base = remainder_y.abs() <= BASE_TILE_OFFSET_TOLERANCE_PX;

		let end_x = src_x + src_w as i64;
		let end_y = src_y + src_h as i64;
		let inside_raster = src_x >= 0 && end_x <= i64::from(raster_width) && src_y >= 0 && end_y <= i64::from(raster_height);

		if x_is_base && y_is_base && inside_raster {
			classification.base.push(tile.clone());
		} else {
			classification.aux.push(tile.clone());
		}
	}

	if classification.base.is_empty() {
		return Err(FusionError::NoBaseTiles { raster_fn: raster_fn.to_string() });
	}

	Ok(classification)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn tiling_info() -> TilingInfo {
		TilingInfo {
			source_offset: (0, 0),
			source_stride: (100.0, 100.0),
			source_size: (200, 200),
		}
	}

	#[test]
	fn grid_aligned_tile_is_base() {
		let tiles = vec![Tile::image_pixel("r.tif", 0, 0, 200, 200)];
		let result = classify_tiles(&tiles, "r.tif", 1000, 1000, &tiling_info()).unwrap();
		assert_eq!(result.base.len(), 1);
		assert!(result.aux.is_empty());
	}

	#[test]
	fn strided_tile_is_auxiliary() {
		let tiles = vec![Tile::image_pixel("r.tif", 100, 0, 200, 200)];
		let result = classify_tiles(&tiles, "r.tif", 1000, 1000, &tiling_info()).unwrap();
		assert!(result.base.is_empty());
		assert_eq!(result.aux.len(), 1);
	}

	#[test]
	fn base_tile_hanging_over_raster_edge_is_auxiliary() {
		let tiles = vec![Tile::image_pixel("r.tif", 0, 0, 200, 200)];
		let result = classify_tiles(&tiles, "r.tif", 150, 150, &tiling_info()).unwrap();
		assert!(result.base.is_empty());
		assert_eq!(result.aux.len(), 1);
	}

	#[test]
	fn no_base_tiles_is_an_error() {
		let tiles = vec![Tile::image_pixel("r.tif", 50, 50, 200, 200)];
		let err = classify_tiles(&tiles, "r.tif", 1000, 1000, &tiling_info()).unwrap_err();
		assert!(matches!(err, FusionError::NoBaseTiles { .. }));
	}

	#[test]
	fn ambiguous_offset_is_rejected() {
		let tiles = vec![Tile::image_pixel("r.tif", 8, 0, 200, 200)];
		let err = classify_tiles(&tiles, "r.tif", 1000, 1000, &tiling_info()).unwrap_err();
		assert!(matches!(err, FusionError::AmbiguousOffset { .. }));
	}
}
