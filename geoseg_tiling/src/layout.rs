//! The tiling layout engine: turns a [`TilingScheme`] plus a raster's size
//! (and, for `Mercator`, its bounding box) into an ordered list of [`Tile`]
//! identities.
//!
//! The `LocalPixel`/`LocalMeter` path mirrors the per-axis offset algorithm
//! used by the original tiling tool: compute how many tiles fit on an axis,
//! place a tiling origin according to the chosen [`TileAlignment`], then split
//! the axis into tiles on either side of that origin. Offsets are additionally
//! sorted ascending per axis so tiles are always emitted in scan order
//! (`y` then `x`), which the source algorithm left to enumeration order.

use crate::TilingError;
use geoseg_core::geo::mercator;
use geoseg_core::scheme::LocalSchemeFlags;
use geoseg_core::{GeoBBox, Tile, TileAlignment, TilingScheme};

/// Web-Mercator tiles are always 256px square.
pub const MERCATOR_TILE_SIZE_PX: u32 = 256;

/// Per-axis tiling offsets plus the stride they were computed with, kept
/// around so the caller can report it in the manifest's `TilingInfo`.
#[derive(Clone, Debug, PartialEq)]
pub struct AxisLayout {
	pub offsets: Vec<i64>,
	pub stride: f64,
	/// The tiling origin this axis's offsets were split around, i.e. the value
	/// `compute_origin` returned — reported in the manifest's `TilingInfo`.
	pub origin: i64,
}

fn num_tiles_float(area: f64, size: f64, stride: f64) -> f64 {
	(area + stride - size) / stride
}

fn round_tile_count(value: f64, use_overhang: bool) -> i64 {
	let count = if use_overhang { value.ceil() } else { value.floor() };
	count.max(0.0) as i64
}

fn tiled_area_float(num_tiles: i64, size: f64, stride: f64) -> f64 {
	num_tiles as f64 * stride + size - stride
}

/// Computes the tiling origin on one axis, per [`TileAlignment`].
///
/// `aligned_to_base` substitutes a stride rounded to a whole multiple of the
/// base stride (`stride * round(size / stride)`) into the origin computation
/// only; the subsequent negative/positive tile counts still use the raw stride.
fn compute_origin(raster_size: f64, size: f64, stride: f64, alignment: TileAlignment, aligned_to_base: bool) -> f64 {
	let origin_stride = if aligned_to_base { stride * (size / stride).round() } else { stride };

	match alignment {
		TileAlignment::AlignedToImageBorder => 0.0,
		TileAlignment::CenteredToImage => (raster_size / 2.0).floor(),
		TileAlignment::Optimized => {
			let num_tiles = num_tiles_float(raster_size, size, origin_stride).floor().max(0.0);
			let tiled_area = tiled_area_float(num_tiles as i64, size, origin_stride);
			((raster_size - tiled_area) / 2.0).floor()
		}
	}
}

/// Computes the ordered (ascending) tile offsets on one axis.
fn compute_axis_offsets(raster_size: u32, size: u32, stride: u32, flags: LocalSchemeFlags) -> AxisLayout {
	let raster_size = f64::from(raster_size);
	let size_f = f64::from(size);
	let stride_f = f64::from(stride);

	let origin = compute_origin(raster_size, size_f, stride_f, flags.alignment, flags.aligned_to_base);

	let positive_area = raster_size - origin;
	let redundant_covered_area = (size_f - stride_f).min(positive_area).max(0.0);
	let negative_area = origin + redundant_covered_area;

	let num_negative = round_tile_count(num_tiles_float(negative_area, size_f, stride_f), flags.use_overhang);
	let num_positive = round_tile_count(num_tiles_float(positive_area, size_f, stride_f), flags.use_overhang);

	let mut offsets: Vec<i64> = Vec::with_capacity((num_negative + num_positive) as usize);
	for idx in 0..num_negative {
		offsets.push(origin as i64 - (((idx + 1) as f64) * stride_f).floor() as i64);
	}
	for idx in 0..num_positive {
		offsets.push(origin as i64 + ((idx as f64) * stride_f).floor() as i64);
	}
	offsets.sort_unstable();

	AxisLayout {
		offsets,
		stride: stride_f,
		origin: origin as i64,
	}
}

/// Builds the `ImagePixel` tile list for a `LocalPixel` scheme. When
/// `flags.use_border` is false, tiles that would hang over the raster's edge
/// (possible whenever `use_overhang` rounds a tile count up) are dropped,
/// mirroring the `use_border_tiles` behavior of the Mercator path.
///
/// # Errors
///
/// Returns [`TilingError::NoTilesFit`] if either axis produces zero tiles, and
/// [`TilingError::OptimizedAlignmentUnsupported`] for the unsupported
/// `Optimized + aligned_to_base_tile_area` combination (§9 Open Question 2).
pub fn compute_local_pixel_tiles(
	raster_fn: &str,
	raster_w: u32,
	raster_h: u32,
	tile_size_px: (u32, u32),
	tile_stride_px: (u32, u32),
	flags: LocalSchemeFlags,
) -> Result<(Vec<Tile>, AxisLayout, AxisLayout), TilingError> {
	if flags.alignment == TileAlignment::Optimized && flags.aligned_to_base {
		return Err(TilingError::OptimizedAlignmentUnsupported);
	}

	let x_layout = compute_axis_offsets(raster_w, tile_size_px.0, tile_stride_px.0, flags);
	let y_layout = compute_axis_offsets(raster_h, tile_size_px.1, tile_stride_px.1, flags);

	if x_layout.offsets.is_empty() {
		return Err(TilingError::NoTilesFit {
			raster_fn: raster_fn.to_string(),
			axis: "x",
		});
	}
	if y_layout.offsets.is_empty() {
		return Err(TilingError::NoTilesFit {
			raster_fn: raster_fn.to_string(),
			axis: "y",
		});
	}

	let (tile_w, tile_h) = (u64::from(tile_size_px.0), u64::from(tile_size_px.1));
	let tiles: Vec<Tile> = y_layout
		.offsets
		.iter()
		.flat_map(|&y| x_layout.offsets.iter().map(move |&x| (x, y)))
		.filter(|&(x, y)| {
			flags.use_border || (tile_fully_inside(x, tile_w, raster_w) && tile_fully_inside(y, tile_h, raster_h))
		})
		.map(|(x, y)| Tile::image_pixel(raster_fn, x, y, tile_w, tile_h))
		.collect();

	Ok((tiles, x_layout, y_layout))
}

/// Whether a tile starting at `offset` with the given `size` lies entirely
/// within `[0, raster_size)` on one axis, i.e. is not a border tile.
fn tile_fully_inside(offset: i64, size: u64, raster_size: u32) -> bool {
	offset >= 0 && offset as u64 + size <= u64::from(raster_size)
}

/// Builds the `Mercator` tile list for a given zoom level, restricted to the
/// tiles that intersect `raster_bbox` (EPSG:4326). When `use_border_tiles` is
/// false, tiles whose bounds are not fully contained in `raster_bbox` are
/// dropped.
#[must_use]
pub fn compute_mercator_tiles(raster_bbox: &GeoBBox, zoom: u32, use_border_tiles: bool) -> Vec<Tile> {
	mercator::tiles_intersecting(raster_bbox, zoom)
		.into_iter()
		.filter(|&(x, y)| {
			if use_border_tiles {
				return true;
			}
			let tile_bbox = mercator::tile_bounds(x, y, zoom);
			raster_bbox.x_min <= tile_bbox.x_min
				&& raster_bbox.y_min <= tile_bbox.y_min
				&& raster_bbox.x_max >= tile_bbox.x_max
				&& raster_bbox.y_max >= tile_bbox.y_max
		})
		.map(|(x, y)| Tile::mercator(x, y, zoom, MERCATOR_TILE_SIZE_PX, MERCATOR_TILE_SIZE_PX))
		.collect()
}

/// The tile list for a raster under a resolved tiling scheme (`Mercator`, or
/// a `LocalPixel` scheme already resolved from `LocalMeter` via
/// [`TilingScheme::resolve_to_local_pixel`]).
///
/// # Errors
///
/// Propagates [`TilingError`] from [`compute_local_pixel_tiles`]; `Mercator`
/// never fails here (an empty tile list is valid for a raster outside the
/// requested zoom's coverage, though in practice the raster's own bbox is
/// always self-intersecting).
pub fn compute_tiles(
	raster_fn: &str,
	raster_w: u32,
	raster_h: u32,
	raster_bbox: &GeoBBox,
	scheme: &TilingScheme,
) -> Result<Vec<Tile>, TilingError> {
	match scheme {
		TilingScheme::Mercator { zoom, use_border_tiles } => Ok(compute_mercator_tiles(raster_bbox, *zoom, *use_border_tiles)),
		TilingScheme::LocalPixel {
			tile_size_px,
			tile_stride_px,
			flags,
		} => {
			let (tiles, _, _) = compute_local_pixel_tiles(raster_fn, raster_w, raster_h, *tile_size_px, *tile_stride_px, *flags)?;
			Ok(tiles)
		}
		TilingScheme::LocalMeter { .. } => unreachable!("LocalMeter must be resolved to LocalPixel before calling compute_tiles"),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use geoseg_core::TileAlignment;

	fn flags(alignment: TileAlignment, use_overhang: bool) -> LocalSchemeFlags {
		LocalSchemeFlags {
			alignment,
			use_overhang,
			use_border: true,
			aligned_to_base: false,
		}
	}

	#[test]
	fn aligned_to_border_tiles_exact_multiple() {
		let layout = compute_axis_offsets(1000, 100, 100, flags(TileAlignment::AlignedToImageBorder, false));
		assert_eq!(layout.offsets, (0..10).map(|i| i * 100).collect::<Vec<i64>>());
	}

	#[test]
	fn centered_matches_border_when_stride_equals_size() {
		let border = compute_axis_offsets(1000, 100, 100, flags(TileAlignment::AlignedToImageBorder, false));
		let centered = compute_axis_offsets(1000, 100, 100, flags(TileAlignment::CenteredToImage, false));
		assert_eq!(border.offsets, centered.offsets);
	}

	#[test]
	fn offsets_are_sorted_ascending() {
		let layout = compute_axis_offsets(777, 256, 200, flags(TileAlignment::Optimized, true));
		for pair in layout.offsets.windows(2) {
			assert!(pair[0] < pair[1]);
		}
	}

	#[test]
	fn overhang_covers_full_raster() {
		let raster_size = 1000u32;
		let (size, stride) = (256u32, 200u32);
		let layout = compute_axis_offsets(raster_size, size, stride, flags(TileAlignment::AlignedToImageBorder, true));
		let last = *layout.offsets.last().unwrap();
		assert!(last + i64::from(size) >= i64::from(raster_size));
		let first = layout.offsets[0];
		assert!(first <= 0);
	}

	#[test]
	fn rejects_optimized_aligned_to_base() {
		let mut f = flags(TileAlignment::Optimized, false);
		f.aligned_to_base = true;
		let err = compute_local_pixel_tiles("r.tif", 1000, 1000, (100, 100), (100, 100), f).unwrap_err();
		assert!(matches!(err, TilingError::OptimizedAlignmentUnsupported));
	}

	#[test]
	fn local_pixel_tile_count_matches_axis_product() {
		let f = flags(TileAlignment::AlignedToImageBorder, false);
		let (tiles, x, y) = compute_local_pixel_tiles("r.tif", 1000, 500, (100, 100), (100, 100), f).unwrap();
		assert_eq!(tiles.len(), x.offsets.len() * y.offsets.len());
	}

	#[test]
	fn dropping_border_tiles_removes_overhanging_tiles() {
		let mut f = flags(TileAlignment::AlignedToImageBorder, true);
		f.use_border = true;
		let (with_border, _, _) = compute_local_pixel_tiles("r.tif", 950, 950, (256, 256), (200, 200), f).unwrap();
		f.use_border = false;
		let (without_border, _, _) = compute_local_pixel_tiles("r.tif", 950, 950, (256, 256), (200, 200), f).unwrap();
		assert!(without_border.len() < with_border.len());
		for tile in &without_border {
			if let geoseg_core::tile::TileKind::ImagePixel { src_x, src_y, src_w, src_h, .. } = tile.kind {
				assert!(src_x >= 0 && src_y >= 0);
				assert!(src_x as u64 + src_w <= 950 && src_y as u64 + src_h <= 950);
			}
		}
	}

	#[test]
	fn local_pixel_tiles_are_in_scan_order() {
		let f = flags(TileAlignment::Optimized, true);
		let (tiles, _, _) = compute_local_pixel_tiles("r.tif", 777, 513, (256, 256), (200, 200), f).unwrap();
		let coords: Vec<(i64, i64)> = tiles
			.iter()
			.map(|t| match t.kind {
				geoseg_core::tile::TileKind::ImagePixel { src_x, src_y, .. } => (src_x, src_y),
				geoseg_core::tile::TileKind::Mercator { .. } => unreachable!(),
			})
			.collect();
		for pair in coords.windows(2) {
			let (x0, y0) = pair[0];
			let (x1, y1) = pair[1];
			assert!(y1 > y0 || (y1 == y0 && x1 > x0));
		}
	}

	#[test]
	fn mercator_drops_border_tiles_when_disabled() {
		let zoom = 6;
		let (x, y) = (10u32, 20u32);
		let tile_bbox = mercator::tile_bounds(x, y, zoom);
		let full = compute_mercator_tiles(&tile_bbox, zoom, false);
		assert!(full.iter().any(|t| matches!(t.kind, geoseg_core::tile::TileKind::Mercator { x: tx, y: ty, z } if tx == x && ty == y && z == zoom)));

		let shrunk = GeoBBox::new(
			tile_bbox.x_min + (tile_bbox.x_max - tile_bbox.x_min) * 0.25,
			tile_bbox.y_min + (tile_bbox.y_max - tile_bbox.y_min) * 0.25,
			tile_bbox.x_max - (tile_bbox.x_max - tile_bbox.x_min) * 0.25,
			tile_bbox.y_max - (tile_bbox.y_max - tile_bbox.y_min) * 0.25,
		)
		.unwrap();
		let partial = compute_mercator_tiles(&shrunk, zoom, false);
		assert!(partial.is_empty());
		let partial_with_border = compute_mercator_tiles(&shrunk, zoom, true);
		assert!(!partial_with_border.is_empty());
	}
}
