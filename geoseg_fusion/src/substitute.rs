//! Pixel substitution: copies each overlapping auxiliary tile's reliable
//! center rectangle into a base tile's output at the correct offset.
//!
//! All coordinates here are disk pixels relative to the base tile's own disk
//! extent. The offset of an overlapping tile's center is computed from the
//! *absolute* source-pixel difference between the two tiles' identities,
//! scaled by the base tile's disk-to-source ratio — never by multiplying out
//! the (float, possibly quantized) stride — so the result is exact even when
//! successive tiles along an axis don't show identical relative offsets
//! (e.g. a stride of 100.5 yields offsets `[0, 100, 201, 301, ...]`).

use crate::error::FusionError;
use geoseg_core::tile::TileKind;
use geoseg_core::Tile;
use geoseg_raster::RasterWindow;

fn image_pixel_origin(tile: &Tile) -> Result<(i64, i64, u64, u64), FusionError> {
	match &tile.kind {
		TileKind::ImagePixel { src_x, src_y, src_w, src_h, .. } => Ok((*src_x, *src_y, *src_w, *src_h)),
		TileKind::Mercator { .. } => Err(FusionError::NotImagePixelTile),
	}
}

/// The disk-pixel offset of `other`'s center relative to `base`'s center,
/// computed from their source-pixel origins scaled by `base`'s own
/// disk/source ratio (both tiles share a raster, hence the same ratio).
fn relative_disk_offset(base: &Tile, other: &Tile) -> Result<(i64, i64), FusionError> {
	let (base_x, base_y, base_src_w, base_src_h) = image_pixel_origin(base)?;
	let (other_x, other_y, _, _) = image_pixel_origin(other)?;
	let (disk_w, disk_h) = base.disk_size();
	let ratio_x = f64::from(disk_w) / base_src_w as f64;
	let ratio_y = f64::from(disk_h) / base_src_h as f64;
	let dx = ((other_x - base_x) as f64 * ratio_x).floor() as i64;
	let dy = ((other_y - base_y) as f64 * ratio_y).floor() as i64;
	Ok((dx, dy))
}

/// Substitutes reliable center regions from `overlaps` into a copy of
/// `base_window`, the prediction read for `base_tile`.
///
/// `reliable_offset` is the `(x, y)` reliable-center radius in disk pixels,
/// from [`crate::reliable::reliable_offsets`]. `overlaps` pairs each
/// overlapping auxiliary tile's identity with its own prediction window;
/// every window (base and auxiliary) must share `base_window`'s band count.
///
/// # Errors
///
/// Returns [`FusionError::NotImagePixelTile`] if `base_tile` or any
/// overlapping tile is a Mercator tile.
pub fn substitute_pixels(
	base_tile: &Tile,
	base_window: &RasterWindow,
	overlaps: &[(&Tile, &RasterWindow)],
	reliable_offset: (i64, i64),
) -> Result<RasterWindow, FusionError> {
	let (width, height) = (base_window.width, base_window.height);
	let mut merged = base_window.data.clone();
	let center_x = (width / 2) as i64;
	let center_y = (height / 2) as i64;
	let (reliable_x, reliable_y) = reliable_offset;

	for (overlap_tile, overlap_window) in overlaps {
		let (relative_x, relative_y) = relative_disk_offset(base_tile, overlap_tile)?;
		let relative_center_x = center_x + relative_x;
		let relative_center_y = center_y + relative_y;

		let merged_lower_x = relative_center_x - reliable_x;
		let merged_upper_x = relative_center_x + reliable_x;
		let merged_lower_y = relative_center_y - reliable_y;
		let merged_upper_y = relative_center_y + reliable_y;

		let merged_lower_x_adj = merged_lower_x.max(0);
		let merged_upper_x_adj = merged_upper_x.min(i64::from(width));
		let merged_lower_y_adj = merged_lower_y.max(0);
		let merged_upper_y_adj = merged_upper_y.min(i64::from(height));

		let lower_x_slack = relative_center_x - merged_lower_x_adj;
		let upper_x_slack = merged_upper_x_adj - relative_center_x;
		let lower_y_slack = relative_center_y - merged_lower_y_adj;
		let upper_y_slack = merged_upper_y_adj - relative_center_y;

		let overlap_lower_x = center_x - lower_x_slack;
		let overlap_upper_x = center_x + upper_x_slack;
		let overlap_lower_y = center_y - lower_y_slack;
		let overlap_upper_y = center_y + upper_y_slack;

		if overlap_lower_x > overlap_upper_x || overlap_lower_y > overlap_upper_y {
			continue;
		}
		if merged_lower_x_adj >= merged_upper_x_adj || merged_lower_y_adj >= merged_upper_y_adj {
			continue;
		}

		copy_rect(
			overlap_window,
			&mut merged,
			width,
			height,
			(overlap_lower_x as u32, overlap_lower_y as u32),
			(merged_lower_x_adj as u32, merged_lower_y_adj as u32),
			((merged_upper_x_adj - merged_lower_x_adj) as u32, (merged_upper_y_adj - merged_lower_y_adj) as u32),
		);
	}

	Ok(RasterWindow {
		width,
		height,
		band_count: base_window.band_count,
		data: merged,
	})
}

#[allow(clippy::too_many_arguments)]
fn copy_rect(src: &RasterWindow, dst: &mut [u8], dst_width: u32, dst_height: u32, src_origin: (u32, u32), dst_origin: (u32, u32), size: (u32, u32)) {
	let (sw, sh) = size;
	let plane_dst = dst_width as usize * dst_height as usize;
	let plane_src = src.width as usize * src.height as usize;
	for band in 0..src.band_count {
		let src_plane = &src.data[band * plane_src..(band + 1) * plane_src];
		let dst_plane = &mut dst[band * plane_dst..(band + 1) * plane_dst];
		for row in 0..sh {
			let src_row_start = ((src_origin.1 + row) as usize) * src.width as usize + src_origin.0 as usize;
			let dst_row_start = ((dst_origin.1 + row) as usize) * dst_width as usize + dst_origin.0 as usize;
			dst_plane[dst_row_start..dst_row_start + sw as usize].copy_from_slice(&src_plane[src_row_start..src_row_start + sw as usize]);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn filled_window(width: u32, height: u32, value: u8) -> RasterWindow {
		let mut window = RasterWindow::zero_filled(width, height, 1);
		window.band_mut(0).fill(value);
		window
	}

	#[test]
	fn center_of_aligned_overlap_replaces_base_values() {
		let base_tile = Tile::image_pixel("r.tif", 100, 100, 100, 100).with_disk_size(100, 100);
		let base_window = filled_window(100, 100, 1);
		let overlap_tile = Tile::image_pixel("r.tif", 100, 100, 100, 100).with_disk_size(100, 100);
		let overlap_window = filled_window(100, 100, 9);

		let fused = substitute_pixels(&base_tile, &base_window, &[(&overlap_tile, &overlap_window)], (10, 10)).unwrap();

		assert_eq!(fused.band(0)[50 * 100 + 50], 9);
		assert_eq!(fused.band(0)[0], 1);
	}

	#[test]
	fn no_overlap_tiles_leaves_base_unchanged() {
		let base_tile = Tile::image_pixel("r.tif", 0, 0, 100, 100).with_disk_size(100, 100);
		let base_window = filled_window(100, 100, 5);
		let fused = substitute_pixels(&base_tile, &base_window, &[], (10, 10)).unwrap();
		assert!(fused.band(0).iter().all(|&v| v == 5));
	}

	#[test]
	fn shifted_overlap_substitutes_only_near_its_own_center() {
		let base_tile = Tile::image_pixel("r.tif", 0, 0, 100, 100).with_disk_size(100, 100);
		let base_window = filled_window(100, 100, 1);
		// Auxiliary tile offset by +40 source pixels on the x axis, same disk ratio (1.0).
		let overlap_tile = Tile::image_pixel("r.tif", 40, 0, 100, 100).with_disk_size(100, 100);
		let overlap_window = filled_window(100, 100, 9);

		let fused = substitute_pixels(&base_tile, &base_window, &[(&overlap_tile, &overlap_window)], (5, 5)).unwrap();

		// Overlap's center lands at base x = 50 + 40 = 90, y = 50; reliable
		// radius 5 covers base x in [85, 95).
		assert_eq!(fused.band(0)[50 * 100 + 90], 9);
		// Far from the shifted center, the base value survives.
		assert_eq!(fused.band(0)[50 * 100 + 10], 1);
	}
}
