//! Pixel-projection: back-projecting a tile's label pixels onto a
//! raster-sized output grid via the tile's own pixel→raster-pixel affine.
//!
//! `ImagePixel` tiles already share the raster's pixel grid, so their
//! tile-pixel→raster-pixel affine is a pure scale (disk size vs. source
//! size) with no world round-trip. `Mercator` tiles are defined over
//! EPSG:3857 regardless of the raster's native CRS, so their affine is built
//! the same way `geoseg_raster`'s reprojection path builds a destination
//! geo-transform: tile bounds in Mercator meters, divided by the tile's disk
//! size, then composed with the raster's own inverted pixel→world transform.

use crate::error::AggregationError;
use geoseg_core::geo::mercator;
use geoseg_core::tile::TileKind;
use geoseg_core::{Affine, DatasetCategories, Tile};
use geoseg_raster::RasterWindow;

/// One accumulator per output raster: a grayscale category-index plane, an
/// RGBA color plane, and an RGBA grid-overlay plane (always drawn last, per
/// the ordering rule in §4.3).
pub struct Accumulators {
	pub width: u32,
	pub height: u32,
	pub grayscale: RasterWindow,
	pub color: RasterWindow,
	pub grid_overlay: RasterWindow,
}

impl Accumulators {
	#[must_use]
	pub fn new(width: u32, height: u32) -> Accumulators {
		Accumulators {
			width,
			height,
			grayscale: RasterWindow::zero_filled(width, height, 1),
			color: RasterWindow::zero_filled(width, height, 4),
			grid_overlay: RasterWindow::zero_filled(width, height, 4),
		}
	}
}

/// Builds the tile-pixel→raster-pixel affine for `tile`, placed on a raster
/// whose own pixel→world transform is `raster_transform`.
///
/// # Errors
///
/// Returns [`AggregationError::SingularTransform`] if `raster_transform`
/// cannot be inverted.
pub fn tile_to_raster_affine(tile: &Tile, raster_transform: &Affine, raster_fn: &str) -> Result<Affine, AggregationError> {
	match &tile.kind {
		TileKind::ImagePixel { src_x, src_y, src_w, src_h, .. } => {
			let (disk_w, disk_h) = tile.disk_size();
			let scale_x = *src_w as f64 / f64::from(disk_w.max(1));
			let scale_y = *src_h as f64 / f64::from(disk_h.max(1));
			Ok(Affine::from_origin_and_pixel_size(*src_x as f64, *src_y as f64, scale_x, scale_y))
		}
		TileKind::Mercator { x, y, z } => {
			let (disk_w, disk_h) = tile.disk_size();
			let bounds = mercator::tile_bounds(*x, *y, *z).to_mercator();
			let tile_to_world = Affine::from_origin_and_pixel_size(
				bounds[0],
				bounds[3],
				(bounds[2] - bounds[0]) / f64::from(disk_w.max(1)),
				(bounds[1] - bounds[3]) / f64::from(disk_h.max(1)),
			);
			let world_to_raster = raster_transform.invert().map_err(|_| AggregationError::SingularTransform {
				raster_fn: raster_fn.to_string(),
			})?;
			Ok(tile_to_world.then(&world_to_raster))
		}
	}
}

/// Projects one label tile's palette-index plane onto `accumulators`, in
/// `categories` order (later categories overwrite earlier ones at the same
/// raster pixel; the grid overlay always overwrites whatever is already
/// there at `grid_color`'s opacity).
pub fn project_tile(accumulators: &mut Accumulators, tile_window: &RasterWindow, affine: &Affine, categories: &DatasetCategories) {
	let indices = tile_window.band(0);
	for ty in 0..tile_window.height {
		for tx in 0..tile_window.width {
			let index = indices[(ty as usize) * (tile_window.width as usize) + tx as usize];
			let Some(category) = categories.by_palette_index(index) else { continue };
			if category.is_ignore {
				continue;
			}
			let (rx, ry) = affine.apply(f64::from(tx) + 0.5, f64::from(ty) + 0.5);
			if rx < 0.0 || ry < 0.0 {
				continue;
			}
			let (rx, ry) = (rx as u32, ry as u32);
			if rx >= accumulators.width || ry >= accumulators.height {
				continue;
			}
			let offset = (ry as usize) * (accumulators.width as usize) + rx as usize;
			accumulators.grayscale.band_mut(0)[offset] = category.palette_index;
			let (r, g, b) = category.palette_color;
			accumulators.color.band_mut(0)[offset] = r;
			accumulators.color.band_mut(1)[offset] = g;
			accumulators.color.band_mut(2)[offset] = b;
			accumulators.color.band_mut(3)[offset] = 255;
		}
	}
}

/// Draws a tile's boundary into the grid-overlay accumulator, which is
/// always composited on top of the category overlays.
pub fn draw_tile_boundary(accumulators: &mut Accumulators, affine: &Affine, tile_w: u32, tile_h: u32, color: (u8, u8, u8, u8)) {
	let corners_top: Vec<(u32, u32)> = (0..tile_w).map(|x| (x, 0)).collect();
	let corners_bottom: Vec<(u32, u32)> = (0..tile_w).map(|x| (x, tile_h.saturating_sub(1))).collect();
	let corners_left: Vec<(u32, u32)> = (0..tile_h).map(|y| (0, y)).collect();
	let corners_right: Vec<(u32, u32)> = (0..tile_h).map(|y| (tile_w.saturating_sub(1), y)).collect();
	for (tx, ty) in corners_top.into_iter().chain(corners_bottom).chain(corners_left).chain(corners_right) {
		paint_grid_pixel(accumulators, affine, tx, ty, color);
	}
}

fn paint_grid_pixel(accumulators: &mut Accumulators, affine: &Affine, tx: u32, ty: u32, color: (u8, u8, u8, u8)) {
	let (rx, ry) = affine.apply(f64::from(tx) + 0.5, f64::from(ty) + 0.5);
	if rx < 0.0 || ry < 0.0 {
		return;
	}
	let (rx, ry) = (rx as u32, ry as u32);
	if rx >= accumulators.width || ry >= accumulators.height {
		return;
	}
	let offset = (ry as usize) * (accumulators.width as usize) + rx as usize;
	let (r, g, b, a) = color;
	accumulators.grid_overlay.band_mut(0)[offset] = r;
	accumulators.grid_overlay.band_mut(1)[offset] = g;
	accumulators.grid_overlay.band_mut(2)[offset] = b;
	accumulators.grid_overlay.band_mut(3)[offset] = a;
}
