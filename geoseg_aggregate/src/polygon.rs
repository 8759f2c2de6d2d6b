//! Polygon-projection: vectorizing each tile's per-category mask into
//! world-coordinate polygons, then merging every tile's contribution for a
//! category into one [`GeoSegmentation`] per raster.
//!
//! Unlike pixel-projection, this path never needs a raster-pixel grid: a
//! tile's own pixel→world affine (EPSG:3857 for Mercator tiles, the
//! raster's native CRS for `ImagePixel` tiles) is enough to vectorize
//! directly into world coordinates, which is also what makes this strategy
//! preferable when the output needs to be reprojected or merged against
//! other vector data rather than rendered back onto the source raster's
//! pixel grid.

use crate::error::AggregationError;
use geoseg_core::geo::mercator;
use geoseg_core::tile::TileKind;
use geoseg_core::{Affine, DatasetCategories, Tile};
use geoseg_geometry::GeoSegmentation;
use geoseg_raster::RasterWindow;
use std::collections::BTreeMap;

/// Builds the tile-pixel→world affine for `tile`, along with the CRS that
/// affine's output is expressed in.
///
/// # Errors
///
/// Never fails for `ImagePixel` tiles. For `Mercator` tiles this mirrors
/// [`crate::project::tile_to_raster_affine`]'s bounds computation and is
/// likewise infallible; the `Result` is kept for symmetry with that
/// function and so a future CRS-aware extension can fail cleanly.
pub fn tile_to_world_affine(tile: &Tile, raster_transform: &Affine, raster_crs: &str) -> Result<(Affine, String), AggregationError> {
	match &tile.kind {
		TileKind::ImagePixel { src_x, src_y, src_w, src_h, .. } => {
			let (disk_w, disk_h) = tile.disk_size();
			let scale_x = *src_w as f64 / f64::from(disk_w.max(1));
			let scale_y = *src_h as f64 / f64::from(disk_h.max(1));
			let tile_to_raster_pixel = Affine::from_origin_and_pixel_size(*src_x as f64, *src_y as f64, scale_x, scale_y);
			Ok((tile_to_raster_pixel.then(raster_transform), raster_crs.to_string()))
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
			Ok((tile_to_world, "EPSG:3857".to_string()))
		}
	}
}

/// Accumulates one [`GeoSegmentation`] per active, non-ignore category
/// across every tile of a raster.
#[derive(Default)]
pub struct PolygonAccumulator {
	by_category: BTreeMap<String, GeoSegmentation>,
}

impl PolygonAccumulator {
	#[must_use]
	pub fn new() -> PolygonAccumulator {
		PolygonAccumulator::default()
	}

	/// Vectorizes one tile's label plane and merges each category's
	/// contribution into the running per-category segmentation.
	pub fn add_tile(&mut self, tile_window: &RasterWindow, affine: &Affine, crs: &str, categories: &DatasetCategories) {
		let (width, height) = (tile_window.width, tile_window.height);
		let indices = tile_window.band(0);
		for category in categories.active() {
			if category.is_ignore {
				continue;
			}
			let mask: Vec<bool> = indices.iter().map(|&v| v == category.palette_index).collect();
			if !mask.iter().any(|&v| v) {
				continue;
			}
			let contribution = GeoSegmentation::vectorize_mask(&mask, width, height, affine, category.name.clone(), category.palette_color, crs);
			self.by_category
				.entry(category.name.clone())
				.and_modify(|existing| existing.merge(&contribution))
				.or_insert(contribution);
		}
	}

	/// Consumes the accumulator, returning every category's final
	/// segmentation in category-name order.
	#[must_use]
	pub fn into_segmentations(self) -> Vec<GeoSegmentation> {
		self.by_category.into_values().collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use geoseg_core::DatasetCategory;

	fn sample_categories() -> DatasetCategories {
		DatasetCategories::new(vec![
			DatasetCategory::new("background", 0, (0, 0, 0)),
			DatasetCategory::new("building", 1, (255, 0, 0)),
		])
		.unwrap()
	}

	#[test]
	fn image_pixel_tile_projects_into_raster_crs() {
		let tile = Tile::image_pixel("r.tif", 10, 10, 10, 10).with_disk_size(10, 10);
		let raster_transform = Affine::from_origin_and_pixel_size(1000.0, 2000.0, 2.0, -2.0);
		let (affine, crs) = tile_to_world_affine(&tile, &raster_transform, "EPSG:32633").unwrap();
		assert_eq!(crs, "EPSG:32633");
		let (wx, wy) = affine.apply(0.0, 0.0);
		assert_eq!((wx, wy), (1020.0, 1980.0));
	}

	#[test]
	fn accumulator_merges_two_tiles_into_one_segmentation_per_category() {
		let categories = sample_categories();
		let mut accumulator = PolygonAccumulator::new();

		let mut window_a = RasterWindow::zero_filled(4, 4, 1);
		window_a.band_mut(0).fill(1);
		let tile_a = Tile::image_pixel("r.tif", 0, 0, 4, 4).with_disk_size(4, 4);
		let (affine_a, crs_a) = tile_to_world_affine(&tile_a, &Affine::identity(), "EPSG:4326").unwrap();
		accumulator.add_tile(&window_a, &affine_a, &crs_a, &categories);

		let mut window_b = RasterWindow::zero_filled(4, 4, 1);
		window_b.band_mut(0).fill(1);
		let tile_b = Tile::image_pixel("r.tif", 4, 0, 4, 4).with_disk_size(4, 4);
		let (affine_b, crs_b) = tile_to_world_affine(&tile_b, &Affine::identity(), "EPSG:4326").unwrap();
		accumulator.add_tile(&window_b, &affine_b, &crs_b, &categories);

		let segmentations = accumulator.into_segmentations();
		assert_eq!(segmentations.len(), 1);
		assert_eq!(segmentations[0].category, "building");
	}
}
