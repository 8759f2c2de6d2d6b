//! Per-category comparison: true/false positive/negative confusion masks
//! between a reference (ground-truth) tile directory and a fused
//! (predicted) tile directory with matching tile identities.
//!
//! The fused directory is expected to be a subset by identity of the
//! reference directory (every tile that was fused corresponds to a
//! reference tile; not every reference tile need have been fused). One
//! output directory is written per active, non-ignore category, holding
//! the confusion-palette label tile for every fused tile that overlaps it.

use crate::error::AggregationError;
use geoseg_core::manifest::{RasterTilingResult, RasterTilingResults, MANIFEST_FILE_NAME};
use geoseg_core::tile::TileKind;
use geoseg_core::{DatasetCategories, DatasetCategory, Tile};
use geoseg_raster::RasterWindow;
use geoseg_tiling::io;
use std::path::Path;

/// Confusion-mask palette index for a true negative (neither reference nor fused).
pub const TRUE_NEGATIVE: u8 = 0;
/// Confusion-mask palette index for a false positive (fused only).
pub const FALSE_POSITIVE: u8 = 1;
/// Confusion-mask palette index for a false negative (reference only).
pub const FALSE_NEGATIVE: u8 = 2;
/// Confusion-mask palette index for a true positive (both).
pub const TRUE_POSITIVE: u8 = 3;

/// The fixed four-class palette every confusion mask is written with:
/// black/true-negative, red/false-positive, blue/false-negative,
/// white/true-positive.
#[must_use]
pub fn confusion_categories() -> DatasetCategories {
	DatasetCategories::new(vec![
		DatasetCategory::new("true_negative", TRUE_NEGATIVE, (0, 0, 0)),
		DatasetCategory::new("false_positive", FALSE_POSITIVE, (255, 0, 0)),
		DatasetCategory::new("false_negative", FALSE_NEGATIVE, (0, 0, 255)),
		DatasetCategory::new("true_positive", TRUE_POSITIVE, (255, 255, 255)),
	])
	.expect("four fixed, contiguous, non-duplicated categories always validate")
}

/// The two-class palette a non-paletted (RGB/RGBA) comparison is written
/// with: unchanged pixels vs. any-band-differs pixels.
#[must_use]
pub fn difference_categories() -> DatasetCategories {
	DatasetCategories::new(vec![
		DatasetCategory::new("same", 0, (0, 0, 0)),
		DatasetCategory::new("different", 1, (255, 0, 0)),
	])
	.expect("two fixed, contiguous, non-duplicated categories always validate")
}

/// What a tile directory's files encode, mirroring `geoseg_fusion::TileFormat`
/// but specialized to what the comparison engine can read and classify.
pub enum CompareFormat<'a> {
	/// Single-band palette-index tiles; `categories` names the active,
	/// non-ignore classes to produce a confusion mask for.
	Label { categories: &'a DatasetCategories },
	/// RGB/RGBA image tiles; classified only as same/different per pixel.
	Image,
}

fn io_error(context: &'static str, err: &impl std::fmt::Display) -> AggregationError {
	AggregationError::Io {
		context,
		message: err.to_string(),
	}
}

/// Runs comparison over every raster named in `reference_dir`'s manifest,
/// writing one subdirectory per category (or a single `difference`
/// subdirectory for [`CompareFormat::Image`]) under `out_dir`.
///
/// # Errors
///
/// Returns [`AggregationError::FusedSetNotSubset`] if a fused tile has no
/// matching reference tile, or any per-tile I/O failure.
pub async fn compare_tiles(reference_dir: &Path, fused_dir: &Path, out_dir: &Path, ext: &str, format: &CompareFormat<'_>) -> Result<(), AggregationError> {
	let manifest_path = reference_dir.join(MANIFEST_FILE_NAME);
	let manifest_json = tokio::fs::read_to_string(&manifest_path).await.map_err(|err| io_error("read reference manifest", &err))?;
	let results = RasterTilingResults::from_json(&manifest_json).map_err(|err| AggregationError::Io {
		context: "parse reference manifest",
		message: err.to_string(),
	})?;

	tokio::fs::create_dir_all(out_dir).await.map_err(|err| io_error("create comparison output directory", &err))?;

	for raster in &results.raster_tiling_result_list {
		compare_raster(reference_dir, fused_dir, out_dir, ext, format, raster).await?;
	}
	Ok(())
}

async fn compare_raster(reference_dir: &Path, fused_dir: &Path, out_dir: &Path, ext: &str, format: &CompareFormat<'_>, raster: &RasterTilingResult) -> Result<(), AggregationError> {
	log::info!("comparing raster '{}'", raster.raster_fn);
	let reference_tiles = discover_tiles(reference_dir, &raster.raster_fn, ext).await?;
	let fused_tiles = discover_tiles(fused_dir, &raster.raster_fn, ext).await?;

	for fused_tile in &fused_tiles {
		let Some(reference_tile) = reference_tiles.iter().find(|t| *t == fused_tile) else {
			return Err(AggregationError::FusedSetNotSubset {
				extra_relative_path: fused_tile.relative_path(ext),
			});
		};

		match format {
			CompareFormat::Label { categories } => {
				let reference_window = io::read_label_tile(&reference_dir.join(reference_tile.relative_path(ext))).await?;
				let fused_window = io::read_label_tile(&fused_dir.join(fused_tile.relative_path(ext))).await?;
				for category in categories.active() {
					if category.is_ignore {
						continue;
					}
					let mask = confusion_mask(&reference_window, &fused_window, category.palette_index);
					let category_dir = out_dir.join(&category.name);
					let path = category_dir.join(fused_tile.relative_path(ext));
					io::write_label_tile(&path, &mask, &confusion_categories()).await?;
				}
			}
			CompareFormat::Image => {
				let reference_window = io::read_image_tile(&reference_dir.join(reference_tile.relative_path(ext))).await?;
				let fused_window = io::read_image_tile(&fused_dir.join(fused_tile.relative_path(ext))).await?;
				let mask = difference_mask(&reference_window, &fused_window);
				let path = out_dir.join("difference").join(fused_tile.relative_path(ext));
				io::write_label_tile(&path, &mask, &difference_categories()).await?;
			}
		}
	}
	Ok(())
}

/// Classifies every pixel of a label tile pair into TN/FP/FN/TP for a single
/// category's palette index.
#[must_use]
pub fn confusion_mask(reference: &RasterWindow, fused: &RasterWindow, palette_index: u8) -> RasterWindow {
	let mut out = RasterWindow::zero_filled(fused.width, fused.height, 1);
	let reference_plane = reference.band(0);
	let fused_plane = fused.band(0);
	for i in 0..out.band(0).len() {
		let is_reference = reference_plane[i] == palette_index;
		let is_fused = fused_plane[i] == palette_index;
		out.band_mut(0)[i] = match (is_reference, is_fused) {
			(false, false) => TRUE_NEGATIVE,
			(false, true) => FALSE_POSITIVE,
			(true, false) => FALSE_NEGATIVE,
			(true, true) => TRUE_POSITIVE,
		};
	}
	out
}

/// Classifies every pixel of an RGB(A) tile pair as unchanged (`0`) or
/// differing in any band (`1`).
#[must_use]
pub fn difference_mask(reference: &RasterWindow, fused: &RasterWindow) -> RasterWindow {
	let mut out = RasterWindow::zero_filled(fused.width, fused.height, 1);
	let pixel_count = out.band(0).len();
	for i in 0..pixel_count {
		let differs = (0..fused.band_count).any(|band| reference.band(band)[i] != fused.band(band)[i]);
		out.band_mut(0)[i] = u8::from(differs);
	}
	out
}

async fn discover_tiles(dir: &Path, raster_fn: &str, ext: &str) -> Result<Vec<Tile>, AggregationError> {
	let root = dir.to_path_buf();
	let ext_owned = ext.to_string();
	let relative_paths = tokio::task::spawn_blocking(move || walk_relative_paths(&root, &ext_owned))
		.await
		.map_err(|err| io_error("discover_tiles join", &err))?;

	let raster_fn = raster_fn.to_string();
	Ok(relative_paths
		.into_iter()
		.filter_map(|relative| Tile::parse_path(&relative).ok())
		.filter(|tile| match &tile.kind {
			TileKind::ImagePixel { raster_name, .. } => raster_name == &raster_fn,
			TileKind::Mercator { .. } => true,
		})
		.collect())
}

fn walk_relative_paths(root: &Path, ext: &str) -> Vec<String> {
	let mut out = Vec::new();
	walk(root, root, ext, &mut out);
	out
}

fn walk(root: &Path, dir: &Path, ext: &str, out: &mut Vec<String>) {
	let Ok(entries) = std::fs::read_dir(dir) else { return };
	for entry in entries.flatten() {
		let path = entry.path();
		if path.is_dir() {
			walk(root, &path, ext, out);
			continue;
		}
		let matches_ext = path.extension().is_some_and(|found| format!(".{}", found.to_string_lossy()) == ext);
		if !matches_ext {
			continue;
		}
		if let Ok(relative) = path.strip_prefix(root) {
			out.push(relative.to_string_lossy().replace(std::path::MAIN_SEPARATOR, "/"));
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn confusion_mask_classifies_all_four_cases() {
		let mut reference = RasterWindow::zero_filled(2, 2, 1);
		reference.band_mut(0)[0] = 1;
		reference.band_mut(0)[1] = 1;
		let mut fused = RasterWindow::zero_filled(2, 2, 1);
		fused.band_mut(0)[0] = 1;
		fused.band_mut(0)[2] = 1;

		let mask = confusion_mask(&reference, &fused, 1);
		assert_eq!(mask.band(0)[0], TRUE_POSITIVE);
		assert_eq!(mask.band(0)[1], FALSE_NEGATIVE);
		assert_eq!(mask.band(0)[2], FALSE_POSITIVE);
		assert_eq!(mask.band(0)[3], TRUE_NEGATIVE);
	}

	#[test]
	fn all_category_a_vs_all_category_b_is_entirely_fn_and_fp() {
		let mut reference = RasterWindow::zero_filled(4, 4, 1);
		reference.band_mut(0).fill(0);
		let mut fused = RasterWindow::zero_filled(4, 4, 1);
		fused.band_mut(0).fill(1);

		let mask_for_a = confusion_mask(&reference, &fused, 0);
		assert!(mask_for_a.band(0).iter().all(|&v| v == FALSE_NEGATIVE));

		let mask_for_b = confusion_mask(&reference, &fused, 1);
		assert!(mask_for_b.band(0).iter().all(|&v| v == FALSE_POSITIVE));
	}

	#[test]
	fn difference_mask_flags_any_band_mismatch() {
		let mut reference = RasterWindow::zero_filled(1, 1, 3);
		reference.band_mut(0)[0] = 10;
		let mut fused = RasterWindow::zero_filled(1, 1, 3);
		fused.band_mut(0)[0] = 20;
		let mask = difference_mask(&reference, &fused);
		assert_eq!(mask.band(0)[0], 1);
	}
}
