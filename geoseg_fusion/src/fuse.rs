//! Top-level fusion orchestration: reads a predicted-tile directory and its
//! [`RasterTilingResults`] manifest, classifies each raster's tiles into base
//! and auxiliary sets, fuses (or, if disabled, simply extracts) the base
//! tiles, and writes them plus a copy of the manifest to the output
//! directory.

use crate::classify::{self, Classification};
use crate::error::FusionError;
use crate::index::AuxiliaryIndex;
use crate::reliable;
use crate::substitute::substitute_pixels;
use geoseg_core::manifest::{RasterTilingResult, RasterTilingResults, MANIFEST_FILE_NAME};
use geoseg_core::{DatasetCategories, Tile};
use geoseg_raster::RasterWindow;
use geoseg_tiling::io;
use std::path::Path;

/// What a tile directory's files encode, and how to read/write them.
pub enum TileFormat<'a> {
	Image,
	Label { categories: &'a DatasetCategories },
}

/// Tuning for [`fuse_tiles`].
#[derive(Clone, Copy, Debug)]
pub struct FusionOptions {
	/// If `false`, base tiles are extracted (copied) unchanged and no
	/// auxiliary substitution happens at all.
	pub perform_fusion: bool,
	/// If `true`, reject schemes that would make fusion output vary across
	/// stride choices (see SPEC_FULL §4.2's soundness contract).
	pub consistent_for_varying_tile_strides: bool,
}

impl Default for FusionOptions {
	fn default() -> FusionOptions {
		FusionOptions {
			perform_fusion: true,
			consistent_for_varying_tile_strides: true,
		}
	}
}

fn io_error(context: &'static str, err: &impl std::fmt::Display) -> FusionError {
	FusionError::Io {
		context,
		message: err.to_string(),
	}
}

/// Runs fusion over every raster named in `predict_dir`'s manifest, writing
/// fused (or extracted) base tiles plus a copy of the manifest to `fuse_dir`.
///
/// Rasters are processed concurrently; within a raster, base tiles are fused
/// sequentially (see SPEC_FULL §8's note on deterministic per-raster ordering).
///
/// # Errors
///
/// Returns [`FusionError::OptimizedAlignmentUnsupported`] or
/// [`FusionError::OverhangRequired`] if `options.consistent_for_varying_tile_strides`
/// is set and the manifest's scheme cannot satisfy it, or any per-raster
/// classification/I/O failure.
pub async fn fuse_tiles(predict_dir: &Path, fuse_dir: &Path, ext: &str, format: &TileFormat<'_>, options: &FusionOptions) -> Result<(), FusionError> {
	let manifest_path = predict_dir.join(MANIFEST_FILE_NAME);
	let manifest_json = tokio::fs::read_to_string(&manifest_path).await.map_err(|err| io_error("read tiling manifest", &err))?;
	let results = RasterTilingResults::from_json(&manifest_json).map_err(|err| FusionError::Io {
		context: "parse tiling manifest",
		message: err.to_string(),
	})?;

	if options.consistent_for_varying_tile_strides {
		if results.tiling_scheme.is_optimized() {
			return Err(FusionError::OptimizedAlignmentUnsupported);
		}
		if !results.tiling_scheme.uses_overhanging_tiles() {
			return Err(FusionError::OverhangRequired);
		}
	}

	tokio::fs::create_dir_all(fuse_dir).await.map_err(|err| io_error("create fuse directory", &err))?;

	let outcomes = futures::future::join_all(
		results
			.raster_tiling_result_list
			.iter()
			.map(|raster| fuse_raster(predict_dir, fuse_dir, ext, format, options.perform_fusion, raster)),
	)
	.await;
	for outcome in outcomes {
		outcome?;
	}

	copy_tiling_result_file(predict_dir, fuse_dir).await
}

async fn fuse_raster(predict_dir: &Path, fuse_dir: &Path, ext: &str, format: &TileFormat<'_>, perform_fusion: bool, raster: &RasterTilingResult) -> Result<(), FusionError> {
	log::info!("fusing raster '{}'", raster.raster_fn);
	let tiles = discover_tiles(predict_dir, &raster.raster_fn, ext).await?;
	let Classification { base, aux } = classify::classify_tiles(&tiles, &raster.raster_fn, raster.raster_width, raster.raster_height, &raster.tiling_info)?;
	log::info!("raster '{}': {} base tiles, {} auxiliary tiles", raster.raster_fn, base.len(), aux.len());

	if !perform_fusion {
		for tile in &base {
			copy_tile(predict_dir, fuse_dir, ext, tile).await?;
		}
		return Ok(());
	}

	let index = AuxiliaryIndex::build(&aux);
	let source_stride = raster.tiling_info.source_stride;

	for base_tile in &base {
		let base_window = read_tile(predict_dir, ext, format, base_tile).await?;
		let base_tile = base_tile.clone().with_disk_size(base_window.width, base_window.height);

		let overlap_indices = index.overlapping(&base_tile);
		let mut overlap_tiles = Vec::with_capacity(overlap_indices.len());
		let mut overlap_windows: Vec<RasterWindow> = Vec::with_capacity(overlap_indices.len());
		for overlap_index in overlap_indices {
			let aux_tile = &aux[overlap_index];
			let window = read_tile(predict_dir, ext, format, aux_tile).await?;
			overlap_tiles.push(aux_tile.clone().with_disk_size(window.width, window.height));
			overlap_windows.push(window);
		}
		let overlaps: Vec<(&Tile, &RasterWindow)> = overlap_tiles.iter().zip(overlap_windows.iter()).collect();

		let source_size = base_tile.source_size().ok_or(FusionError::NotImagePixelTile)?;
		let reliable_offset = reliable::reliable_offsets(base_tile.disk_size(), source_size, source_stride);

		let fused = substitute_pixels(&base_tile, &base_window, &overlaps, reliable_offset)?;
		write_tile(fuse_dir, ext, format, &base_tile, &fused).await?;
	}
	Ok(())
}

async fn read_tile(dir: &Path, ext: &str, format: &TileFormat<'_>, tile: &Tile) -> Result<RasterWindow, FusionError> {
	let path = dir.join(tile.relative_path(ext));
	let window = match format {
		TileFormat::Image => io::read_image_tile(&path).await?,
		TileFormat::Label { .. } => io::read_label_tile(&path).await?,
	};
	Ok(window)
}

async fn write_tile(dir: &Path, ext: &str, format: &TileFormat<'_>, tile: &Tile, window: &RasterWindow) -> Result<(), FusionError> {
	let path = dir.join(tile.relative_path(ext));
	match format {
		TileFormat::Image => io::write_image_tile(&path, window).await?,
		TileFormat::Label { categories } => io::write_label_tile(&path, window, categories).await?,
	}
	Ok(())
}

async fn copy_tile(predict_dir: &Path, fuse_dir: &Path, ext: &str, tile: &Tile) -> Result<(), FusionError> {
	let relative = tile.relative_path(ext);
	let src = predict_dir.join(&relative);
	let dst = fuse_dir.join(&relative);
	if let Some(parent) = dst.parent() {
		tokio::fs::create_dir_all(parent).await.map_err(|err| io_error("create fuse tile directory", &err))?;
	}
	tokio::fs::copy(&src, &dst).await.map_err(|err| io_error("copy base tile", &err))?;
	Ok(())
}

/// Copies the `tiling_result.json` manifest unchanged from `predict_dir` to
/// `fuse_dir`, so `fuse_dir` is itself a complete, independently loadable
/// tile directory.
///
/// # Errors
///
/// Returns [`FusionError::Io`] if the source manifest is missing or the copy fails.
pub async fn copy_tiling_result_file(predict_dir: &Path, fuse_dir: &Path) -> Result<(), FusionError> {
	let src = predict_dir.join(MANIFEST_FILE_NAME);
	let dst = fuse_dir.join(MANIFEST_FILE_NAME);
	tokio::fs::copy(&src, &dst).await.map_err(|err| io_error("copy tiling manifest", &err))?;
	Ok(())
}

/// Walks `predict_dir` for tile files with extension `ext` belonging to
/// `raster_fn`, reconstructing each [`Tile`] identity from its canonical
/// relative path. Files that don't parse as a tile path are skipped.
async fn discover_tiles(predict_dir: &Path, raster_fn: &str, ext: &str) -> Result<Vec<Tile>, FusionError> {
	let root = predict_dir.to_path_buf();
	let ext = ext.to_string();
	let relative_paths = tokio::task::spawn_blocking(move || walk_relative_paths(&root, &ext))
		.await
		.map_err(|err| io_error("discover_tiles join", &err))?;

	let raster_fn = raster_fn.to_string();
	Ok(relative_paths
		.into_iter()
		.filter_map(|relative| Tile::parse_path(&relative).ok())
		.filter(|tile| match &tile.kind {
			geoseg_core::tile::TileKind::ImagePixel { raster_name, .. } => raster_name == &raster_fn,
			geoseg_core::tile::TileKind::Mercator { .. } => false,
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
	use geoseg_core::manifest::TilingInfo;
	use geoseg_core::scheme::{LocalSchemeFlags, TileAlignment};
	use geoseg_core::{Affine, TilingScheme};
	use geoseg_raster::RasterWindow;

	fn manifest_json(raster_width: u32, raster_height: u32) -> String {
		let result = RasterTilingResult::new(
			"r.tif",
			"/data/r.tif",
			"EPSG:4326",
			Affine::from_origin_and_pixel_size(0.0, 0.0, 1.0, -1.0),
			raster_width,
			raster_height,
			(100, 100),
			TilingInfo {
				source_offset: (0, 0),
				source_stride: (50.0, 50.0),
				source_size: (100, 100),
			},
			Vec::new(),
		)
		.with_computed_statistic();
		let scheme = TilingScheme::LocalPixel {
			tile_size_px: (100, 100),
			tile_stride_px: (50, 50),
			flags: LocalSchemeFlags {
				alignment: TileAlignment::AlignedToImageBorder,
				use_overhang: true,
				use_border: true,
				aligned_to_base: false,
			},
		};
		RasterTilingResults::new(scheme, vec![result]).to_json().unwrap()
	}

	async fn write_tile_file(dir: &Path, tile: &Tile, value: u8) {
		let window = {
			let mut w = RasterWindow::zero_filled(100, 100, 1);
			w.band_mut(0).fill(value);
			w
		};
		io::write_label_tile(
			&dir.join(tile.relative_path(".png")),
			&window,
			&geoseg_core::DatasetCategories::new(vec![
				geoseg_core::DatasetCategory::new("bg", 0, (0, 0, 0)),
				geoseg_core::DatasetCategory::new("fg", 1, (255, 0, 0)),
			])
			.unwrap(),
		)
		.await
		.unwrap();
	}

	#[tokio::test]
	async fn fuse_tiles_extracts_base_only_when_fusion_disabled() {
		let predict_dir = tempfile::tempdir().unwrap();
		let fuse_dir = tempfile::tempdir().unwrap();
		tokio::fs::write(predict_dir.path().join(MANIFEST_FILE_NAME), manifest_json(200, 200)).await.unwrap();

		let base_tile = Tile::image_pixel("r.tif", 0, 0, 100, 100);
		write_tile_file(predict_dir.path(), &base_tile, 3).await;

		let categories = geoseg_core::DatasetCategories::new(vec![
			geoseg_core::DatasetCategory::new("bg", 0, (0, 0, 0)),
			geoseg_core::DatasetCategory::new("fg", 1, (255, 0, 0)),
		])
		.unwrap();
		let format = TileFormat::Label { categories: &categories };
		let options = FusionOptions {
			perform_fusion: false,
			consistent_for_varying_tile_strides: true,
		};
		fuse_tiles(predict_dir.path(), fuse_dir.path(), ".png", &format, &options).await.unwrap();

		assert!(fuse_dir.path().join(base_tile.relative_path(".png")).exists());
		assert!(fuse_dir.path().join(MANIFEST_FILE_NAME).exists());
	}

	#[tokio::test]
	async fn fuse_tiles_rejects_optimized_scheme_when_consistent() {
		let predict_dir = tempfile::tempdir().unwrap();
		let fuse_dir = tempfile::tempdir().unwrap();
		let result = RasterTilingResult::new(
			"r.tif",
			"/data/r.tif",
			"EPSG:4326",
			Affine::from_origin_and_pixel_size(0.0, 0.0, 1.0, -1.0),
			200,
			200,
			(100, 100),
			TilingInfo {
				source_offset: (0, 0),
				source_stride: (50.0, 50.0),
				source_size: (100, 100),
			},
			Vec::new(),
		);
		let scheme = TilingScheme::LocalPixel {
			tile_size_px: (100, 100),
			tile_stride_px: (50, 50),
			flags: LocalSchemeFlags {
				alignment: TileAlignment::Optimized,
				use_overhang: true,
				use_border: true,
				aligned_to_base: false,
			},
		};
		let manifest = RasterTilingResults::new(scheme, vec![result]).to_json().unwrap();
		tokio::fs::write(predict_dir.path().join(MANIFEST_FILE_NAME), manifest).await.unwrap();

		let categories = geoseg_core::DatasetCategories::new(vec![
			geoseg_core::DatasetCategory::new("bg", 0, (0, 0, 0)),
			geoseg_core::DatasetCategory::new("fg", 1, (255, 0, 0)),
		])
		.unwrap();
		let format = TileFormat::Label { categories: &categories };
		let err = fuse_tiles(predict_dir.path(), fuse_dir.path(), ".png", &format, &FusionOptions::default())
			.await
			.unwrap_err();
		assert!(matches!(err, FusionError::OptimizedAlignmentUnsupported));
	}
}
