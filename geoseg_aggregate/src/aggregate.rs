//! Top-level aggregation orchestration: reads a fused-tile directory and its
//! manifest, and for each raster, projects every tile back onto a
//! raster-sized output, via pixel-projection or polygon-projection (or
//! both).

use crate::error::AggregationError;
use crate::polygon::{self, PolygonAccumulator};
use crate::project::{self, Accumulators};
use geoseg_core::manifest::{RasterTilingResult, RasterTilingResults, MANIFEST_FILE_NAME};
use geoseg_core::tile::TileKind;
use geoseg_core::{DatasetCategories, Tile};
use geoseg_geometry::geo::GeoCollection;
use geoseg_tiling::io;
use std::path::Path;

/// Which projection strategies to run for each raster. Both may be
/// requested at once; pixel-projection and polygon-projection are
/// independent and do not share accumulators.
#[derive(Clone, Copy, Debug, Default)]
pub struct AggregationOptions {
	pub pixel_projection: bool,
	pub polygon_projection: bool,
	/// Draw tile-grid boundaries into the pixel-projection output's grid
	/// overlay plane.
	pub draw_grid: bool,
}

fn io_error(context: &'static str, err: &impl std::fmt::Display) -> AggregationError {
	AggregationError::Io {
		context,
		message: err.to_string(),
	}
}

/// Runs aggregation over every raster named in `fuse_dir`'s manifest,
/// writing raster-sized outputs to `out_dir`: `<raster_fn>.grayscale.png`,
/// `<raster_fn>.color.png`, `<raster_fn>.grid.png` for pixel-projection, and
/// `<raster_fn>.geojson` for polygon-projection.
///
/// # Errors
///
/// Returns [`AggregationError`] on manifest I/O or parse failure, or any
/// per-raster projection failure.
pub async fn aggregate_tiles(fuse_dir: &Path, out_dir: &Path, ext: &str, categories: &DatasetCategories, options: &AggregationOptions) -> Result<(), AggregationError> {
	let manifest_path = fuse_dir.join(MANIFEST_FILE_NAME);
	let manifest_json = tokio::fs::read_to_string(&manifest_path).await.map_err(|err| io_error("read fused manifest", &err))?;
	let results = RasterTilingResults::from_json(&manifest_json).map_err(|err| AggregationError::Io {
		context: "parse fused manifest",
		message: err.to_string(),
	})?;

	tokio::fs::create_dir_all(out_dir).await.map_err(|err| io_error("create aggregation output directory", &err))?;

	let outcomes = futures::future::join_all(
		results
			.raster_tiling_result_list
			.iter()
			.map(|raster| aggregate_raster(fuse_dir, out_dir, ext, categories, options, raster)),
	)
	.await;
	for outcome in outcomes {
		outcome?;
	}
	Ok(())
}

async fn aggregate_raster(fuse_dir: &Path, out_dir: &Path, ext: &str, categories: &DatasetCategories, options: &AggregationOptions, raster: &RasterTilingResult) -> Result<(), AggregationError> {
	log::info!("aggregating raster '{}'", raster.raster_fn);
	let tiles = discover_tiles(fuse_dir, &raster.raster_fn, ext).await?;

	let mut pixel_accumulators = options.pixel_projection.then(|| Accumulators::new(raster.raster_width, raster.raster_height));
	let mut polygon_accumulator = options.polygon_projection.then(PolygonAccumulator::new);

	for tile in &tiles {
		let window = io::read_label_tile(&fuse_dir.join(tile.relative_path(ext))).await?;
		let tile = tile.clone().with_disk_size(window.width, window.height);

		if let Some(accumulators) = pixel_accumulators.as_mut() {
			let affine = project::tile_to_raster_affine(&tile, &raster.raster_transform, &raster.raster_fn)?;
			project::project_tile(accumulators, &window, &affine, categories);
			if options.draw_grid {
				project::draw_tile_boundary(accumulators, &affine, window.width, window.height, (255, 255, 0, 255));
			}
		}

		if let Some(accumulator) = polygon_accumulator.as_mut() {
			let (affine, crs) = polygon::tile_to_world_affine(&tile, &raster.raster_transform, &raster.raster_crs)?;
			accumulator.add_tile(&window, &affine, &crs, categories);
		}
	}

	if let Some(accumulators) = pixel_accumulators {
		write_pixel_outputs(out_dir, &raster.raster_fn, &accumulators).await?;
	}
	if let Some(accumulator) = polygon_accumulator {
		write_polygon_output(out_dir, &raster.raster_fn, accumulator).await?;
	}
	Ok(())
}

async fn write_pixel_outputs(out_dir: &Path, raster_fn: &str, accumulators: &Accumulators) -> Result<(), AggregationError> {
	io::write_image_tile(&out_dir.join(format!("{raster_fn}.grayscale.png")), &accumulators.grayscale).await?;
	io::write_image_tile(&out_dir.join(format!("{raster_fn}.color.png")), &accumulators.color).await?;
	io::write_image_tile(&out_dir.join(format!("{raster_fn}.grid.png")), &accumulators.grid_overlay).await?;
	Ok(())
}

async fn write_polygon_output(out_dir: &Path, raster_fn: &str, accumulator: PolygonAccumulator) -> Result<(), AggregationError> {
	let features = accumulator.into_segmentations().iter().map(|segmentation| segmentation.to_feature()).collect();
	let collection = GeoCollection::from(features);
	let json = collection.to_json(None).stringify();
	let path = out_dir.join(format!("{raster_fn}.geojson"));
	tokio::fs::write(&path, json).await.map_err(|err| io_error("write geojson output", &err))?;
	Ok(())
}

/// Walks `fuse_dir` for tile files with extension `ext` belonging to
/// `raster_fn`, reconstructing each [`Tile`] identity from its canonical
/// relative path.
async fn discover_tiles(fuse_dir: &Path, raster_fn: &str, ext: &str) -> Result<Vec<Tile>, AggregationError> {
	let root = fuse_dir.to_path_buf();
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
