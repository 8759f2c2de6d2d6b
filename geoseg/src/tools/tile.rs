//! `geoseg tile`: cuts one or more source rasters into tiles under a shared
//! tiling scheme, writing the tile tree plus its manifest to an output
//! directory.

use crate::config::RunConfig;
use anyhow::{Context, Result};
use geoseg_core::manifest::{RasterTilingResults, MANIFEST_FILE_NAME, MANIFEST_TXT_FILE_NAME};
use geoseg_raster::{GdalRasterSource, ResampleAlg};
use geoseg_tiling::summary::{self, TileKind};
use std::path::PathBuf;

/// Cuts source rasters into tiles per a run configuration's tiling scheme.
#[derive(clap::Args, Debug)]
pub struct Subcommand {
	/// Source rasters to tile. Each is tiled independently under the same scheme.
	#[arg(required = true)]
	pub rasters: Vec<PathBuf>,
	/// YAML run configuration (tiling scheme, categories, tile extension).
	#[arg(long)]
	pub config: PathBuf,
	/// Directory the tile tree and manifest are written to.
	#[arg(long)]
	pub out_dir: PathBuf,
	/// Write single-band indexed label tiles (classified by the config's
	/// categories) instead of RGB(A) image tiles.
	#[arg(long)]
	pub label: bool,
}

pub async fn run(arguments: &Subcommand) -> Result<()> {
	let config = RunConfig::from_path(&arguments.config).await?;
	tokio::fs::create_dir_all(&arguments.out_dir)
		.await
		.with_context(|| format!("creating output directory '{}'", arguments.out_dir.display()))?;

	let mut results = Vec::with_capacity(arguments.rasters.len());
	for raster_path in &arguments.rasters {
		let raster_fp = raster_path.to_string_lossy().to_string();
		let raster_fn = raster_path
			.file_stem()
			.map(|stem| stem.to_string_lossy().to_string())
			.unwrap_or_else(|| raster_fp.clone());

		log::info!("opening raster '{raster_fn}' ({raster_fp})");
		let source = GdalRasterSource::open(raster_fp.clone()).await.with_context(|| format!("opening raster '{raster_fp}'"))?;

		let kind = if arguments.label {
			TileKind::Label {
				categories: &config.categories.categories,
			}
		} else {
			TileKind::Image
		};

		let result = summary::tile_raster(&source, &raster_fn, &raster_fp, &config.tiling.scheme, &arguments.out_dir, &config.ext, ResampleAlg::NearestNeighbour, kind)
			.await
			.with_context(|| format!("tiling raster '{raster_fn}'"))?;
		log::info!("raster '{raster_fn}': {} tiles written", result.tiles.len());
		results.push(result);
	}

	let manifest = RasterTilingResults::new(config.tiling.scheme.clone(), results).with_computed_summary();
	tokio::fs::write(arguments.out_dir.join(MANIFEST_FILE_NAME), manifest.to_json()?)
		.await
		.context("writing tiling manifest")?;
	tokio::fs::write(arguments.out_dir.join(MANIFEST_TXT_FILE_NAME), manifest.to_txt())
		.await
		.context("writing tiling manifest summary")?;
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use clap::Parser;

	#[derive(Parser)]
	struct Wrapper {
		#[command(flatten)]
		args: Subcommand,
	}

	#[test]
	fn parses_minimal_arguments() {
		let wrapper = Wrapper::parse_from(["geoseg", "a.tif", "b.tif", "--config", "run.yaml", "--out-dir", "out"]);
		assert_eq!(wrapper.args.rasters.len(), 2);
		assert!(!wrapper.args.label);
	}
}
