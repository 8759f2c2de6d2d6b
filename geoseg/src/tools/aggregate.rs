//! `geoseg aggregate`: projects a fused tile directory's per-tile predictions
//! back onto raster-sized outputs, via pixel-projection, polygon-projection,
//! or both.

use crate::config::RunConfig;
use anyhow::{Context, Result};
use geoseg_aggregate::{aggregate_tiles, AggregationOptions};
use std::path::PathBuf;

/// Aggregates fused tiles back onto raster-sized pixel and/or polygon outputs.
#[derive(clap::Args, Debug)]
pub struct Subcommand {
	/// Directory of fused tiles plus their tiling manifest.
	#[arg(long)]
	pub fuse_dir: PathBuf,
	/// Directory the aggregated raster-sized outputs are written to.
	#[arg(long)]
	pub out_dir: PathBuf,
	/// YAML run configuration (categories, tile extension).
	#[arg(long)]
	pub config: PathBuf,
	/// Skip pixel-projection (grayscale/color/grid outputs).
	#[arg(long)]
	pub no_pixel: bool,
	/// Also run polygon-projection, writing a GeoJSON per raster.
	#[arg(long)]
	pub polygons: bool,
	/// Draw tile-grid boundaries into the pixel-projection grid overlay.
	#[arg(long)]
	pub draw_grid: bool,
}

pub async fn run(arguments: &Subcommand) -> Result<()> {
	let config = RunConfig::from_path(&arguments.config).await?;
	let options = AggregationOptions {
		pixel_projection: !arguments.no_pixel,
		polygon_projection: arguments.polygons,
		draw_grid: arguments.draw_grid,
	};

	aggregate_tiles(&arguments.fuse_dir, &arguments.out_dir, &config.ext, &config.categories.categories, &options)
		.await
		.context("aggregating fused tiles")?;
	log::info!("aggregated outputs written to '{}'", arguments.out_dir.display());
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
		let wrapper = Wrapper::parse_from(["geoseg", "--fuse-dir", "fuse", "--out-dir", "out", "--config", "run.yaml"]);
		assert!(!wrapper.args.no_pixel);
		assert!(!wrapper.args.polygons);
	}
}
