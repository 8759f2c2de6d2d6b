//! `geoseg fuse`: classifies a predicted tile directory's tiles into base and
//! auxiliary sets and substitutes each auxiliary tile's reliable center
//! pixels into the base tiles it overlaps.

use crate::config::RunConfig;
use anyhow::{Context, Result};
use geoseg_fusion::{fuse_tiles, FusionOptions, TileFormat};
use std::path::PathBuf;

/// Fuses overlapping-tile predictions into a non-overlapping base grid.
#[derive(clap::Args, Debug)]
pub struct Subcommand {
	/// Directory of predicted tiles plus their tiling manifest.
	#[arg(long)]
	pub predict_dir: PathBuf,
	/// Directory the fused base tiles and manifest copy are written to.
	#[arg(long)]
	pub fuse_dir: PathBuf,
	/// YAML run configuration (tile extension; categories when fusing labels).
	#[arg(long)]
	pub config: PathBuf,
	/// Tiles are single-band indexed label tiles rather than RGB(A) images.
	#[arg(long)]
	pub label: bool,
	/// Extract base tiles unchanged instead of substituting auxiliary pixels.
	#[arg(long)]
	pub no_fuse: bool,
	/// Allow schemes that are not overhanging/non-optimized, accepting that
	/// fusion output may vary with the chosen tile stride.
	#[arg(long)]
	pub allow_inconsistent_strides: bool,
}

pub async fn run(arguments: &Subcommand) -> Result<()> {
	let config = RunConfig::from_path(&arguments.config).await?;
	let format = if arguments.label {
		TileFormat::Label {
			categories: &config.categories.categories,
		}
	} else {
		TileFormat::Image
	};
	let options = FusionOptions {
		perform_fusion: !arguments.no_fuse,
		consistent_for_varying_tile_strides: !arguments.allow_inconsistent_strides,
	};

	fuse_tiles(&arguments.predict_dir, &arguments.fuse_dir, &config.ext, &format, &options)
		.await
		.context("fusing predicted tiles")?;
	log::info!("fused tiles written to '{}'", arguments.fuse_dir.display());
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
		let wrapper = Wrapper::parse_from(["geoseg", "--predict-dir", "predict", "--fuse-dir", "fuse", "--config", "run.yaml"]);
		assert!(!wrapper.args.no_fuse);
		assert!(!wrapper.args.allow_inconsistent_strides);
	}
}
