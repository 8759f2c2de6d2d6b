//! `geoseg compare`: produces per-category TP/FP/FN/TN confusion masks (or a
//! same/different mask for image tiles) between a reference tile directory
//! and a fused tile directory.

use crate::config::RunConfig;
use anyhow::{Context, Result};
use geoseg_aggregate::{compare_tiles, CompareFormat};
use std::path::PathBuf;

/// Compares a fused tile directory against a reference directory.
#[derive(clap::Args, Debug)]
pub struct Subcommand {
	/// Directory of reference (ground-truth) tiles plus their tiling manifest.
	#[arg(long)]
	pub reference_dir: PathBuf,
	/// Directory of fused (predicted) tiles to compare against the reference.
	#[arg(long)]
	pub fused_dir: PathBuf,
	/// Directory the per-category confusion masks are written to.
	#[arg(long)]
	pub out_dir: PathBuf,
	/// YAML run configuration (categories, tile extension).
	#[arg(long)]
	pub config: PathBuf,
	/// Tiles are RGB(A) images compared same/different rather than label tiles.
	#[arg(long)]
	pub image: bool,
}

pub async fn run(arguments: &Subcommand) -> Result<()> {
	let config = RunConfig::from_path(&arguments.config).await?;
	let format = if arguments.image {
		CompareFormat::Image
	} else {
		CompareFormat::Label {
			categories: &config.categories.categories,
		}
	};

	compare_tiles(&arguments.reference_dir, &arguments.fused_dir, &arguments.out_dir, &config.ext, &format)
		.await
		.context("comparing fused tiles against reference")?;
	log::info!("comparison masks written to '{}'", arguments.out_dir.display());
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
		let wrapper = Wrapper::parse_from(["geoseg", "--reference-dir", "ref", "--fused-dir", "fused", "--out-dir", "out", "--config", "run.yaml"]);
		assert!(!wrapper.args.image);
	}
}
