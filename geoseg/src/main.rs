use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{ErrorLevel, Verbosity};
use geoseg::tools;

/// Tiles georeferenced rasters, fuses overlapping-tile predictions, and
/// aggregates per-tile masks back into raster-sized outputs.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
	#[command(subcommand)]
	command: Commands,
	#[command(flatten)]
	verbose: Verbosity<ErrorLevel>,
}

#[derive(Subcommand)]
enum Commands {
	/// Cuts source rasters into tiles under a shared tiling scheme.
	Tile(tools::tile::Subcommand),
	/// Fuses a predicted tile directory into a non-overlapping base grid.
	Fuse(tools::fuse::Subcommand),
	/// Projects a fused tile directory back onto raster-sized outputs.
	Aggregate(tools::aggregate::Subcommand),
	/// Compares a fused tile directory against a reference directory.
	Compare(tools::compare::Subcommand),
}

#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();

	env_logger::Builder::new().filter_level(cli.verbose.log_level_filter()).init();

	match &cli.command {
		Commands::Tile(arguments) => tools::tile::run(arguments).await,
		Commands::Fuse(arguments) => tools::fuse::run(arguments).await,
		Commands::Aggregate(arguments) => tools::aggregate::run(arguments).await,
		Commands::Compare(arguments) => tools::compare::run(arguments).await,
	}
}

#[cfg(test)]
mod tests {
	use super::Cli;
	use clap::Parser;

	/// Parses `arguments` as `geoseg`'s own argv (index 0 is the binary name,
	/// matching what `clap` expects from `Parser::try_parse_from`) and
	/// renders whatever `clap` would have printed: help/version text on
	/// success, the error message on failure.
	fn run_command(arguments: Vec<&str>) -> Result<String, String> {
		let mut argv = vec!["geoseg"];
		argv.extend(arguments);
		match Cli::try_parse_from(argv) {
			Ok(_) => Ok(String::new()),
			Err(error) => {
				let rendered = error.render().to_string();
				if error.exit_code() == 0 {
					Ok(rendered)
				} else {
					Err(rendered)
				}
			}
		}
	}

	#[test]
	fn help_lists_every_subcommand() {
		let output = run_command(vec!["--help"]).unwrap();
		assert!(output.contains("tile"));
		assert!(output.contains("fuse"));
		assert!(output.contains("aggregate"));
		assert!(output.contains("compare"));
	}

	#[test]
	fn version_flag_prints_the_crate_version() {
		let output = run_command(vec!["-V"]).unwrap();
		assert!(output.starts_with("geoseg "));
	}

	#[test]
	fn tile_subcommand_requires_config_and_out_dir() {
		let error = run_command(vec!["tile", "a.tif"]).unwrap_err();
		assert!(error.contains("required"));
	}
}
