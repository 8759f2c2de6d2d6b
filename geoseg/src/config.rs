//! Run configuration: a YAML document describing the tiling scheme, the
//! dataset's category table, and the tile file extension a whole pipeline
//! run shares across its tiling, fusion, aggregation, and comparison stages.
//!
//! Library crates take these values as plain arguments; only this binary
//! knows how to load them from a file, mirroring how the rest of the
//! workspace keeps config-format concerns at the outermost layer.

use anyhow::{Context, Result};
use geoseg_core::{DatasetCategories, DatasetCategory, TilingScheme};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level run configuration, loaded once per invocation and shared by
/// every subcommand that needs it.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
	pub tiling: TilingConfig,
	pub categories: CategoriesConfig,
	/// File extension tiles and aggregation outputs are written with,
	/// including the leading dot (e.g. `.png`).
	#[serde(default = "default_ext")]
	pub ext: String,
}

fn default_ext() -> String {
	".png".to_string()
}

/// The tiling scheme plus the raster-extension it's meant to be applied to.
/// `scheme` is `geoseg_core`'s own `TilingScheme`, reused verbatim rather
/// than mirrored here, so a YAML scheme document and an in-memory one never
/// drift apart.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TilingConfig {
	#[serde(flatten)]
	pub scheme: TilingScheme,
}

/// The dataset's category table. Deserialized as a plain list and re-checked
/// through [`DatasetCategories::new`] so a malformed YAML table (duplicate
/// palette index, two ignore categories, ...) is rejected at load time
/// rather than silently accepted by a derive that skips the invariant.
#[derive(Clone, Debug, Serialize)]
#[serde(transparent)]
pub struct CategoriesConfig {
	pub categories: DatasetCategories,
}

impl<'de> Deserialize<'de> for CategoriesConfig {
	fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<CategoriesConfig, D::Error> {
		let list = Vec::<DatasetCategory>::deserialize(deserializer)?;
		let categories = DatasetCategories::new(list).map_err(serde::de::Error::custom)?;
		Ok(CategoriesConfig { categories })
	}
}

impl RunConfig {
	/// Loads and parses a run configuration from a YAML file at `path`.
	///
	/// # Errors
	///
	/// Returns an error if `path` cannot be read or does not parse as a
	/// well-formed [`RunConfig`] document.
	pub async fn from_path(path: &Path) -> Result<RunConfig> {
		let text = tokio::fs::read_to_string(path)
			.await
			.with_context(|| format!("reading config file '{}'", path.display()))?;
		RunConfig::from_str(&text).with_context(|| format!("parsing config file '{}'", path.display()))
	}

	fn from_str(text: &str) -> Result<RunConfig> {
		serde_yaml_ng::from_str(text).context("config does not match the expected schema")
	}
}
