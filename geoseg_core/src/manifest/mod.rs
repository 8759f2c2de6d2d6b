//! The `RasterTilingResults` manifest: everything downstream stages need to
//! recover tiling parameters, the raster transform, and statistics without
//! re-opening source rasters. Persisted as JSON (complete) and TXT
//! (human-readable) next to the tile tree.

use crate::geo::Affine;
use crate::scheme::TilingScheme;
use crate::tile::Tile;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Canonical filename for the JSON manifest persisted alongside every tile
/// tree. Every stage that reads or writes a tile directory (tiling, fusion,
/// aggregation) agrees on this name rather than taking it as a parameter.
pub const MANIFEST_FILE_NAME: &str = "tiling_result.json";

/// Canonical filename for the human-readable `.txt` summary persisted
/// alongside [`MANIFEST_FILE_NAME`].
pub const MANIFEST_TXT_FILE_NAME: &str = "tiling_result.txt";

/// Per-raster, per-axis tiling grid parameters, as computed by the layout engine.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TilingInfo {
	#[serde(rename = "tiling_source_offset_int")]
	pub source_offset: (i64, i64),
	#[serde(rename = "tiling_source_stride_float")]
	pub source_stride: (f64, f64),
	#[serde(rename = "tiling_source_size_int")]
	pub source_size: (u32, u32),
}

/// Human-facing per-raster statistics, also rolled up into the dataset-wide summary.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TilingStatistic {
	pub real_world_extent: (f64, f64),
	pub source_width: u32,
	pub source_height: u32,
	pub disk_to_source_ratio: (f64, f64),
}

mod affine_as_array {
	use super::Affine;
	use serde::{Deserialize, Deserializer, Serialize, Serializer};

	pub fn serialize<S: Serializer>(affine: &Affine, serializer: S) -> Result<S::Ok, S::Error> {
		affine.as_gdal_array().serialize(serializer)
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Affine, D::Error> {
		let array = <[f64; 6]>::deserialize(deserializer)?;
		Ok(Affine::from_gdal_array(array))
	}
}

/// Tiling results for a single raster.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RasterTilingResult {
	pub raster_fn: String,
	pub raster_fp: String,
	pub raster_crs: String,
	#[serde(with = "affine_as_array")]
	pub raster_transform: Affine,
	pub raster_width: u32,
	pub raster_height: u32,
	#[serde(rename = "disk_tile_size_int")]
	pub disk_tile_size: (u32, u32),
	pub tiling_info: TilingInfo,
	#[serde(default)]
	pub tiling_statistic: Option<TilingStatistic>,
	/// Not serialized: tiles are enumerated on disk, not in the manifest.
	#[serde(skip)]
	pub tiles: Vec<Tile>,
}

impl RasterTilingResult {
	#[must_use]
	pub fn new(
		raster_fn: impl Into<String>,
		raster_fp: impl Into<String>,
		raster_crs: impl Into<String>,
		raster_transform: Affine,
		raster_width: u32,
		raster_height: u32,
		disk_tile_size: (u32, u32),
		tiling_info: TilingInfo,
		tiles: Vec<Tile>,
	) -> RasterTilingResult {
		RasterTilingResult {
			raster_fn: raster_fn.into(),
			raster_fp: raster_fp.into(),
			raster_crs: raster_crs.into(),
			raster_transform,
			raster_width,
			raster_height,
			disk_tile_size,
			tiling_info,
			tiling_statistic: None,
			tiles,
		}
	}

	/// Computes and attaches a [`TilingStatistic`] derived from this result's own fields.
	#[must_use]
	pub fn with_computed_statistic(mut self) -> RasterTilingResult {
		let (pw, ph) = self.raster_transform.pixel_size();
		let real_world_extent = (self.raster_width as f64 * pw, self.raster_height as f64 * ph);
		let (disk_w, disk_h) = self.disk_tile_size;
		let (src_w, src_h) = self.tiling_info.source_size;
		let disk_to_source_ratio = (
			if src_w == 0 { 1.0 } else { f64::from(disk_w) / f64::from(src_w) },
			if src_h == 0 { 1.0 } else { f64::from(disk_h) / f64::from(src_h) },
		);
		self.tiling_statistic = Some(TilingStatistic {
			real_world_extent,
			source_width: self.raster_width,
			source_height: self.raster_height,
			disk_to_source_ratio,
		});
		self
	}
}

/// Tiling results across an entire dataset (many rasters, one shared scheme).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RasterTilingResults {
	pub tiling_scheme: TilingScheme,
	pub raster_tiling_result_list: Vec<RasterTilingResult>,
	#[serde(default)]
	pub statistic_summary: Option<TilingStatistic>,
}

impl RasterTilingResults {
	#[must_use]
	pub fn new(tiling_scheme: TilingScheme, raster_tiling_result_list: Vec<RasterTilingResult>) -> RasterTilingResults {
		RasterTilingResults {
			tiling_scheme,
			raster_tiling_result_list,
			statistic_summary: None,
		}
	}

	/// Rolls up an aggregated [`TilingStatistic`] across all per-raster statistics
	/// (summed extent and source size, averaged disk-to-source ratio).
	#[must_use]
	pub fn with_computed_summary(mut self) -> RasterTilingResults {
		let stats: Vec<TilingStatistic> = self
			.raster_tiling_result_list
			.iter()
			.filter_map(|r| r.tiling_statistic)
			.collect();
		if stats.is_empty() {
			return self;
		}
		let n = stats.len() as f64;
		let real_world_extent = stats.iter().fold((0.0, 0.0), |acc, s| (acc.0 + s.real_world_extent.0, acc.1 + s.real_world_extent.1));
		let source_width = stats.iter().map(|s| s.source_width).max().unwrap_or(0);
		let source_height = stats.iter().map(|s| s.source_height).max().unwrap_or(0);
		let ratio_sum = stats.iter().fold((0.0, 0.0), |acc, s| (acc.0 + s.disk_to_source_ratio.0, acc.1 + s.disk_to_source_ratio.1));
		self.statistic_summary = Some(TilingStatistic {
			real_world_extent,
			source_width,
			source_height,
			disk_to_source_ratio: (ratio_sum.0 / n, ratio_sum.1 / n),
		});
		self
	}

	/// Serializes the manifest to its canonical JSON form.
	///
	/// # Errors
	///
	/// Returns an error if serialization fails (it cannot, for well-formed values,
	/// but the signature mirrors `serde_json`'s fallible API).
	pub fn to_json(&self) -> Result<String> {
		serde_json::to_string_pretty(self).context("failed to serialize RasterTilingResults to JSON")
	}

	/// Parses a manifest previously produced by [`to_json`](Self::to_json).
	///
	/// # Errors
	///
	/// Returns an error if `json` is not a well-formed manifest.
	pub fn from_json(json: &str) -> Result<RasterTilingResults> {
		let results: RasterTilingResults =
			serde_json::from_str(json).context("failed to parse RasterTilingResults manifest")?;
		log::debug!(
			"loaded tiling manifest: scheme={}, rasters={}",
			results.tiling_scheme.name(),
			results.raster_tiling_result_list.len()
		);
		Ok(results)
	}

	/// Renders the human-readable `.txt` summary written alongside the JSON manifest.
	#[must_use]
	pub fn to_txt(&self) -> String {
		let mut out = String::new();
		let _ = writeln!(out, "tiling scheme: {}", self.tiling_scheme.name());
		let _ = writeln!(out, "rasters: {}", self.raster_tiling_result_list.len());
		for result in &self.raster_tiling_result_list {
			let _ = writeln!(out);
			let _ = writeln!(out, "[{}]", result.raster_fn);
			let _ = writeln!(out, "  source size: {}x{}", result.raster_width, result.raster_height);
			let _ = writeln!(out, "  disk tile size: {}x{}", result.disk_tile_size.0, result.disk_tile_size.1);
			if let Some(stat) = result.tiling_statistic {
				let _ = writeln!(
					out,
					"  real-world extent: {:.3} x {:.3}",
					stat.real_world_extent.0, stat.real_world_extent.1
				);
				let _ = writeln!(
					out,
					"  disk-to-source ratio: {:.4} x {:.4}",
					stat.disk_to_source_ratio.0, stat.disk_to_source_ratio.1
				);
			}
		}
		if let Some(summary) = self.statistic_summary {
			let _ = writeln!(out);
			let _ = writeln!(out, "[summary]");
			let _ = writeln!(
				out,
				"  total real-world extent: {:.3} x {:.3}",
				summary.real_world_extent.0, summary.real_world_extent.1
			);
		}
		out
	}
}
