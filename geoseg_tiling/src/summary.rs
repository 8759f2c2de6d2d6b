//! Ties the layout engine and tile I/O together: for a single raster, compute
//! its tile list, write every tile (and, for label rasters, the cover CSV),
//! and return the [`RasterTilingResult`] that feeds the dataset-wide manifest.

use crate::error::TilingError;
use crate::layout;
use crate::io;
use geoseg_core::manifest::{RasterTilingResult, TilingInfo};
use geoseg_core::{DatasetCategories, TileAlignment, TilingScheme};
use geoseg_raster::{RasterSource, ResampleAlg};
use std::path::Path;

/// What to write for each tile: an RGB(A) image tile, or a single-band
/// indexed label tile against a fixed category table.
pub enum TileKind<'a> {
	Image,
	Label { categories: &'a DatasetCategories },
}

/// Computes the tile list for `source` under `scheme`, writes every tile
/// under `out_dir`, writes the cover CSV alongside it, and returns the
/// manifest entry for this raster.
///
/// `scheme` is resolved from `LocalMeter` to `LocalPixel` internally using
/// the raster's own GSD, so callers may pass either.
///
/// # Errors
///
/// Returns [`TilingError`] if layout computation, a raster read, or a tile
/// write fails. The first failing tile write aborts the whole raster; no
/// partial manifest entry is returned.
pub async fn tile_raster(
	source: &dyn RasterSource,
	raster_fn: &str,
	raster_fp: &str,
	scheme: &TilingScheme,
	out_dir: &Path,
	ext: &str,
	resample: ResampleAlg,
	kind: TileKind<'_>,
) -> Result<RasterTilingResult, TilingError> {
	let resolved = scheme
		.resolve_to_local_pixel(source.gsd())
		.unwrap_or_else(|_| scheme.clone());

	let (tiles, tiling_info) = match &resolved {
		TilingScheme::Mercator { zoom, use_border_tiles } => {
			let tiles = layout::compute_mercator_tiles(source.bbox(), *zoom, *use_border_tiles);
			let info = TilingInfo {
				source_offset: (0, 0),
				source_stride: (f64::from(layout::MERCATOR_TILE_SIZE_PX), f64::from(layout::MERCATOR_TILE_SIZE_PX)),
				source_size: (layout::MERCATOR_TILE_SIZE_PX, layout::MERCATOR_TILE_SIZE_PX),
			};
			(tiles, info)
		}
		TilingScheme::LocalPixel {
			tile_size_px,
			tile_stride_px,
			flags,
		} => {
			let (tiles, x_layout, y_layout) =
				layout::compute_local_pixel_tiles(raster_fn, source.width(), source.height(), *tile_size_px, *tile_stride_px, *flags)?;
			let info = TilingInfo {
				source_offset: (x_layout.origin, y_layout.origin),
				source_stride: (x_layout.stride, y_layout.stride),
				source_size: *tile_size_px,
			};
			log::debug!(
				"alignment {} produced {} tiles for '{raster_fn}'",
				flags.alignment_name(),
				tiles.len()
			);
			(tiles, info)
		}
		TilingScheme::LocalMeter { .. } => unreachable!("resolve_to_local_pixel never returns LocalMeter"),
	};

	for tile in &tiles {
		let window = io::read_tile_window(source, tile, resample).await?;
		let path = out_dir.join(tile.relative_path(ext));
		match &kind {
			TileKind::Image => io::write_image_tile(&path, &window).await?,
			TileKind::Label { categories } => io::write_label_tile(&path, &window, categories).await?,
		}
	}

	io::write_cover_csv(&out_dir.join(format!("{raster_fn}_cover.csv")), &tiles, ext, raster_fn).await?;

	let disk_tile_size = tiles.first().map(geoseg_core::Tile::disk_size).unwrap_or((0, 0));

	Ok(RasterTilingResult::new(
		raster_fn,
		raster_fp,
		source.crs().to_string(),
		source.transform(),
		source.width(),
		source.height(),
		disk_tile_size,
		tiling_info,
		tiles,
	)
	.with_computed_statistic())
}

trait AlignmentName {
	fn alignment_name(&self) -> &'static str;
}

impl AlignmentName for geoseg_core::scheme::LocalSchemeFlags {
	fn alignment_name(&self) -> &'static str {
		match self.alignment {
			TileAlignment::CenteredToImage => "centered_to_image",
			TileAlignment::AlignedToImageBorder => "aligned_to_image_border",
			TileAlignment::Optimized => "optimized",
		}
	}
}
