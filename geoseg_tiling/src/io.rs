//! Tile data I/O: reading the pixels a [`Tile`] identity names off a
//! [`RasterSource`] and writing them to disk as image or label tiles, plus
//! the cover CSV sidecar.
//!
//! Image tiles (RGB/RGBA) are written through the `image` crate, the same
//! one the teacher's own tile pack/unpack helpers use. Label tiles need a
//! true single-band indexed PNG, which `image`'s `DynamicImage` has no
//! color-type variant for, so those go through the `png` crate directly
//! (already a transitive dependency of `image`'s own PNG codec, not a new
//! ecosystem the ambient stack didn't already reach for).

use crate::error::TilingError;
use geoseg_core::tile::{Tile, TileKind};
use geoseg_core::{DatasetCategories, GeoBBox};
use geoseg_raster::{PixelWindow, RasterError, RasterSource, RasterWindow, ResampleAlg};
use std::path::Path;

/// Reads the pixels for `tile` off `source`, dispatching on the tile's kind:
/// `ImagePixel` tiles read the raster's own pixel grid directly, `Mercator`
/// tiles go through a reprojection into EPSG:3857.
///
/// A window entirely outside the raster is recovered locally as a zero-filled
/// buffer rather than surfaced to the caller, per §9's exception-flow note.
pub async fn read_tile_window(source: &dyn RasterSource, tile: &Tile, resample: ResampleAlg) -> Result<RasterWindow, TilingError> {
	let (out_w, out_h) = tile.disk_size();
	match &tile.kind {
		TileKind::ImagePixel { src_x, src_y, src_w, src_h, .. } => {
			let window = PixelWindow::new(*src_x, *src_y, *src_w, *src_h);
			match source.read_window(window, (out_w, out_h), resample).await {
				Ok(data) => Ok(data),
				Err(RasterError::OutOfBounds) => Ok(RasterWindow::zero_filled(out_w, out_h, source.band_count())),
				Err(err) => Err(err.into()),
			}
		}
		TileKind::Mercator { x, y, z } => {
			let bbox = geoseg_core::geo::mercator::tile_bounds(*x, *y, *z);
			match source.read_reprojected(&bbox, (out_w, out_h), 3857, resample).await {
				Ok(data) => Ok(data),
				Err(RasterError::OutOfBounds) => Ok(RasterWindow::zero_filled(out_w, out_h, source.band_count())),
				Err(err) => Err(err.into()),
			}
		}
	}
}

/// Builds an RGB or RGBA `image::DynamicImage` from a decoded raster window.
/// 1-band windows are expanded to greyscale RGB; 2-band to greyscale+alpha
/// expanded to RGBA; 3/4-band pass through as RGB/RGBA.
///
/// # Errors
///
/// Returns [`TilingError::Image`] if `window.band_count` is not in `1..=4`.
pub fn window_to_image(window: &RasterWindow) -> Result<image::DynamicImage, TilingError> {
	let (w, h) = (window.width, window.height);
	match window.band_count {
		1 => {
			let buf = image::GrayImage::from_raw(w, h, window.band(0).to_vec()).ok_or_else(|| image_buf_error("grey"))?;
			Ok(image::DynamicImage::ImageLuma8(buf))
		}
		2 => {
			let mut data = vec![0u8; w as usize * h as usize * 2];
			for i in 0..(w as usize * h as usize) {
				data[i * 2] = window.band(0)[i];
				data[i * 2 + 1] = window.band(1)[i];
			}
			let buf = image::GrayAlphaImage::from_raw(w, h, data).ok_or_else(|| image_buf_error("grey+alpha"))?;
			Ok(image::DynamicImage::ImageLumaA8(buf))
		}
		3 => {
			let mut data = vec![0u8; w as usize * h as usize * 3];
			for band in 0..3 {
				let plane = window.band(band);
				for i in 0..plane.len() {
					data[i * 3 + band] = plane[i];
				}
			}
			let buf = image::RgbImage::from_raw(w, h, data).ok_or_else(|| image_buf_error("rgb"))?;
			Ok(image::DynamicImage::ImageRgb8(buf))
		}
		4 => {
			let mut data = vec![0u8; w as usize * h as usize * 4];
			for band in 0..4 {
				let plane = window.band(band);
				for i in 0..plane.len() {
					data[i * 4 + band] = plane[i];
				}
			}
			let buf = image::RgbaImage::from_raw(w, h, data).ok_or_else(|| image_buf_error("rgba"))?;
			Ok(image::DynamicImage::ImageRgba8(buf))
		}
		n => Err(TilingError::Image {
			context: "window_to_image",
			message: format!("unsupported band count {n}"),
		}),
	}
}

fn image_buf_error(kind: &'static str) -> TilingError {
	TilingError::Image {
		context: "window_to_image",
		message: format!("raster window size does not match its {kind} buffer"),
	}
}

/// Writes an image tile as a PNG at `path`, creating parent directories first.
///
/// # Errors
///
/// Returns [`TilingError::Io`] if directory creation or the write fails, or
/// [`TilingError::Image`] if encoding fails.
pub async fn write_image_tile(path: &Path, window: &RasterWindow) -> Result<(), TilingError> {
	let image = window_to_image(window)?;
	ensure_parent_dir(path).await?;
	let bytes = path.to_path_buf();
	let owned = image.clone();
	tokio::task::spawn_blocking(move || owned.save_with_format(&bytes, image::ImageFormat::Png))
		.await
		.map_err(|err| io_error("write_image_tile join", &err))?
		.map_err(|err| TilingError::Image {
			context: "write_image_tile",
			message: err.to_string(),
		})
}

/// Writes a single-band label tile as an indexed (palette) PNG at `path`.
///
/// The raster window's first band is taken as the palette index per pixel.
/// `categories` supplies the palette: index `i` gets `categories.by_palette_index(i)`'s
/// color, or black for any gap (there should be none after `DatasetCategories`
/// validation, save for the reserved ignore index).
///
/// # Errors
///
/// Returns [`TilingError::Image`] if `window` is not single-band, or
/// [`TilingError::Io`] if the file cannot be written.
pub async fn write_label_tile(path: &Path, window: &RasterWindow, categories: &DatasetCategories) -> Result<(), TilingError> {
	if window.band_count != 1 {
		return Err(TilingError::Image {
			context: "write_label_tile",
			message: format!("label tiles must be single-band, found {} bands", window.band_count),
		});
	}

	let max_index = categories.max_palette_index();
	let mut palette = vec![0u8; (usize::from(max_index) + 1) * 3];
	for category in categories.iter() {
		if category.is_ignore {
			continue;
		}
		let idx = usize::from(category.palette_index);
		let (r, g, b) = category.palette_color;
		palette[idx * 3] = r;
		palette[idx * 3 + 1] = g;
		palette[idx * 3 + 2] = b;
	}

	ensure_parent_dir(path).await?;
	let path = path.to_path_buf();
	let (w, h) = (window.width, window.height);
	let indices = window.band(0).to_vec();

	tokio::task::spawn_blocking(move || encode_indexed_png(&path, w, h, &indices, &palette))
		.await
		.map_err(|err| io_error("write_label_tile join", &err))?
}

fn encode_indexed_png(path: &Path, w: u32, h: u32, indices: &[u8], palette: &[u8]) -> Result<(), TilingError> {
	let file = std::fs::File::create(path).map_err(|err| io_error("create label tile file", &err))?;
	let writer = std::io::BufWriter::new(file);
	let mut encoder = png::Encoder::new(writer, w, h);
	encoder.set_color(png::ColorType::Indexed);
	encoder.set_depth(png::BitDepth::Eight);
	encoder.set_palette(palette.to_vec());
	let mut writer = encoder.write_header().map_err(|err| TilingError::Image {
		context: "write_label_tile",
		message: err.to_string(),
	})?;
	writer.write_image_data(indices).map_err(|err| TilingError::Image {
		context: "write_label_tile",
		message: err.to_string(),
	})
}

async fn ensure_parent_dir(path: &Path) -> Result<(), TilingError> {
	if let Some(parent) = path.parent() {
		tokio::fs::create_dir_all(parent).await.map_err(|err| io_error("create tile directory", &err))?;
	}
	Ok(())
}

fn io_error(context: &'static str, err: &impl std::fmt::Display) -> TilingError {
	TilingError::Io {
		context,
		message: err.to_string(),
	}
}

/// Reads back an RGB(A) image tile previously written by [`write_image_tile`].
///
/// Planes are returned in the same band order `window_to_image` consumed them
/// in (grey, grey+alpha, RGB, or RGBA), so a round trip through
/// `window_to_image`/`read_image_tile` preserves band count.
///
/// # Errors
///
/// Returns [`TilingError::Io`] if the file cannot be read, or
/// [`TilingError::Image`] if it cannot be decoded.
pub async fn read_image_tile(path: &Path) -> Result<RasterWindow, TilingError> {
	let owned = path.to_path_buf();
	tokio::task::spawn_blocking(move || {
		let image = image::open(&owned).map_err(|err| TilingError::Image {
			context: "read_image_tile",
			message: err.to_string(),
		})?;
		Ok(image_to_window(&image))
	})
	.await
	.map_err(|err| io_error("read_image_tile join", &err))?
}

fn image_to_window(image: &image::DynamicImage) -> RasterWindow {
	use image::DynamicImage;
	let (w, h) = (image.width(), image.height());
	match image {
		DynamicImage::ImageLuma8(buf) => RasterWindow {
			width: w,
			height: h,
			band_count: 1,
			data: buf.as_raw().clone(),
		},
		DynamicImage::ImageLumaA8(buf) => {
			let mut window = RasterWindow::zero_filled(w, h, 2);
			for (i, px) in buf.pixels().enumerate() {
				window.band_mut(0)[i] = px.0[0];
				window.band_mut(1)[i] = px.0[1];
			}
			window
		}
		DynamicImage::ImageRgba8(buf) => {
			let mut window = RasterWindow::zero_filled(w, h, 4);
			for (i, px) in buf.pixels().enumerate() {
				for band in 0..4 {
					window.band_mut(band)[i] = px.0[band];
				}
			}
			window
		}
		other => {
			let buf = other.to_rgb8();
			let mut window = RasterWindow::zero_filled(w, h, 3);
			for (i, px) in buf.pixels().enumerate() {
				for band in 0..3 {
					window.band_mut(band)[i] = px.0[band];
				}
			}
			window
		}
	}
}

/// Reads back a single-band indexed label tile previously written by
/// [`write_label_tile`], returning the palette index plane as a 1-band
/// [`RasterWindow`]. The PNG's embedded palette is not interpreted here;
/// callers that need category identities compare indices against their own
/// `DatasetCategories` table.
///
/// # Errors
///
/// Returns [`TilingError::Io`] if the file cannot be read or is not an
/// 8-bit indexed PNG.
pub async fn read_label_tile(path: &Path) -> Result<RasterWindow, TilingError> {
	let owned = path.to_path_buf();
	tokio::task::spawn_blocking(move || {
		let file = std::fs::File::open(&owned).map_err(|err| io_error("open label tile", &err))?;
		let decoder = png::Decoder::new(std::io::BufReader::new(file));
		let mut reader = decoder.read_info().map_err(|err| io_error("read label tile header", &err))?;
		let mut buf = vec![0u8; reader.output_buffer_size()];
		let info = reader.next_frame(&mut buf).map_err(|err| io_error("decode label tile", &err))?;
		if info.color_type != png::ColorType::Indexed || info.bit_depth != png::BitDepth::Eight {
			return Err(TilingError::Image {
				context: "read_label_tile",
				message: "label tile is not an 8-bit indexed PNG".to_string(),
			});
		}
		buf.truncate(info.buffer_size());
		Ok(RasterWindow {
			width: info.width,
			height: info.height,
			band_count: 1,
			data: buf,
		})
	})
	.await
	.map_err(|err| io_error("read_label_tile join", &err))?
}

/// One row of the cover CSV: the tile's relative path plus the source
/// rectangle (or Mercator coordinate) it was cut from, per §6's cover format.
#[must_use]
pub fn cover_csv_row(tile: &Tile, ext: &str) -> String {
	match &tile.kind {
		TileKind::ImagePixel { src_x, src_y, src_w, src_h, .. } => {
			format!("{},{src_x},{src_y},{src_w},{src_h}", tile.relative_path(ext))
		}
		TileKind::Mercator { x, y, z } => {
			format!("{},{x},{y},{z}", tile.relative_path(ext))
		}
	}
}

/// Renders the full cover CSV (header plus one row per tile) for a raster.
#[must_use]
pub fn cover_csv(tiles: &[Tile], ext: &str, raster_fn: &str) -> String {
	let is_mercator = matches!(tiles.first().map(|t| &t.kind), Some(TileKind::Mercator { .. }));
	let mut out = if is_mercator {
		"path,x,y,z\n".to_string()
	} else {
		"path,src_x,src_y,src_w,src_h\n".to_string()
	};
	for tile in tiles {
		out.push_str(&cover_csv_row(tile, ext));
		out.push('\n');
	}
	log::debug!("cover CSV for '{raster_fn}': {} rows", tiles.len());
	out
}

/// Writes the cover CSV to `path`.
///
/// # Errors
///
/// Returns [`TilingError::Io`] if the write fails.
pub async fn write_cover_csv(path: &Path, tiles: &[Tile], ext: &str, raster_fn: &str) -> Result<(), TilingError> {
	ensure_parent_dir(path).await?;
	let contents = cover_csv(tiles, ext, raster_fn);
	tokio::fs::write(path, contents).await.map_err(|err| io_error("write_cover_csv", &err))
}

/// Mercator tiles are always defined over EPSG:3857; this is a thin
/// convenience so callers don't have to import `GeoBBox` just to name the
/// zero constant used when a raster provides no bbox at all (fully local
/// rasters with no geo-reference, used only in tests).
#[must_use]
pub fn whole_world_bbox() -> GeoBBox {
	GeoBBox::new_clamped(-180.0, -85.051_128_779_806_59, 180.0, 85.051_128_779_806_59)
}

#[cfg(test)]
mod tests {
	use super::*;
	use geoseg_core::DatasetCategory;

	fn sample_categories() -> DatasetCategories {
		DatasetCategories::new(vec![
			DatasetCategory::new("background", 0, (0, 0, 0)),
			DatasetCategory::new("building", 1, (255, 0, 0)),
		])
		.unwrap()
	}

	#[test]
	fn window_to_image_rejects_unsupported_band_count() {
		let window = RasterWindow::zero_filled(4, 4, 5);
		assert!(window_to_image(&window).is_err());
	}

	#[test]
	fn window_to_image_builds_rgb_from_three_bands() {
		let mut window = RasterWindow::zero_filled(2, 2, 3);
		window.band_mut(0).fill(10);
		window.band_mut(1).fill(20);
		window.band_mut(2).fill(30);
		let image = window_to_image(&window).unwrap();
		assert_eq!(image.width(), 2);
		assert_eq!(image.height(), 2);
	}

	#[tokio::test]
	async fn write_label_tile_rejects_multi_band() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("label.png");
		let window = RasterWindow::zero_filled(2, 2, 2);
		let err = write_label_tile(&path, &window, &sample_categories()).await.unwrap_err();
		assert!(matches!(err, TilingError::Image { .. }));
	}

	#[tokio::test]
	async fn write_label_tile_writes_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("nested").join("label.png");
		let window = RasterWindow::zero_filled(2, 2, 1);
		write_label_tile(&path, &window, &sample_categories()).await.unwrap();
		assert!(path.exists());
	}

	#[test]
	fn cover_csv_has_image_pixel_header() {
		let tiles = vec![Tile::image_pixel("r.tif", 0, 0, 100, 100)];
		let csv = cover_csv(&tiles, ".png", "r.tif");
		assert!(csv.starts_with("path,src_x,src_y,src_w,src_h\n"));
		assert!(csv.contains("0,0,100,100"));
	}

	#[test]
	fn cover_csv_has_mercator_header() {
		let tiles = vec![Tile::mercator(1, 2, 3, 256, 256)];
		let csv = cover_csv(&tiles, ".png", "r.tif");
		assert!(csv.starts_with("path,x,y,z\n"));
	}
}
