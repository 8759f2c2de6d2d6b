//! The narrow interface the rest of the engine reads rasters through. No
//! other crate in this workspace imports `gdal` directly; everything goes
//! through `RasterSource` so the tiling, fusion, and aggregation stages stay
//! free of GDAL types.

use crate::error::RasterError;
use crate::resample::ResampleAlg;
use async_trait::async_trait;
use geoseg_core::{Affine, GeoBBox};

/// A pixel-space read window in the source raster's own coordinate system.
/// `x`/`y` may be negative and `x + w`/`y + h` may exceed the raster's size;
/// callers ask for whatever rectangle a tile's layout computed, and the
/// source is responsible for clipping and zero-filling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelWindow {
	pub x: i64,
	pub y: i64,
	pub w: u64,
	pub h: u64,
}

impl PixelWindow {
	#[must_use]
	pub fn new(x: i64, y: i64, w: u64, h: u64) -> PixelWindow {
		PixelWindow { x, y, w, h }
	}
}

/// A decoded raster window: `band_count` planes of `width * height` bytes
/// each, row-major, one plane per band in band-mapping order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RasterWindow {
	pub width: u32,
	pub height: u32,
	pub band_count: usize,
	pub data: Vec<u8>,
}

impl RasterWindow {
	#[must_use]
	pub fn zero_filled(width: u32, height: u32, band_count: usize) -> RasterWindow {
		RasterWindow {
			width,
			height,
			band_count,
			data: vec![0u8; width as usize * height as usize * band_count],
		}
	}

	/// The byte slice for a single band plane.
	#[must_use]
	pub fn band(&self, index: usize) -> &[u8] {
		let plane = self.width as usize * self.height as usize;
		&self.data[index * plane..(index + 1) * plane]
	}

	#[must_use]
	pub fn band_mut(&mut self, index: usize) -> &mut [u8] {
		let plane = self.width as usize * self.height as usize;
		&mut self.data[index * plane..(index + 1) * plane]
	}
}

/// A georeferenced raster, read behind a narrow trait so the tiling, fusion,
/// and aggregation engines never touch GDAL types directly.
#[async_trait]
pub trait RasterSource: Send + Sync {
	fn width(&self) -> u32;
	fn height(&self) -> u32;
	fn band_count(&self) -> usize;
	fn transform(&self) -> Affine;
	fn crs(&self) -> &str;

	/// Ground sampling distance `(x, y)` in meters/pixel, as consulted from
	/// raster metadata or falling back to `(|transform.a|, |transform.e|)`.
	fn gsd(&self) -> (f64, f64);

	/// The raster's bounds in EPSG:4326.
	fn bbox(&self) -> &GeoBBox;

	/// Reads a window in the raster's own pixel grid, resampled to `out_size`
	/// if it differs from the window's own size. Portions of `window` outside
	/// the raster are zero-filled; a window entirely outside the raster
	/// returns [`RasterError::OutOfBounds`], which callers are expected to
	/// match on and recover from with a zero-filled tile.
	async fn read_window(
		&self,
		window: PixelWindow,
		out_size: (u32, u32),
		resample: ResampleAlg,
	) -> Result<RasterWindow, RasterError>;

	/// Reads a reprojection of `bbox` (EPSG:4326) into a `dst_epsg`-projected
	/// buffer of `out_size`. Used for Mercator-scheme tiles, which are defined
	/// in EPSG:3857 regardless of the source raster's native CRS.
	async fn read_reprojected(
		&self,
		bbox: &GeoBBox,
		out_size: (u32, u32),
		dst_epsg: u32,
		resample: ResampleAlg,
	) -> Result<RasterWindow, RasterError>;
}
