//! Resampling algorithm mapping for GDAL read/warp operations.
//!
//! Mirrors GDAL's `GDALResampleAlg` constants so the rest of the engine can
//! pick a strategy (nearest-neighbour for label tiles, something smoother for
//! image overlays) without reaching for `gdal_sys` directly.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResampleAlg {
	/// Nearest neighbour — fastest, no smoothing. Required for label/palette tiles.
	NearestNeighbour,
	Bilinear,
	Cubic,
	CubicSpline,
	Lanczos,
	Average,
}

impl ResampleAlg {
	/// Converts to the corresponding `GDALResampleAlg` constant.
	pub fn as_gdal(&self) -> u32 {
		use ResampleAlg::{Average, Bilinear, Cubic, CubicSpline, Lanczos, NearestNeighbour};
		use gdal_sys::GDALResampleAlg::{
			GRA_Average, GRA_Bilinear, GRA_Cubic, GRA_CubicSpline, GRA_Lanczos, GRA_NearestNeighbour,
		};
		match self {
			NearestNeighbour => GRA_NearestNeighbour,
			Bilinear => GRA_Bilinear,
			Cubic => GRA_Cubic,
			CubicSpline => GRA_CubicSpline,
			Lanczos => GRA_Lanczos,
			Average => GRA_Average,
		}
	}
}

impl Default for ResampleAlg {
	fn default() -> Self {
		ResampleAlg::Average
	}
}

impl From<ResampleAlg> for gdal::raster::ResampleAlg {
	/// Converts to the `gdal` crate's own resample enum, used by plain
	/// (non-warp) band reads via `RasterBand::read_as`.
	fn from(value: ResampleAlg) -> Self {
		match value {
			ResampleAlg::NearestNeighbour => gdal::raster::ResampleAlg::NearestNeighbour,
			ResampleAlg::Bilinear => gdal::raster::ResampleAlg::Bilinear,
			ResampleAlg::Cubic => gdal::raster::ResampleAlg::Cubic,
			ResampleAlg::CubicSpline => gdal::raster::ResampleAlg::CubicSpline,
			ResampleAlg::Lanczos => gdal::raster::ResampleAlg::Lanczos,
			ResampleAlg::Average => gdal::raster::ResampleAlg::Average,
		}
	}
}
