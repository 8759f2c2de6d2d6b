//! Maps a GDAL dataset's raw band indices onto an RGB(A) or greyscale(+A)
//! output layout, so the rest of this crate never has to inspect
//! `ColorInterpretation` itself.

use crate::error::RasterError;
use gdal::raster::ColorInterpretation;
use log::{debug, trace, warn};

pub struct BandMapping {
	map: Vec<usize>,
	alpha: Option<usize>,
}

impl BandMapping {
	pub fn from_dataset(dataset: &gdal::Dataset, path: &str) -> Result<BandMapping, RasterError> {
		trace!("computing band mapping (raster_count={})", dataset.raster_count());
		let mut color_index = [0usize; 3];
		let mut grey_index = 0usize;
		let mut alpha: Option<usize> = None;

		for i in 1..=dataset.raster_count() {
			let band = dataset.rasterband(i).map_err(|e| RasterError::Gdal {
				context: "failed to open raster band",
				message: e.to_string(),
			})?;
			use ColorInterpretation::{AlphaBand, BlueBand, GrayIndex, GreenBand, RedBand};
			match band.color_interpretation() {
				RedBand => color_index[0] = i,
				GreenBand => color_index[1] = i,
				BlueBand => color_index[2] = i,
				AlphaBand => alpha = Some(i),
				GrayIndex => grey_index = i,
				other => warn!("band {i} of '{path}' has unsupported color interpretation: {other:?}"),
			}
		}

		let mut map = vec![];
		if color_index.iter().all(|&i| i > 0) {
			if grey_index > 0 {
				return Err(RasterError::Gdal {
					context: "band mapping",
					message: format!("raster '{path}' has both color and grey bands"),
				});
			}
			map.extend_from_slice(&color_index);
		} else if grey_index > 0 {
			map.push(grey_index);
		} else {
			return Err(RasterError::Gdal {
				context: "band mapping",
				message: format!("raster '{path}' has no color or grey bands to read"),
			});
		}

		if let Some(alpha_index) = alpha {
			map.push(alpha_index);
		}
		debug!("band mapping for '{path}': {map:?}");

		Ok(BandMapping { map, alpha })
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.map.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.map.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
		self.map.iter().copied().enumerate()
	}

	#[must_use]
	pub fn alpha_band(&self) -> Option<usize> {
		self.alpha
	}
}

impl std::fmt::Debug for BandMapping {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "BandMapping {{ map: {:?}, alpha: {:?} }}", self.map, self.alpha)
	}
}
