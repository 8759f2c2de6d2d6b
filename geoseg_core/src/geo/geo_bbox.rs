use anyhow::{Result, ensure};
use std::fmt::Debug;

static MAX_MERCATOR_LAT: f64 = 85.051_128_779_806_59;
static MAX_MERCATOR_LNG: f64 = 180.0;
static RADIUS: f64 = 6_378_137.0; // meters

/// A geographical bounding box (`GeoBBox`) represents a rectangular area on a map
/// defined by its minimum and maximum longitude (x) and latitude (y) coordinates.
///
/// # Examples
///
/// ```
/// use geoseg_core::GeoBBox;
///
/// let bbox = GeoBBox::new(-10.0, -5.0, 10.0, 5.0).unwrap();
/// assert_eq!(bbox.as_tuple(), (-10.0, -5.0, 10.0, 5.0));
/// ```
#[derive(Clone, Copy, PartialEq)]
#[allow(clippy::manual_non_exhaustive)]
pub struct GeoBBox {
	pub x_min: f64,
	pub y_min: f64,
	pub x_max: f64,
	pub y_max: f64,
	phantom: (),
}

impl GeoBBox {
	/// Creates a new `GeoBBox` from `west, south, east, north`.
	///
	/// # Errors
	///
	/// Returns an error if any coordinate is out of `[-180,180]`/`[-90,90]` range
	/// or `x_min > x_max` / `y_min > y_max`.
	pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Result<GeoBBox> {
		GeoBBox {
			x_min,
			y_min,
			x_max,
			y_max,
			phantom: (),
		}
		.checked()
	}

	/// Builds a `GeoBBox` from two arbitrarily ordered corners, clamping to valid
	/// lon/lat ranges instead of failing.
	#[must_use]
	pub fn new_clamped(x0: f64, y0: f64, x1: f64, y1: f64) -> GeoBBox {
		GeoBBox {
			x_min: x0.min(x1).clamp(-180.0, 180.0),
			y_min: y0.min(y1).clamp(-90.0, 90.0),
			x_max: x0.max(x1).clamp(-180.0, 180.0),
			y_max: y0.max(y1).clamp(-90.0, 90.0),
			phantom: (),
		}
	}

	pub fn limit_to_mercator(&mut self) {
		self.x_min = self.x_min.max(-MAX_MERCATOR_LNG).min(MAX_MERCATOR_LNG);
		self.y_min = self.y_min.max(-MAX_MERCATOR_LAT).min(MAX_MERCATOR_LAT);
		self.x_max = self.x_max.max(-MAX_MERCATOR_LNG).min(MAX_MERCATOR_LNG);
		self.y_max = self.y_max.max(-MAX_MERCATOR_LAT).min(MAX_MERCATOR_LAT);
	}

	#[must_use]
	pub fn as_tuple(&self) -> (f64, f64, f64, f64) {
		(self.x_min, self.y_min, self.x_max, self.y_max)
	}

	#[must_use]
	pub fn as_array(&self) -> [f64; 4] {
		[self.x_min, self.y_min, self.x_max, self.y_max]
	}

	/// Expands `self` in place to include `other`.
	pub fn extend(&mut self, other: &GeoBBox) {
		self.x_min = self.x_min.min(other.x_min);
		self.y_min = self.y_min.min(other.y_min);
		self.x_max = self.x_max.max(other.x_max);
		self.y_max = self.y_max.max(other.y_max);
	}

	#[must_use]
	pub fn extended(mut self, other: &GeoBBox) -> GeoBBox {
		self.extend(other);
		self
	}

	/// Intersects `self` in place with `other`; if the boxes do not overlap the
	/// result has `x_min > x_max` and/or `y_min > y_max` (a degenerate, empty box).
	pub fn intersect(&mut self, other: &GeoBBox) {
		self.x_min = self.x_min.max(other.x_min);
		self.y_min = self.y_min.max(other.y_min);
		self.x_max = self.x_max.min(other.x_max);
		self.y_max = self.y_max.min(other.y_max);
	}

	#[must_use]
	pub fn intersected(mut self, other: &GeoBBox) -> GeoBBox {
		self.intersect(other);
		self
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.x_min > self.x_max || self.y_min > self.y_max
	}

	fn checked(self) -> Result<Self> {
		ensure!(self.x_min >= -180., "x_min ({}) must be >= -180", self.x_min);
		ensure!(self.y_min >= -90., "y_min ({}) must be >= -90", self.y_min);
		ensure!(self.x_max <= 180., "x_max ({}) must be <= 180", self.x_max);
		ensure!(self.y_max <= 90., "y_max ({}) must be <= 90", self.y_max);
		ensure!(
			self.x_min <= self.x_max,
			"x_min ({}) must be <= x_max ({})",
			self.x_min,
			self.x_max
		);
		ensure!(
			self.y_min <= self.y_max,
			"y_min ({}) must be <= y_max ({})",
			self.y_min,
			self.y_max
		);
		Ok(self)
	}

	/// Converts this WGS84 (EPSG:4326) bounding box to Web-Mercator meters (EPSG:3857),
	/// clamping to the valid Web-Mercator domain first.
	#[must_use]
	pub fn to_mercator(&self) -> [f64; 4] {
		fn x_from_lon(lon_deg: f64) -> f64 {
			let lon = lon_deg.max(-MAX_MERCATOR_LNG).min(MAX_MERCATOR_LNG);
			RADIUS * lon.to_radians()
		}
		fn y_from_lat(lat_deg: f64) -> f64 {
			let lat = lat_deg.max(-MAX_MERCATOR_LAT).min(MAX_MERCATOR_LAT);
			let phi = lat.to_radians();
			RADIUS * ((std::f64::consts::FRAC_PI_4 + phi / 2.0).tan()).ln()
		}

		[
			x_from_lon(self.x_min),
			y_from_lat(self.y_min),
			x_from_lon(self.x_max),
			y_from_lat(self.y_max),
		]
	}
}

impl Debug for GeoBBox {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "GeoBBox({}, {}, {}, {})", self.x_min, self.y_min, self.x_max, self.y_max)
	}
}

impl TryFrom<[f64; 4]> for GeoBBox {
	type Error = anyhow::Error;

	fn try_from(input: [f64; 4]) -> Result<Self> {
		GeoBBox::new(input[0], input[1], input[2], input[3])
	}
}
