//! Standard spherical-mercator (EPSG:3857) XYZ tile math.
//!
//! At zoom `z` the world is divided into `2^z × 2^z` tiles; tile `(0,0)` is the
//! top-left (north-west) corner. All formulas here are the textbook "slippy map"
//! ones, kept free of any CRS-library dependency since they're pure arithmetic.

use crate::geo::GeoBBox;
use itertools::Itertools;

/// Number of tiles per axis at a given zoom level.
#[must_use]
pub fn tile_count(zoom: u32) -> u32 {
	1u32 << zoom
}

/// Longitude/latitude (EPSG:4326, degrees) of a tile's top-left corner.
#[must_use]
pub fn tile_top_left_lonlat(x: u32, y: u32, zoom: u32) -> (f64, f64) {
	let n = tile_count(zoom) as f64;
	let lon = x as f64 / n * 360.0 - 180.0;
	let lat_rad = (std::f64::consts::PI * (1.0 - 2.0 * y as f64 / n)).sinh().atan();
	(lon, lat_rad.to_degrees())
}

/// The EPSG:4326 bounding box covered by tile `(x, y, zoom)`.
#[must_use]
pub fn tile_bounds(x: u32, y: u32, zoom: u32) -> GeoBBox {
	let (x_min, y_max) = tile_top_left_lonlat(x, y, zoom);
	let (x_max, y_min) = tile_top_left_lonlat(x + 1, y + 1, zoom);
	GeoBBox::new_clamped(x_min, y_min, x_max, y_max)
}

/// The tile `(x, y)` at `zoom` that contains the given longitude/latitude.
#[must_use]
pub fn lonlat_to_tile(lon: f64, lat: f64, zoom: u32) -> (u32, u32) {
	let n = tile_count(zoom) as f64;
	let lat_rad = lat.to_radians();
	let x = ((lon + 180.0) / 360.0 * n).floor().clamp(0.0, n - 1.0) as u32;
	let y = ((1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / std::f64::consts::PI) / 2.0 * n)
		.floor()
		.clamp(0.0, n - 1.0) as u32;
	(x, y)
}

/// Every tile `(x, y)` at `zoom` whose bounds intersect `bbox` (EPSG:4326).
///
/// Tiles are returned in scan order (`y` then `x`), matching the ordering
/// guarantee of the tiling layout engine for local schemes.
#[must_use]
pub fn tiles_intersecting(bbox: &GeoBBox, zoom: u32) -> Vec<(u32, u32)> {
	let n = tile_count(zoom);
	let (x_min, y_min) = lonlat_to_tile(bbox.x_min, bbox.y_max.min(85.051_128_779_806_59), zoom);
	let (x_max, y_max) = lonlat_to_tile(bbox.x_max, bbox.y_min.max(-85.051_128_779_806_59), zoom);
	let x_max = x_max.min(n - 1);
	let y_max = y_max.min(n - 1);

	(y_min..=y_max)
		.cartesian_product(x_min..=x_max)
		.map(|(y, x)| (x, y))
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn tile_count_doubles_per_zoom() {
		assert_eq!(tile_count(0), 1);
		assert_eq!(tile_count(1), 2);
		assert_eq!(tile_count(10), 1024);
	}

	#[test]
	fn root_tile_covers_whole_world() {
		let bounds = tile_bounds(0, 0, 0);
		assert!((bounds.x_min + 180.0).abs() < 1e-9);
		assert!((bounds.x_max - 180.0).abs() < 1e-9);
		assert!(bounds.y_max > 85.0);
		assert!(bounds.y_min < -85.0);
	}

	#[test]
	fn lonlat_roundtrips_through_tile_center() {
		let (x, y) = lonlat_to_tile(13.405, 52.52, 12); // Berlin
		let bounds = tile_bounds(x, y, 12);
		assert!(bounds.x_min <= 13.405 && 13.405 <= bounds.x_max);
		assert!(bounds.y_min <= 52.52 && 52.52 <= bounds.y_max);
	}

	#[test]
	fn tiles_intersecting_single_tile_bbox() {
		let bounds = tile_bounds(2200, 1344, 12);
		let tiles = tiles_intersecting(&bounds.intersected(&bounds), 12);
		assert!(tiles.contains(&(2200, 1344)));
	}

	#[test]
	fn tiles_intersecting_scan_order() {
		let bbox = GeoBBox::new(0.0, 0.0, 1.0, 1.0).unwrap();
		let tiles = tiles_intersecting(&bbox, 6);
		for pair in tiles.windows(2) {
			let (x0, y0) = pair[0];
			let (x1, y1) = pair[1];
			assert!(y1 > y0 || (y1 == y0 && x1 > x0));
		}
	}
}
