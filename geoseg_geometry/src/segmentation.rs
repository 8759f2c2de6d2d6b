//! `GeoSegmentation`: a polygon collection in a declared CRS, carrying a
//! category name and mask color, plus the raster mask ↔ polygon conversions
//! the Tile-to-Raster Aggregation Engine's polygon-projection strategy needs.
//!
//! Vectorization merges each mask row into horizontal runs before unioning
//! them, rather than unioning one polygon per pixel, since a run-length
//! encoding produces orders of magnitude fewer input polygons for the same
//! result. Rasterization is a plain per-pixel-center containment test; it
//! costs `O(width * height)` per raster, which is acceptable since polygon
//! projection is already the lower-fidelity, GeoJSON-output path (see
//! SPEC_FULL §4.3's performance note).

use crate::geo::{GeoFeature, GeoProperties, Geometry};
use geo::{BooleanOps, Buffer, Contains};
use geo_types::{Coord, LineString, MultiPolygon, Point, Polygon};
use geoseg_core::Affine;

/// A polygon collection in a single declared CRS, tagged with the category
/// it was vectorized from.
#[derive(Clone, Debug)]
pub struct GeoSegmentation {
	pub category: String,
	pub color: (u8, u8, u8),
	pub crs: String,
	pub polygons: MultiPolygon<f64>,
}

impl GeoSegmentation {
	#[must_use]
	pub fn empty(category: impl Into<String>, color: (u8, u8, u8), crs: impl Into<String>) -> GeoSegmentation {
		GeoSegmentation {
			category: category.into(),
			color,
			crs: crs.into(),
			polygons: MultiPolygon::new(Vec::new()),
		}
	}

	/// Vectorizes a row-major boolean mask into world-coordinate polygons via
	/// `transform` (the tile's own pixel→world affine), merging each row's
	/// contiguous `true` runs into a rectangle before unioning.
	#[must_use]
	pub fn vectorize_mask(
		mask: &[bool],
		width: u32,
		height: u32,
		transform: &Affine,
		category: impl Into<String>,
		color: (u8, u8, u8),
		crs: impl Into<String>,
	) -> GeoSegmentation {
		let mut polygons: Vec<Polygon<f64>> = Vec::new();
		for y in 0..height {
			let row_start = (y as usize) * (width as usize);
			let mut x = 0u32;
			while x < width {
				if !mask[row_start + x as usize] {
					x += 1;
					continue;
				}
				let run_start = x;
				while x < width && mask[row_start + x as usize] {
					x += 1;
				}
				polygons.push(rect_polygon(transform, run_start, y, x, y + 1));
			}
		}

		let unioned = polygons.into_iter().fold(MultiPolygon::new(Vec::new()), |acc, poly| acc.union(&MultiPolygon::new(vec![poly])));

		GeoSegmentation {
			category: category.into(),
			color,
			crs: crs.into(),
			polygons: unioned,
		}
	}

	/// Unions `other`'s polygons into `self`. Both must already share a CRS;
	/// the caller is responsible for reprojecting beforehand (see
	/// [`GeoSegmentation::to_mercator`]).
	pub fn merge(&mut self, other: &GeoSegmentation) {
		self.polygons = self.polygons.union(&other.polygons);
	}

	/// Reprojects to EPSG:3857 via the spherical Web-Mercator formula, the
	/// same one used for `to_mercator()` elsewhere in this crate's geometry types.
	#[must_use]
	pub fn to_mercator(&self) -> GeoSegmentation {
		let polygons = MultiPolygon::new(self.polygons.iter().map(|p| reproject_polygon(p, lonlat_to_mercator)).collect());
		GeoSegmentation {
			category: self.category.clone(),
			color: self.color,
			crs: "EPSG:3857".to_string(),
			polygons,
		}
	}

	/// Buffers every polygon by `meters`, assuming `self` is already in
	/// EPSG:3857 (see [`GeoSegmentation::to_mercator`]). A negative distance
	/// erodes instead of dilates.
	#[must_use]
	pub fn buffer_meters(&self, meters: f64) -> GeoSegmentation {
		GeoSegmentation {
			category: self.category.clone(),
			color: self.color,
			crs: self.crs.clone(),
			polygons: self.polygons.buffer(meters),
		}
	}

	/// Rasterizes this collection into a `width`×`height` boolean mask under
	/// `transform` (the destination raster's pixel→world affine), by testing
	/// each pixel's center for polygon containment.
	#[must_use]
	pub fn rasterize(&self, transform: &Affine, width: u32, height: u32) -> Vec<bool> {
		let mut out = vec![false; width as usize * height as usize];
		for y in 0..height {
			for x in 0..width {
				let (wx, wy) = transform.apply(f64::from(x) + 0.5, f64::from(y) + 0.5);
				if self.polygons.contains(&Point::new(wx, wy)) {
					out[(y as usize) * (width as usize) + x as usize] = true;
				}
			}
		}
		out
	}

	/// Converts to a [`GeoFeature`] with a `MultiPolygon` geometry and
	/// `category`/`color` properties, ready for `GeoCollection::to_json`.
	#[must_use]
	pub fn to_feature(&self) -> GeoFeature {
		let coords: Vec<Vec<Vec<[f64; 2]>>> = self
			.polygons
			.iter()
			.map(|poly| {
				let mut rings = vec![ring_coords(poly.exterior())];
				rings.extend(poly.interiors().iter().map(ring_coords));
				rings
			})
			.collect();
		let mut feature = GeoFeature::new(Geometry::new_multi_polygon(coords));
		let mut properties = GeoProperties::new();
		properties.insert("category".to_string(), self.category.clone().into());
		properties.insert("color_r".to_string(), i64::from(self.color.0).into());
		properties.insert("color_g".to_string(), i64::from(self.color.1).into());
		properties.insert("color_b".to_string(), i64::from(self.color.2).into());
		feature.set_properties(properties);
		feature
	}
}

fn ring_coords(ring: &LineString<f64>) -> Vec<[f64; 2]> {
	ring.coords().map(|c| [c.x, c.y]).collect()
}

fn rect_polygon(transform: &Affine, x0: u32, y0: u32, x1: u32, y1: u32) -> Polygon<f64> {
	let corners = [(x0, y0), (x1, y0), (x1, y1), (x0, y1), (x0, y0)];
	let ring: Vec<Coord<f64>> = corners
		.into_iter()
		.map(|(px, py)| {
			let (wx, wy) = transform.apply(f64::from(px), f64::from(py));
			Coord { x: wx, y: wy }
		})
		.collect();
	Polygon::new(LineString::new(ring), Vec::new())
}

fn lonlat_to_mercator(x: f64, y: f64) -> (f64, f64) {
	const RADIUS: f64 = 6_378_137.0;
	const MAX_LAT: f64 = 85.051_128_779_806_59;
	let lat = y.clamp(-MAX_LAT, MAX_LAT);
	let phi = lat.to_radians();
	(
		RADIUS * x.to_radians(),
		RADIUS * (std::f64::consts::FRAC_PI_4 + phi / 2.0).tan().ln(),
	)
}

fn reproject_polygon(poly: &Polygon<f64>, project: impl Fn(f64, f64) -> (f64, f64) + Copy) -> Polygon<f64> {
	let reproject_ring = |ring: &LineString<f64>| -> LineString<f64> {
		LineString::new(
			ring.coords()
				.map(|c| {
					let (x, y) = project(c.x, c.y);
					Coord { x, y }
				})
				.collect(),
		)
	};
	Polygon::new(reproject_ring(poly.exterior()), poly.interiors().iter().map(reproject_ring).collect())
}

#[cfg(test)]
mod tests {
	use super::*;
	use geo::Area;

	#[test]
	fn vectorize_mask_single_cell_is_unit_square() {
		let mask = vec![true];
		let transform = Affine::identity();
		let seg = GeoSegmentation::vectorize_mask(&mask, 1, 1, &transform, "building", (255, 0, 0), "EPSG:4326");
		assert_eq!(seg.polygons.0.len(), 1);
		let exterior = seg.polygons.0[0].exterior();
		assert!(exterior.coords().any(|c| c.x == 0.0 && c.y == 0.0));
		assert!(exterior.coords().any(|c| c.x == 1.0 && c.y == 1.0));
	}

	#[test]
	fn vectorize_mask_merges_contiguous_row() {
		let mask = vec![true, true, true, false];
		let transform = Affine::identity();
		let seg = GeoSegmentation::vectorize_mask(&mask, 4, 1, &transform, "building", (255, 0, 0), "EPSG:4326");
		assert_eq!(seg.polygons.0.len(), 1);
	}

	#[test]
	fn rasterize_round_trips_a_filled_rectangle() {
		let mut mask = vec![false; 10 * 10];
		for y in 2..5 {
			for x in 2..6 {
				mask[y * 10 + x] = true;
			}
		}
		let transform = Affine::identity();
		let seg = GeoSegmentation::vectorize_mask(&mask, 10, 10, &transform, "c", (0, 0, 0), "EPSG:4326");
		let back = seg.rasterize(&transform, 10, 10);
		assert_eq!(back, mask);
	}

	#[test]
	fn buffer_meters_grows_a_polygon() {
		let mut mask = vec![false; 10 * 10];
		mask[5 * 10 + 5] = true;
		let transform = Affine::identity();
		let seg = GeoSegmentation::vectorize_mask(&mask, 10, 10, &transform, "c", (0, 0, 0), "EPSG:3857");
		let area_before = seg.polygons.iter().map(|p| p.unsigned_area()).sum::<f64>();
		let buffered = seg.buffer_meters(2.0);
		let area_after = buffered.polygons.iter().map(|p| p.unsigned_area()).sum::<f64>();
		assert!(area_after > area_before);
	}

	#[test]
	fn empty_mask_yields_no_polygons() {
		let mask = vec![false; 9];
		let seg = GeoSegmentation::vectorize_mask(&mask, 3, 3, &Affine::identity(), "c", (0, 0, 0), "EPSG:4326");
		assert!(seg.polygons.0.is_empty());
	}
}
