#![allow(dead_code)]

use super::*;
use crate::json::{JsonObject, JsonValue};
use anyhow::Result;
use std::fmt::Debug;

#[derive(Clone, PartialEq)]
pub enum Geometry {
	Point(PointGeometry),
	LineString(LineStringGeometry),
	Polygon(PolygonGeometry),
	MultiPoint(MultiPointGeometry),
	MultiLineString(MultiLineStringGeometry),
	MultiPolygon(MultiPolygonGeometry),
}

impl Geometry {
	pub fn new_point<T: Convertible>(value: [T; 2]) -> Self {
		Self::Point(PointGeometry::from(value))
	}
	pub fn new_line_string<T: Convertible>(value: Vec<[T; 2]>) -> Self {
		Self::LineString(LineStringGeometry::from(value))
	}
	pub fn new_polygon<T: Convertible>(value: Vec<Vec<[T; 2]>>) -> Self {
		Self::Polygon(PolygonGeometry::from(value))
	}
	pub fn new_multi_point<T: Convertible>(value: Vec<[T; 2]>) -> Self {
		Self::MultiPoint(MultiPointGeometry::from(value))
	}
	pub fn new_multi_line_string<T: Convertible>(value: Vec<Vec<[T; 2]>>) -> Self {
		Self::MultiLineString(MultiLineStringGeometry::from(value))
	}
	pub fn new_multi_polygon<T: Convertible>(value: Vec<Vec<Vec<[T; 2]>>>) -> Self {
		Self::MultiPolygon(MultiPolygonGeometry::from(value))
	}

	/// Returns the GeoJSON type name of this geometry (`"Point"`, `"Polygon"`, etc.).
	pub fn type_name(&self) -> &str {
		match self {
			Geometry::Point(_) => "Point",
			Geometry::LineString(_) => "LineString",
			Geometry::Polygon(_) => "Polygon",
			Geometry::MultiPoint(_) => "MultiPoint",
			Geometry::MultiLineString(_) => "MultiLineString",
			Geometry::MultiPolygon(_) => "MultiPolygon",
		}
	}

	/// Converts this geometry's coordinates to their GeoJSON `coordinates` representation.
	pub fn to_coord_json(&self, precision: Option<u8>) -> JsonValue {
		match self {
			Geometry::Point(g) => g.to_coord_json(precision),
			Geometry::LineString(g) => g.to_coord_json(precision),
			Geometry::Polygon(g) => g.to_coord_json(precision),
			Geometry::MultiPoint(g) => g.to_coord_json(precision),
			Geometry::MultiLineString(g) => g.to_coord_json(precision),
			Geometry::MultiPolygon(g) => g.to_coord_json(precision),
		}
	}

	/// Converts this geometry's `"type"`/`"coordinates"` pair to a GeoJSON geometry object.
	pub fn to_json(&self, precision: Option<u8>) -> JsonValue {
		let mut obj = JsonObject::new();
		obj.set("type", JsonValue::from(self.type_name()));
		obj.set("coordinates", self.to_coord_json(precision));
		JsonValue::from(obj)
	}

	pub fn verify(&self) -> Result<()> {
		match self {
			Geometry::Point(g) => g.verify(),
			Geometry::LineString(g) => g.verify(),
			Geometry::Polygon(g) => g.verify(),
			Geometry::MultiPoint(g) => g.verify(),
			Geometry::MultiLineString(g) => g.verify(),
			Geometry::MultiPolygon(g) => g.verify(),
		}
	}

	pub fn contains_point(&self, x: f64, y: f64) -> bool {
		match self {
			Geometry::Point(g) => g.contains_point(x, y),
			Geometry::LineString(g) => g.contains_point(x, y),
			Geometry::Polygon(g) => g.contains_point(x, y),
			Geometry::MultiPoint(g) => g.contains_point(x, y),
			Geometry::MultiLineString(g) => g.contains_point(x, y),
			Geometry::MultiPolygon(g) => g.contains_point(x, y),
		}
	}

	pub fn to_mercator(&self) -> Self {
		match self {
			Geometry::Point(g) => Geometry::Point(g.to_mercator()),
			Geometry::LineString(g) => Geometry::LineString(g.to_mercator()),
			Geometry::Polygon(g) => Geometry::Polygon(g.to_mercator()),
			Geometry::MultiPoint(g) => Geometry::MultiPoint(g.to_mercator()),
			Geometry::MultiLineString(g) => Geometry::MultiLineString(g.to_mercator()),
			Geometry::MultiPolygon(g) => Geometry::MultiPolygon(g.to_mercator()),
		}
	}

	pub fn compute_bounds(&self) -> Option<[f64; 4]> {
		match self {
			Geometry::Point(g) => g.compute_bounds(),
			Geometry::LineString(g) => g.compute_bounds(),
			Geometry::Polygon(g) => g.compute_bounds(),
			Geometry::MultiPoint(g) => g.compute_bounds(),
			Geometry::MultiLineString(g) => g.compute_bounds(),
			Geometry::MultiPolygon(g) => g.compute_bounds(),
		}
	}

	pub fn area(&self) -> f64 {
		match self {
			Geometry::Point(g) => g.area(),
			Geometry::LineString(g) => g.area(),
			Geometry::Polygon(g) => g.area(),
			Geometry::MultiPoint(g) => g.area(),
			Geometry::MultiLineString(g) => g.area(),
			Geometry::MultiPolygon(g) => g.area(),
		}
	}

	pub fn into_multi(self) -> Self {
		match self {
			Geometry::Point(g) => Geometry::MultiPoint(g.into_multi()),
			Geometry::LineString(g) => Geometry::MultiLineString(g.into_multi()),
			Geometry::Polygon(g) => Geometry::MultiPolygon(g.into_multi()),
			Geometry::MultiPoint(_) => self,
			Geometry::MultiLineString(_) => self,
			Geometry::MultiPolygon(_) => self,
		}
	}

	pub fn new_example() -> Self {
		Self::new_multi_polygon(vec![
			vec![
				vec![[0.0, 0.0], [5.0, 0.0], [2.5, 4.0], [0.0, 0.0]],
				vec![[2.0, 1.0], [2.5, 2.0], [3.0, 1.0], [2.0, 1.0]],
			],
			vec![
				vec![[6.0, 0.0], [9.0, 0.0], [9.0, 4.0], [6.0, 4.0], [6.0, 0.0]],
				vec![[7.0, 1.0], [7.0, 3.0], [8.0, 3.0], [8.0, 1.0], [7.0, 1.0]],
			],
		])
	}
}

impl Debug for Geometry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let (type_name, inner): (&str, &dyn Debug) = match self {
			Geometry::Point(g) => ("Point", g),
			Geometry::LineString(g) => ("LineString", g),
			Geometry::Polygon(g) => ("Polygon", g),
			Geometry::MultiPoint(g) => ("MultiPoint", g),
			Geometry::MultiLineString(g) => ("MultiLineString", g),
			Geometry::MultiPolygon(g) => ("MultiPolygon", g),
		};
		f.debug_tuple(type_name).field(inner).finish()
	}
}
