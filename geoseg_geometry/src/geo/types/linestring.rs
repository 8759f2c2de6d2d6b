use super::{CompositeGeometryTrait, Coordinates, GeometryTrait, MultiLineStringGeometry, SingleGeometryTrait};
use anyhow::{ensure, Result};
use std::fmt::Debug;
use crate::json::JsonValue;

/// An open (or closed, but not implicitly filled) sequence of coordinates.
#[derive(Clone, PartialEq)]
pub struct LineStringGeometry(pub Vec<Coordinates>);

impl GeometryTrait for LineStringGeometry {
	/// Lines have no area.
	fn area(&self) -> f64 {
		0.0
	}

	/// Verifies that the line has at least two points.
	fn verify(&self) -> Result<()> {
		ensure!(self.0.len() >= 2, "LineString must have at least 2 points");
		Ok(())
	}

	fn to_coord_json(&self, precision: Option<u8>) -> JsonValue {
		JsonValue::from(self.0.iter().map(|coord| coord.to_json(precision)).collect::<Vec<_>>())
	}

	/// Lines have no interior, so this always returns `false`.
	fn contains_point(&self, _x: f64, _y: f64) -> bool {
		false
	}

	fn to_mercator(&self) -> LineStringGeometry {
		LineStringGeometry(self.0.iter().map(Coordinates::to_mercator).collect())
	}

	fn compute_bounds(&self) -> Option<[f64; 4]> {
		if self.0.is_empty() {
			return None;
		}
		let mut x_min = f64::MAX;
		let mut y_min = f64::MAX;
		let mut x_max = f64::MIN;
		let mut y_max = f64::MIN;
		for coord in &self.0 {
			x_min = x_min.min(coord.x());
			y_min = y_min.min(coord.y());
			x_max = x_max.max(coord.x());
			y_max = y_max.max(coord.y());
		}
		Some([x_min, y_min, x_max, y_max])
	}
}

impl SingleGeometryTrait<MultiLineStringGeometry> for LineStringGeometry {
	fn into_multi(self) -> MultiLineStringGeometry {
		MultiLineStringGeometry(vec![self])
	}
}

impl CompositeGeometryTrait<Coordinates> for LineStringGeometry {
	fn new() -> Self {
		Self(Vec::new())
	}
	fn as_vec(&self) -> &Vec<Coordinates> {
		&self.0
	}
	fn as_mut_vec(&mut self) -> &mut Vec<Coordinates> {
		&mut self.0
	}
	fn into_inner(self) -> Vec<Coordinates> {
		self.0
	}
}

impl Debug for LineStringGeometry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_list().entries(&self.0).finish()
	}
}

crate::impl_from_array!(LineStringGeometry, Coordinates);

impl From<geo::LineString<f64>> for LineStringGeometry {
	fn from(geometry: geo::LineString<f64>) -> Self {
		LineStringGeometry(geometry.into_iter().map(Coordinates::from).collect())
	}
}
