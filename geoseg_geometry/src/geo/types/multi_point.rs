use super::*;
use anyhow::Result;
use std::fmt::Debug;
use crate::json::JsonValue;

#[derive(Clone, PartialEq)]
pub struct MultiPointGeometry(pub Vec<PointGeometry>);

impl GeometryTrait for MultiPointGeometry {
	fn area(&self) -> f64 {
		0.0
	}

	fn verify(&self) -> Result<()> {
		for point in &self.0 {
			point.verify()?;
		}
		Ok(())
	}

	fn to_coord_json(&self, precision: Option<u8>) -> JsonValue {
		JsonValue::from(self.0.iter().map(|point| point.to_coord_json(precision)).collect::<Vec<_>>())
	}

	fn contains_point(&self, _x: f64, _y: f64) -> bool {
		false
	}

	fn to_mercator(&self) -> MultiPointGeometry {
		MultiPointGeometry(self.0.iter().map(PointGeometry::to_mercator).collect())
	}

	fn compute_bounds(&self) -> Option<[f64; 4]> {
		union_bounds(self.0.iter().map(PointGeometry::compute_bounds))
	}
}

impl CompositeGeometryTrait<PointGeometry> for MultiPointGeometry {
	fn new() -> Self {
		Self(Vec::new())
	}
	fn as_vec(&self) -> &Vec<PointGeometry> {
		&self.0
	}
	fn as_mut_vec(&mut self) -> &mut Vec<PointGeometry> {
		&mut self.0
	}
	fn into_inner(self) -> Vec<PointGeometry> {
		self.0
	}
}

impl Debug for MultiPointGeometry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_list().entries(&self.0).finish()
	}
}

crate::impl_from_array!(MultiPointGeometry, PointGeometry);
