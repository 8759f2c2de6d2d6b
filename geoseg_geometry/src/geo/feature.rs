#![allow(dead_code)]

use std::fmt::Debug;

use super::*;
use crate::json::{JsonObject, JsonValue};

#[derive(Clone, Debug)]
pub struct GeoFeature {
	pub id: Option<GeoValue>,
	pub geometry: Geometry,
	pub properties: GeoProperties,
}

impl GeoFeature {
	pub fn new(geometry: Geometry) -> Self {
		Self {
			id: None,
			geometry,
			properties: GeoProperties::new(),
		}
	}

	pub fn set_id<T>(&mut self, id: T)
	where
		GeoValue: From<T>,
	{
		self.id = Some(GeoValue::from(id));
	}

	pub fn set_properties(&mut self, properties: GeoProperties) {
		self.properties = properties;
	}

	pub fn set_property<T>(&mut self, key: String, value: T)
	where
		GeoValue: From<T>,
	{
		self.properties.insert(key, GeoValue::from(value));
	}

	/// Converts this feature into a `"Feature"` GeoJSON object, including its geometry and properties.
	pub fn to_json(&self, precision: Option<u8>) -> JsonValue {
		let mut obj = JsonObject::new();
		obj.set("type", JsonValue::from("Feature"));
		if let Some(id) = &self.id {
			obj.set("id", id.to_json());
		}
		obj.set("geometry", self.geometry.to_json(precision));
		obj.set("properties", JsonValue::from(self.properties.to_json()));
		JsonValue::from(obj)
	}

	#[cfg(test)]
	pub fn new_example() -> Self {
		Self {
			id: Some(GeoValue::from(13u64)),
			geometry: Geometry::new_example(),
			properties: GeoProperties::from(vec![
				("name", GeoValue::from("Nice")),
				("population", GeoValue::from(348085)),
				("is_nice", GeoValue::from(true)),
			]),
		}
	}
}
