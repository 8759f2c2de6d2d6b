//! GeoJSON parser for `geoseg_geometry`.
//!
//! This module parses GeoJSON text into the crate's internal types
//! (`GeoCollection`, `GeoFeature`, `Geometry`, `GeoProperties`, `GeoValue`).
//! Parsing goes through `serde_json::Value`; only the tree shape and numeric
//! classification (`Int`/`UInt`/`Double`) are interpreted here.

use crate::geo::{GeoCollection, GeoFeature, GeoProperties, GeoValue, Geometry};
use anyhow::{anyhow, bail, Context, Result};
use serde_json::Value;

/// Parses a GeoJSON FeatureCollection from a UTF-8 string into a [`GeoCollection`].
pub fn parse_geojson(json: &str) -> Result<GeoCollection> {
	let value: Value = serde_json::from_str(json).context("parsing GeoJSON root")?;
	parse_geojson_collection(&value).context("parsing GeoJSON FeatureCollection")
}

/// Parses a GeoJSON `FeatureCollection` object.
///
/// Expects an object with `type: "FeatureCollection"` and a `features` array of
/// Feature objects. Unknown members are ignored.
pub fn parse_geojson_collection(value: &Value) -> Result<GeoCollection> {
	let object = value.as_object().ok_or_else(|| anyhow!("FeatureCollection must be a JSON object"))?;

	check_type(object.get("type"), "FeatureCollection")?;

	let features = object
		.get("features")
		.ok_or_else(|| anyhow!("FeatureCollection is missing 'features'"))?
		.as_array()
		.ok_or_else(|| anyhow!("'features' must be an array"))?
		.iter()
		.map(parse_geojson_feature)
		.collect::<Result<Vec<_>>>()?;

	Ok(GeoCollection { features })
}

/// Validates the required GeoJSON `type` field for a given object.
fn check_type(object_type: Option<&Value>, name: &str) -> Result<()> {
	let object_type = object_type
		.ok_or_else(|| anyhow!("{name} must have a type"))?
		.as_str()
		.ok_or_else(|| anyhow!("type must be a string"))?;

	if object_type != name {
		bail!("type must be '{name}'")
	}
	Ok(())
}

/// Parses a GeoJSON `Feature` object.
///
/// Reads optional `id`, required `geometry`, and optional `properties`. Unknown
/// members are ignored. Returns an error if `geometry` is missing.
pub fn parse_geojson_feature(value: &Value) -> Result<GeoFeature> {
	let object = value.as_object().ok_or_else(|| anyhow!("Feature must be a JSON object"))?;

	check_type(object.get("type"), "Feature").context("parsing GeoJSON Feature")?;

	let id = object.get("id").map(parse_geojson_id).transpose()?;

	let geometry = object
		.get("geometry")
		.ok_or_else(|| anyhow!("feature is missing 'geometry'"))?;
	let geometry = parse_geojson_geometry(geometry).context("parsing GeoJSON geometry")?;

	let properties = object
		.get("properties")
		.map(parse_geojson_properties)
		.transpose()?
		.unwrap_or_default();

	Ok(GeoFeature { id, geometry, properties })
}

/// Parses a GeoJSON `id` field (string or number) into a [`GeoValue`].
fn parse_geojson_id(value: &Value) -> Result<GeoValue> {
	match value {
		Value::String(s) => Ok(GeoValue::from(s.clone())),
		Value::Number(_) => parse_geojson_number(value),
		other => bail!("expected a string or number for 'id', found a {}", type_name(other)),
	}
}

/// Classifies a JSON number into the most specific [`GeoValue`] variant: `UInt`
/// for non-negative integers, `Int` for negative integers, `Double` otherwise.
fn parse_geojson_number(value: &Value) -> Result<GeoValue> {
	let number = value.as_number().ok_or_else(|| anyhow!("expected a number"))?;
	if let Some(v) = number.as_u64() {
		Ok(GeoValue::UInt(v))
	} else if let Some(v) = number.as_i64() {
		Ok(GeoValue::Int(v))
	} else {
		Ok(GeoValue::Double(number.as_f64().ok_or_else(|| anyhow!("invalid number"))?))
	}
}

/// Parses a GeoJSON property value: string, number, boolean, or null.
fn parse_geojson_value(value: &Value) -> Result<GeoValue> {
	match value {
		Value::String(s) => Ok(GeoValue::from(s.clone())),
		Value::Number(_) => parse_geojson_number(value),
		Value::Bool(b) => Ok(GeoValue::Bool(*b)),
		Value::Null => Ok(GeoValue::Null),
		other => bail!("expected a string, number, boolean or null, found a {}", type_name(other)),
	}
}

/// Parses a GeoJSON `properties` object into a [`GeoProperties`] map.
fn parse_geojson_properties(value: &Value) -> Result<GeoProperties> {
	let object = value.as_object().ok_or_else(|| anyhow!("'properties' must be a JSON object"))?;
	let list = object
		.iter()
		.map(|(key, value)| Ok((key.clone(), parse_geojson_value(value)?)))
		.collect::<Result<Vec<(String, GeoValue)>>>()?;
	Ok(GeoProperties::from_iter(list))
}

fn type_name(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "boolean",
		Value::Number(_) => "number",
		Value::String(_) => "string",
		Value::Array(_) => "array",
		Value::Object(_) => "object",
	}
}

/// Parses a GeoJSON `geometry` object into a [`Geometry`] variant.
///
/// Supports `Point`, `LineString`, `Polygon`, `MultiPoint`, `MultiLineString`, and `MultiPolygon`.
fn parse_geojson_geometry(value: &Value) -> Result<Geometry> {
	let object = value.as_object().ok_or_else(|| anyhow!("geometry must be a JSON object"))?;

	let geometry_type = object
		.get("type")
		.ok_or_else(|| anyhow!("geometry must have a type"))?
		.as_str()
		.ok_or_else(|| anyhow!("geometry type must be a string"))?;

	let coordinates = object
		.get("coordinates")
		.ok_or_else(|| anyhow!("geometry must have coordinates"))?;
	let coordinates = parse_geojson_coordinates(coordinates)?;

	Ok(match geometry_type {
		"Point" => Geometry::new_point(coordinates.unwrap_c0()),
		"LineString" => Geometry::new_line_string(coordinates.unwrap_c1()),
		"Polygon" => Geometry::new_polygon(coordinates.unwrap_c2()),
		"MultiPoint" => Geometry::new_multi_point(coordinates.unwrap_c1()),
		"MultiLineString" => Geometry::new_multi_line_string(coordinates.unwrap_c2()),
		"MultiPolygon" => Geometry::new_multi_polygon(coordinates.unwrap_c3()),
		other => bail!("unknown geometry type '{other}'"),
	})
}

/// Temporary coordinate accumulator used while recursively parsing nested coordinate arrays.
///
/// This internal enum mirrors the allowed GeoJSON coordinate nesting depths.
enum TemporaryCoordinates {
	V(f64),
	C0([f64; 2]),
	C1(Vec<[f64; 2]>),
	C2(Vec<Vec<[f64; 2]>>),
	C3(Vec<Vec<Vec<[f64; 2]>>>),
}

impl TemporaryCoordinates {
	pub fn unwrap_v(self) -> f64 {
		match self {
			TemporaryCoordinates::V(v) => v,
			_ => panic!("coordinate is not a single value"),
		}
	}
	pub fn unwrap_c0(self) -> [f64; 2] {
		match self {
			TemporaryCoordinates::C0(v) => v,
			_ => panic!("coordinates are not a point"),
		}
	}
	pub fn unwrap_c1(self) -> Vec<[f64; 2]> {
		match self {
			TemporaryCoordinates::C1(v) => v,
			_ => panic!("coordinates are not an array of points"),
		}
	}
	pub fn unwrap_c2(self) -> Vec<Vec<[f64; 2]>> {
		match self {
			TemporaryCoordinates::C2(v) => v,
			_ => panic!("coordinates are not an array of an array of points"),
		}
	}
	pub fn unwrap_c3(self) -> Vec<Vec<Vec<[f64; 2]>>> {
		match self {
			TemporaryCoordinates::C3(v) => v,
			_ => panic!("coordinates are not an array of an array of an array of points"),
		}
	}
}

/// Recursively parses GeoJSON `coordinates` arrays to the appropriate nesting level.
///
/// Enforces GeoJSON shape constraints (e.g., points are two numbers, no empty arrays,
/// bounded nesting depth for multi-geometries) and returns a temporary accumulator that
/// is later converted to concrete geometry types.
fn parse_geojson_coordinates(value: &Value) -> Result<TemporaryCoordinates> {
	use TemporaryCoordinates::{C0, C1, C2, C3, V};

	match value {
		Value::Number(_) => Ok(V(value.as_f64().ok_or_else(|| anyhow!("invalid coordinate number"))?)),
		Value::Array(items) => {
			if items.is_empty() {
				bail!("empty arrays are not allowed in coordinates")
			}

			let list = items.iter().map(parse_geojson_coordinates).collect::<Result<Vec<_>>>()?;

			Ok(match list.first().unwrap() {
				V(_) => {
					if list.len() != 2 {
						bail!("points in coordinates must have exactly two values")
					}
					C0(list
						.into_iter()
						.map(TemporaryCoordinates::unwrap_v)
						.collect::<Vec<f64>>()
						.try_into()
						.unwrap_or_else(|v: Vec<f64>| panic!("Expected a Vec of length 2 but it was {}", v.len())))
				}
				C0(_) => C1(list.into_iter().map(TemporaryCoordinates::unwrap_c0).collect()),
				C1(_) => C2(list.into_iter().map(TemporaryCoordinates::unwrap_c1).collect()),
				C2(_) => C3(list.into_iter().map(TemporaryCoordinates::unwrap_c2).collect()),
				C3(_) => bail!("coordinates are nested too deep"),
			})
		}
		other => bail!("expected an array or number while parsing coordinates, found a {}", type_name(other)),
	}
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn test_parse_geojson_valid_feature_collection() -> Result<()> {
		let json = r#"{
			"type": "FeatureCollection",
			"features": [
				{"type":"Feature","geometry":{"type":"Point","coordinates":[1,2]},"properties":{"p":"v"}}
			]
		}"#;

		let collection = parse_geojson(json)?;
		assert_eq!(collection.features.len(), 1);

		let feature = &collection.features[0];
		assert_eq!(feature.geometry.type_name(), "Point");
		if let Geometry::Point(coords) = &feature.geometry {
			assert_eq!(coords.x(), 1.0);
			assert_eq!(coords.y(), 2.0);
		}
		assert_eq!(feature.properties.get("p"), Some(&GeoValue::String("v".to_string())));

		Ok(())
	}

	#[test]
	fn test_parse_geojson_invalid_type() {
		let json = r#"{"type": "InvalidCollection", "features": []}"#;
		assert!(parse_geojson(json).is_err());
	}

	#[test]
	fn test_parse_geojson_missing_geometry() {
		let json = r#"{
			"type": "FeatureCollection",
			"features": [{"type": "Feature", "properties": {"prop0": "value0"}}]
		}"#;
		assert!(parse_geojson(json).is_err());
	}

	#[test]
	fn test_parse_geojson_empty_features() -> Result<()> {
		let json = r#"{"type": "FeatureCollection", "features": []}"#;
		let collection = parse_geojson(json)?;
		assert!(collection.features.is_empty());
		Ok(())
	}

	#[test]
	fn test_parse_geojson_invalid_json() {
		let json = r#"{
			"type": "FeatureCollection",
			"features": [
				{"type": "Feature", "geometry": {"type": "Point", "coordinates": [102.0, 0.5]}, "properties": {"prop0": "value0"}},
			]
		"#; // Note the trailing comma and unclosed brace
		assert!(parse_geojson(json).is_err());
	}

	#[test]
	fn test_parse_geojson_with_id() -> Result<()> {
		let json = r#"{
			"type": "FeatureCollection",
			"features": [{
				"type": "Feature",
				"id": "feature1",
				"geometry": {"type": "Point", "coordinates": [102.0, 0.5]},
				"properties": {"prop0": "value0"}
			}]
		}"#;

		let collection = parse_geojson(json)?;
		assert_eq!(collection.features.len(), 1);
		assert_eq!(collection.features[0].id, Some(GeoValue::String("feature1".to_string())));
		Ok(())
	}

	#[test]
	fn test_parse_geojson_numeric_id() -> Result<()> {
		let json = r#"{
		"type":"FeatureCollection",
		"features":[{
			"type":"Feature","id":123,
			"geometry":{"type":"Point","coordinates":[1,2]},"properties":{}
		}]}"#;
		let collection = parse_geojson(json)?;
		assert_eq!(collection.features[0].id, Some(GeoValue::UInt(123)));
		Ok(())
	}

	#[test]
	fn test_parse_geojson_boolean_null_properties() -> Result<()> {
		let json = r#"{
		"type":"FeatureCollection",
		"features":[{
			"type":"Feature","geometry":{"type":"Point","coordinates":[0,0]},"properties":{"b":true,"n":null}
		}]}"#;
		let collection = parse_geojson(json)?;
		let props = &collection.features[0].properties;
		assert_eq!(props.get("b"), Some(&GeoValue::Bool(true)));
		assert_eq!(props.get("n"), Some(&GeoValue::Null));
		Ok(())
	}

	#[test]
	fn test_parse_geojson_line_string() -> Result<()> {
		let json = r#"{
		"type":"FeatureCollection",
		"features":[{
			"type":"Feature","geometry":{"type":"LineString","coordinates":[[0,0],[1,1]]},"properties":{}
		}]}"#;
		let collection = parse_geojson(json)?;
		assert_eq!(collection.features[0].geometry.type_name(), "LineString");
		Ok(())
	}

	#[test]
	fn test_parse_geojson_polygon() -> Result<()> {
		let json = r#"{
		"type":"FeatureCollection",
		"features":[{
			"type":"Feature","geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,1],[0,0]]]},"properties":{}
		}]}"#;
		let collection = parse_geojson(json)?;
		assert_eq!(collection.features[0].geometry.type_name(), "Polygon");
		Ok(())
	}

	#[test]
	fn test_parse_geojson_multipoint() -> Result<()> {
		let json = r#"{
		"type":"FeatureCollection",
		"features":[{
			"type":"Feature","geometry":{"type":"MultiPoint","coordinates":[[1,2],[3,4]]},"properties":{}
		}]}"#;
		let collection = parse_geojson(json)?;
		assert_eq!(collection.features[0].geometry.type_name(), "MultiPoint");
		Ok(())
	}

	#[test]
	fn test_parse_geojson_multilinestring() -> Result<()> {
		let json = r#"{
		"type":"FeatureCollection",
		"features":[{
			"type":"Feature","geometry":{"type":"MultiLineString","coordinates":[[[0,0],[1,1]],[[2,2],[3,3]]]},"properties":{}
		}]}"#;
		let collection = parse_geojson(json)?;
		assert_eq!(collection.features[0].geometry.type_name(), "MultiLineString");
		Ok(())
	}

	#[test]
	fn test_parse_geojson_multipolygon() -> Result<()> {
		let json = r#"{
		"type":"FeatureCollection",
		"features":[{
			"type":"Feature","geometry":{"type":"MultiPolygon","coordinates":[[[[0,0],[1,0],[1,1],[0,1],[0,0]]]]},"properties":{}
		}]}"#;
		let collection = parse_geojson(json)?;
		assert_eq!(collection.features[0].geometry.type_name(), "MultiPolygon");
		Ok(())
	}

	#[test]
	fn test_parse_geojson_unknown_geometry_type_feature() {
		let json = r#"{
		"type":"FeatureCollection",
		"features":[{
			"type":"Feature","geometry":{"type":"Unknown","coordinates":[0,0]},"properties":{}
		}]}"#;
		assert!(parse_geojson(json).is_err());
	}

	#[test]
	fn test_parse_geojson_number_variants() -> Result<()> {
		let cases = vec![
			(json!(123), GeoValue::UInt(123)),
			(json!(-456), GeoValue::Int(-456)),
			(json!(47.11), GeoValue::from(47.11_f64)),
		];
		for (value, expected) in cases {
			assert_eq!(parse_geojson_number(&value)?, expected);
		}
		Ok(())
	}

	#[test]
	fn test_parse_geojson_false_boolean() -> Result<()> {
		let json = r#"{
		"type":"FeatureCollection",
		"features":[{
			"type":"Feature","geometry":{"type":"Point","coordinates":[0,0]},"properties":{"flag":false}
		}]}"#;
		let collection = parse_geojson(json)?;
		let props = &collection.features[0].properties;
		assert_eq!(props.get("flag"), Some(&GeoValue::Bool(false)));
		Ok(())
	}

	#[test]
	fn test_parse_geojson_negative_number_property() -> Result<()> {
		let json = r#"{
		"type":"FeatureCollection",
		"features":[{
			"type":"Feature","geometry":{"type":"Point","coordinates":[0,0]},"properties":{"val":-42}
		}]}"#;
		let collection = parse_geojson(json)?;
		let props = &collection.features[0].properties;
		assert_eq!(props.get("val"), Some(&GeoValue::Int(-42)));
		Ok(())
	}

	#[test]
	fn test_parse_geojson_float_property() -> Result<()> {
		let json = r#"{
		"type":"FeatureCollection",
		"features":[{
			"type":"Feature","geometry":{"type":"Point","coordinates":[0,0]},"properties":{"val":47.11}
		}]}"#;
		let collection = parse_geojson(json)?;
		let props = &collection.features[0].properties;
		assert_eq!(props.get("val"), Some(&GeoValue::Double(47.11)));
		Ok(())
	}

	#[test]
	fn test_parse_geojson_missing_feature_type() {
		let json = r#"{
		"type":"FeatureCollection",
		"features":[{
			"geometry":{"type":"Point","coordinates":[0,0]},"properties":{}
		}]}"#;
		assert!(parse_geojson(json).is_err());
	}

	#[test]
	fn test_parse_geojson_missing_geometry_type() {
		let json = r#"{
		"type":"FeatureCollection",
		"features":[{
			"type":"Feature","geometry":{"coordinates":[0,0]},"properties":{}
		}]}"#;
		assert!(parse_geojson(json).is_err());
	}

	#[test]
	fn test_parse_geojson_missing_coordinates() {
		let json = r#"{
		"type":"FeatureCollection",
		"features":[{
			"type":"Feature","geometry":{"type":"Point"},"properties":{}
		}]}"#;
		assert!(parse_geojson(json).is_err());
	}

	#[test]
	fn test_parse_geojson_empty_coordinates_array() {
		let json = r#"{
		"type":"FeatureCollection",
		"features":[{
			"type":"Feature","geometry":{"type":"LineString","coordinates":[]},"properties":{}
		}]}"#;
		assert!(parse_geojson(json).is_err());
	}

	#[test]
	fn test_parse_geojson_wrong_point_dimensions() {
		let json = r#"{
		"type":"FeatureCollection",
		"features":[{
			"type":"Feature","geometry":{"type":"Point","coordinates":[1,2,3]},"properties":{}
		}]}"#;
		assert!(parse_geojson(json).is_err());
	}

	#[test]
	fn test_parse_geojson_single_point_dimension() {
		let json = r#"{
		"type":"FeatureCollection",
		"features":[{
			"type":"Feature","geometry":{"type":"Point","coordinates":[1]},"properties":{}
		}]}"#;
		assert!(parse_geojson(json).is_err());
	}

	#[test]
	fn test_parse_geojson_unknown_members_ignored() -> Result<()> {
		let json = r#"{
		"type":"FeatureCollection",
		"name":"test",
		"crs":{"type":"name","properties":{}},
		"features":[{
			"type":"Feature",
			"extra":"ignored",
			"geometry":{"type":"Point","coordinates":[1,2],"bbox":[1,2,1,2]},
			"properties":{}
		}]}"#;
		let collection = parse_geojson(json)?;
		assert_eq!(collection.features.len(), 1);
		Ok(())
	}

	#[test]
	fn test_parse_geojson_invalid_id_character() {
		let result = parse_geojson_id(&json!([1, 2]));
		assert!(result.is_err());
	}

	#[test]
	fn test_parse_geojson_invalid_value_character() {
		let result = parse_geojson_value(&json!([1, 2]));
		assert!(result.is_err());
	}

	#[test]
	fn test_parse_geojson_invalid_coordinate_character() {
		let result = parse_geojson_coordinates(&json!("invalid"));
		assert!(result.is_err());
	}

	#[test]
	fn test_parse_geojson_negative_float_coordinates() -> Result<()> {
		let json = r#"{
		"type":"FeatureCollection",
		"features":[{
			"type":"Feature","geometry":{"type":"Point","coordinates":[-1.5,-2.5]},"properties":{}
		}]}"#;
		let collection = parse_geojson(json)?;
		if let Geometry::Point(coords) = &collection.features[0].geometry {
			assert_eq!(coords.x(), -1.5);
			assert_eq!(coords.y(), -2.5);
		}
		Ok(())
	}
}
