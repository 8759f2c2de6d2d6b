use super::{stringify, JsonArray, JsonObject};
use anyhow::{bail, Result};

/// Represents any JSON data: arrays, objects, numbers, strings, booleans, and null.
#[derive(Clone, Debug, PartialEq)]
pub enum JsonValue {
	Array(JsonArray),
	Boolean(bool),
	Null,
	Number(f64),
	Object(JsonObject),
	String(String),
}

impl JsonValue {
	/// Return the JSON type as a lowercase string (`"array"`, `"object"`, etc.).
	#[must_use]
	pub fn type_as_str(&self) -> &str {
		use JsonValue::*;
		match self {
			Array(_) => "array",
			Boolean(_) => "boolean",
			Null => "null",
			Number(_) => "number",
			Object(_) => "object",
			String(_) => "string",
		}
	}

	/// Serialize the `JsonValue` to a compact JSON string without unnecessary whitespace.
	#[must_use]
	pub fn stringify(&self) -> String {
		stringify(self)
	}

	#[must_use]
	pub fn new_array() -> JsonValue {
		JsonValue::Array(JsonArray::default())
	}

	#[must_use]
	pub fn new_object() -> JsonValue {
		JsonValue::Object(JsonObject::default())
	}

	pub fn as_array(&self) -> Result<&JsonArray> {
		if let JsonValue::Array(array) = self {
			Ok(array)
		} else {
			bail!("expected a JSON array, found a {}", self.type_as_str())
		}
	}

	pub fn into_array(self) -> Result<JsonArray> {
		if let JsonValue::Array(array) = self {
			Ok(array)
		} else {
			bail!("expected a JSON array, found a {}", self.type_as_str())
		}
	}

	pub fn as_object(&self) -> Result<&JsonObject> {
		if let JsonValue::Object(object) = self {
			Ok(object)
		} else {
			bail!("expected a JSON object, found a {}", self.type_as_str())
		}
	}

	pub fn into_object(self) -> Result<JsonObject> {
		if let JsonValue::Object(object) = self {
			Ok(object)
		} else {
			bail!("expected a JSON object, found a {}", self.type_as_str())
		}
	}

	pub fn as_string(&self) -> Result<String> {
		match self {
			JsonValue::String(text) => Ok(text.to_owned()),
			_ => bail!("expected a string, found a {}", self.type_as_str()),
		}
	}

	pub fn as_str(&self) -> Result<&str> {
		match self {
			JsonValue::String(text) => Ok(text),
			_ => bail!("expected a string, found a {}", self.type_as_str()),
		}
	}

	pub fn as_number(&self) -> Result<f64> {
		if let JsonValue::Number(val) = self {
			Ok(*val)
		} else {
			bail!("expected a number, found a {}", self.type_as_str())
		}
	}
}

impl From<&str> for JsonValue {
	fn from(input: &str) -> Self {
		JsonValue::String(input.to_string())
	}
}

impl From<&String> for JsonValue {
	fn from(input: &String) -> Self {
		JsonValue::String(input.to_string())
	}
}

impl From<String> for JsonValue {
	fn from(input: String) -> Self {
		JsonValue::String(input)
	}
}

impl From<bool> for JsonValue {
	fn from(input: bool) -> Self {
		JsonValue::Boolean(input)
	}
}

impl From<&JsonValue> for JsonValue {
	fn from(input: &JsonValue) -> Self {
		input.clone()
	}
}

impl From<f64> for JsonValue {
	fn from(input: f64) -> Self {
		JsonValue::Number(input)
	}
}

impl From<u8> for JsonValue {
	fn from(input: u8) -> Self {
		JsonValue::Number(f64::from(input))
	}
}

impl From<i32> for JsonValue {
	fn from(input: i32) -> Self {
		JsonValue::Number(f64::from(input))
	}
}

impl<I> From<I> for JsonValue
where
	JsonArray: From<I>,
{
	fn from(input: I) -> Self {
		JsonValue::Array(input.into())
	}
}

impl From<JsonObject> for JsonValue {
	fn from(input: JsonObject) -> Self {
		JsonValue::Object(input)
	}
}
