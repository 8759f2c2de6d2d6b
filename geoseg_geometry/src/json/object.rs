use super::{escape_json_string, stringify, stringify_pretty_multi_line, stringify_pretty_single_line, JsonArray, JsonValue};
use anyhow::Result;
use std::collections::BTreeMap;

/// A JSON object backed by a `BTreeMap<String, JsonValue>`.
#[derive(Clone, Default, PartialEq, Debug)]
pub struct JsonObject(pub BTreeMap<String, JsonValue>);

impl JsonObject {
	#[must_use]
	pub fn new() -> Self {
		Self(BTreeMap::new())
	}

	/// Merge entries from another `JsonObject` into this one, overwriting existing keys.
	pub fn assign(&mut self, object: JsonObject) -> Result<()> {
		for entry in object.0 {
			self.0.insert(entry.0, entry.1);
		}
		Ok(())
	}

	#[must_use]
	pub fn get(&self, key: &str) -> Option<&JsonValue> {
		self.0.get(key)
	}

	pub fn get_string(&self, key: &str) -> Result<Option<String>> {
		self.get(key).map(JsonValue::as_string).transpose()
	}

	pub fn get_object(&self, key: &str) -> Result<Option<&JsonObject>> {
		self.get(key).map(JsonValue::as_object).transpose()
	}

	pub fn get_number(&self, key: &str) -> Result<Option<f64>> {
		self.get(key).map(JsonValue::as_number).transpose()
	}

	pub fn get_array(&self, key: &str) -> Result<Option<&JsonArray>> {
		self.get(key).map(JsonValue::as_array).transpose()
	}

	pub fn get_string_vec(&self, key: &str) -> Result<Option<Vec<String>>> {
		self.get_array(key)?.map(JsonArray::as_string_vec).transpose()
	}

	/// Set the specified key to the given value, converting it into a `JsonValue`.
	pub fn set<T: Clone>(&mut self, key: &str, value: T)
	where
		JsonValue: From<T>,
	{
		self.0.insert(key.to_owned(), JsonValue::from(value));
	}

	/// Set the specified key only if the provided `Option` is `Some`.
	pub fn set_optional<T>(&mut self, key: &str, value: &Option<T>)
	where
		JsonValue: From<T>,
		T: Clone,
	{
		if let Some(v) = value {
			self.0.insert(key.to_owned(), JsonValue::from(v.clone()));
		}
	}

	/// Serialize this `JsonObject` into a compact JSON string without extra whitespace.
	#[must_use]
	pub fn stringify(&self) -> String {
		let items = self
			.0
			.iter()
			.map(|(key, value)| format!("\"{}\":{}", escape_json_string(key), stringify(value)))
			.collect::<Vec<_>>();
		format!("{{{}}}", items.join(","))
	}

	/// Serialize this `JsonObject` into a single-line, pretty-printed JSON string with spaces.
	#[must_use]
	pub fn stringify_pretty_single_line(&self) -> String {
		let items = self
			.0
			.iter()
			.map(|(key, value)| format!("\"{}\": {}", escape_json_string(key), stringify_pretty_single_line(value)))
			.collect::<Vec<_>>();
		format!("{{ {} }}", items.join(", "))
	}

	/// Serialize this `JsonObject` into a multi-line, pretty-printed JSON string.
	#[must_use]
	pub fn stringify_pretty_multi_line(&self, max_width: usize, depth: usize) -> String {
		let indent = "  ".repeat(depth);
		let items = self
			.0
			.iter()
			.map(|(key, value)| {
				format!(
					"{indent}  \"{}\": {}",
					escape_json_string(key),
					stringify_pretty_multi_line(value, max_width, depth + 1, depth * 2 + key.len() + 6)
				)
			})
			.collect::<Vec<_>>();
		format!("{{\n{}\n{}}}", items.join(",\n"), indent)
	}
}

impl<T> From<Vec<(&str, T)>> for JsonObject
where
	JsonValue: From<T>,
{
	fn from(input: Vec<(&str, T)>) -> Self {
		JsonObject(BTreeMap::from_iter(
			input.into_iter().map(|(key, value)| (key.to_string(), JsonValue::from(value))),
		))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_set_and_get() {
		let mut obj = JsonObject::new();
		obj.set("key", "value");
		assert_eq!(obj.get_string("key").unwrap(), Some("value".to_string()));
	}

	#[test]
	fn test_stringify() {
		let obj = JsonObject::from(vec![("key", "value")]);
		assert_eq!(obj.stringify(), r#"{"key":"value"}"#);
	}

	#[test]
	fn test_assign() {
		let mut a = JsonObject::from(vec![("a", "1")]);
		let b = JsonObject::from(vec![("b", "2")]);
		a.assign(b).unwrap();
		assert_eq!(a.get_string("b").unwrap(), Some("2".to_string()));
	}

	#[test]
	fn test_get_number() {
		let mut obj = JsonObject::new();
		obj.set("n", 3.5);
		assert_eq!(obj.get_number("n").unwrap(), Some(3.5));
	}
}
