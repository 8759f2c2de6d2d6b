use super::{stringify, stringify_pretty_multi_line, stringify_pretty_single_line, JsonValue};
use anyhow::Result;
use std::fmt::Debug;

/// A JSON array, backed by a `Vec<JsonValue>`.
#[derive(Clone, Default, PartialEq)]
pub struct JsonArray(pub Vec<JsonValue>);

impl JsonArray {
	/// Serialize the JSON array to a compact string without extra whitespace.
	pub fn stringify(&self) -> String {
		let items = self.0.iter().map(stringify).collect::<Vec<_>>();
		format!("[{}]", items.join(","))
	}

	/// Serialize the array to a single-line, pretty-printed string with spaces.
	pub fn stringify_pretty_single_line(&self) -> String {
		let items = self.0.iter().map(stringify_pretty_single_line).collect::<Vec<_>>();
		format!("[ {} ]", items.join(", "))
	}

	/// Serialize the array to a multi-line, pretty-printed string.
	pub fn stringify_pretty_multi_line(&self, max_width: usize, depth: usize) -> String {
		let indent = "  ".repeat(depth);
		let items = self
			.0
			.iter()
			.map(|value| format!("{indent}  {}", stringify_pretty_multi_line(value, max_width, depth + 1, depth * 2 + 2)))
			.collect::<Vec<_>>();
		format!("[\n{}\n{}]", items.join(",\n"), indent)
	}

	/// Convert all elements to Rust `String`s, returning an error if any element is not a string.
	pub fn as_string_vec(&self) -> Result<Vec<String>> {
		self.0.iter().map(JsonValue::as_string).collect::<Result<Vec<_>>>()
	}

	/// Get a reference to the underlying `Vec<JsonValue>`.
	pub fn as_vec(&self) -> &Vec<JsonValue> {
		&self.0
	}
}

impl Debug for JsonArray {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{:?}", self.0)
	}
}

impl<T> From<Vec<T>> for JsonArray
where
	JsonValue: From<T>,
{
	fn from(input: Vec<T>) -> Self {
		JsonArray(Vec::from_iter(input.into_iter().map(JsonValue::from)))
	}
}

impl<T> From<&Vec<T>> for JsonArray
where
	JsonValue: From<T>,
	T: Clone,
{
	fn from(input: &Vec<T>) -> Self {
		JsonArray(Vec::from_iter(input.iter().map(|v| JsonValue::from(v.clone()))))
	}
}

impl<T, const N: usize> From<&[T; N]> for JsonArray
where
	JsonValue: From<T>,
	T: Copy,
{
	fn from(input: &[T; N]) -> Self {
		JsonArray(Vec::from_iter(input.iter().map(|v| JsonValue::from(*v))))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_stringify() {
		let array = JsonArray(vec![JsonValue::from("hello"), JsonValue::from(42.0), JsonValue::from(true)]);
		assert_eq!(array.stringify(), r#"["hello",42,true]"#);
	}

	#[test]
	fn test_as_string_vec() -> Result<()> {
		let array = JsonArray::from(vec!["hello", "world"]);
		assert_eq!(array.as_string_vec()?, vec!["hello", "world"]);
		Ok(())
	}

	#[test]
	fn test_from_array_ref() {
		let slice = [4, 5, 6];
		let arr = JsonArray::from(&slice);
		assert_eq!(arr.0, vec![JsonValue::from(4), JsonValue::from(5), JsonValue::from(6)]);
	}
}
