use super::JsonValue;

pub fn stringify(json: &JsonValue) -> String {
	match json {
		JsonValue::String(s) => format!("\"{}\"", escape_json_string(s)),
		JsonValue::Number(n) => n.to_string(),
		JsonValue::Boolean(b) => b.to_string(),
		JsonValue::Null => String::from("null"),
		JsonValue::Array(arr) => arr.stringify(),
		JsonValue::Object(obj) => obj.stringify(),
	}
}

pub fn stringify_pretty_single_line(json: &JsonValue) -> String {
	match json {
		JsonValue::Array(arr) => arr.stringify_pretty_single_line(),
		JsonValue::Object(obj) => obj.stringify_pretty_single_line(),
		_ => stringify(json),
	}
}

pub fn stringify_pretty_multi_line(json: &JsonValue, max_width: usize, depth: usize, indention: usize) -> String {
	match json {
		JsonValue::Array(arr) => {
			let single_line = arr.stringify_pretty_single_line();
			if single_line.len() + indention <= max_width {
				return single_line;
			}
			arr.stringify_pretty_multi_line(max_width, depth)
		}
		JsonValue::Object(obj) => {
			let single_line = obj.stringify_pretty_single_line();
			if single_line.len() + indention <= max_width {
				return single_line;
			}
			obj.stringify_pretty_multi_line(max_width, depth)
		}
		_ => stringify(json),
	}
}

pub fn escape_json_string(input: &str) -> String {
	input
		.chars()
		.map(|c| match c {
			'"' => "\\\"".to_string(),
			'\\' => "\\\\".to_string(),
			'\n' => "\\n".to_string(),
			'\r' => "\\r".to_string(),
			'\t' => "\\t".to_string(),
			'\u{08}' => "\\b".to_string(),
			'\u{0c}' => "\\f".to_string(),
			c if c.is_control() => format!("\\u{:04x}", c as u32),
			c => c.to_string(),
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use super::super::JsonArray;

	#[test]
	fn test_as_string_primitives() {
		assert_eq!(stringify(&JsonValue::Number(42.0)), "42");
		assert_eq!(stringify(&JsonValue::Boolean(true)), "true");
		assert_eq!(stringify(&JsonValue::Null), "null");
	}

	#[test]
	fn test_escape_json_string_control() {
		let input = "Control:\x01\x02";
		assert_eq!(escape_json_string(input), "Control:\\u0001\\u0002");
	}

	#[test]
	fn test_pretty_single_line_array() {
		let json = JsonValue::Array(JsonArray(vec![JsonValue::Number(1.0), JsonValue::Number(2.0), JsonValue::Number(3.0)]));
		assert_eq!(stringify_pretty_single_line(&json), "[ 1, 2, 3 ]");
	}

	#[test]
	fn test_stringify_pretty_multi_line_array() {
		let json = JsonValue::Array(JsonArray(vec![
			JsonValue::from("alpha"),
			JsonValue::from("beta"),
			JsonValue::from("gamma"),
		]));
		let result = stringify_pretty_multi_line(&json, 5, 0, 0);
		let expected = "[\n  \"alpha\",\n  \"beta\",\n  \"gamma\"\n]";
		assert_eq!(result, expected);
	}
}
