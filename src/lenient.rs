//! Per-field lenient decoders for loosely typed remote payloads.
//!
//! The remote service is inconsistent about scalar encodings: the same code or count may
//! arrive as `200` or `"200"`, and flags as `true`, `1`, or `"1"`. Each module here is a
//! `#[serde(with = "...")]` rule applied to exactly the fields that need it.
//!
//! ```
//! use lingxing_client::lenient;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Row {
//! 	#[serde(with = "lenient::int")]
//! 	code: i64,
//! 	#[serde(default, with = "lenient::flag")]
//! 	enabled: bool,
//! }
//!
//! let row: Row = serde_json::from_str(r#"{"code":"200","enabled":"1"}"#).unwrap();
//!
//! assert_eq!(row.code, 200);
//! assert!(row.enabled);
//! ```

// crates.io
use serde::{Deserializer, Serializer, de::Error as DeError};
// self
use crate::_prelude::*;

fn int_from_value<E>(value: &Value) -> Result<Option<i64>, E>
where
	E: DeError,
{
	match value {
		Value::Null => Ok(None),
		Value::Number(n) => n
			.as_i64()
			.or_else(|| n.as_f64().filter(|f| f.fract() == 0.).map(|f| f as i64))
			.map(Some)
			.ok_or_else(|| E::custom(format!("number {n} is not an integer"))),
		Value::String(s) => {
			let trimmed = s.trim();

			if trimmed.is_empty() {
				return Ok(None);
			}

			trimmed
				.parse::<i64>()
				.map(Some)
				.map_err(|_| E::custom(format!("string `{s}` is not an integer")))
		},
		Value::Bool(b) => Ok(Some(i64::from(*b))),
		other => Err(E::custom(format!("expected an integer, found {other}"))),
	}
}

/// Integer that may be encoded as a JSON number or a numeric string.
///
/// `null` and blank strings decode to `0`.
pub mod int {
	// self
	use super::*;

	/// Serializes as a plain JSON number.
	pub fn serialize<S>(value: &i64, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_i64(*value)
	}

	/// Accepts a number, a numeric string, a boolean, or `null`.
	pub fn deserialize<'de, D>(deserializer: D) -> Result<i64, D::Error>
	where
		D: Deserializer<'de>,
	{
		let value = Value::deserialize(deserializer)?;

		Ok(int_from_value(&value)?.unwrap_or_default())
	}
}

/// Integer with the same encodings as [`int`] that must be present.
///
/// `null`, blank strings, and non-numeric text are decode errors instead of `0`.
pub mod required_int {
	// self
	use super::*;

	/// Serializes as a plain JSON number.
	pub fn serialize<S>(value: &i64, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_i64(*value)
	}

	/// Accepts a number, a numeric string, or a boolean.
	pub fn deserialize<'de, D>(deserializer: D) -> Result<i64, D::Error>
	where
		D: Deserializer<'de>,
	{
		let value = Value::deserialize(deserializer)?;

		int_from_value(&value)?
			.ok_or_else(|| D::Error::custom(format!("expected an integer, found `{value}`")))
	}
}

/// Optional integer with the same encodings as [`int`]; `null` and blank strings are `None`.
pub mod opt_int {
	// self
	use super::*;

	/// Serializes as a JSON number or `null`.
	pub fn serialize<S>(value: &Option<i64>, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		match value {
			Some(v) => serializer.serialize_some(v),
			None => serializer.serialize_none(),
		}
	}

	/// Accepts a number, a numeric string, a boolean, or `null`.
	pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
	where
		D: Deserializer<'de>,
	{
		let value = Value::deserialize(deserializer)?;

		int_from_value(&value)
	}
}

/// Boolean that may be encoded as `true`/`false`, `0`/`1`, or their string forms.
pub mod flag {
	// self
	use super::*;

	/// Serializes as a plain JSON boolean.
	pub fn serialize<S>(value: &bool, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_bool(*value)
	}

	/// Accepts booleans, `0`/`1`, and `"0"`/`"1"`/`"true"`/`"false"` (case-insensitive).
	pub fn deserialize<'de, D>(deserializer: D) -> Result<bool, D::Error>
	where
		D: Deserializer<'de>,
	{
		match Value::deserialize(deserializer)? {
			Value::Null => Ok(false),
			Value::Bool(b) => Ok(b),
			Value::Number(n) => match n.as_i64() {
				Some(0) => Ok(false),
				Some(1) => Ok(true),
				_ => Err(D::Error::custom(format!("number {n} is not a flag"))),
			},
			Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
				"" | "0" | "false" => Ok(false),
				"1" | "true" => Ok(true),
				_ => Err(D::Error::custom(format!("string `{s}` is not a flag"))),
			},
			other => Err(D::Error::custom(format!("expected a flag, found {other}"))),
		}
	}
}

/// Optional text that may arrive as a string or a bare number.
///
/// Blank strings and `null` decode to `None`.
pub mod opt_text {
	// self
	use super::*;

	/// Serializes as a JSON string or `null`.
	pub fn serialize<S>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		match value {
			Some(v) => serializer.serialize_some(v),
			None => serializer.serialize_none(),
		}
	}

	/// Accepts strings, numbers, booleans, or `null`.
	pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
	where
		D: Deserializer<'de>,
	{
		match Value::deserialize(deserializer)? {
			Value::Null => Ok(None),
			Value::String(s) if s.trim().is_empty() => Ok(None),
			Value::String(s) => Ok(Some(s)),
			Value::Number(n) => Ok(Some(n.to_string())),
			Value::Bool(b) => Ok(Some(b.to_string())),
			other => Err(D::Error::custom(format!("expected text, found {other}"))),
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[derive(Debug, Deserialize)]
	struct Sample {
		#[serde(default, with = "int")]
		code: i64,
		#[serde(default, with = "opt_int")]
		total: Option<i64>,
		#[serde(default, with = "flag")]
		enabled: bool,
		#[serde(default, with = "opt_text")]
		request_id: Option<String>,
	}

	fn parse(raw: &str) -> Result<Sample, serde_json::Error> {
		serde_json::from_str(raw)
	}

	#[test]
	fn integers_accept_numbers_and_numeric_strings() {
		let sample = parse(r#"{"code":"200","total":"17"}"#).expect("Numeric strings should decode.");

		assert_eq!(sample.code, 200);
		assert_eq!(sample.total, Some(17));

		let sample = parse(r#"{"code":2001003,"total":3.0}"#).expect("Numbers should decode.");

		assert_eq!(sample.code, 2001003);
		assert_eq!(sample.total, Some(3));

		let sample = parse(r#"{"code":null,"total":""}"#).expect("Blank values should decode.");

		assert_eq!(sample.code, 0);
		assert_eq!(sample.total, None);
		assert!(parse(r#"{"code":"abc"}"#).is_err());
		assert!(parse(r#"{"total":1.5}"#).is_err());
	}

	#[test]
	fn required_integers_reject_blank_values() {
		#[derive(Debug, Deserialize)]
		struct Strict {
			#[serde(with = "required_int")]
			code: i64,
		}

		let strict = |raw: &str| serde_json::from_str::<Strict>(raw);

		assert_eq!(strict(r#"{"code":"0"}"#).expect("Numeric strings should decode.").code, 0);
		assert_eq!(strict(r#"{"code":2001003}"#).expect("Numbers should decode.").code, 2001003);

		for raw in [r#"{"code":null}"#, r#"{"code":""}"#, r#"{"code":" "}"#, r#"{"code":"ok"}"#, "{}"] {
			assert!(strict(raw).is_err(), "{raw}");
		}
	}

	#[test]
	fn flags_accept_common_encodings() {
		for (raw, expected) in [
			(r#"{"enabled":true}"#, true),
			(r#"{"enabled":1}"#, true),
			(r#"{"enabled":"1"}"#, true),
			(r#"{"enabled":"TRUE"}"#, true),
			(r#"{"enabled":0}"#, false),
			(r#"{"enabled":"false"}"#, false),
			(r#"{}"#, false),
		] {
			assert_eq!(parse(raw).expect("Flag should decode.").enabled, expected, "{raw}");
		}

		assert!(parse(r#"{"enabled":2}"#).is_err());
		assert!(parse(r#"{"enabled":"yes"}"#).is_err());
	}

	#[test]
	fn text_accepts_numbers() {
		let sample = parse(r#"{"request_id":12345}"#).expect("Numeric text should decode.");

		assert_eq!(sample.request_id.as_deref(), Some("12345"));
		assert_eq!(parse(r#"{"request_id":" "}"#).expect("Blank text should decode.").request_id, None);
	}
}
