//! Response envelope parsing and the single place remote codes become typed errors.

// self
use crate::{
	_prelude::*,
	code::ApiCode,
	error::{ApiError, TransientError, TransportError},
	http::HttpResponse,
	lenient,
};

/// Boilerplate stripped from `error_details` entries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DetailFormat {
	/// Leading label removed from each entry.
	pub label: String,
	/// Everything from this token onwards is dropped.
	pub separator: String,
}
impl Default for DetailFormat {
	fn default() -> Self {
		Self { label: "错误信息：".into(), separator: "; nested exception is".into() }
	}
}
impl DetailFormat {
	/// Strips the label and truncates at the separator.
	pub fn clean<'a>(&self, raw: &'a str) -> &'a str {
		let mut text = raw.trim();

		if !self.label.is_empty() {
			text = text.strip_prefix(self.label.as_str()).unwrap_or(text).trim_start();
		}
		if let Some(idx) = text.find(self.separator.as_str()).filter(|_| !self.separator.is_empty()) {
			text = &text[..idx];
		}

		text.trim()
	}

	/// Flattens every supported `error_details` shape into one message.
	///
	/// Accepts a bare string, an array of strings, or an array of objects carrying a
	/// `message`/`msg` field.
	pub fn summarize(&self, details: &Value) -> String {
		let mut parts = Vec::new();

		collect_details(details, &mut parts);

		parts
			.iter()
			.map(|part| self.clean(part))
			.filter(|part| !part.is_empty())
			.collect::<Vec<_>>()
			.join("; ")
	}
}

fn collect_details(details: &Value, out: &mut Vec<String>) {
	match details {
		Value::Null => {},
		Value::String(s) => out.push(s.clone()),
		Value::Array(items) => {
			for item in items {
				collect_details(item, out);
			}
		},
		Value::Object(map) => {
			let text = ["message", "msg", "error"]
				.iter()
				.find_map(|key| map.get(*key).and_then(Value::as_str));

			match text {
				Some(text) => out.push(text.to_owned()),
				None => out.push(details.to_string()),
			}
		},
		other => out.push(other.to_string()),
	}
}

#[derive(Debug, Deserialize)]
struct RawEnvelope {
	#[serde(with = "lenient::required_int")]
	code: i64,
	#[serde(default, with = "lenient::opt_text")]
	message: Option<String>,
	#[serde(default, with = "lenient::opt_text")]
	msg: Option<String>,
	#[serde(default)]
	error_details: Value,
	#[serde(default, with = "lenient::opt_text")]
	request_id: Option<String>,
	#[serde(default)]
	data: Value,
	#[serde(default, with = "lenient::opt_int")]
	total: Option<i64>,
}

/// Normalized successful response.
#[derive(Clone, Debug, PartialEq)]
pub struct Envelope {
	/// Success sentinel reported by the server.
	pub code: i64,
	/// Message text, possibly empty.
	pub message: String,
	/// Request identifier echoed by the server.
	pub request_id: Option<String>,
	/// Payload.
	pub data: Value,
	/// Total item count for list endpoints.
	pub total: Option<u64>,
	/// HTTP status the envelope arrived with.
	pub status: u16,
}
impl Envelope {
	/// Decodes [`Self::data`] into `T`, reporting the failing field path on mismatch.
	pub fn decode<T>(&self) -> Result<T>
	where
		T: DeserializeOwned,
	{
		serde_path_to_error::deserialize(&self.data).map_err(|source| {
			TransportError::MalformedEnvelope { source, status: self.status }.into()
		})
	}

	/// Returns `true` when `data` is `null`, an empty array, or an empty object.
	pub fn is_empty(&self) -> bool {
		match &self.data {
			Value::Null => true,
			Value::Array(items) => items.is_empty(),
			Value::Object(map) => map.is_empty(),
			_ => false,
		}
	}
}

/// Turns a raw response into an [`Envelope`] or a classified error.
///
/// - HTTP 429 is a rate-limit error regardless of the body.
/// - A parsable envelope with a non-success code becomes an [`ApiError`].
/// - An unparsable body on a 2xx status is a malformed envelope; on 502/503/504 the gateway
///   is treated as temporarily unavailable; any other status is unexpected.
pub fn interpret(response: &HttpResponse, format: &DetailFormat) -> Result<Envelope> {
	if response.status == 429 {
		return Err(TransientError::RateLimited {
			status: response.status,
			retry_after: response.retry_after,
		}
		.into());
	}

	let mut de = serde_json::Deserializer::from_slice(&response.body);
	let raw = match serde_path_to_error::deserialize::<_, RawEnvelope>(&mut de) {
		Ok(raw) => raw,
		Err(source) =>
			return Err(match response.status {
				200..=299 => TransportError::MalformedEnvelope { source, status: response.status }.into(),
				502..=504 => TransientError::Unavailable {
					status: response.status,
					retry_after: response.retry_after,
				}
				.into(),
				status =>
					TransportError::UnexpectedStatus { status, body_preview: response.body_preview() }
						.into(),
			}),
	};

	if !ApiCode::is_success(raw.code) {
		let summary = format.summarize(&raw.error_details);
		let base = raw.message.or(raw.msg).unwrap_or_default();
		let base = base.trim();
		let message = match (base.is_empty(), summary.is_empty()) {
			(_, true) => base.to_owned(),
			(true, false) => summary,
			(false, false) => format!("{base}: {summary}"),
		};

		return Err(ApiError::new(raw.code, message).with_request_id(raw.request_id).into());
	}
	if !response.is_success() {
		return Err(TransportError::UnexpectedStatus {
			status: response.status,
			body_preview: response.body_preview(),
		}
		.into());
	}

	Ok(Envelope {
		code: raw.code,
		message: raw.message.or(raw.msg).unwrap_or_default(),
		request_id: raw.request_id,
		data: raw.data,
		total: raw.total.and_then(|total| u64::try_from(total).ok()),
		status: response.status,
	})
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;
	use crate::code::ErrorCategory;

	fn response(status: u16, body: Value) -> HttpResponse {
		HttpResponse { status, retry_after: None, body: body.to_string().into_bytes() }
	}

	fn interpret_json(status: u16, body: Value) -> Result<Envelope> {
		interpret(&response(status, body), &DetailFormat::default())
	}

	#[test]
	fn success_envelope_keeps_data_and_total() {
		let envelope =
			interpret_json(200, json!({ "code": 0, "message": "success", "data": [1, 2], "total": "2" }))
				.expect("Success envelope should parse.");

		assert_eq!(envelope.data, json!([1, 2]));
		assert_eq!(envelope.total, Some(2));
		assert_eq!(envelope.message, "success");

		let envelope = interpret_json(200, json!({ "code": "200", "msg": "OK" }))
			.expect("String success code should parse.");

		assert!(envelope.is_empty());
	}

	#[test]
	fn empty_message_falls_back_to_canned_text() {
		let err = interpret_json(200, json!({ "code": 2001003, "msg": "" }))
			.expect_err("Token-expired envelope must fail.");

		assert_eq!(err.api_code(), Some(ApiCode::AccessTokenExpired));
		assert_eq!(err.category(), ErrorCategory::Credential);
		assert!(err.to_string().ends_with(ApiCode::AccessTokenExpired.canned_message()));
	}

	#[test]
	fn error_details_are_normalized_in_every_shape() {
		let format = DetailFormat::default();

		for (details, expected) in [
			(json!("错误信息：sku is required"), "sku is required"),
			(json!(["a failed", "b failed"]), "a failed; b failed"),
			(
				json!([{ "message": "错误信息：x; nested exception is java.lang.Foo" }, { "msg": "y" }]),
				"x; y",
			),
			(json!(null), ""),
		] {
			assert_eq!(format.summarize(&details), expected);
		}

		let err = interpret_json(
			200,
			json!({
				"code": 3001001,
				"message": "bad request",
				"error_details": ["错误信息：sid is required"],
				"request_id": "req-1",
			}),
		)
		.expect_err("Error envelope must fail.");

		match err {
			Error::Api(api) => {
				assert_eq!(api.message, "bad request: sid is required");
				assert_eq!(api.request_id.as_deref(), Some("req-1"));
			},
			other => panic!("Unexpected error: {other:?}."),
		}
	}

	#[test]
	fn status_and_body_failures_are_classified() {
		assert!(matches!(
			interpret_json(429, json!({ "code": 0 })),
			Err(Error::Transient(TransientError::RateLimited { status: 429, .. }))
		));

		let garbage = HttpResponse { status: 200, retry_after: None, body: b"<html>".to_vec() };

		assert!(matches!(
			interpret(&garbage, &DetailFormat::default()),
			Err(Error::Transport(TransportError::MalformedEnvelope { status: 200, .. }))
		));

		let missing_code = interpret_json(200, json!({ "data": [] }));

		assert!(matches!(
			missing_code,
			Err(Error::Transport(TransportError::MalformedEnvelope { .. }))
		));

		let gateway = HttpResponse { status: 503, retry_after: None, body: b"down".to_vec() };

		assert!(matches!(
			interpret(&gateway, &DetailFormat::default()),
			Err(Error::Transient(TransientError::Unavailable { status: 503, .. }))
		));

		let server = HttpResponse { status: 500, retry_after: None, body: b"oops".to_vec() };

		assert!(matches!(
			interpret(&server, &DetailFormat::default()),
			Err(Error::Transport(TransportError::UnexpectedStatus { status: 500, .. }))
		));
		assert!(matches!(
			interpret_json(500, json!({ "code": 0 })),
			Err(Error::Transport(TransportError::UnexpectedStatus { status: 500, .. }))
		));
	}

	#[test]
	fn null_or_blank_code_is_malformed_not_success() {
		for body in [
			json!({ "code": null, "data": [1] }),
			json!({ "code": "", "data": [1] }),
			json!({ "code": "  " }),
		] {
			let result = interpret_json(200, body.clone());

			assert!(
				matches!(
					result,
					Err(Error::Transport(TransportError::MalformedEnvelope { status: 200, .. }))
				),
				"{body} decoded as {result:?}",
			);
		}
	}

	#[test]
	fn decode_reports_field_paths() {
		#[derive(Debug, Deserialize)]
		struct Row {
			#[allow(dead_code)]
			sid: u64,
		}

		let envelope = interpret_json(200, json!({ "code": 0, "data": [{ "sid": "x" }] }))
			.expect("Envelope should parse.");
		let err = envelope.decode::<Vec<Row>>().expect_err("Mismatched data must fail.");

		match err {
			Error::Transport(TransportError::MalformedEnvelope { source, .. }) =>
				assert_eq!(source.path().to_string(), "[0].sid"),
			other => panic!("Unexpected error: {other:?}."),
		}
	}
}
