//! Request builder and caller-side validation helpers.

// self
use crate::{_prelude::*, http::HttpMethod, page::PagePolicy, sign::SignError};

/// Parameters injected by the dispatcher; caller values under these names are replaced.
pub const RESERVED_PARAMS: [&str; 4] = ["app_key", "access_token", "timestamp", "sign"];

/// One logical resource call, independent of any signing or retry state.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
	/// Verb.
	pub method: HttpMethod,
	/// Path relative to the resource base path, starting with `/`.
	pub path: String,
	/// Extra URL query parameters.
	pub query: BTreeMap<String, Value>,
	/// JSON body fields.
	pub body: Map<String, Value>,
	/// End-of-list detection used by list helpers.
	pub paging: PagePolicy,
	/// No retry starts after this instant.
	pub deadline: Option<Instant>,
}
impl ApiRequest {
	/// Creates a request for `path` using `method`.
	pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
		Self {
			method,
			path: path.into(),
			query: BTreeMap::new(),
			body: Map::new(),
			paging: PagePolicy::default(),
			deadline: None,
		}
	}

	/// `POST` request.
	pub fn post(path: impl Into<String>) -> Self {
		Self::new(HttpMethod::Post, path)
	}

	/// `GET` request.
	pub fn get(path: impl Into<String>) -> Self {
		Self::new(HttpMethod::Get, path)
	}

	/// Adds a URL query parameter.
	pub fn query(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.query.insert(key.into(), value.into());

		self
	}

	/// Adds a body field.
	pub fn body_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.body.insert(key.into(), value.into());

		self
	}

	/// Merges every field of `body`, which must serialize to a JSON object.
	pub fn json_body<T>(mut self, body: &T) -> Result<Self>
	where
		T: ?Sized + Serialize,
	{
		match serde_json::to_value(body).map_err(|source| SignError::Encode { source })? {
			Value::Object(map) => {
				self.body.extend(map);

				Ok(self)
			},
			Value::Null => Ok(self),
			other => Err(Error::invalid_input(format!(
				"request body must be a JSON object, got {}",
				json_kind(&other)
			))),
		}
	}

	/// Selects the end-of-list policy.
	pub fn paging(mut self, policy: PagePolicy) -> Self {
		self.paging = policy;

		self
	}

	/// Stops retrying once `deadline` has passed.
	pub fn deadline(mut self, deadline: Instant) -> Self {
		self.deadline = Some(deadline);

		self
	}

	/// Stops retrying once `timeout` has elapsed from now.
	pub fn timeout(self, timeout: StdDuration) -> Self {
		self.deadline(Instant::now() + timeout)
	}

	/// Rejects malformed paths, and body fields on `GET`, before any network call.
	pub fn validate(&self) -> Result<()> {
		if !self.path.starts_with('/') {
			return Err(Error::invalid_input(format!("path `{}` must start with `/`", self.path)));
		}
		if self.path.contains(['?', '#']) {
			return Err(Error::invalid_input(format!(
				"path `{}` must not carry a query or fragment",
				self.path
			)));
		}
		if self.method == HttpMethod::Get && !self.body.is_empty() {
			return Err(Error::invalid_input("GET requests carry parameters in the query, not a body"));
		}

		Ok(())
	}
}

fn json_kind(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "a boolean",
		Value::Number(_) => "a number",
		Value::String(_) => "a string",
		Value::Array(_) => "an array",
		Value::Object(_) => "an object",
	}
}

/// Caller-side validation run before a typed request is dispatched.
pub trait Validate {
	/// Returns [`Error::InvalidInput`] when the request cannot be sent.
	fn validate(&self) -> Result<()>;
}

/// Ensures `start <= end` and the span does not exceed `max_days` (when given).
pub fn ensure_date_range(
	field: &str,
	start: time::Date,
	end: time::Date,
	max_days: Option<i64>,
) -> Result<()> {
	if start > end {
		return Err(Error::invalid_input(format!("{field}: start {start} is after end {end}")));
	}
	if let Some(max_days) = max_days.filter(|max| (end - start).whole_days() > *max) {
		return Err(Error::invalid_input(format!("{field}: range exceeds {max_days} days")));
	}

	Ok(())
}

/// Ensures `value` is one of `allowed`.
pub fn ensure_one_of<T>(field: &str, value: &T, allowed: &[T]) -> Result<()>
where
	T: PartialEq + Debug,
{
	if allowed.contains(value) {
		Ok(())
	} else {
		Err(Error::invalid_input(format!("{field}: {value:?} is not one of {allowed:?}")))
	}
}
