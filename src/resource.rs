//! Typed endpoint descriptors and the decode helpers resource modules build on.
//!
//! Resource code declares each endpoint once as a `const` [`Endpoint`] and turns it into an
//! [`ApiRequest`] per call. The helpers on [`Client`] cover the three response shapes the
//! remote service uses: a single payload ([`Client::call`]), a detail lookup that may be
//! empty ([`Client::one`]), and offset-paginated lists ([`Client::list`], [`Client::list_all`]).
//!
//! ```
//! use lingxing_client::{http::HttpMethod, page::PagePolicy, resource::Endpoint};
//!
//! const LIST_SELLERS: Endpoint =
//! 	Endpoint::get("/data/seller/lists").with_paging(PagePolicy::ItemCount);
//!
//! let request = LIST_SELLERS.request().query("sid", 7);
//!
//! assert_eq!(request.method, HttpMethod::Get);
//! assert_eq!(request.paging, PagePolicy::ItemCount);
//! ```

// self
use crate::{
	_prelude::*,
	client::Client,
	dispatch::ApiRequest,
	http::{ApiHttpClient, HttpMethod},
	page::{Page, PageCursor, PagePolicy},
};

/// Body (or query, for `GET`) field carrying the page offset.
pub const OFFSET_FIELD: &str = "offset";
/// Body (or query, for `GET`) field carrying the page size.
pub const LENGTH_FIELD: &str = "length";

/// Static description of one remote endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Endpoint {
	/// Verb.
	pub method: HttpMethod,
	/// Path relative to the resource base path.
	pub path: &'static str,
	/// End-of-list detection honored by the endpoint.
	pub paging: PagePolicy,
}
impl Endpoint {
	/// `POST` endpoint using the default paging policy.
	pub const fn post(path: &'static str) -> Self {
		Self { method: HttpMethod::Post, path, paging: PagePolicy::TotalCount }
	}

	/// `GET` endpoint using the default paging policy.
	pub const fn get(path: &'static str) -> Self {
		Self { method: HttpMethod::Get, path, paging: PagePolicy::TotalCount }
	}

	/// Overrides the paging policy.
	pub const fn with_paging(mut self, paging: PagePolicy) -> Self {
		self.paging = paging;

		self
	}

	/// Starts a request for this endpoint.
	pub fn request(&self) -> ApiRequest {
		ApiRequest::new(self.method, self.path).paging(self.paging)
	}
}

impl<C> Client<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Dispatches `request` and decodes the whole `data` payload into `T`.
	pub async fn call<T>(&self, request: ApiRequest) -> Result<T>
	where
		T: DeserializeOwned,
	{
		self.execute(request).await?.decode()
	}

	/// Dispatches a detail lookup.
	///
	/// Returns [`Error::NotFound`] when `data` is empty; when `data` is an array the first
	/// element is decoded.
	pub async fn one<T>(&self, request: ApiRequest) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let mut envelope = self.execute(request).await?;

		if envelope.is_empty() {
			return Err(Error::NotFound);
		}

		envelope.data = match envelope.data.take() {
			Value::Array(mut items) => items.swap_remove(0),
			other => other,
		};

		envelope.decode()
	}

	/// Fetches the page at `cursor` (normalized into the configured bounds).
	pub async fn list<T>(&self, request: ApiRequest, cursor: PageCursor) -> Result<Page<T>>
	where
		T: DeserializeOwned,
	{
		let tracker = self.pages();
		let cursor = tracker.normalize(cursor);
		let policy = request.paging;
		let request = with_cursor(request, cursor);
		let envelope = self.execute(request).await?;
		let items = match envelope.data {
			Value::Null => Vec::new(),
			_ => envelope.decode::<Vec<T>>()?,
		};
		let step = tracker.advance_with(policy, cursor, items.len(), envelope.total);

		Ok(Page {
			items,
			total: envelope.total,
			cursor,
			next: step.next,
			is_last_page: step.is_last_page,
		})
	}

	/// Walks every page starting from the first one and concatenates the items.
	pub async fn list_all<T>(&self, request: ApiRequest) -> Result<Vec<T>>
	where
		T: DeserializeOwned,
	{
		let mut cursor = self.pages().first();
		let mut items = Vec::new();

		loop {
			let page = self.list::<T>(request.clone(), cursor).await?;

			items.extend(page.items);

			if page.is_last_page {
				return Ok(items);
			}

			cursor = page.next;
		}
	}
}

fn with_cursor(request: ApiRequest, cursor: PageCursor) -> ApiRequest {
	match request.method {
		HttpMethod::Post =>
			request.body_field(OFFSET_FIELD, cursor.offset).body_field(LENGTH_FIELD, cursor.limit),
		HttpMethod::Get =>
			request.query(OFFSET_FIELD, cursor.offset).query(LENGTH_FIELD, cursor.limit),
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	const ORDERS: Endpoint = Endpoint::post("/data/orders");

	#[test]
	fn cursor_fields_follow_the_method() {
		let post = with_cursor(ORDERS.request(), PageCursor::new(40, 20));

		assert_eq!(post.body.get(OFFSET_FIELD), Some(&json!(40)));
		assert_eq!(post.body.get(LENGTH_FIELD), Some(&json!(20)));
		assert!(post.query.is_empty());

		let get = with_cursor(
			Endpoint::get("/data/shops").with_paging(PagePolicy::ItemCount).request(),
			PageCursor::new(0, 5),
		);

		assert_eq!(get.query.get(LENGTH_FIELD), Some(&json!(5)));
		assert_eq!(get.paging, PagePolicy::ItemCount);
		assert!(get.body.is_empty());
	}
}
