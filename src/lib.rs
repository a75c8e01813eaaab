//! Authenticated request pipeline for the LingXing ERP open API: canonical request signing,
//! self-renewing access tokens, bounded retries, and offset pagination in one crate.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod client;
pub mod code;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod lenient;
pub mod lifecycle;
pub mod oauth;
pub mod obs;
pub mod page;
pub mod resource;
pub mod sign;
pub mod store;
#[cfg(any(test, feature = "test"))]
#[doc(hidden)]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests.

	pub use crate::_prelude::*;

	// std
	use std::collections::VecDeque;
	// self
	use crate::{
		client::Client,
		config::ClientConfig,
		dispatch::RetryPolicy,
		error::TransportError,
		http::{ApiHttpClient, HttpRequest, HttpResponse, TransportFuture},
		store::{CredentialStore, MemoryStore},
	};

	/// Application id used across tests; 16 bytes so it doubles as an AES-128 key.
	pub const TEST_APP_ID: &str = "ak_0123456789abc";
	/// Application secret used across tests; contains characters that need URL escaping.
	pub const TEST_APP_SECRET: &str = "s3cret/with+plus=";

	/// Builds a validated config pointing at `base_url` with zero-delay retries.
	pub fn test_config(base_url: &str) -> ClientConfig {
		ClientConfig::builder(TEST_APP_ID, TEST_APP_SECRET)
			.base_url(Url::parse(base_url).expect("Test base URL should parse."))
			.retry(RetryPolicy::immediate(2))
			.build()
			.expect("Test config should build successfully.")
	}

	/// Client backed by [`ScriptedHttpClient`].
	pub type ScriptedTestClient = Client<ScriptedHttpClient>;

	/// Constructs a client wired to a scripted transport and an in-memory store.
	pub fn build_scripted_test_client(
		config: ClientConfig,
	) -> (ScriptedTestClient, Arc<ScriptedHttpClient>, Arc<MemoryStore>) {
		let transport = Arc::new(ScriptedHttpClient::default());
		let store_backend = Arc::new(MemoryStore::default());
		let store: Arc<dyn CredentialStore> = store_backend.clone();
		let client = Client::<ScriptedHttpClient>::with_http_client(config, store, transport.clone())
			.expect("Scripted test client should build successfully.");

		(client, transport, store_backend)
	}

	/// Builds a successful JSON response with the given body.
	pub fn json_response(status: u16, body: Value) -> HttpResponse {
		HttpResponse { status, retry_after: None, body: body.to_string().into_bytes() }
	}

	/// Builds the auth endpoint payload returned by the remote service.
	pub fn token_payload(access: &str, refresh: &str, expires_in: i64) -> Value {
		serde_json::json!({
			"code": "200",
			"msg": "OK",
			"data": { "access_token": access, "refresh_token": refresh, "expires_in": expires_in },
		})
	}

	/// In-process transport that replays queued responses per URL path and records requests.
	#[derive(Debug, Default)]
	pub struct ScriptedHttpClient {
		routes: Mutex<HashMap<String, VecDeque<HttpResponse>>>,
		fallback: Mutex<HashMap<String, HttpResponse>>,
		requests: Mutex<Vec<HttpRequest>>,
	}
	impl ScriptedHttpClient {
		/// Queues a one-shot response for `path`.
		pub fn push(&self, path: &str, response: HttpResponse) {
			self.routes.lock().entry(path.to_owned()).or_default().push_back(response);
		}

		/// Sets the response returned for `path` once its queue is drained.
		pub fn always(&self, path: &str, response: HttpResponse) {
			self.fallback.lock().insert(path.to_owned(), response);
		}

		/// Returns every request observed so far.
		pub fn requests(&self) -> Vec<HttpRequest> {
			self.requests.lock().clone()
		}

		/// Returns the requests sent to `path`.
		pub fn requests_to(&self, path: &str) -> Vec<HttpRequest> {
			self.requests.lock().iter().filter(|req| req.url.path() == path).cloned().collect()
		}

		/// Counts the requests sent to `path`.
		pub fn calls(&self, path: &str) -> usize {
			self.requests_to(path).len()
		}
	}
	impl ApiHttpClient for ScriptedHttpClient {
		fn execute(&self, request: HttpRequest) -> TransportFuture<'_> {
			Box::pin(async move {
				let path = request.url.path().to_owned();

				self.requests.lock().push(request);

				let queued = self.routes.lock().get_mut(&path).and_then(VecDeque::pop_front);

				match queued.or_else(|| self.fallback.lock().get(&path).cloned()) {
					Some(response) => Ok(response),
					None => Err(TransportError::network(std::io::Error::new(
						std::io::ErrorKind::NotFound,
						format!("no scripted response for {path}"),
					))),
				}
			})
		}
	}

	#[cfg(feature = "reqwest")]
	/// Client type alias used by reqwest-backed integration tests.
	pub type ReqwestTestClient = Client<crate::http::ReqwestHttpClient>;

	#[cfg(feature = "reqwest")]
	/// Constructs a reqwest-backed client pointed at `base_url` with an in-memory store.
	pub fn build_reqwest_test_client(base_url: &str) -> (ReqwestTestClient, Arc<MemoryStore>) {
		let store_backend = Arc::new(MemoryStore::default());
		let store: Arc<dyn CredentialStore> = store_backend.clone();
		let client = Client::new(test_config(base_url), store)
			.expect("Reqwest test client should build successfully.");

		(client, store_backend)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
		time::{Duration as StdDuration, Instant},
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize, de::DeserializeOwned};
	pub use serde_json::{Map, Value};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
