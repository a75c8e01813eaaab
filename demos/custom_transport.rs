//! Demonstrates plugging a non-reqwest transport into the client.
//!
//! 1. Implement [`ApiHttpClient`] and answer each [`HttpRequest`] with an [`HttpResponse`].
//! 2. Pass the transport to [`Client::with_http_client`]; signing, token renewal, and retries
//!    run on top of it unchanged.
//! 3. Report transport failures as [`TransportError`] so they are classified like any other.

// std
use std::{
	io::{Error as IoError, ErrorKind},
	sync::Arc,
};
// crates.io
use color_eyre::Result;
use url::Url;
// self
use lingxing_client::{
	client::Client,
	config::ClientConfig,
	dispatch::{ApiRequest, RetryPolicy},
	error::TransportError,
	http::{ApiHttpClient, HttpRequest, HttpResponse, TransportFuture},
	oauth::ACCESS_TOKEN_PATH,
	store::{CredentialStore, MemoryStore},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let store: Arc<dyn CredentialStore> = Arc::new(MemoryStore::default());
	let client = Client::<CannedTransport>::with_http_client(
		config()?,
		Arc::clone(&store),
		CannedTransport::Online,
	)?;
	let envelope = client.execute(ApiRequest::post("/data/mws/orders").body_field("sid", 7)).await?;

	println!("Canned transport answered with {} and data {}.", envelope.message, envelope.data);

	let offline = Client::<CannedTransport>::with_http_client(
		config()?,
		store,
		CannedTransport::Offline,
	)?;

	match offline.execute(ApiRequest::get("/data/shops")).await {
		Ok(_) => println!("Offline transport unexpectedly succeeded."),
		Err(e) => println!("Offline transport failed as {:?}: {e}.", e.category()),
	}

	Ok(())
}

fn config() -> Result<ClientConfig> {
	Ok(ClientConfig::builder("ak_demo000000000", "demo-secret")
		.base_url(Url::parse("http://127.0.0.1:9")?)
		.retry(RetryPolicy::immediate(1))
		.build()?)
}

#[derive(Clone, Copy, Debug)]
enum CannedTransport {
	Online,
	Offline,
}
impl ApiHttpClient for CannedTransport {
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_> {
		let transport = *self;

		Box::pin(async move {
			if matches!(transport, Self::Offline) {
				return Err(TransportError::network(IoError::new(
					ErrorKind::ConnectionRefused,
					format!("nothing listens on {}", request.url),
				)));
			}

			let body = if request.url.path() == ACCESS_TOKEN_PATH {
				r#"{"code":"200","msg":"OK","data":{"access_token":"canned-access","refresh_token":"canned-refresh","expires_in":7199}}"#
			} else {
				r#"{"code":0,"message":"success","data":[{"order_id":"A-1"}],"total":1}"#
			};

			Ok(HttpResponse { status: 200, retry_after: None, body: body.as_bytes().to_vec() })
		})
	}
}
