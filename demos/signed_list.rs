//! Walks every page of a resource list through the bundled reqwest transport.
//!
//! A local mock server stands in for the LingXing gateway: it issues a token on the auth
//! endpoint and answers the signed list call with a single page.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde::Deserialize;
use url::Url;
// self
use lingxing_client::{
	client::Client,
	config::ClientConfig,
	oauth::ACCESS_TOKEN_PATH,
	resource::Endpoint,
	store::{CredentialStore, MemoryStore},
};

const SHOPS: Endpoint = Endpoint::post("/data/seller/lists");

#[derive(Debug, Deserialize)]
struct Shop {
	sid: u64,
	name: String,
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path(ACCESS_TOKEN_PATH).query_param("appId", "ak_demo000000000");
			then.status(200).header("content-type", "application/json").body(
				r#"{"code":"200","msg":"OK","data":{"access_token":"demo-access","refresh_token":"demo-refresh","expires_in":7199}}"#,
			);
		})
		.await;
	let shops_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/erp/sc/data/seller/lists")
				.query_param("access_token", "demo-access")
				.query_param_exists("sign");
			then.status(200).header("content-type", "application/json").body(
				r#"{"code":0,"message":"success","data":[{"sid":1,"name":"EU"},{"sid":2,"name":"US"}],"total":"2"}"#,
			);
		})
		.await;
	let config = ClientConfig::builder("ak_demo000000000", "demo-secret")
		.base_url(Url::parse(&server.base_url())?)
		.build()?;
	let store: Arc<dyn CredentialStore> = Arc::new(MemoryStore::default());
	let client = Client::new(config, store)?;
	let shops: Vec<Shop> = client.list_all(SHOPS.request()).await?;

	for shop in &shops {
		println!("Shop {} is named {}.", shop.sid, shop.name);
	}

	token_mock.assert_async().await;
	shops_mock.assert_async().await;

	Ok(())
}
