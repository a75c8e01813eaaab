#![cfg(feature = "test")]

// std
use std::{env, fs, process};
// crates.io
use time::macros;
// self
use lingxing_client::{
	_preludet::*,
	auth::{RenewalMargin, Token},
	client::Client,
	oauth::ACCESS_TOKEN_PATH,
	store::{CredentialStore, FileStore, MemoryStore, StoreError},
};

fn build_token(access: &str) -> Token {
	let issued = macros::datetime!(2025-11-10 12:00 UTC);

	Token::issue(access, "refresh-1", 3600, RenewalMargin::HALF, issued)
		.expect("Token fixture should build successfully.")
}

fn unique_path(tag: &str) -> std::path::PathBuf {
	env::temp_dir().join(format!("lingxing_store_it_{tag}_{}.json", process::id()))
}

#[tokio::test]
async fn memory_store_replaces_tokens_wholesale() {
	let store = MemoryStore::default();

	assert_eq!(store.load().await, Err(StoreError::NotFound));

	store.save(build_token("access-1")).await.expect("First save should succeed.");
	store.save(build_token("access-2")).await.expect("Second save should succeed.");

	let loaded = store.load().await.expect("Saved token should load.");

	assert_eq!(loaded.access_token.expose(), "access-2");
	assert_eq!(loaded.expires_at, macros::datetime!(2025-11-10 12:30 UTC));
}

#[tokio::test]
async fn file_store_survives_client_restarts() {
	let path = unique_path("restart");
	let _ = fs::remove_file(&path);
	let config = test_config("http://127.0.0.1:9");
	let first_transport = Arc::new(ScriptedHttpClient::default());

	first_transport
		.push(ACCESS_TOKEN_PATH, json_response(200, token_payload("persisted", "r-1", 7200)));

	let first = Client::<ScriptedHttpClient>::with_http_client(
		config.clone(),
		Arc::new(FileStore::open(&path).expect("File store should open.")),
		first_transport.clone(),
	)
	.expect("First client should build.");
	let token = first.tokens().ensure_valid(false).await.expect("Acquisition should succeed.");

	assert_eq!(token.access_token.expose(), "persisted");

	let second_transport = Arc::new(ScriptedHttpClient::default());
	let second = Client::<ScriptedHttpClient>::with_http_client(
		config,
		Arc::new(FileStore::open(&path).expect("File store should reopen.")),
		second_transport.clone(),
	)
	.expect("Second client should build.");
	let reloaded = second.tokens().ensure_valid(false).await.expect("Cached token should load.");

	assert_eq!(reloaded, token);
	assert!(second_transport.requests().is_empty());

	let _ = fs::remove_file(&path);
}

#[tokio::test]
async fn corrupt_cache_forces_acquisition() {
	let path = unique_path("corrupt");

	fs::write(&path, b"{ not json").expect("Corrupt fixture should be written.");

	let store = FileStore::open(&path).expect("File store should open.");

	assert_eq!(store.load().await, Err(StoreError::NotFound));

	let transport = Arc::new(ScriptedHttpClient::default());
	let client = Client::<ScriptedHttpClient>::with_http_client(
		test_config("http://127.0.0.1:9"),
		Arc::new(store),
		transport.clone(),
	)
	.expect("Client should build.");

	transport.push(ACCESS_TOKEN_PATH, json_response(200, token_payload("fresh", "r-1", 7200)));

	let token = client.tokens().ensure_valid(false).await.expect("Acquisition should succeed.");

	assert_eq!(token.access_token.expose(), "fresh");
	assert_eq!(transport.calls(ACCESS_TOKEN_PATH), 1);

	let _ = fs::remove_file(&path);
}
