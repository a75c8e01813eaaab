#![cfg(feature = "test")]

// crates.io
use serde_json::json;
// self
use lingxing_client::{
	_preludet::*,
	config::ClientConfig,
	dispatch::RetryPolicy,
	http::HttpResponse,
	oauth::ACCESS_TOKEN_PATH,
	page::{PageCursor, PageDefaults, PagePolicy},
	resource::{Endpoint, LENGTH_FIELD, OFFSET_FIELD},
};

const ORDERS: Endpoint = Endpoint::post("/data/orders");
const SHOPS: Endpoint = Endpoint::get("/data/shops").with_paging(PagePolicy::ItemCount);
const ORDER_DETAIL: Endpoint = Endpoint::post("/data/order/detail");

#[derive(Debug, PartialEq, Deserialize)]
struct Order {
	id: u32,
}

fn paged_client(limit: u32) -> (ScriptedTestClient, Arc<ScriptedHttpClient>) {
	let config = ClientConfig::builder(TEST_APP_ID, TEST_APP_SECRET)
		.base_url(Url::parse("http://127.0.0.1:9").expect("Base URL should parse."))
		.retry(RetryPolicy::immediate(0))
		.paging(PageDefaults { default_limit: limit, max_limit: limit })
		.build()
		.expect("Config should build.");
	let (client, transport, _) = build_scripted_test_client(config);

	transport.always(ACCESS_TOKEN_PATH, json_response(200, token_payload("a-1", "r-1", 7200)));

	(client, transport)
}

fn page(ids: &[u32], total: Option<u64>) -> HttpResponse {
	let data = ids.iter().map(|id| json!({ "id": id })).collect::<Vec<_>>();

	json_response(200, json!({ "code": 0, "data": data, "total": total }))
}

#[tokio::test]
async fn list_all_walks_pages_until_the_total_is_reached() {
	let (client, transport) = paged_client(2);
	let path = "/erp/sc/data/orders";

	transport.push(path, page(&[1, 2], Some(5)));
	transport.push(path, page(&[3, 4], Some(5)));
	transport.push(path, page(&[5], Some(5)));

	let orders: Vec<Order> =
		client.list_all(ORDERS.request()).await.expect("Every page should be fetched.");

	assert_eq!(orders.iter().map(|o| o.id).collect::<Vec<_>>(), [1, 2, 3, 4, 5]);

	let windows = transport
		.requests_to(path)
		.iter()
		.map(|req| {
			let body = req.json_body().expect("List requests carry a JSON body.");

			(body[OFFSET_FIELD].as_u64(), body[LENGTH_FIELD].as_u64())
		})
		.collect::<Vec<_>>();

	assert_eq!(windows, [(Some(0), Some(2)), (Some(2), Some(2)), (Some(4), Some(2))]);
}

#[tokio::test]
async fn item_count_endpoints_stop_on_a_short_page() {
	let (client, transport) = paged_client(3);
	let path = "/erp/sc/data/shops";

	transport.push(path, page(&[1, 2, 3], Some(1)));
	transport.push(path, page(&[4], None));

	let first = client
		.list::<Order>(SHOPS.request(), PageCursor::new(0, 0))
		.await
		.expect("First page should load.");

	assert_eq!(first.cursor, PageCursor::new(0, 3));
	assert!(!first.is_last_page);

	let second =
		client.list::<Order>(SHOPS.request(), first.next).await.expect("Second page should load.");

	assert_eq!(second.items, [Order { id: 4 }]);
	assert_eq!(second.next, PageCursor::new(6, 3));
	assert!(second.is_last_page);
	assert_eq!(transport.requests_to(path)[1].query_value(OFFSET_FIELD).as_deref(), Some("3"));
}

#[tokio::test]
async fn empty_list_data_is_the_last_page() {
	let (client, transport) = paged_client(10);

	transport.push(
		"/erp/sc/data/orders",
		json_response(200, json!({ "code": 0, "data": null, "total": 0 })),
	);

	let page = client
		.list::<Order>(ORDERS.request(), client.pages().first())
		.await
		.expect("Empty page should load.");

	assert!(page.items.is_empty());
	assert!(page.is_last_page);
	assert_eq!(page.next, PageCursor::new(10, 10));
}

#[tokio::test]
async fn detail_lookups_report_not_found_for_empty_data() {
	let (client, transport) = paged_client(10);
	let path = "/erp/sc/data/order/detail";

	transport.push(path, json_response(200, json!({ "code": 0, "data": [] })));
	transport.push(path, json_response(200, json!({ "code": 0, "data": [{ "id": 9 }, { "id": 10 }] })));

	let missing = client
		.one::<Order>(ORDER_DETAIL.request().body_field("order_id", "x"))
		.await
		.expect_err("Empty detail must be reported.");

	assert!(matches!(missing, Error::NotFound));

	let found = client
		.one::<Order>(ORDER_DETAIL.request().body_field("order_id", "y"))
		.await
		.expect("Detail should decode the first element.");

	assert_eq!(found, Order { id: 9 });
}
