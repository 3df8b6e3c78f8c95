#![cfg(feature = "reqwest")]

mod common;

// std
use std::sync::Arc;
// crates.io
use httpmock::prelude::*;
use time::Duration;
// self
use common::*;
use dealer_storefront::{
	config::StorefrontConfig,
	flows::{OrderOutcome, OrderSelection, OrderState, ReqwestStorefront, RejectionReason},
	store::{MemoryStore, StoreSlot},
	url::Url,
};

async fn authorized_storefront(
	config: StorefrontConfig,
) -> (ReqwestStorefront, Arc<MemoryStore>, Visits) {
	let (storefront, store, visits) = build_reqwest_test_storefront(config);

	seed(&store, &[(StoreSlot::CorrelationCode, "abc123"), (StoreSlot::BearerToken, "tok")])
		.await;
	storefront
		.select_order(&OrderSelection::new("m-1", "c-7", "d-3"))
		.await
		.expect("Selection should persist.");

	(storefront, store, visits)
}

#[tokio::test]
async fn approved_order_fetches_list_and_navigates_to_profile() {
	let server = MockServer::start_async().await;
	let (storefront, _, visits) = authorized_storefront(mock_config(&server)).await;
	let submit = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/orders/submit")
				.header("rcode", "abc123")
				.header("token", "tok")
				.json_body(serde_json::json!({
					"modification_id": "m-1",
					"color_id": "c-7",
					"dealer_id": "d-3",
					"filial_id": 100,
					"captcha": "7k2p"
				}));
			then.status(200).header("content-type", "application/json").body("{}");
		})
		.await;
	let status = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/api/orders/status")
				.query_param("modification_id", "m-1")
				.query_param("token", "abc123");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"status\":1}");
		})
		.await;
	let list = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/orders").header("token", "tok");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"data\":[{\"order_id\":42,\"modification_id\":\"m-1\",\"status\":\"1\"}]}");
		})
		.await;
	let outcome = storefront.submit_order(" 7k2p ").await.expect("Submission should run.");

	submit.assert_async().await;
	status.assert_async().await;
	list.assert_async().await;

	let OrderOutcome::Approved { orders: Some(orders) } = &outcome else {
		panic!("Order should be approved with a list, got {outcome:?}.");
	};

	assert_eq!(orders.len(), 1);
	assert_eq!(orders[0].id.as_deref(), Some("42"));
	assert_eq!(visits.paths(), vec!["/profile".to_owned()]);
	assert_eq!(storefront.order_tracker().state(), OrderState::Approved);
	assert_eq!(storefront.poll_metrics.snapshot().approvals, 1);
}

#[tokio::test]
async fn declined_order_surfaces_backend_message() {
	let server = MockServer::start_async().await;
	let (storefront, _, visits) = authorized_storefront(mock_config(&server)).await;
	let _submit = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/orders/submit");
			then.status(200).body("{}");
		})
		.await;
	let _status = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/orders/status");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"status\":\"-1\",\"message\":\"Limit exceeded\"}");
		})
		.await;
	let outcome = storefront.submit_order("7k2p").await.expect("Submission should run.");

	assert_eq!(
		outcome,
		OrderOutcome::Rejected(RejectionReason::Declined {
			message: Some("Limit exceeded".to_owned()),
		})
	);
	assert_eq!(outcome.message(), "Limit exceeded");
	assert!(visits.paths().is_empty());
}

#[tokio::test]
async fn refused_submission_reads_as_invalid_captcha() {
	let server = MockServer::start_async().await;
	let (storefront, _, _) = authorized_storefront(mock_config(&server)).await;
	let submit = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/orders/submit");
			then.status(422)
				.header("content-type", "application/json")
				.body("{\"message\":\"Wrong captcha\"}");
		})
		.await;
	let status = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/orders/status");
			then.status(200).body("{\"status\":1}");
		})
		.await;
	let outcome = storefront.submit_order("0000").await.expect("Submission should run.");

	assert_eq!(outcome, OrderOutcome::Rejected(RejectionReason::InvalidCaptcha));
	assert_eq!(outcome.message(), "The captcha is invalid. Please try again.");

	submit.assert_async().await;
	status.assert_calls_async(0).await;
}

#[tokio::test]
async fn pending_order_times_out_after_budget() {
	let server = MockServer::start_async().await;
	let config = StorefrontConfig::builder()
		.identity_base(Url::parse(&server.url("/oneid/")).expect("Mock base should parse."))
		.api_base(Url::parse(&server.url("/api/")).expect("Mock base should parse."))
		.poll_budget(3)
		.poll_interval(Duration::milliseconds(10))
		.build()
		.expect("Config should build.");
	let (storefront, _, visits) = authorized_storefront(config).await;
	let _submit = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/orders/submit");
			then.status(200).body("{}");
		})
		.await;
	let status = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/orders/status");
			then.status(200).body("{\"status\":0}");
		})
		.await;
	let outcome = storefront.submit_order("7k2p").await.expect("Submission should run.");

	assert_eq!(outcome, OrderOutcome::TimedOut { attempts: 3 });

	status.assert_calls_async(3).await;

	assert!(visits.paths().is_empty());
	assert_eq!(storefront.order_tracker().state(), OrderState::TimedOut);
}
