#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
// self
use token_courier::{
	_preludet::*,
	config::{ClientConfig, TenantId},
	http::OutboundRequest,
	store::KeyValueStore,
};

async fn seed_credentials(courier: &ReqwestTestCourier, access: &str, renewal: &str) {
	courier
		.store
		.set_access_credential(Some(access))
		.await
		.expect("Failed to seed the access credential.");
	courier
		.store
		.set_renewal_credential(Some(renewal))
		.await
		.expect("Failed to seed the renewal credential.");
}

fn protected_request(server: &MockServer) -> OutboundRequest {
	OutboundRequest::get(
		Url::parse(&server.url("/v1/widgets")).expect("Mock widget endpoint should parse."),
	)
}

#[tokio::test]
async fn renewed_credential_is_attached_to_the_retried_send() {
	let server = MockServer::start_async().await;
	let (courier, _) = build_test_courier(ClientConfig::new(server.base_url()))
		.expect("Test courier should build successfully.");

	seed_credentials(&courier, "A1", "R1").await;

	let stale = server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/widgets").header("authorization", "Bearer A1");
			then.status(401).body("token expired");
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/v1/auth/refresh")
				.json_body(serde_json::json!({"refresh_token": "R1"}));
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"access_token":"A2","refresh_token":"R2","token_type":"bearer"}"#);
		})
		.await;
	let fresh = server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/widgets").header("authorization", "Bearer A2");
			then.status(200).body("widgets");
		})
		.await;
	let response = courier
		.dispatch(protected_request(&server))
		.await
		.expect("Dispatch with a renewable credential should succeed.");

	stale.assert_async().await;
	refresh.assert_async().await;
	fresh.assert_async().await;

	assert_eq!(response.status.as_u16(), 200);
	assert_eq!(
		courier.store.access_credential().await.expect("Store read should succeed."),
		Some("A2".into()),
	);
	assert_eq!(
		courier.store.renewal_credential().await.expect("Store read should succeed."),
		Some("R2".into()),
	);
}

#[tokio::test]
async fn non_authorization_failures_pass_through_without_renewal() {
	let server = MockServer::start_async().await;
	let (courier, _) = build_test_courier(ClientConfig::new(server.base_url()))
		.expect("Test courier should build successfully.");

	seed_credentials(&courier, "A1", "R1").await;

	let forbidden = server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/widgets");
			then.status(403).body("not yours");
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v1/auth/refresh");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"access_token":"A2","refresh_token":"R2"}"#);
		})
		.await;
	let response = courier
		.dispatch(protected_request(&server))
		.await
		.expect("A forbidden response should pass through as-is.");

	forbidden.assert_async().await;
	refresh.assert_calls_async(0).await;

	assert_eq!(response.status.as_u16(), 403);
	assert_eq!(response.body, b"not yours".to_vec());
	// The business-logic failure must not disturb the stored credentials.
	assert_eq!(
		courier.store.access_credential().await.expect("Store read should succeed."),
		Some("A1".into()),
	);
}

#[tokio::test]
async fn concurrent_unauthorized_requests_share_one_renewal_call() {
	let server = MockServer::start_async().await;
	let (courier, _) = build_test_courier(ClientConfig::new(server.base_url()))
		.expect("Test courier should build successfully.");

	seed_credentials(&courier, "A1", "R1").await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/widgets").header("authorization", "Bearer A1");
			then.status(401).body("token expired");
		})
		.await;

	let refresh = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/v1/auth/refresh")
				.json_body(serde_json::json!({"refresh_token": "R1"}));
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"access_token":"A2","refresh_token":"R2"}"#);
		})
		.await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/widgets").header("authorization", "Bearer A2");
			then.status(200).body("widgets");
		})
		.await;

	let (a, b, c, d) = tokio::join!(
		courier.dispatch(protected_request(&server)),
		courier.dispatch(protected_request(&server)),
		courier.dispatch(protected_request(&server)),
		courier.dispatch(protected_request(&server)),
	);

	for response in [a, b, c, d] {
		let response = response.expect("Every concurrent dispatch should succeed.");

		assert_eq!(response.status.as_u16(), 200);
	}

	refresh.assert_calls_async(1).await;
}

#[tokio::test]
async fn renewal_failure_clears_credentials_and_expires_the_session() {
	let server = MockServer::start_async().await;
	let (courier, backend) = build_test_courier(ClientConfig::new(server.base_url()))
		.expect("Test courier should build successfully.");

	seed_credentials(&courier, "A1", "R1").await;

	let stale = server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/widgets");
			then.status(401).body("token expired");
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v1/auth/refresh");
			then.status(400).body("invalid refresh token");
		})
		.await;
	let err = courier
		.dispatch(protected_request(&server))
		.await
		.expect_err("A failed renewal should expire the session.");

	// The request is never retried: one send, one renewal call.
	stale.assert_calls_async(1).await;
	refresh.assert_calls_async(1).await;

	match err {
		Error::SessionExpired { reason } => assert!(reason.contains("invalid refresh token")),
		other => panic!("Expected SessionExpired, got {other:?}."),
	}

	assert!(backend.is_empty());
}

#[tokio::test]
async fn tenanted_couriers_renew_through_the_tenant_prefix() {
	let server = MockServer::start_async().await;
	let tenant = TenantId::new("acme").expect("Tenant fixture should be valid.");
	let (courier, backend) =
		build_test_courier(ClientConfig::new(server.base_url()).with_tenant(tenant))
			.expect("Test courier should build successfully.");

	seed_credentials(&courier, "A1", "R1").await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/widgets").header("authorization", "Bearer A1");
			then.status(401).body("token expired");
		})
		.await;

	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v1/acme/auth/refresh");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"access_token":"A2","refresh_token":"R2"}"#);
		})
		.await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/widgets").header("authorization", "Bearer A2");
			then.status(200).body("widgets");
		})
		.await;

	courier
		.dispatch(protected_request(&server))
		.await
		.expect("Tenanted dispatch should succeed.");

	refresh.assert_async().await;

	// Renewed credentials land under the tenant-scoped keys.
	assert_eq!(
		backend.get("auth:acme_access_token").await.expect("Backend read should succeed."),
		Some("A2".into()),
	);
	assert_eq!(
		backend.get("auth:acme_refresh_token").await.expect("Backend read should succeed."),
		Some("R2".into()),
	);
}
