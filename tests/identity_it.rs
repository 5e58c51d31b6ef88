#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
// self
use token_courier::{
	_preludet::*,
	config::{ClientConfig, TenantId},
	identity::LoginRequest,
	store::KeyValueStore,
};

#[tokio::test]
async fn sign_in_persists_the_issued_credential_pair() {
	let server = MockServer::start_async().await;
	let (courier, backend) = build_test_courier(ClientConfig::new(server.base_url()))
		.expect("Test courier should build successfully.");
	let login = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v1/auth/login").json_body(serde_json::json!({
				"identifier": "alice",
				"password": "pw",
				"client_id": "client1",
			}));
			then.status(200)
				.header("content-type", "application/json")
				.body(
					r#"{"access_token":"A1","refresh_token":"R1","token_type":"bearer","expires_in":900}"#,
				);
		})
		.await;
	let grant = courier
		.sign_in(&LoginRequest::new("alice", "pw", "client1"))
		.await
		.expect("Sign-in against the stub endpoint should succeed.");

	login.assert_async().await;

	assert_eq!(grant.access_token, "A1");
	assert_eq!(grant.refresh_token.as_deref(), Some("R1"));
	assert_eq!(grant.expires_in, Some(900));
	assert_eq!(
		backend.get("auth_access_token").await.expect("Backend read should succeed."),
		Some("A1".into()),
	);
	assert_eq!(
		backend.get("auth_refresh_token").await.expect("Backend read should succeed."),
		Some("R1".into()),
	);
}

#[tokio::test]
async fn totp_and_extra_fields_reach_the_wire_only_when_present() {
	let server = MockServer::start_async().await;
	let (courier, _) = build_test_courier(ClientConfig::new(server.base_url()))
		.expect("Test courier should build successfully.");
	let login = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v1/auth/login").json_body(serde_json::json!({
				"identifier": "alice",
				"password": "pw",
				"client_id": "client1",
				"totp": "123456",
				"device": "cli",
			}));
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"access_token":"A1","refresh_token":"R1"}"#);
		})
		.await;

	courier
		.sign_in(
			&LoginRequest::new("alice", "pw", "client1").with_totp("123456").with_extra("device", "cli"),
		)
		.await
		.expect("Sign-in with totp and extra fields should succeed.");

	login.assert_async().await;
}

#[tokio::test]
async fn login_rejection_carries_status_and_body_text() {
	let server = MockServer::start_async().await;
	let (courier, backend) = build_test_courier(ClientConfig::new(server.base_url()))
		.expect("Test courier should build successfully.");

	server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v1/auth/login");
			then.status(401).body("invalid credentials");
		})
		.await;

	let err = courier
		.sign_in(&LoginRequest::new("alice", "wrong", "client1"))
		.await
		.expect_err("A rejected login should surface to the caller.");

	match err {
		Error::AuthenticationRejected { status, reason } => {
			assert_eq!(status, 401);
			assert_eq!(reason, "invalid credentials");
		},
		other => panic!("Expected AuthenticationRejected, got {other:?}."),
	}

	// A rejected login must not create store entries.
	assert!(backend.is_empty());
}

#[tokio::test]
async fn login_rejection_with_an_empty_body_falls_back_to_the_status_text() {
	let server = MockServer::start_async().await;
	let (courier, _) = build_test_courier(ClientConfig::new(server.base_url()))
		.expect("Test courier should build successfully.");

	server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v1/auth/login");
			then.status(503);
		})
		.await;

	let err = courier
		.sign_in(&LoginRequest::new("alice", "pw", "client1"))
		.await
		.expect_err("A rejected login should surface to the caller.");

	match err {
		Error::AuthenticationRejected { status, reason } => {
			assert_eq!(status, 503);
			assert_eq!(reason, "Service Unavailable");
		},
		other => panic!("Expected AuthenticationRejected, got {other:?}."),
	}
}

#[tokio::test]
async fn tenanted_sign_in_targets_the_tenant_prefix_and_keys() {
	let server = MockServer::start_async().await;
	let tenant = TenantId::new("acme").expect("Tenant fixture should be valid.");
	let (courier, backend) =
		build_test_courier(ClientConfig::new(server.base_url()).with_tenant(tenant))
			.expect("Test courier should build successfully.");
	let login = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v1/acme/auth/login");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"access_token":"A1","refresh_token":"R1"}"#);
		})
		.await;

	courier
		.sign_in(&LoginRequest::new("alice", "pw", "client1"))
		.await
		.expect("Tenanted sign-in should succeed.");

	login.assert_async().await;

	assert_eq!(
		backend.get("auth:acme_access_token").await.expect("Backend read should succeed."),
		Some("A1".into()),
	);

	courier.sign_out().await.expect("Sign-out should succeed.");

	assert!(backend.is_empty());
}

#[tokio::test]
async fn renew_rejection_surfaces_directly_from_the_identity_client() {
	let server = MockServer::start_async().await;
	let (courier, _) = build_test_courier(ClientConfig::new(server.base_url()))
		.expect("Test courier should build successfully.");

	server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/v1/auth/refresh")
				.json_body(serde_json::json!({"refresh_token": "R-consumed"}));
			then.status(403).body("refresh token already used");
		})
		.await;

	let err = courier
		.identity
		.renew("R-consumed")
		.await
		.expect_err("A rejected renewal should surface to the caller.");

	match err {
		Error::RenewalRejected { status, reason } => {
			assert_eq!(status, 403);
			assert_eq!(reason, "refresh token already used");
		},
		other => panic!("Expected RenewalRejected, got {other:?}."),
	}
}

#[tokio::test]
async fn malformed_success_bodies_are_reported_with_their_path() {
	let server = MockServer::start_async().await;
	let (courier, _) = build_test_courier(ClientConfig::new(server.base_url()))
		.expect("Test courier should build successfully.");

	server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v1/auth/login");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"access_token":12345}"#);
		})
		.await;

	let err = courier
		.sign_in(&LoginRequest::new("alice", "pw", "client1"))
		.await
		.expect_err("A mistyped grant should fail to decode.");

	match err {
		Error::MalformedResponse { status, .. } => assert_eq!(status, 200),
		other => panic!("Expected MalformedResponse, got {other:?}."),
	}
}
