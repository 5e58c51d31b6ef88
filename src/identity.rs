//! Identity endpoint client: authenticate, renew, and introspect as pure remote calls.
//!
//! [`IdentityClient`] owns the resolved [`Endpoints`] and a transport handle, nothing else: no
//! retries, no caching, no store mutation. Remote rejections surface directly to the caller with
//! the HTTP status and a best-effort body reason; reading the failure body never itself fails.

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	config::Endpoints,
	error::ConfigError,
	http::{HttpTransport, OutboundRequest, OutboundResponse},
};

/// Login payload carried by the authenticate operation.
///
/// `totp` is sent only when present; `extra` fields are flattened into the payload for
/// backend-specific needs.
#[derive(Clone, Debug, Serialize)]
pub struct LoginRequest {
	/// Account identifier (username or email).
	pub identifier: String,
	/// Account secret.
	pub password: String,
	/// Client identifier of the calling application.
	pub client_id: String,
	/// One-time password, omitted from the wire when absent.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub totp: Option<String>,
	/// Extra backend-specific fields flattened into the payload.
	#[serde(flatten)]
	pub extra: BTreeMap<String, serde_json::Value>,
}
impl LoginRequest {
	/// Creates a login payload for the provided identifier, password, and client identifier.
	pub fn new(
		identifier: impl Into<String>,
		password: impl Into<String>,
		client_id: impl Into<String>,
	) -> Self {
		Self {
			identifier: identifier.into(),
			password: password.into(),
			client_id: client_id.into(),
			totp: None,
			extra: BTreeMap::new(),
		}
	}

	/// Attaches a one-time password.
	pub fn with_totp(mut self, totp: impl Into<String>) -> Self {
		self.totp = Some(totp.into());

		self
	}

	/// Adds an extra field to the payload.
	pub fn with_extra(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
		self.extra.insert(name.into(), value.into());

		self
	}
}

/// Credential pair returned by the authenticate and renew operations.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenGrant {
	/// Fresh access credential.
	pub access_token: String,
	/// Fresh renewal credential; a grant may omit rotation.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub refresh_token: Option<String>,
	/// Token type hint advertised by the backend (typically `bearer`).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub token_type: Option<String>,
	/// Access credential lifetime in seconds, when advertised.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub expires_in: Option<u64>,
}

/// Backend-defined introspection payload.
#[derive(Clone, Debug, Deserialize)]
pub struct Introspection {
	/// Whether the presented credential is currently active.
	#[serde(default)]
	pub active: bool,
	/// Username bound to the credential, when disclosed.
	#[serde(default)]
	pub username: Option<String>,
	/// Subject claim, when disclosed.
	#[serde(default)]
	pub sub: Option<String>,
	/// Audience claim, when disclosed.
	#[serde(default)]
	pub aud: Option<String>,
	/// Space-delimited scope string, when disclosed.
	#[serde(default)]
	pub scope: Option<String>,
	/// Expiry as Unix seconds, when disclosed.
	#[serde(default)]
	pub exp: Option<i64>,
	/// Issuance as Unix seconds, when disclosed.
	#[serde(default)]
	pub iat: Option<i64>,
	/// Roles granted to the credential holder.
	#[serde(default)]
	pub roles: Vec<String>,
	/// Any further backend-specific fields.
	#[serde(flatten)]
	pub extra: BTreeMap<String, serde_json::Value>,
}
impl Introspection {
	/// Expiry instant, when the backend disclosed a representable one.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		self.exp.and_then(|secs| OffsetDateTime::from_unix_timestamp(secs).ok())
	}

	/// Issuance instant, when the backend disclosed a representable one.
	pub fn issued_at(&self) -> Option<OffsetDateTime> {
		self.iat.and_then(|secs| OffsetDateTime::from_unix_timestamp(secs).ok())
	}
}

#[derive(Serialize)]
struct RenewRequest<'a> {
	refresh_token: &'a str,
}
#[derive(Serialize)]
struct IntrospectRequest<'a> {
	token: &'a str,
}

/// Client for the three remote identity operations.
#[derive(Clone)]
pub struct IdentityClient<C>
where
	C: ?Sized + HttpTransport,
{
	endpoints: Endpoints,
	transport: Arc<C>,
}
impl<C> Debug for IdentityClient<C>
where
	C: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("IdentityClient").field("endpoints", &self.endpoints).finish()
	}
}
impl<C> IdentityClient<C>
where
	C: ?Sized + HttpTransport,
{
	/// Creates a client over the provided endpoints and transport.
	pub fn new(endpoints: Endpoints, transport: impl Into<Arc<C>>) -> Self {
		Self { endpoints, transport: transport.into() }
	}

	/// Returns the resolved endpoints in use.
	pub fn endpoints(&self) -> &Endpoints {
		&self.endpoints
	}

	/// Authenticates against the login endpoint, returning the issued credential pair.
	pub async fn authenticate(&self, request: &LoginRequest) -> Result<TokenGrant> {
		let response = self.post_json(&self.endpoints.login, request).await?;

		if !response.status.is_success() {
			return Err(Error::AuthenticationRejected {
				status: response.status.as_u16(),
				reason: response.reason(),
			});
		}

		decode(&response)
	}

	/// Exchanges a renewal credential for a fresh credential pair.
	pub async fn renew(&self, renewal_credential: &str) -> Result<TokenGrant> {
		let response = self
			.post_json(&self.endpoints.refresh, &RenewRequest { refresh_token: renewal_credential })
			.await?;

		if !response.status.is_success() {
			return Err(Error::RenewalRejected {
				status: response.status.as_u16(),
				reason: response.reason(),
			});
		}

		decode(&response)
	}

	/// Submits an access credential for validation.
	pub async fn introspect(&self, access_credential: &str) -> Result<Introspection> {
		let response = self
			.post_json(&self.endpoints.introspect, &IntrospectRequest { token: access_credential })
			.await?;

		if !response.status.is_success() {
			return Err(Error::IntrospectionRejected {
				status: response.status.as_u16(),
				reason: response.reason(),
			});
		}

		decode(&response)
	}

	async fn post_json<B>(&self, url: &Url, body: &B) -> Result<OutboundResponse>
	where
		B: Serialize,
	{
		let payload = serde_json::to_vec(body)
			.map_err(|e| ConfigError::RequestBuild { source: e })?;
		let request = OutboundRequest {
			method: Method::POST,
			url: url.clone(),
			headers: self.endpoints.default_headers.clone(),
			body: payload,
		};

		Ok(self.transport.dispatch(request).await?)
	}
}

fn decode<T>(response: &OutboundResponse) -> Result<T>
where
	T: DeserializeOwned,
{
	let mut deserializer = serde_json::Deserializer::from_slice(&response.body);

	serde_path_to_error::deserialize(&mut deserializer).map_err(|e| Error::MalformedResponse {
		source: e,
		status: response.status.as_u16(),
	})
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn login_payload_omits_absent_totp_and_flattens_extra() {
		let bare = LoginRequest::new("alice", "pw", "client1");
		let value = serde_json::to_value(&bare).expect("Login payload should serialize.");

		assert_eq!(
			value,
			serde_json::json!({"identifier": "alice", "password": "pw", "client_id": "client1"}),
		);

		let full = LoginRequest::new("alice", "pw", "client1")
			.with_totp("123456")
			.with_extra("device", "cli");
		let value = serde_json::to_value(&full).expect("Login payload should serialize.");

		assert_eq!(
			value,
			serde_json::json!({
				"identifier": "alice",
				"password": "pw",
				"client_id": "client1",
				"totp": "123456",
				"device": "cli",
			}),
		);
	}

	#[test]
	fn token_grant_tolerates_omitted_optional_fields() {
		let grant: TokenGrant = serde_json::from_str(r#"{"access_token":"A1"}"#)
			.expect("Minimal grant should deserialize.");

		assert_eq!(grant.access_token, "A1");
		assert_eq!(grant.refresh_token, None);
		assert_eq!(grant.expires_in, None);
	}

	#[test]
	fn introspection_converts_unix_timestamps() {
		let payload = r#"{"active":true,"username":"alice","exp":1700000000,"roles":["admin"],"team":"core"}"#;
		let introspection: Introspection =
			serde_json::from_str(payload).expect("Introspection payload should deserialize.");

		assert!(introspection.active);
		assert_eq!(
			introspection.expires_at().map(|at| at.unix_timestamp()),
			Some(1_700_000_000),
		);
		assert_eq!(introspection.issued_at(), None);
		assert_eq!(introspection.roles, vec!["admin".to_owned()]);
		assert_eq!(introspection.extra.get("team"), Some(&serde_json::json!("core")));
	}

	#[test]
	fn decode_reports_the_offending_path() {
		let response = OutboundResponse {
			status: StatusCode::OK,
			headers: HeaderMap::new(),
			body: br#"{"access_token":42}"#.to_vec(),
		};
		let err = decode::<TokenGrant>(&response)
			.expect_err("A mistyped grant should fail to decode.");

		match err {
			Error::MalformedResponse { source, status } => {
				assert_eq!(status, 200);
				assert_eq!(source.path().to_string(), "access_token");
			},
			other => panic!("Expected MalformedResponse, got {other:?}."),
		}
	}
}
