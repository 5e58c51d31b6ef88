//! Incoming-credential verification for services that receive bearer requests.
//!
//! The courier side of this crate attaches credentials to outgoing requests; this module is the
//! receiving side's counterpart. [`extract_bearer`] parses an `Authorization` header value and
//! [`BearerVerifier`] validates the extracted credential against the identity endpoint's
//! introspect operation, rejecting inactive credentials. No caching: every verification is one
//! remote call.

// self
use crate::{
	_prelude::*,
	http::HttpTransport,
	identity::{IdentityClient, Introspection},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

const BEARER_SCHEME: &str = "Bearer";

/// Extracts the bearer credential from an `Authorization` header value.
///
/// The scheme comparison is case-insensitive; anything other than exactly `Bearer {credential}`
/// is rejected as malformed.
pub fn extract_bearer(header_value: Option<&str>) -> Result<&str> {
	let value = header_value.ok_or(Error::MissingAuthorization)?;
	let parts: Vec<&str> = value.split(' ').collect();

	match parts.as_slice() {
		&[scheme, credential]
			if scheme.eq_ignore_ascii_case(BEARER_SCHEME) && !credential.is_empty() =>
			Ok(credential),
		_ => Err(Error::MalformedAuthorization),
	}
}

/// Verifies incoming bearer credentials against the identity endpoint.
#[derive(Clone, Debug)]
pub struct BearerVerifier<C>
where
	C: ?Sized + HttpTransport,
{
	identity: IdentityClient<C>,
}
impl<C> BearerVerifier<C>
where
	C: ?Sized + HttpTransport,
{
	/// Creates a verifier over the provided identity client.
	pub fn new(identity: IdentityClient<C>) -> Self {
		Self { identity }
	}

	/// Extracts the bearer credential, introspects it, and rejects inactive credentials.
	pub async fn verify(&self, authorization: Option<&str>) -> Result<Introspection> {
		const KIND: FlowKind = FlowKind::Introspection;

		let span = FlowSpan::new(KIND, "verify");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let credential = extract_bearer(authorization)?;
				let introspection = self.identity.introspect(credential).await?;

				if !introspection.active {
					return Err(Error::InactiveCredential);
				}

				Ok(introspection)
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}
}
