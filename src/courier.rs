//! The authenticated-request pipeline: attach, send, renew once, retry once.
//!
//! [`Courier`] wraps an arbitrary outbound request with bearer-credential attachment,
//! authorization-failure detection, coordinated renewal, and a bounded single retry. A logical
//! request moves `ATTACH → SEND → (SUCCESS | NEEDS_RENEWAL) → [RENEW → RETRY_SEND] →
//! (SUCCESS | FAILED)`. Only a 401 Unauthorized response with a stored renewal credential enters
//! the renewal branch; every other response is returned untouched. Across concurrent requests at
//! most one renewal call per credential scope is in flight at any instant, enforced by a
//! per-courier episode cell; followers await the leader's outcome instead of renewing again.

mod gate;
mod metrics;

pub use gate::RenewalOutcome;
pub use metrics::RenewalMetrics;

// crates.io
use http::header::AUTHORIZATION;
// self
use crate::{
	_prelude::*,
	config::ClientConfig,
	courier::gate::RenewalGate,
	error::ConfigError,
	http::{HttpTransport, OutboundRequest, OutboundResponse},
	identity::{IdentityClient, LoginRequest, TokenGrant},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	store::{CredentialStore, KeyValueStore, StorageKeys},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

#[cfg(feature = "reqwest")]
/// Courier specialized for the crate's default reqwest transport.
pub type ReqwestCourier = Courier<ReqwestTransport>;

/// Dispatches outbound requests for one credential scope.
///
/// The courier owns the transport, the identity client, the typed credential store, and the
/// renewal gate, so arbitrary callers can share a single instance: ordinary traffic proceeds
/// fully in parallel while authorization failures coalesce into one renewal episode. The
/// credential pair lives exclusively in the store; the courier only holds transient in-flight
/// copies for the duration of a single request.
#[derive(Clone)]
pub struct Courier<C>
where
	C: ?Sized + HttpTransport,
{
	/// Transport used for protected dispatches and identity calls alike.
	pub transport: Arc<C>,
	/// Identity client issuing the remote authenticate/renew/introspect operations.
	pub identity: IdentityClient<C>,
	/// Typed credential storage for this courier's scope.
	pub store: CredentialStore,
	/// Shared counters for renewal episodes.
	pub renewal_metrics: Arc<RenewalMetrics>,
	gate: RenewalGate,
}
impl<C> Courier<C>
where
	C: ?Sized + HttpTransport,
{
	/// Creates a courier that reuses the caller-provided transport.
	pub fn with_transport(
		config: ClientConfig,
		backend: Arc<dyn KeyValueStore>,
		transport: impl Into<Arc<C>>,
	) -> Result<Self> {
		let endpoints = config.endpoints()?;
		let transport = transport.into();
		let identity = IdentityClient::new(endpoints, transport.clone());
		let keys = StorageKeys::new(config.storage_prefix, config.tenant);
		let store = CredentialStore::new(backend, keys);

		Ok(Self {
			transport,
			identity,
			store,
			renewal_metrics: Default::default(),
			gate: Default::default(),
		})
	}

	/// Authenticates against the identity endpoint and persists the issued credential pair.
	pub async fn sign_in(&self, request: &LoginRequest) -> Result<TokenGrant> {
		const KIND: FlowKind = FlowKind::SignIn;

		let span = FlowSpan::new(KIND, "sign_in");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let grant = self.identity.authenticate(request).await?;

				// Access credential first, then renewal credential, so an interleaved reader
				// never pairs a new renewal credential with a stale access credential.
				self.store.set_access_credential(Some(&grant.access_token)).await?;
				self.store.set_renewal_credential(grant.refresh_token.as_deref()).await?;

				Ok(grant)
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	/// Clears both stored credentials.
	pub async fn sign_out(&self) -> Result<()> {
		Ok(self.store.clear().await?)
	}

	/// Dispatches a request with credential attachment, coordinated renewal, and one retry.
	///
	/// The caller's request value is never mutated; every attempt works on its own copy of the
	/// header set. The second send is the last: whatever status it carries is returned as-is,
	/// renewal is never attempted twice for one logical request.
	pub async fn dispatch(&self, request: OutboundRequest) -> Result<OutboundResponse> {
		const KIND: FlowKind = FlowKind::Dispatch;

		let span = FlowSpan::new(KIND, "dispatch");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.dispatch_inner(request)).await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	async fn dispatch_inner(&self, request: OutboundRequest) -> Result<OutboundResponse> {
		let attached = self.store.access_credential().await?;
		let response = self.send_attempt(&request, attached.as_deref()).await?;

		if response.status != StatusCode::UNAUTHORIZED {
			return Ok(response);
		}
		if self.store.renewal_credential().await?.is_none() {
			return Ok(response);
		}

		match self.join_renewal(attached.as_deref()).await? {
			RenewalOutcome::Renewed => {
				let fresh = self.store.access_credential().await?;

				self.send_attempt(&request, fresh.as_deref()).await
			},
			RenewalOutcome::Expired { reason } => Err(Error::SessionExpired { reason }),
		}
	}

	async fn send_attempt(
		&self,
		request: &OutboundRequest,
		credential: Option<&str>,
	) -> Result<OutboundResponse> {
		let mut attempt = request.clone();

		if let Some(credential) = credential {
			let value = HeaderValue::from_str(&format!("Bearer {credential}")).map_err(|e| {
				ConfigError::InvalidHeader { name: AUTHORIZATION.to_string(), source: e.into() }
			})?;

			attempt.headers.insert(AUTHORIZATION, value);
		}

		Ok(self.transport.dispatch(attempt).await?)
	}

	/// Joins the live renewal episode for this scope, leading it when nobody else has.
	async fn join_renewal(&self, attached: Option<&str>) -> Result<RenewalOutcome> {
		const KIND: FlowKind = FlowKind::Renewal;

		let span = FlowSpan::new(KIND, "join_renewal");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);
		self.renewal_metrics.record_attempt();

		let result = span
			.instrument(async {
				let episode = self.gate.join();
				let mut slot = episode.lock().await;
				let outcome = match slot.as_ref() {
					// Follower: the leader resolved this episode while we waited on the cell.
					Some(outcome) => outcome.clone(),
					None => {
						let outcome = self.lead_renewal(attached).await?;

						*slot = Some(outcome.clone());

						outcome
					},
				};

				drop(slot);
				self.gate.retire(&episode);

				Ok(outcome)
			})
			.await;

		match &result {
			Ok(RenewalOutcome::Renewed) => {
				self.renewal_metrics.record_renewal();
				obs::record_flow_outcome(KIND, FlowOutcome::Success);
			},
			Ok(RenewalOutcome::Expired { .. }) | Err(_) => {
				self.renewal_metrics.record_expiration();
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);
			},
		}

		result
	}

	async fn lead_renewal(&self, attached: Option<&str>) -> Result<RenewalOutcome> {
		// An earlier episode may have renewed between this request's failed send and taking the
		// lead; its credentials are fresher than the one this request attached.
		if let Some(current) = self.store.access_credential().await? {
			if attached != Some(current.as_str()) {
				return Ok(RenewalOutcome::Renewed);
			}
		}

		let Some(renewal) = self.store.renewal_credential().await? else {
			// A failed episode cleared the store while this request waited for the lead.
			return Ok(RenewalOutcome::Expired {
				reason: "no renewal credential is stored".into(),
			});
		};

		match self.identity.renew(&renewal).await {
			Ok(grant) => {
				// Same write order as sign_in: access credential before renewal credential.
				self.store.set_access_credential(Some(&grant.access_token)).await?;

				// A grant may omit rotation; the stored renewal credential then stays valid.
				let next_renewal = grant.refresh_token.as_deref().unwrap_or(renewal.as_str());

				self.store.set_renewal_credential(Some(next_renewal)).await?;

				Ok(RenewalOutcome::Renewed)
			},
			Err(err) => {
				// Renewal failure ends the session; the clear is best-effort on this path.
				let _ = self.store.clear().await;

				Ok(RenewalOutcome::Expired { reason: err.to_string() })
			},
		}
	}
}
#[cfg(feature = "reqwest")]
impl Courier<ReqwestTransport> {
	/// Creates a new courier for the provided configuration and storage backend.
	///
	/// The courier provisions its own reqwest-backed transport so callers do not need to pass
	/// HTTP handles explicitly. Use [`Courier::with_transport`] to bring a custom transport or a
	/// preconfigured [`ReqwestClient`].
	pub fn new(config: ClientConfig, backend: Arc<dyn KeyValueStore>) -> Result<Self> {
		Self::with_transport(config, backend, ReqwestTransport::default())
	}
}
impl<C> Debug for Courier<C>
where
	C: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Courier")
			.field("identity", &self.identity)
			.field("store", &self.store)
			.finish()
	}
}
