//! Transport primitives for courier dispatches and identity calls.
//!
//! The module exposes [`HttpTransport`] together with the [`OutboundRequest`] and
//! [`OutboundResponse`] value types so downstream crates can integrate custom HTTP clients. The
//! trait is the crate's only dependency on an HTTP stack; the courier and the identity client
//! both talk to it and never to a concrete client. A reqwest-backed implementation ships behind
//! the default `reqwest` feature.

// std
use std::ops::Deref;
// self
use crate::{_prelude::*, error::TransportError};

/// Future returned by [`HttpTransport::dispatch`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<OutboundResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP transports capable of executing courier requests.
///
/// Implementations must be `Send + Sync + 'static` so one transport instance can serve
/// concurrent dispatches without additional wrappers. Timeout behavior belongs to the transport:
/// the courier imposes no timeout of its own, and a renewal call that never settles blocks every
/// follower awaiting that renewal. Configure the underlying client accordingly.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Executes the request and resolves with the complete response.
	///
	/// Body collection is best-effort: when the status and headers are known but the body read
	/// fails mid-stream, implementations should resolve with an empty body rather than fail, so
	/// failure reasons degrade to the status text instead of masking the response.
	fn dispatch(&self, request: OutboundRequest) -> TransportFuture<'_>;
}

/// An outbound HTTP request owned by the caller.
///
/// The courier never mutates a caller-supplied value; every dispatch attempt works on its own
/// copy of the header set.
#[derive(Clone, Debug)]
pub struct OutboundRequest {
	/// Request method.
	pub method: Method,
	/// Absolute request URL.
	pub url: Url,
	/// Caller-supplied headers.
	pub headers: HeaderMap,
	/// Request body bytes.
	pub body: Vec<u8>,
}
impl OutboundRequest {
	/// Creates a request with the provided method and URL.
	pub fn new(method: Method, url: Url) -> Self {
		Self { method, url, headers: HeaderMap::new(), body: Vec::new() }
	}

	/// Creates a GET request.
	pub fn get(url: Url) -> Self {
		Self::new(Method::GET, url)
	}

	/// Creates a POST request.
	pub fn post(url: Url) -> Self {
		Self::new(Method::POST, url)
	}

	/// Adds a header, replacing any previous value of the same name.
	pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
		self.headers.insert(name, value);

		self
	}

	/// Replaces the request body.
	pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
		self.body = body.into();

		self
	}
}

/// A complete HTTP response with its body already collected.
#[derive(Clone, Debug)]
pub struct OutboundResponse {
	/// Response status code.
	pub status: StatusCode,
	/// Response headers.
	pub headers: HeaderMap,
	/// Response body bytes.
	pub body: Vec<u8>,
}
impl OutboundResponse {
	/// Returns the body decoded as lossy UTF-8.
	pub fn text_lossy(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}

	/// Returns a best-effort failure reason: the trimmed body text, falling back to the status'
	/// canonical reason when the body is empty or unreadable.
	pub fn reason(&self) -> String {
		let text = String::from_utf8_lossy(&self.body);
		let text = text.trim();

		if text.is_empty() {
			self.status.canonical_reason().unwrap_or("request rejected").into()
		} else {
			text.into()
		}
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// The wrapped client owns all timeout and redirect policy. Identity endpoints return their
/// results directly, so a custom client should not follow redirects for them.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestTransport {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	fn dispatch(&self, request: OutboundRequest) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let OutboundRequest { method, url, headers, body } = request;
			let response = client
				.request(method, url)
				.headers(headers)
				.body(body)
				.send()
				.await
				.map_err(TransportError::from)?;
			let status = response.status();
			let headers = response.headers().to_owned();
			// Status and headers are already known here; a failed body read degrades to an
			// empty body so [`OutboundResponse::reason`] falls back to the status text.
			let body = response.bytes().await.map(|bytes| bytes.to_vec()).unwrap_or_default();

			Ok(OutboundResponse { status, headers, body })
		})
	}
}
