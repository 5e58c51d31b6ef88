//! Client-side bearer-credential courier—sign in once, then dispatch requests with automatic
//! credential attachment, single-flight renewal, and a bounded retry.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod config;
pub mod courier;
pub mod error;
pub mod http;
pub mod identity;
pub mod obs;
pub mod store;
pub mod verify;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		config::ClientConfig,
		courier::Courier,
		http::ReqwestTransport,
		store::{KeyValueStore, MemoryStore},
	};

	/// Courier type alias used by reqwest-backed integration tests.
	pub type ReqwestTestCourier = Courier<ReqwestTransport>;

	/// Constructs a [`Courier`] backed by an in-memory store and the crate's default reqwest
	/// transport, returning the raw backend so tests can inspect persisted keys.
	pub fn build_test_courier(
		config: ClientConfig,
	) -> Result<(ReqwestTestCourier, Arc<MemoryStore>)> {
		let backend = Arc::new(MemoryStore::default());
		let store: Arc<dyn KeyValueStore> = backend.clone();
		let courier = Courier::new(config, store)?;

		Ok((courier, backend))
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::OffsetDateTime;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use httpmock as _;
#[cfg(test)] use token_courier as _;
