//! Storage contracts and typed, namespaced credential access.
//!
//! Persistence is an external collaborator: a plain string-keyed key-value store behind
//! [`KeyValueStore`]. [`CredentialStore`] layers typed access for the two credential entries on
//! top of it and owns the key derivation scheme. The store's own durability and concurrency are
//! out of scope here; the built-in [`MemoryStore`] and [`FileStore`] backends cover tests and
//! lightweight deployments.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{_prelude::*, config::TenantId};

const ACCESS_FIELD: &str = "access_token";
const RENEWAL_FIELD: &str = "refresh_token";

/// Future returned by [`KeyValueStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// String-keyed persistence contract backing the credential store.
pub trait KeyValueStore
where
	Self: Send + Sync,
{
	/// Fetches the value stored under `key`, if present.
	fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>>;

	/// Writes or replaces the value stored under `key`.
	fn put<'a>(&'a self, key: &'a str, value: &'a str) -> StoreFuture<'a, ()>;

	/// Deletes the value stored under `key`; deleting an absent key is not an error.
	fn remove<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()>;
}

/// Error type produced by [`KeyValueStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Deterministic storage key derivation for one credential scope.
///
/// Keys are `{prefix}:{tenant}_{name}` when a tenant is configured and `{prefix}_{name}`
/// otherwise. This scheme is a required invariant, not an implementation detail: the `:` tenant
/// separator guarantees that two distinct tenants never share a key for the same field and that
/// no tenanted key collides with an untenanted one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageKeys {
	prefix: String,
	tenant: Option<TenantId>,
}
impl StorageKeys {
	/// Builds a derivation scheme for the provided prefix and optional tenant.
	pub fn new(prefix: impl Into<String>, tenant: Option<TenantId>) -> Self {
		Self { prefix: prefix.into(), tenant }
	}

	/// Derives the storage key for a logical field name.
	pub fn derive(&self, name: &str) -> String {
		match &self.tenant {
			Some(tenant) => format!("{}:{tenant}_{name}", self.prefix),
			None => format!("{}_{name}", self.prefix),
		}
	}

	/// Key under which the access credential is stored.
	pub fn access(&self) -> String {
		self.derive(ACCESS_FIELD)
	}

	/// Key under which the renewal credential is stored.
	pub fn renewal(&self) -> String {
		self.derive(RENEWAL_FIELD)
	}
}

/// Snapshot of the two credential entries for one scope.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CredentialPair {
	/// Short-lived opaque token authorizing a single request.
	pub access_credential: Option<String>,
	/// Longer-lived opaque token exchanged for a fresh access credential.
	pub renewal_credential: Option<String>,
}

/// Typed, namespaced access to the credential pair of one scope.
///
/// The store owns the persisted credentials exclusively; the courier only ever holds transient
/// in-flight copies for the duration of a single request.
#[derive(Clone)]
pub struct CredentialStore {
	backend: Arc<dyn KeyValueStore>,
	keys: StorageKeys,
}
impl CredentialStore {
	/// Creates a credential store over the provided backend and key scheme.
	pub fn new(backend: Arc<dyn KeyValueStore>, keys: StorageKeys) -> Self {
		Self { backend, keys }
	}

	/// Returns the key derivation scheme in use.
	pub fn keys(&self) -> &StorageKeys {
		&self.keys
	}

	/// Fetches the stored access credential.
	pub async fn access_credential(&self) -> Result<Option<String>, StoreError> {
		self.backend.get(&self.keys.access()).await
	}

	/// Fetches the stored renewal credential.
	pub async fn renewal_credential(&self) -> Result<Option<String>, StoreError> {
		self.backend.get(&self.keys.renewal()).await
	}

	/// Writes the access credential; `None` deletes the underlying key.
	pub async fn set_access_credential(&self, value: Option<&str>) -> Result<(), StoreError> {
		self.set(&self.keys.access(), value).await
	}

	/// Writes the renewal credential; `None` deletes the underlying key.
	pub async fn set_renewal_credential(&self, value: Option<&str>) -> Result<(), StoreError> {
		self.set(&self.keys.renewal(), value).await
	}

	/// Fetches both credential entries.
	pub async fn credentials(&self) -> Result<CredentialPair, StoreError> {
		Ok(CredentialPair {
			access_credential: self.access_credential().await?,
			renewal_credential: self.renewal_credential().await?,
		})
	}

	/// Deletes both credential entries.
	pub async fn clear(&self) -> Result<(), StoreError> {
		self.backend.remove(&self.keys.access()).await?;
		self.backend.remove(&self.keys.renewal()).await
	}

	async fn set(&self, key: &str, value: Option<&str>) -> Result<(), StoreError> {
		match value {
			Some(value) => self.backend.put(key, value).await,
			None => self.backend.remove(key).await,
		}
	}
}
impl Debug for CredentialStore {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialStore").field("keys", &self.keys).finish()
	}
}
