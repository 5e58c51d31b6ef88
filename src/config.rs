//! Client configuration and endpoint resolution.
//!
//! A [`ClientConfig`] carries the raw options recognized by this crate (base URL, optional
//! tenant, per-operation path overrides, extra headers, storage prefix). Resolving it yields an
//! immutable [`Endpoints`] value with the three operation URLs and the default header set every
//! identity call sends.

// std
use std::{borrow::Borrow, ops::Deref};
// crates.io
use http::header::CONTENT_TYPE;
// self
use crate::{_prelude::*, error::ConfigError};

const TENANT_MAX_LEN: usize = 64;

/// Default storage prefix applied when the caller does not override it.
pub const DEFAULT_STORAGE_PREFIX: &str = "auth";

/// Error returned when tenant validation fails.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum TenantIdError {
	/// The tenant was empty.
	#[error("Tenant identifier cannot be empty.")]
	Empty,
	/// The tenant contains whitespace characters.
	#[error("Tenant identifier contains whitespace.")]
	ContainsWhitespace,
	/// The tenant contains a path separator and would change the endpoint layout.
	#[error("Tenant identifier contains a path separator.")]
	ContainsSeparator,
	/// The tenant exceeded the allowed character count.
	#[error("Tenant identifier exceeds {max} characters.")]
	TooLong {
		/// Maximum permitted character count.
		max: usize,
	},
}

/// Isolation namespace affecting both the remote path prefix and the storage key prefix.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TenantId(String);
impl TenantId {
	/// Creates a new tenant identifier after validation.
	pub fn new(value: impl AsRef<str>) -> Result<Self, TenantIdError> {
		let view = value.as_ref();

		validate_tenant(view)?;

		Ok(Self(view.to_owned()))
	}
}
impl Deref for TenantId {
	type Target = str;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl AsRef<str> for TenantId {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl Borrow<str> for TenantId {
	fn borrow(&self) -> &str {
		&self.0
	}
}
impl From<TenantId> for String {
	fn from(value: TenantId) -> Self {
		value.0
	}
}
impl TryFrom<String> for TenantId {
	type Error = TenantIdError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		validate_tenant(&value)?;

		Ok(Self(value))
	}
}
impl FromStr for TenantId {
	type Err = TenantIdError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}
impl Debug for TenantId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Tenant({})", self.0)
	}
}
impl Display for TenantId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

fn validate_tenant(view: &str) -> Result<(), TenantIdError> {
	if view.is_empty() {
		return Err(TenantIdError::Empty);
	}
	if view.chars().any(char::is_whitespace) {
		return Err(TenantIdError::ContainsWhitespace);
	}
	if view.contains('/') {
		return Err(TenantIdError::ContainsSeparator);
	}
	if view.len() > TENANT_MAX_LEN {
		return Err(TenantIdError::TooLong { max: TENANT_MAX_LEN });
	}

	Ok(())
}

/// Recognized client options.
///
/// Only `base_url` is required. A tenant changes both the remote path prefix and the storage key
/// prefix; each operation path may be overridden independently; extra headers are merged over the
/// fixed `content-type: application/json` default, with explicit overrides winning.
#[derive(Clone, Debug)]
pub struct ClientConfig {
	/// Base endpoint URL, e.g. `https://auth.example.com`.
	pub base_url: String,
	/// Optional isolation namespace.
	pub tenant: Option<TenantId>,
	/// Optional login path override.
	pub login_path: Option<String>,
	/// Optional refresh path override.
	pub refresh_path: Option<String>,
	/// Optional introspect path override.
	pub introspect_path: Option<String>,
	/// Extra headers sent with every identity call.
	pub headers: BTreeMap<String, String>,
	/// Storage key prefix (defaults to [`DEFAULT_STORAGE_PREFIX`]).
	pub storage_prefix: String,
}
impl ClientConfig {
	/// Creates a configuration for the provided base endpoint URL.
	pub fn new(base_url: impl Into<String>) -> Self {
		Self {
			base_url: base_url.into(),
			tenant: None,
			login_path: None,
			refresh_path: None,
			introspect_path: None,
			headers: BTreeMap::new(),
			storage_prefix: DEFAULT_STORAGE_PREFIX.into(),
		}
	}

	/// Scopes the configuration to a tenant.
	pub fn with_tenant(mut self, tenant: TenantId) -> Self {
		self.tenant = Some(tenant);

		self
	}

	/// Overrides the login path.
	pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
		self.login_path = Some(path.into());

		self
	}

	/// Overrides the refresh path.
	pub fn with_refresh_path(mut self, path: impl Into<String>) -> Self {
		self.refresh_path = Some(path.into());

		self
	}

	/// Overrides the introspect path.
	pub fn with_introspect_path(mut self, path: impl Into<String>) -> Self {
		self.introspect_path = Some(path.into());

		self
	}

	/// Adds a header sent with every identity call, overriding defaults of the same name.
	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.insert(name.into(), value.into());

		self
	}

	/// Overrides the storage key prefix.
	pub fn with_storage_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.storage_prefix = prefix.into();

		self
	}

	/// Resolves the configuration into immutable endpoints.
	pub fn endpoints(&self) -> Result<Endpoints, ConfigError> {
		Endpoints::resolve(self)
	}
}

/// Immutable endpoint set derived once from a [`ClientConfig`].
#[derive(Clone, Debug)]
pub struct Endpoints {
	/// Resolved login endpoint.
	pub login: Url,
	/// Resolved refresh endpoint.
	pub refresh: Url,
	/// Resolved introspect endpoint.
	pub introspect: Url,
	/// Header set sent with every identity call.
	pub default_headers: HeaderMap,
}
impl Endpoints {
	/// Resolves the three operation URLs and the default header set.
	///
	/// Trailing slashes on the base URL are trimmed before concatenation, so
	/// `https://auth.example.com/` and `https://auth.example.com` resolve identically.
	pub fn resolve(config: &ClientConfig) -> Result<Self, ConfigError> {
		let base = config.base_url.trim();

		if base.is_empty() {
			return Err(ConfigError::MissingBaseUrl);
		}

		let base = base.trim_end_matches('/');

		// Validate the base on its own so a bad base is reported as such, not as a bad endpoint.
		Url::parse(base).map_err(|e| ConfigError::InvalidBaseUrl { source: e })?;

		let prefix = path_prefix(config.tenant.as_ref());
		let login = resolve_one(base, config.login_path.as_deref(), &prefix, "login")?;
		let refresh = resolve_one(base, config.refresh_path.as_deref(), &prefix, "refresh")?;
		let introspect =
			resolve_one(base, config.introspect_path.as_deref(), &prefix, "introspect")?;
		let default_headers = resolve_headers(&config.headers)?;

		Ok(Self { login, refresh, introspect, default_headers })
	}
}

fn path_prefix(tenant: Option<&TenantId>) -> String {
	match tenant {
		Some(tenant) => format!("/api/v1/{tenant}/auth"),
		None => "/api/v1/auth".into(),
	}
}

fn resolve_one(
	base: &str,
	override_path: Option<&str>,
	prefix: &str,
	endpoint: &'static str,
) -> Result<Url, ConfigError> {
	let raw = match override_path {
		Some(path) => format!("{base}{path}"),
		None => format!("{base}{prefix}/{endpoint}"),
	};

	Url::parse(&raw).map_err(|e| ConfigError::InvalidEndpoint { endpoint, source: e })
}

fn resolve_headers(extra: &BTreeMap<String, String>) -> Result<HeaderMap, ConfigError> {
	let mut headers = HeaderMap::new();

	headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

	for (name, value) in extra {
		let header_name = HeaderName::from_str(name).map_err(|e| ConfigError::InvalidHeader {
			name: name.clone(),
			source: e.into(),
		})?;
		let header_value =
			HeaderValue::from_str(value).map_err(|e| ConfigError::InvalidHeader {
				name: name.clone(),
				source: e.into(),
			})?;

		headers.insert(header_name, header_value);
	}

	Ok(headers)
}
