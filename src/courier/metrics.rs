// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for renewal episodes.
#[derive(Debug, Default)]
pub struct RenewalMetrics {
	attempts: AtomicU64,
	renewals: AtomicU64,
	expirations: AtomicU64,
}
impl RenewalMetrics {
	/// Returns the total number of renewal joins (leaders and coalesced followers alike).
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of joins that observed a successful renewal.
	pub fn renewals(&self) -> u64 {
		self.renewals.load(Ordering::Relaxed)
	}

	/// Returns the number of joins that observed an expired session.
	pub fn expirations(&self) -> u64 {
		self.expirations.load(Ordering::Relaxed)
	}

	pub(crate) fn record_attempt(&self) {
		self.attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_renewal(&self) {
		self.renewals.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_expiration(&self) {
		self.expirations.fetch_add(1, Ordering::Relaxed);
	}
}
