//! Single-flight coordination for renewal episodes.

// self
use crate::_prelude::*;

/// Result of a renewal episode, shared between the leader and its followers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RenewalOutcome {
	/// Fresh credentials were stored; waiting requests re-read the store and retry.
	Renewed,
	/// Renewal failed; the store was cleared and waiting requests fail without retrying.
	Expired {
		/// Failure summary of the renewal call that ended the session.
		reason: String,
	},
}

/// Shared cell carrying one episode's outcome.
///
/// The first caller to lock a cell whose slot is still `None` leads the episode and records the
/// outcome before releasing the lock; every later caller blocks on the same lock and reads the
/// recorded outcome instead of renewing again. A leader dropped mid-renewal releases the lock
/// with the slot still empty, promoting the next waiter to leader.
pub(crate) type EpisodeCell = Arc<AsyncMutex<Option<RenewalOutcome>>>;

/// Mutual-exclusion gate over the renewal operation.
///
/// The gate hands out one live [`EpisodeCell`] at a time for its credential scope. Cells are
/// created lazily on the first authorization failure of an episode, retired right after
/// resolution, and never persisted. The gate guards only renewal; ordinary traffic never touches
/// it.
#[derive(Clone, Debug, Default)]
pub(crate) struct RenewalGate {
	slot: Arc<Mutex<Option<EpisodeCell>>>,
}
impl RenewalGate {
	/// Returns the live episode cell, creating one when none is live.
	pub fn join(&self) -> EpisodeCell {
		let mut slot = self.slot.lock();

		slot.get_or_insert_with(|| Arc::new(AsyncMutex::new(None))).clone()
	}

	/// Retires a resolved episode cell so the next authorization failure starts a fresh episode.
	///
	/// A no-op when a newer episode already replaced `cell`.
	pub fn retire(&self, cell: &EpisodeCell) {
		let mut slot = self.slot.lock();

		if slot.as_ref().is_some_and(|live| Arc::ptr_eq(live, cell)) {
			*slot = None;
		}
	}
}
