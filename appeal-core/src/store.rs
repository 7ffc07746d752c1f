use async_trait::async_trait;

use crate::COOLDOWN_WINDOW_SECS;

/// A persisted appeal submission. Never updated or deleted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmissionRecord {
    pub user_id: String,
    /// Unix seconds.
    pub submitted_at: u64,
}

impl SubmissionRecord {
    /// Seconds until the cooldown started by this record ends.
    pub fn cooldown_remaining_secs(&self, now: u64) -> u64 {
        (self.submitted_at + COOLDOWN_WINDOW_SECS).saturating_sub(now)
    }
}

/// Lower bound of the cooldown window ending at `now`.
pub fn cooldown_window_start(now: u64) -> u64 {
    now.saturating_sub(COOLDOWN_WINDOW_SECS)
}

/// Persistent collection of prior submissions.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Most recent submission of `user_id` with `submitted_at >= since`.
    async fn find_recent_submission(
        &self,
        user_id: &str,
        since: u64,
    ) -> anyhow::Result<Option<SubmissionRecord>>;

    /// Try to take the exclusive per-user submission lock, held across the
    /// cooldown check, the message post and the record insert. Returns
    /// `None` without waiting when another request already holds it.
    async fn try_lock_user(
        &self,
        user_id: &str,
    ) -> anyhow::Result<Option<Box<dyn SubmissionLock>>>;
}

/// Exclusive hold on one user's submissions. Dropping it without calling
/// [`SubmissionLock::record_submission`] releases the lock and writes nothing.
#[async_trait]
pub trait SubmissionLock: Send {
    async fn find_recent_submission(
        &mut self,
        since: u64,
    ) -> anyhow::Result<Option<SubmissionRecord>>;

    /// Insert the record and release the lock.
    async fn record_submission(self: Box<Self>, submitted_at: u64) -> anyhow::Result<()>;
}
