use tracing::{error, info};

use appeal_core::store::cooldown_window_start;
use appeal_core::{AppealConfig, SubmissionRecord, SubmissionStore};
use appeal_utils::time::format_time;

use crate::reply::StageReply;

pub const BLOCKED_MESSAGE: &str = "You cannot submit ban appeals with this Discord account.";
pub const STORE_ERROR_MESSAGE: &str =
    "An error occurred while processing your ban appeal submission.";
pub const INVALID_TOKEN_MESSAGE: &str =
    "Your login session is invalid or has expired. Please log in again.";
pub const IN_PROGRESS_MESSAGE: &str =
    "An appeal for this account is already being processed.";

pub fn cooldown_message(remaining_secs: u64) -> String {
    format!(
        "You must wait {} before submitting another appeal.",
        format_time(remaining_secs.saturating_mul(1000))
    )
}

/// Error reply when the user is on the block-list.
pub fn blocked_reply(config: &AppealConfig, user_id: &str) -> Option<StageReply> {
    if config.is_blocked(user_id) {
        info!(user_id, "blocked user attempted an appeal");
        return Some(StageReply::error(BLOCKED_MESSAGE));
    }
    None
}

/// Error reply carrying the remaining wait when `recent` is still inside the
/// cooldown window at `now`.
pub fn cooldown_reply(recent: Option<&SubmissionRecord>, now: u64) -> Option<StageReply> {
    let record = recent?;
    let remaining = record.cooldown_remaining_secs(now);
    if remaining == 0 {
        return None;
    }

    info!(
        user_id = %record.user_id,
        remaining_secs = remaining,
        "appeal rejected by cooldown"
    );
    Some(StageReply::error(&cooldown_message(remaining)))
}

/// Read-only cooldown check against the store. Fails closed: an unavailable
/// store rejects the request with a generic message.
pub async fn precheck_cooldown(
    store: &dyn SubmissionStore,
    user_id: &str,
    now: u64,
) -> Option<StageReply> {
    match store
        .find_recent_submission(user_id, cooldown_window_start(now))
        .await
    {
        Ok(recent) => cooldown_reply(recent.as_ref(), now),
        Err(source) => {
            error!(?source, user_id, "failed to check recent appeal submissions");
            Some(StageReply::error(STORE_ERROR_MESSAGE))
        }
    }
}
