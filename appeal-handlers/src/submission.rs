use anyhow::Context as _;
use axum::body::Bytes;
use axum::http::{Method, StatusCode};
use serde::Deserialize;
use tracing::{error, info, warn};

use appeal_core::store::cooldown_window_start;
use appeal_core::{BanRecord, COOLDOWN_WINDOW_SECS, Data, PublicIdentity};

use crate::UNBAN_PATH;
use crate::eligibility::{
    IN_PROGRESS_MESSAGE, INVALID_TOKEN_MESSAGE, STORE_ERROR_MESSAGE, blocked_reply,
    cooldown_reply,
};
use crate::embeds::{AppealAnswers, appeal_message, submitter_log_message};
use crate::reply::{StageReply, with_query};
use crate::request::StageRequest;
use crate::unban::UnbanClaims;

/// Raw form fields; absent and empty values are both treated as missing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppealForm {
    ban_reason: Option<String>,
    appeal_text: Option<String>,
    future_actions: Option<String>,
    level: Option<String>,
    token: Option<String>,
}

#[derive(Deserialize)]
struct FormEnvelope {
    payload: EnvelopePayload,
}

#[derive(Deserialize)]
struct EnvelopePayload {
    data: AppealForm,
}

/// A form with every required field present.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppealSubmission {
    pub answers: AppealAnswers,
    pub token: String,
}

impl AppealForm {
    fn complete(self) -> Option<AppealSubmission> {
        fn present(value: Option<String>) -> Option<String> {
            value.filter(|value| !value.is_empty())
        }

        Some(AppealSubmission {
            answers: AppealAnswers {
                ban_reason: present(self.ban_reason)?,
                appeal_text: present(self.appeal_text)?,
                future_actions: present(self.future_actions)?,
                level: present(self.level)?,
            },
            token: present(self.token)?,
        })
    }
}

/// Parse a urlencoded form body. A repeated field keeps its first value.
pub fn parse_form_body(body: &[u8]) -> Option<AppealSubmission> {
    let pairs = serde_urlencoded::from_bytes::<Vec<(String, String)>>(body).ok()?;
    let first = |name: &str| {
        pairs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
    };

    AppealForm {
        ban_reason: first("banReason"),
        appeal_text: first("appealText"),
        future_actions: first("futureActions"),
        level: first("level"),
        token: first("token"),
    }
    .complete()
}

/// Parse the JSON envelope posted by the alternate form transport.
pub fn parse_form_envelope(body: &[u8]) -> Option<AppealSubmission> {
    serde_json::from_slice::<FormEnvelope>(body)
        .ok()?
        .payload
        .data
        .complete()
}

fn parse_submission(use_form_envelope: bool, body: &Bytes) -> Option<AppealSubmission> {
    if use_form_envelope {
        parse_form_envelope(body)
    } else {
        parse_form_body(body)
    }
}

pub async fn handle_submission(data: &Data, request: &StageRequest) -> anyhow::Result<StageReply> {
    let config = &data.config;

    if !config.use_form_envelope && request.method != Method::POST {
        return Ok(StageReply::method_not_allowed());
    }

    let Some(submission) = parse_submission(config.use_form_envelope, &request.body) else {
        return Ok(StageReply::bad_request());
    };

    let now = data.clock.now_unix_secs();
    let identity: PublicIdentity = match data.codec.decode(&submission.token, now) {
        Ok(identity) => identity,
        Err(source) => {
            warn!(%source, "appeal submitted with an unusable token");
            return Ok(StageReply::error(INVALID_TOKEN_MESSAGE));
        }
    };

    if let Some(reply) = blocked_reply(config, &identity.id) {
        return Ok(reply);
    }

    // Held until the record is written; dropping it on any early return
    // releases the user without consuming the cooldown.
    let mut lock = match data.store.try_lock_user(&identity.id).await {
        Ok(Some(lock)) => lock,
        Ok(None) => {
            info!(user_id = %identity.id, "appeal rejected: another submission is in progress");
            return Ok(StageReply::error(IN_PROGRESS_MESSAGE));
        }
        Err(source) => {
            error!(?source, user_id = %identity.id, "failed to lock appeal submissions");
            return Ok(StageReply::error(STORE_ERROR_MESSAGE));
        }
    };

    let recent = match lock.find_recent_submission(cooldown_window_start(now)).await {
        Ok(recent) => recent,
        Err(source) => {
            error!(?source, user_id = %identity.id, "failed to check recent appeal submissions");
            return Ok(StageReply::error(STORE_ERROR_MESSAGE));
        }
    };

    if let Some(reply) = cooldown_reply(recent.as_ref(), now) {
        return Ok(reply);
    }

    let ban = current_ban(data, &identity.id).await;
    let unban_link = unban_link(data, &identity.id, now)?;
    let message = appeal_message(&identity, &submission.answers, ban.as_ref(), unban_link, now);

    data.platform
        .post_message(config.appeals_channel_id, &message)
        .await?;

    if let Some(log_channel_id) = config.log_channel_id {
        let log = submitter_log_message(&identity, &request.forwarded_ip(), now);
        if let Err(source) = data.platform.post_message(log_channel_id, &log).await {
            warn!(?source, user_id = %identity.id, "failed to post appeal log message");
        }
    }

    if let Err(source) = lock.record_submission(now).await {
        error!(?source, user_id = %identity.id, "failed to record appeal submission");
    }

    info!(user_id = %identity.id, "appeal submitted");

    if config.use_form_envelope {
        Ok(StageReply::Status(StatusCode::OK))
    } else {
        Ok(StageReply::redirect("/success"))
    }
}

/// Ban record used for the footer. Lookup failures only cost the footer.
async fn current_ban(data: &Data, user_id: &str) -> Option<BanRecord> {
    let guild_id = data.config.guild_id?;
    match data.platform.fetch_ban(guild_id, user_id).await {
        Ok(ban) => ban,
        Err(source) => {
            warn!(?source, user_id, "failed to fetch ban for appeal footer");
            None
        }
    }
}

fn unban_link(data: &Data, user_id: &str, now: u64) -> anyhow::Result<Option<String>> {
    if data.config.guild_id.is_none() || data.config.disable_unban_link {
        return Ok(None);
    }

    let token = data
        .codec
        .encode(&UnbanClaims::new(user_id), Some(COOLDOWN_WINDOW_SECS), now)
        .context("failed to sign unban token")?;

    Ok(Some(with_query(
        &data.config.public_link(UNBAN_PATH),
        "token",
        &token,
    )))
}
