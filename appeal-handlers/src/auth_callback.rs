use anyhow::Context as _;
use axum::http::Method;
use tracing::{info, warn};

use appeal_core::{Data, PublicIdentity};

use crate::CALLBACK_PATH;
use crate::eligibility::{blocked_reply, precheck_cooldown};
use crate::reply::{StageReply, with_query};
use crate::request::StageRequest;

/// Resolve the caller, apply the eligibility gates and hand out a signed
/// identity token for the appeal form.
pub async fn handle_oauth_callback(data: &Data, request: &StageRequest) -> anyhow::Result<StageReply> {
    if request.method != Method::GET {
        return Ok(StageReply::method_not_allowed());
    }

    if !request.csrf_state_matches() {
        warn!("oauth callback rejected: csrf state mismatch");
        return Ok(StageReply::forbidden());
    }

    let Some(code) = request.query_param("code") else {
        return Ok(StageReply::bad_request());
    };

    let config = &data.config;
    let grant = data
        .identity
        .exchange_code(code, &config.public_link(CALLBACK_PATH))
        .await?;
    let user = data.identity.fetch_user(&grant.access_token).await?;

    if let Some(reply) = blocked_reply(config, &user.id) {
        return Ok(reply);
    }

    let now = data.clock.now_unix_secs();
    if let Some(reply) = precheck_cooldown(data.store.as_ref(), &user.id, now).await {
        return Ok(reply);
    }

    if let Some(guild_id) = config.ban_check_guild() {
        let ban = data.platform.fetch_ban(guild_id, &user.id).await?;
        if ban.is_none() {
            info!(user_id = %user.id, "appeal login from a user who is not banned");
            return Ok(StageReply::generic_error());
        }
    }

    let identity = PublicIdentity::from(&user);
    let token = data
        .codec
        .encode(&identity, Some(grant.expires_in), now)
        .context("failed to sign identity token")?;

    info!(user_id = %user.id, "appeal login accepted");
    Ok(StageReply::redirect(with_query("/form", "token", &token)))
}
