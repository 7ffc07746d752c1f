use axum::http::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use appeal_core::Data;

use crate::reply::StageReply;
use crate::request::StageRequest;

const UNBAN_PURPOSE: &str = "unban";

/// Claims of the signed link attached to appeal messages.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnbanClaims {
    #[serde(rename = "userId")]
    pub user_id: String,
    purpose: String,
}

impl UnbanClaims {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            purpose: UNBAN_PURPOSE.to_owned(),
        }
    }
}

/// Lift the ban of the user named by a signed unban link.
pub async fn handle_unban(data: &Data, request: &StageRequest) -> anyhow::Result<StageReply> {
    if request.method != Method::GET {
        return Ok(StageReply::method_not_allowed());
    }

    let Some(guild_id) = data.config.guild_id else {
        return Ok(StageReply::Status(StatusCode::NOT_FOUND));
    };

    let Some(token) = request.query_param("token") else {
        return Ok(StageReply::bad_request());
    };

    let now = data.clock.now_unix_secs();
    let claims = match data.codec.decode::<UnbanClaims>(token, now) {
        Ok(claims) if claims.purpose == UNBAN_PURPOSE => claims,
        Ok(_) => {
            warn!("unban link rejected: token was not issued for unbanning");
            return Ok(StageReply::forbidden());
        }
        Err(source) => {
            warn!(%source, "unban link rejected");
            return Ok(StageReply::forbidden());
        }
    };

    data.platform.unban(guild_id, &claims.user_id).await?;
    info!(user_id = %claims.user_id, "user unbanned from appeal link");

    Ok(StageReply::redirect("/unban-success"))
}
