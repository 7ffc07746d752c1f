use std::collections::HashSet;
use std::env;

use anyhow::Context as _;

/// Process-wide configuration, read once at start-up and shared read-only
/// by every request stage.
#[derive(Clone, Debug)]
pub struct AppealConfig {
    pub discord_client_id: String,
    pub discord_client_secret: String,
    pub bot_token: String,
    /// Community the appeals belong to. Enables the ban-status gate, the
    /// original ban reason footer and the unban link.
    pub guild_id: Option<u64>,
    pub skip_ban_check: bool,
    pub appeals_channel_id: u64,
    /// Private channel receiving submitter details (email, IP).
    pub log_channel_id: Option<u64>,
    pub disable_unban_link: bool,
    /// Read submissions as a JSON form envelope instead of a urlencoded POST.
    pub use_form_envelope: bool,
    pub jwt_secret: String,
    /// Externally visible base URL, without a trailing slash.
    pub public_url: String,
    pub blocked_users: HashSet<String>,
}

impl AppealConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let guild_id = env_optional_u64("GUILD_ID")?;
        let log_channel_id = env_optional_u64("APPEAL_LOG_CHANNEL")?;
        let appeals_channel_id = env_required("APPEALS_CHANNEL")?
            .parse::<u64>()
            .context("APPEALS_CHANNEL must be a channel id")?;

        Ok(Self {
            discord_client_id: env_required("DISCORD_CLIENT_ID")?,
            discord_client_secret: env_required("DISCORD_CLIENT_SECRET")?,
            bot_token: env_required("DISCORD_BOT_TOKEN")?,
            guild_id,
            skip_ban_check: env_bool("SKIP_BAN_CHECK", false),
            appeals_channel_id,
            log_channel_id,
            disable_unban_link: env_bool("DISABLE_UNBAN_LINK", false),
            use_form_envelope: env_bool("USE_FORM_ENVELOPE", false),
            jwt_secret: env_required("JWT_SECRET")?,
            public_url: env_required("PUBLIC_URL")?.trim_end_matches('/').to_owned(),
            blocked_users: parse_block_list(&env::var("BLOCKED_USERS").unwrap_or_default()),
        })
    }

    pub fn is_blocked(&self, user_id: &str) -> bool {
        self.blocked_users.contains(user_id)
    }

    /// Guild in which the Auth-Callback stage must confirm an active ban.
    pub fn ban_check_guild(&self) -> Option<u64> {
        self.guild_id.filter(|_| !self.skip_ban_check)
    }

    pub fn public_link(&self, path: &str) -> String {
        format!("{}{}", self.public_url, path)
    }
}

pub fn env_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(value) => matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        Err(_) => default,
    }
}

pub fn env_u64(key: &str, default: u64) -> u64 {
    match env::var(key) {
        Ok(value) => value.trim().parse::<u64>().unwrap_or(default),
        Err(_) => default,
    }
}

fn env_required(key: &str) -> anyhow::Result<String> {
    let value = env::var(key).with_context(|| format!("missing required env var {key}"))?;
    let value = value.trim();
    if value.is_empty() {
        anyhow::bail!("env var {key} is empty");
    }
    Ok(value.to_owned())
}

fn env_optional_u64(key: &str) -> anyhow::Result<Option<u64>> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse::<u64>()
            .map(Some)
            .with_context(|| format!("{key} must be a numeric id")),
        _ => Ok(None),
    }
}

fn parse_block_list(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_owned)
        .collect()
}
