use std::sync::Arc;

use anyhow::Context as _;
use async_trait::async_trait;
use serenity::all::{
    ChannelId, CreateActionRow, CreateButton, CreateEmbed, CreateEmbedFooter, CreateMessage,
    GuildId, Http, Timestamp, UserId,
};
use tracing::debug;

use appeal_core::{BanRecord, ModerationMessage, ModerationPlatform};

/// Default embed color used for appeal messages.
pub const DEFAULT_EMBED_COLOR: u32 = 0x90_55_30;

/// Moderation platform backed by serenity's REST client.
#[derive(Clone)]
pub struct DiscordPlatform {
    http: Arc<Http>,
}

impl std::fmt::Debug for DiscordPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordPlatform").finish_non_exhaustive()
    }
}

impl DiscordPlatform {
    pub fn new(bot_token: &str) -> Self {
        Self {
            http: Arc::new(Http::new(bot_token)),
        }
    }
}

fn parse_user_id(user_id: &str) -> anyhow::Result<UserId> {
    let raw = user_id
        .parse::<u64>()
        .with_context(|| format!("invalid user id `{user_id}`"))?;
    if raw == 0 {
        anyhow::bail!("invalid user id `0`");
    }
    Ok(UserId::new(raw))
}

fn nonzero(id: u64, what: &str) -> anyhow::Result<u64> {
    if id == 0 {
        anyhow::bail!("{what} id must not be zero");
    }
    Ok(id)
}

/// Render a platform-neutral message as a serenity embed.
pub fn build_embed(message: &ModerationMessage) -> anyhow::Result<CreateEmbed> {
    let timestamp = i64::try_from(message.timestamp).context("timestamp out of i64 range")?;
    let timestamp = Timestamp::from_unix_timestamp(timestamp)
        .map_err(|_| anyhow::anyhow!("timestamp {timestamp} out of range"))?;

    let mut embed = CreateEmbed::new()
        .title(message.title.clone())
        .color(DEFAULT_EMBED_COLOR)
        .timestamp(timestamp);

    for field in &message.fields {
        embed = embed.field(field.name.clone(), field.value.clone(), false);
    }

    if let Some(footer) = message.footer.as_deref() {
        embed = embed.footer(CreateEmbedFooter::new(footer));
    }

    Ok(embed)
}

pub fn build_message(message: &ModerationMessage) -> anyhow::Result<CreateMessage> {
    let mut builder = CreateMessage::new().embed(build_embed(message)?);

    if let Some(link) = &message.link {
        let button = CreateButton::new_link(link.url.clone()).label(link.label.clone());
        builder = builder.components(vec![CreateActionRow::Buttons(vec![button])]);
    }

    Ok(builder)
}

#[async_trait]
impl ModerationPlatform for DiscordPlatform {
    async fn fetch_ban(&self, guild_id: u64, user_id: &str) -> anyhow::Result<Option<BanRecord>> {
        let guild_id = GuildId::new(nonzero(guild_id, "guild")?);
        let user_id = parse_user_id(user_id)?;

        let ban = guild_id
            .get_ban(&*self.http, user_id)
            .await
            .context("failed to fetch ban")?;

        Ok(ban.map(|ban| BanRecord { reason: ban.reason }))
    }

    async fn post_message(
        &self,
        channel_id: u64,
        message: &ModerationMessage,
    ) -> anyhow::Result<()> {
        let channel_id = ChannelId::new(nonzero(channel_id, "channel")?);
        let sent = channel_id
            .send_message(&*self.http, build_message(message)?)
            .await
            .context("failed to submit message")?;

        debug!(channel_id = channel_id.get(), message_id = sent.id.get(), "message posted");
        Ok(())
    }

    async fn unban(&self, guild_id: u64, user_id: &str) -> anyhow::Result<()> {
        let guild_id = GuildId::new(nonzero(guild_id, "guild")?);
        let user_id = parse_user_id(user_id)?;

        guild_id
            .unban(&*self.http, user_id)
            .await
            .context("failed to unban user")?;

        Ok(())
    }
}
