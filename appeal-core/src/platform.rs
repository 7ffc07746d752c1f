use async_trait::async_trait;

/// Current ban entry of a user in a guild.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BanRecord {
    pub reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageField {
    pub name: String,
    pub value: String,
}

/// Link button rendered under a message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageLink {
    pub label: String,
    pub url: String,
}

/// Platform-neutral description of an embed message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModerationMessage {
    pub title: String,
    /// Unix seconds shown as the embed timestamp.
    pub timestamp: u64,
    pub fields: Vec<MessageField>,
    pub footer: Option<String>,
    pub link: Option<MessageLink>,
}

impl ModerationMessage {
    pub fn new(title: impl Into<String>, timestamp: u64) -> Self {
        Self {
            title: title.into(),
            timestamp,
            fields: Vec::new(),
            footer: None,
            link: None,
        }
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(MessageField {
            name: name.into(),
            value: value.into(),
        });
        self
    }
}

/// The moderation platform the appeals are posted to.
#[async_trait]
pub trait ModerationPlatform: Send + Sync {
    /// Fetch the current ban of a user; `None` when the user is not banned.
    async fn fetch_ban(&self, guild_id: u64, user_id: &str) -> anyhow::Result<Option<BanRecord>>;

    /// Post a message. A non-success response is an error.
    async fn post_message(&self, channel_id: u64, message: &ModerationMessage)
    -> anyhow::Result<()>;

    async fn unban(&self, guild_id: u64, user_id: &str) -> anyhow::Result<()>;
}
