use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Result of an OAuth authorization-code exchange.
#[derive(Clone, Debug, Deserialize)]
pub struct AccessGrant {
    pub access_token: String,
    /// Lifetime of the access token in seconds.
    pub expires_in: u64,
}

/// User profile as returned by the identity provider.
#[derive(Clone, Debug, Deserialize)]
pub struct DiscordUser {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub discriminator: String,
    pub avatar: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// The public subset of a profile carried inside the identity token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicIdentity {
    pub id: String,
    pub avatar: Option<String>,
    pub username: String,
    pub discriminator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl PublicIdentity {
    /// `username#discriminator`, or the bare username for accounts that
    /// were migrated off discriminators.
    pub fn tag(&self) -> String {
        if self.discriminator.is_empty() || self.discriminator == "0" {
            self.username.clone()
        } else {
            format!("{}#{}", self.username, self.discriminator)
        }
    }
}

impl From<&DiscordUser> for PublicIdentity {
    fn from(user: &DiscordUser) -> Self {
        Self {
            id: user.id.clone(),
            avatar: user.avatar.clone(),
            username: user.username.clone(),
            discriminator: user.discriminator.clone(),
            email: user.email.clone(),
        }
    }
}

/// OAuth2 identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Exchange an authorization code. A non-success response is an error.
    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> anyhow::Result<AccessGrant>;

    async fn fetch_user(&self, access_token: &str) -> anyhow::Result<DiscordUser>;
}
