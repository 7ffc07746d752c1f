use anyhow::Context as _;
use async_trait::async_trait;
use tracing::warn;

use appeal_core::{AccessGrant, DiscordUser, IdentityProvider};

use crate::API_ENDPOINT;

/// Scopes requested during the handshake. `email` feeds the private log.
pub const OAUTH_SCOPES: &str = "identify email";

#[derive(Clone, Debug)]
pub struct DiscordOAuthClient {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
}

impl DiscordOAuthClient {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

#[async_trait]
impl IdentityProvider for DiscordOAuthClient {
    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> anyhow::Result<AccessGrant> {
        let response = self
            .http
            .post(format!("{API_ENDPOINT}/oauth2/token"))
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", redirect_uri),
                ("scope", OAUTH_SCOPES),
            ])
            .send()
            .await
            .context("oauth token request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, body = %body, "oauth token exchange rejected");
            anyhow::bail!("failed to get user access token ({status})");
        }

        response
            .json::<AccessGrant>()
            .await
            .context("failed to parse oauth token response")
    }

    async fn fetch_user(&self, access_token: &str) -> anyhow::Result<DiscordUser> {
        let response = self
            .http
            .get(format!("{API_ENDPOINT}/users/@me"))
            .bearer_auth(access_token)
            .send()
            .await
            .context("user info request failed")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("failed to get user info ({status})");
        }

        response
            .json::<DiscordUser>()
            .await
            .context("failed to parse user info response")
    }
}
