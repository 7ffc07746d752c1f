pub mod oauth;
pub mod platform;

pub use oauth::DiscordOAuthClient;
pub use platform::DiscordPlatform;

/// Base URL of the Discord REST API.
pub const API_ENDPOINT: &str = "https://discord.com/api/v10";
