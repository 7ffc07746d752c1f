pub mod auth_callback;
pub mod eligibility;
pub mod embeds;
pub mod reply;
pub mod request;
pub mod submission;
pub mod unban;

#[cfg(test)]
mod testing;

pub use auth_callback::handle_oauth_callback;
pub use reply::StageReply;
pub use request::StageRequest;
pub use submission::handle_submission;
pub use unban::handle_unban;

/// Path the identity provider redirects back to.
pub const CALLBACK_PATH: &str = "/oauth-callback";
pub const SUBMIT_PATH: &str = "/submit";
pub const UNBAN_PATH: &str = "/unban";
