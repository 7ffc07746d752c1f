pub mod clock;
pub mod config;
pub mod identity;
pub mod platform;
pub mod store;
pub mod token;

use std::sync::Arc;

pub use clock::{Clock, SystemClock};
pub use config::AppealConfig;
pub use identity::{AccessGrant, DiscordUser, IdentityProvider, PublicIdentity};
pub use platform::{BanRecord, MessageField, MessageLink, ModerationMessage, ModerationPlatform};
pub use store::{SubmissionLock, SubmissionRecord, SubmissionStore};
pub use token::{TokenCodec, TokenError};

/// Fixed interval during which a user may submit at most one appeal.
pub const COOLDOWN_WINDOW_SECS: u64 = 21 * 24 * 60 * 60;

/// Everything a request stage needs: the immutable configuration and the
/// external collaborators.
#[derive(Clone)]
pub struct Data {
    pub config: Arc<AppealConfig>,
    pub codec: TokenCodec,
    pub identity: Arc<dyn IdentityProvider>,
    pub platform: Arc<dyn ModerationPlatform>,
    pub store: Arc<dyn SubmissionStore>,
    pub clock: Arc<dyn Clock>,
}
