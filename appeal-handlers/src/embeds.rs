use appeal_core::{BanRecord, MessageLink, ModerationMessage, PublicIdentity};
use appeal_utils::formatting::{truncate_chars, user_mention};

/// Discord rejects embed field values above this length.
pub const MAX_EMBED_FIELD_CHARS: usize = 1024;
pub const MAX_EMBED_FOOTER_CHARS: usize = 2048;

pub const APPEAL_TITLE: &str = "New appeal submitted!";
pub const LOG_TITLE: &str = "Ban Appeal Submission Details";
pub const UNBAN_LABEL: &str = "Approve appeal and unban user";

/// The five answers of the appeal form, all present.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppealAnswers {
    pub ban_reason: String,
    pub appeal_text: String,
    pub future_actions: String,
    pub level: String,
}

pub fn appeal_message(
    identity: &PublicIdentity,
    answers: &AppealAnswers,
    ban: Option<&BanRecord>,
    unban_link: Option<String>,
    now: u64,
) -> ModerationMessage {
    let mut message = ModerationMessage::new(APPEAL_TITLE, now)
        .field("Submitter", user_mention(&identity.id))
        .field(
            "Why were you banned?",
            truncate_chars(&answers.ban_reason, MAX_EMBED_FIELD_CHARS),
        )
        .field(
            "Why do you feel you should be unbanned?",
            truncate_chars(&answers.appeal_text, MAX_EMBED_FIELD_CHARS),
        )
        .field(
            "What will you do to avoid being banned in the future?",
            truncate_chars(&answers.future_actions, MAX_EMBED_FIELD_CHARS),
        )
        .field(
            "What estimate level were you before ban?",
            truncate_chars(&answers.level, MAX_EMBED_FIELD_CHARS),
        );

    message.footer = ban
        .and_then(|ban| ban.reason.as_deref())
        .filter(|reason| !reason.is_empty())
        .map(|reason| {
            truncate_chars(
                &format!("Original ban reason: {reason}"),
                MAX_EMBED_FOOTER_CHARS,
            )
        });

    message.link = unban_link.map(|url| MessageLink {
        label: UNBAN_LABEL.to_owned(),
        url,
    });

    message
}

/// Private log entry with the submitter's account details and address.
pub fn submitter_log_message(identity: &PublicIdentity, ip_address: &str, now: u64) -> ModerationMessage {
    ModerationMessage::new(LOG_TITLE, now)
        .field(
            "Discord User",
            format!("{} ({})", user_mention(&identity.id), identity.tag()),
        )
        .field("Discord ID", identity.id.clone())
        .field("Email", identity.email.clone().unwrap_or_else(|| "N/A".to_owned()))
        .field("IP Address", ip_address)
}
