/// Shared formatting helpers (truncation, mentions).
pub mod formatting;
/// Shared time helpers.
pub mod time;
