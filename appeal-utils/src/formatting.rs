/// Truncate a string to at most `max_chars` characters, never splitting a
/// multi-byte character.
pub fn truncate_chars(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        Some((byte_index, _)) => value[..byte_index].to_owned(),
        None => value.to_owned(),
    }
}

/// Render a Discord user mention.
pub fn user_mention(user_id: &str) -> String {
    format!("<@{}>", user_id)
}
