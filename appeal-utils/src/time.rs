use std::time::{SystemTime, UNIX_EPOCH};

const MILLIS_PER_SECOND: u64 = 1000;
const MILLIS_PER_MINUTE: u64 = MILLIS_PER_SECOND * 60;
const MILLIS_PER_HOUR: u64 = MILLIS_PER_MINUTE * 60;
const MILLIS_PER_DAY: u64 = MILLIS_PER_HOUR * 24;

/// Return the current unix timestamp in seconds.
pub fn now_unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_secs())
}

/// Format a millisecond duration as a long human readable string,
/// e.g. `90061000` -> "1 day, 1 hour, 1 minute, 1 second".
///
/// Zero-valued units are omitted. A duration under one second yields an
/// empty string.
pub fn format_time(milliseconds: u64) -> String {
    let days = milliseconds / MILLIS_PER_DAY;
    let hours = (milliseconds / MILLIS_PER_HOUR) % 24;
    let minutes = (milliseconds / MILLIS_PER_MINUTE) % 60;
    let seconds = (milliseconds / MILLIS_PER_SECOND) % 60;

    [
        (days, "day"),
        (hours, "hour"),
        (minutes, "minute"),
        (seconds, "second"),
    ]
    .into_iter()
    .filter(|(value, _)| *value > 0)
    .map(|(value, unit)| {
        if value > 1 {
            format!("{} {}s", value, unit)
        } else {
            format!("{} {}", value, unit)
        }
    })
    .collect::<Vec<_>>()
    .join(", ")
}
