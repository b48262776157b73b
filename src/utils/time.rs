use time::OffsetDateTime;

/// Prefix of generated session titles.
pub const SESSION_TITLE_PREFIX: &str = "SESSION_";

/// Generates a session title from the current clock.
pub fn default_session_title() -> String {
    session_title_at(OffsetDateTime::now_utc())
}

/// Formats a session title as `SESSION_` plus the last four digits of the
/// epoch-millisecond timestamp.
pub fn session_title_at(at: OffsetDateTime) -> String {
    let millis = at.unix_timestamp_nanos() / 1_000_000;
    format!("{SESSION_TITLE_PREFIX}{:04}", millis.rem_euclid(10_000))
}
