/// Round-clock timestamp in milliseconds.
///
/// `0` doubles as the "not scheduled" sentinel wherever a timestamp is
/// optional in replicated state.
pub type Millis = u64;

/// Milliseconds elapsed from `earlier` to `now`, zero if the clock is behind.
pub fn elapsed_since(now: Millis, earlier: Millis) -> Millis {
    now.saturating_sub(earlier)
}

/// Convert a duration in seconds to round-clock milliseconds.
pub fn secs(s: u64) -> Millis {
    s * 1000
}
