//! Throttle gate deciding whether a scheduled action may run now

/// Returns true when `force` is set or strictly more than `interval_ms`
/// has elapsed since `last_ms`. A call exactly at the boundary is throttled.
pub fn allow(now_ms: i64, last_ms: i64, interval_ms: i64, force: bool) -> bool {
    force || now_ms.saturating_sub(last_ms) > interval_ms
}
