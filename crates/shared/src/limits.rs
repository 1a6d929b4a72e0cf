//! Bounds enforced on both sides of the bridge.

/// Maximum number of entries in a products or keywords list.
pub const MAX_LIST_ENTRIES: usize = 500;
/// Per-entry clamp applied when a list crosses the bridge.
pub const MAX_BRIDGE_ENTRY_CHARS: usize = 200;
/// View-side ceiling for a single product entry.
pub const MAX_PRODUCT_CHARS: usize = 100;
/// View-side ceiling for a single keyword entry.
pub const MAX_KEYWORD_CHARS: usize = 200;

pub const MIN_REFRESH_INTERVAL_MS: u64 = 3_000;
pub const MAX_REFRESH_INTERVAL_MS: u64 = 3_600_000;
pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 30_000;

pub const MAX_UNLOCK_USER_CHARS: usize = 100;
pub const MAX_UNLOCK_PASS_CHARS: usize = 256;

pub const DEFAULT_MAX_LOGS: usize = 100;

pub fn refresh_interval_in_bounds(interval_ms: u64) -> bool {
    (MIN_REFRESH_INTERVAL_MS..=MAX_REFRESH_INTERVAL_MS).contains(&interval_ms)
}

/// Truncates `value` to at most `max_chars` characters (not bytes).
pub fn clamp_chars(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => value[..byte_idx].to_string(),
        None => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_on_character_boundaries() {
        assert_eq!(clamp_chars("héllo", 2), "hé");
        assert_eq!(clamp_chars("abc", 10), "abc");
        assert_eq!(clamp_chars("", 0), "");
    }

    #[test]
    fn refresh_bounds_are_inclusive() {
        assert!(!refresh_interval_in_bounds(2_999));
        assert!(refresh_interval_in_bounds(3_000));
        assert!(refresh_interval_in_bounds(3_600_000));
        assert!(!refresh_interval_in_bounds(3_600_001));
    }
}
