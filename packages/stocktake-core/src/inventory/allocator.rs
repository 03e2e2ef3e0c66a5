//! Sequential asset ID allocation.
//!
//! One series per asset type, keyed by the upper-cased type. The first
//! allocation of a type consumes the inventory's authoritative next-ID
//! answer; everything after increments in memory, avoiding a round trip
//! per asset of the same type. Series are run-scoped: IDs are strictly
//! increasing and collision-free within a run, but two concurrent runs
//! can collide; there is no distributed locking.

use std::collections::HashMap;

#[derive(Debug)]
struct SeriesState {
    prefix: String,
    counter: u64,
}

/// Run-scoped allocator, owned by the sweep pipeline.
#[derive(Debug, Default)]
pub struct IdAllocator {
    series: HashMap<String, SeriesState>,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The allocator's partition key for an asset type.
    pub fn normalize(asset_type: &str) -> String {
        let key = asset_type.to_uppercase();
        if key.is_empty() { "GEN".to_string() } else { key }
    }

    /// Whether a series already exists for this type (i.e. no seed fetch
    /// is needed).
    pub fn is_seeded(&self, asset_type: &str) -> bool {
        self.series.contains_key(&Self::normalize(asset_type))
    }

    /// Produce the next ID for the type.
    ///
    /// `seed` is the inventory's next-ID answer, supplied only on the
    /// first allocation of a type. A parseable seed starts the series
    /// as-is; a malformed or absent one falls back to a local series
    /// `{first-3-of-type}-001`.
    pub fn allocate(&mut self, asset_type: &str, seed: Option<&str>) -> String {
        let key = Self::normalize(asset_type);

        if let Some(state) = self.series.get_mut(&key) {
            state.counter += 1;
            return format_id(&state.prefix, state.counter);
        }

        let (prefix, counter) = seed
            .and_then(parse_series_id)
            .unwrap_or_else(|| local_series(&key));
        let id = format_id(&prefix, counter);
        self.series.insert(key, SeriesState { prefix, counter });
        id
    }
}

fn format_id(prefix: &str, counter: u64) -> String {
    format!("{prefix}-{counter:03}")
}

/// Parse an inventory-issued ID of the shape `PREFIX-DIGITS`.
fn parse_series_id(id: &str) -> Option<(String, u64)> {
    let (prefix, digits) = id.trim().split_once('-')?;

    let prefix_ok = !prefix.is_empty()
        && prefix
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit());
    let digits_ok = !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit());

    if !prefix_ok || !digits_ok {
        return None;
    }

    Some((prefix.to_string(), digits.parse().ok()?))
}

fn local_series(key: &str) -> (String, u64) {
    let prefix: String = key.chars().take(3).collect();
    let prefix = if prefix.is_empty() {
        "GEN".to_string()
    } else {
        prefix
    };
    (prefix, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_series_starts_at_the_seed_and_increments() {
        let mut allocator = IdAllocator::new();
        assert_eq!(allocator.allocate("PC", Some("PC-004")), "PC-004");
        assert_eq!(allocator.allocate("PC", None), "PC-005");
        assert_eq!(allocator.allocate("PC", None), "PC-006");
    }

    #[test]
    fn malformed_seed_falls_back_to_a_local_series() {
        let mut allocator = IdAllocator::new();
        assert_eq!(allocator.allocate("Server", Some("not an id")), "SER-001");
        assert_eq!(allocator.allocate("Server", None), "SER-002");
    }

    #[test]
    fn absent_seed_falls_back_too() {
        let mut allocator = IdAllocator::new();
        assert_eq!(allocator.allocate("PC", None), "PC-001");
        assert_eq!(allocator.allocate("PC", None), "PC-002");
    }

    #[test]
    fn empty_type_uses_the_generic_series() {
        let mut allocator = IdAllocator::new();
        assert_eq!(allocator.allocate("", None), "GEN-001");
        assert!(allocator.is_seeded(""));
    }

    #[test]
    fn type_key_is_case_insensitive() {
        let mut allocator = IdAllocator::new();
        assert_eq!(allocator.allocate("Server", Some("SER-010")), "SER-010");
        assert_eq!(allocator.allocate("SERVER", None), "SER-011");
        assert_eq!(allocator.allocate("server", None), "SER-012");
    }

    #[test]
    fn series_are_independent_per_type() {
        let mut allocator = IdAllocator::new();
        assert_eq!(allocator.allocate("PC", Some("PC-100")), "PC-100");
        assert_eq!(allocator.allocate("Server", Some("SER-002")), "SER-002");
        assert_eq!(allocator.allocate("PC", None), "PC-101");
        assert_eq!(allocator.allocate("Server", None), "SER-003");
    }

    #[test]
    fn counters_past_three_digits_are_not_truncated() {
        let mut allocator = IdAllocator::new();
        assert_eq!(allocator.allocate("PC", Some("PC-999")), "PC-999");
        assert_eq!(allocator.allocate("PC", None), "PC-1000");
        assert_eq!(allocator.allocate("PC", None), "PC-1001");
    }

    #[test]
    fn small_counters_are_zero_padded() {
        let mut allocator = IdAllocator::new();
        assert_eq!(allocator.allocate("PC", Some("PC-7")), "PC-007");
    }

    #[test]
    fn seed_is_ignored_once_a_series_exists() {
        let mut allocator = IdAllocator::new();
        assert_eq!(allocator.allocate("PC", Some("PC-004")), "PC-004");
        // A late seed must not reset the series
        assert_eq!(allocator.allocate("PC", Some("PC-001")), "PC-005");
    }

    #[test]
    fn seed_parser_accepts_only_prefix_dash_digits() {
        assert_eq!(parse_series_id("PC-004"), Some(("PC".to_string(), 4)));
        assert_eq!(parse_series_id("R2D2-44"), Some(("R2D2".to_string(), 44)));
        assert_eq!(parse_series_id("pc-004"), None);
        assert_eq!(parse_series_id("PC-"), None);
        assert_eq!(parse_series_id("-004"), None);
        assert_eq!(parse_series_id("PC-4a"), None);
        assert_eq!(parse_series_id("PC_004"), None);
        assert_eq!(parse_series_id(""), None);
    }

    #[test]
    fn mobile_phones_prefix_is_first_three_letters() {
        let mut allocator = IdAllocator::new();
        assert_eq!(allocator.allocate("Mobile Phones", None), "MOB-001");
    }
}
