//! The existing-asset dedup cache.
//!
//! Loaded once per run from the inventory listing and updated only with
//! this run's own successful registrations. Assets added concurrently by
//! another run stay invisible until the next sweep: a deliberate
//! staleness window; the cache is never re-polled mid-run.

use super::client::InventoryClient;
use super::error::InventoryError;
use crate::UNKNOWN;
use std::collections::HashSet;

/// The MAC and IP addresses the inventory already knows.
#[derive(Debug, Default)]
pub struct ExistingAssetIndex {
    macs: HashSet<String>,
    ips: HashSet<String>,
}

impl ExistingAssetIndex {
    /// Load the index from the inventory listing. Never fails: an
    /// unreachable or unauthorized inventory degrades to an empty index
    /// and the sweep proceeds best-effort.
    pub async fn load(client: Option<&InventoryClient>) -> Self {
        let Some(client) = client else {
            tracing::debug!("Offline mode: starting with an empty asset index");
            return Self::default();
        };

        match client.list_assets().await {
            Ok(assets) => {
                let mut index = Self::default();
                for asset in assets {
                    if let Some(mac) = asset.mac_address.as_deref() {
                        if usable(mac) {
                            index.macs.insert(mac.to_string());
                        }
                    }
                    if let Some(ip) = asset.ip_address.as_deref() {
                        if usable(ip) {
                            index.ips.insert(ip.to_string());
                        }
                    }
                }
                tracing::info!(
                    "Loaded existing assets: {} MACs, {} IPs",
                    index.macs.len(),
                    index.ips.len()
                );
                index
            }
            Err(InventoryError::Unauthorized) => {
                tracing::warn!(
                    "Asset listing 401 Unauthorized; continuing with an empty cache (pass --bearer or --basic-user)"
                );
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Could not load existing assets: {}; continuing with an empty cache", e);
                Self::default()
            }
        }
    }

    /// True iff the MAC or the IP is already known. Either match alone is
    /// enough; the `Unknown` sentinel never matches, so an all-unknown
    /// device can only be filtered by its IP.
    pub fn is_duplicate(&self, mac: &str, ip: &str) -> bool {
        (usable(mac) && self.macs.contains(mac)) || (usable(ip) && self.ips.contains(ip))
    }

    /// Record a freshly registered device so later hosts in the same run
    /// see it as a duplicate.
    pub fn insert(&mut self, mac: &str, ip: &str) {
        if usable(mac) {
            self.macs.insert(mac.to_string());
        }
        if usable(ip) {
            self.ips.insert(ip.to_string());
        }
    }
}

fn usable(value: &str) -> bool {
    !value.is_empty() && value != UNKNOWN
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> ExistingAssetIndex {
        let mut index = ExistingAssetIndex::default();
        index.insert("2C:3A:FD:11:22:33", "10.0.0.5");
        index
    }

    #[test]
    fn either_address_marks_a_duplicate() {
        let index = seeded();
        assert!(index.is_duplicate("2C:3A:FD:11:22:33", "10.0.0.99"));
        assert!(index.is_duplicate(UNKNOWN, "10.0.0.5"));
        assert!(!index.is_duplicate("AA:AA:AA:AA:AA:AA", "10.0.0.99"));
    }

    #[test]
    fn unknown_sentinel_never_matches_by_mac() {
        let mut index = ExistingAssetIndex::default();
        index.insert(UNKNOWN, "10.0.0.5");
        // The sentinel was not stored, so a second all-unknown device on a
        // different IP is not a duplicate
        assert!(!index.is_duplicate(UNKNOWN, "10.0.0.6"));
        assert!(index.is_duplicate(UNKNOWN, "10.0.0.5"));
    }

    #[test]
    fn empty_values_never_match() {
        let index = seeded();
        assert!(!index.is_duplicate("", ""));
    }

    #[test]
    fn within_run_inserts_catch_later_hosts() {
        let mut index = ExistingAssetIndex::default();
        assert!(!index.is_duplicate("08:00:27:AA:BB:CC", "10.0.0.7"));
        index.insert("08:00:27:AA:BB:CC", "10.0.0.7");
        assert!(index.is_duplicate("08:00:27:AA:BB:CC", "10.0.0.200"));
        assert!(index.is_duplicate(UNKNOWN, "10.0.0.7"));
    }

    #[tokio::test]
    async fn offline_load_is_empty() {
        let index = ExistingAssetIndex::load(None).await;
        assert!(!index.is_duplicate("2C:3A:FD:11:22:33", "10.0.0.5"));
    }
}
