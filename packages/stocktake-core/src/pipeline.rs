//! The sweep pipeline.
//!
//! Drives discovery → per-host collection → dedup → classification → ID
//! allocation → registration (or dry-run buffering), strictly one host at
//! a time. A failure while processing one host is logged and counted,
//! never allowed to abort the rest of the run.

use crate::classify;
use crate::inventory::{ExistingAssetIndex, IdAllocator, InventoryClient, InventoryError, RetryPolicy};
use crate::record::AssetRecord;
use crate::scanner::{
    self, CollectOptions, ManagementCredentials, ManagementProbe, ScanCapabilities,
};
use anyhow::{Context, Result};
use std::time::Duration;

/// Knobs for one sweep run.
#[derive(Debug, Clone)]
pub struct SweepOptions {
    /// Single IP, `a-b` range, or CIDR.
    pub target: String,
    /// Build records but do not POST them.
    pub dry_run: bool,
    pub skip_management: bool,
    pub skip_arp: bool,
    pub skip_os: bool,
    /// Pause between successful registrations, protecting a single-writer
    /// backend from sustained write pressure.
    pub throttle: Duration,
    /// Cap on processed hosts; 0 means no limit.
    pub max_hosts: usize,
    pub retry: RetryPolicy,
}

impl Default for SweepOptions {
    fn default() -> Self {
        Self {
            target: String::new(),
            dry_run: false,
            skip_management: false,
            skip_arp: false,
            skip_os: false,
            throttle: Duration::from_millis(350),
            max_hosts: 0,
            retry: RetryPolicy::default(),
        }
    }
}

/// Terminal state for one processed host.
#[derive(Debug)]
pub enum HostOutcome {
    Registered { asset_id: String },
    Prepared(AssetRecord),
    Skipped,
}

/// What one run did, for the closing log line and the dry-run output.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub seen: usize,
    /// Registered (live run) or prepared (dry run).
    pub added: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Buffered records; populated only in dry-run mode.
    pub prepared: Vec<AssetRecord>,
}

/// One sweep's worth of state: the allocator and the dedup index live
/// here for exactly the run's lifetime.
pub struct SweepRunner {
    options: SweepOptions,
    client: Option<InventoryClient>,
    management: Option<ManagementProbe>,
    capabilities: ScanCapabilities,
    allocator: IdAllocator,
    index: ExistingAssetIndex,
}

impl SweepRunner {
    /// Set up a run: detect capabilities once, acquire the management
    /// probe if available, and load the dedup index.
    pub async fn new(
        options: SweepOptions,
        client: Option<InventoryClient>,
        management_credentials: Option<ManagementCredentials>,
    ) -> Self {
        let capabilities = scanner::detect_capabilities().await;
        if let Some(warning) = &capabilities.warning {
            tracing::warn!("Limited scan capabilities: {}", warning);
        }

        let management = if options.skip_management {
            None
        } else {
            ManagementProbe::acquire(management_credentials)
        };

        let index = ExistingAssetIndex::load(client.as_ref()).await;

        Self {
            options,
            client,
            management,
            capabilities,
            allocator: IdAllocator::new(),
            index,
        }
    }

    /// Run the sweep to completion and return the summary.
    pub async fn run(mut self) -> Result<RunSummary> {
        let started = std::time::Instant::now();

        let mut hosts = scanner::discover(&self.options.target, &self.capabilities).await?;
        if self.options.max_hosts > 0 && hosts.len() > self.options.max_hosts {
            tracing::info!(
                "Limiting run to the first {} of {} discovered hosts",
                self.options.max_hosts,
                hosts.len()
            );
            hosts.truncate(self.options.max_hosts);
        }

        let mut summary = RunSummary::default();

        for ip in &hosts {
            summary.seen += 1;

            match self.process_host(ip).await {
                Ok(HostOutcome::Registered { asset_id }) => {
                    summary.added += 1;
                    tracing::info!("Registered: {} -> {}", ip, asset_id);
                    if !self.options.throttle.is_zero() {
                        tokio::time::sleep(self.options.throttle).await;
                    }
                }
                Ok(HostOutcome::Prepared(record)) => {
                    summary.added += 1;
                    tracing::info!("Prepared: {} -> {}", ip, record.asset_id);
                    summary.prepared.push(record);
                }
                Ok(HostOutcome::Skipped) => {
                    summary.skipped += 1;
                }
                // The per-host boundary: log, count, keep sweeping
                Err(e) => {
                    summary.failed += 1;
                    tracing::error!("Error processing {}: {:#}", ip, e);
                }
            }
        }

        tracing::info!(
            "Done in {:.1}s. Seen: {}, {}: {}, Skipped: {}, Failed: {}",
            started.elapsed().as_secs_f64(),
            summary.seen,
            if self.options.dry_run { "Prepared" } else { "Added" },
            summary.added,
            summary.skipped,
            summary.failed
        );

        Ok(summary)
    }

    async fn process_host(&mut self, ip: &str) -> Result<HostOutcome> {
        let collect = CollectOptions {
            skip_os: self.options.skip_os,
            skip_arp: self.options.skip_arp,
        };
        let fingerprint =
            scanner::collect_fingerprint(ip, &collect, &self.capabilities, self.management.as_ref())
                .await;

        if self.index.is_duplicate(&fingerprint.mac, &fingerprint.ip) {
            tracing::info!("Duplicate: {} (skipped)", ip);
            return Ok(HostOutcome::Skipped);
        }

        let classification = classify::classify(&fingerprint.os, &fingerprint.model);

        // One next-ID round trip per asset type per run; after that the
        // allocator increments locally.
        let seed = if self.allocator.is_seeded(classification.asset_type) {
            None
        } else {
            match &self.client {
                Some(client) => client.next_asset_id(classification.asset_type).await,
                None => None,
            }
        };
        let asset_id = self.allocator.allocate(classification.asset_type, seed.as_deref());

        let record = AssetRecord::compose(&fingerprint, &classification, asset_id);

        if self.options.dry_run {
            return Ok(HostOutcome::Prepared(record));
        }

        let client = self
            .client
            .as_ref()
            .ok_or(InventoryError::Offline)
            .context("registration needs the inventory API; combine --no-api with --dry-run")?;

        client
            .register_asset(&record, &self.options.retry)
            .await
            .with_context(|| format!("registering {} failed", record.asset_id))?;

        self.index.insert(&record.mac_address, &record.ip_address);

        Ok(HostOutcome::Registered {
            asset_id: record.asset_id,
        })
    }
}
