//! Stocktake Core Library
//!
//! This crate provides the core functionality for the Stocktake agent:
//! - Network discovery (nmap ping scan with a system-ping fallback)
//! - Per-host fingerprint collection (reverse DNS, port probe, ARP,
//!   OUI manufacturer lookup, optional remote management query)
//! - Inventory synchronization (dedup cache, sequential ID allocation,
//!   retrying registration against a single-writer backend)
//!
//! # Example
//!
//! ```no_run
//! use stocktake_core::{AuthScheme, InventoryClient, SweepOptions, SweepRunner};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = InventoryClient::new("http://inventory:4000", AuthScheme::Anonymous)?;
//!
//!     let options = SweepOptions {
//!         target: "192.168.1.0/24".to_string(),
//!         ..SweepOptions::default()
//!     };
//!
//!     let runner = SweepRunner::new(options, Some(client), None).await;
//!     let summary = runner.run().await?;
//!     println!("registered {} new assets", summary.added);
//!
//!     Ok(())
//! }
//! ```

pub mod classify;
pub mod config;
pub mod inventory;
pub mod pipeline;
pub mod record;
pub mod scanner;

/// Sentinel recorded for any fingerprint attribute that could not be observed.
pub const UNKNOWN: &str = "Unknown";

// Re-export commonly used types
pub use classify::Classification;
pub use config::{AgentConfig, ConfigSource};
pub use inventory::{
    AuthScheme, ExistingAssetIndex, IdAllocator, InventoryClient, InventoryError, RetryPolicy,
};
pub use pipeline::{HostOutcome, RunSummary, SweepOptions, SweepRunner};
pub use record::AssetRecord;
pub use scanner::{HostFingerprint, ManagementCredentials, ScanCapabilities};
