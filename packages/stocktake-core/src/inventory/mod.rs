//! Inventory API integration.
//!
//! HTTP client for the inventory service plus the run-scoped state built
//! on top of it: the existing-asset dedup cache and the sequential asset
//! ID allocator.

mod allocator;
mod cache;
mod client;
mod error;
mod retry;

pub use allocator::IdAllocator;
pub use cache::ExistingAssetIndex;
pub use client::{AuthScheme, InventoryClient, KnownAsset};
pub use error::InventoryError;
pub use retry::RetryPolicy;
