//! Enrichment caches (vault, critical accounts) and the manager that publishes immutable
//! snapshots of them, refreshed on a background timer.

pub mod critical_accounts;
pub mod manager;
pub mod vault;

pub use critical_accounts::{CriticalAccount, CriticalAccountsCache};
pub use manager::{AllEnrichments, EnrichmentManager};
pub use vault::VaultCache;
