// Holds the current enrichment snapshot and runs the background refresh loop.
//
// Readers take a lock-free `load_full()` off an `ArcSwapOption`; the single refresh task is
// the only writer, so there is never contention on the hot read path. Detector code always
// sees a fully built `AllEnrichments` — never a partial one.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::config::EnrichmentConfig;
use crate::enrichment::critical_accounts::{
    self, CriticalAccountsCache, CriticalAccountsSource, StubCriticalAccountsSource,
};
use crate::enrichment::vault::{self, StubVaultSource, VaultCache, VaultSource};
use crate::error::{Result, SentinelError};

#[derive(Debug, Clone, Default)]
pub struct AllEnrichments {
    pub vault: VaultCache,
    pub critical_accounts: CriticalAccountsCache,
}

pub struct EnrichmentManager {
    config: EnrichmentConfig,
    vault_source: Box<dyn VaultSource>,
    accounts_source: Box<dyn CriticalAccountsSource>,
    current: Arc<ArcSwapOption<AllEnrichments>>,
    task: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl EnrichmentManager {
    pub fn new(config: EnrichmentConfig) -> Self {
        Self::with_sources(
            config,
            Box::new(StubVaultSource),
            Box::new(StubCriticalAccountsSource),
        )
    }

    pub fn with_sources(
        config: EnrichmentConfig,
        vault_source: Box<dyn VaultSource>,
        accounts_source: Box<dyn CriticalAccountsSource>,
    ) -> Self {
        Self {
            config,
            vault_source,
            accounts_source,
            current: Arc::new(ArcSwapOption::empty()),
            task: std::sync::Mutex::new(None),
        }
    }

    /// Builds the first snapshot synchronously. Must run before any call to `current()` or
    /// `start_refresh_loop()`.
    pub fn load_sync(&self) {
        self.current.store(Some(Arc::new(self.build())));
    }

    /// Starts the single background refresh task. Only one may exist at a time; calling
    /// this twice replaces the handle of an already-running loop, which the caller should
    /// avoid (`stop()` first).
    pub fn start_refresh_loop(self: &Arc<Self>) {
        let manager = Arc::clone(self);
        let handle = tokio::spawn(async move {
            loop {
                tokio::time::sleep(std::time::Duration::from_secs(
                    manager.config.refresh_interval_seconds,
                ))
                .await;
                let snapshot = manager.build();
                manager.current.store(Some(Arc::new(snapshot)));
                info!("enrichment snapshot refreshed");
            }
        });
        *self.task.lock().unwrap() = Some(handle);
    }

    /// Cancels the refresh task and waits for it to terminate. Cancellation during sleep is
    /// the expected path and is never surfaced as an error; any other join failure is logged.
    pub async fn stop(&self) {
        let handle = self.task.lock().unwrap().take();
        if let Some(handle) = handle {
            handle.abort();
            match handle.await {
                Ok(()) => {}
                Err(e) if e.is_cancelled() => {}
                Err(e) => error!(error = %e, "enrichment refresh task ended abnormally"),
            }
        }
    }

    /// Returns the current snapshot. Fails loudly if `load_sync()` has not run yet — reading
    /// enrichment data before startup completes is a programmer error, not a recoverable one.
    pub fn current(&self) -> Result<Arc<AllEnrichments>> {
        self.current
            .load_full()
            .ok_or_else(|| SentinelError::Lifecycle("EnrichmentManager not yet loaded".into()))
    }

    fn build(&self) -> AllEnrichments {
        AllEnrichments {
            vault: vault::build_cache(self.vault_source.as_ref()),
            critical_accounts: critical_accounts::build_cache(self.accounts_source.as_ref()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reading_before_load_sync_fails_loudly() {
        let manager = EnrichmentManager::new(EnrichmentConfig::default());
        assert!(manager.current().is_err());
    }

    #[test]
    fn load_sync_populates_current() {
        let manager = EnrichmentManager::new(EnrichmentConfig::default());
        manager.load_sync();
        let snapshot = manager.current().unwrap();
        assert!(snapshot.critical_accounts.is_critical("account:root"));
    }

    #[tokio::test]
    async fn refresh_loop_can_be_stopped_without_error() {
        let manager = Arc::new(EnrichmentManager::new(EnrichmentConfig {
            refresh_interval_seconds: 3600,
        }));
        manager.load_sync();
        manager.start_refresh_loop();
        manager.stop().await;
    }
}
