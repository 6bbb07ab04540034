// Critical accounts enrichment — account_id -> attributes affecting alert severity.

use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct CriticalAccount {
    pub account_id: String,
    pub account_type: String,
    pub is_critical: bool,
    pub allowed_hosts: Vec<String>,
    pub sensitivity_score: f64,
}

#[derive(Debug, Clone, Default)]
pub struct CriticalAccountsCache {
    pub accounts: HashMap<String, CriticalAccount>,
}

impl CriticalAccountsCache {
    pub fn get(&self, account_id: &str) -> Option<&CriticalAccount> {
        self.accounts.get(account_id)
    }

    pub fn is_critical(&self, account_id: &str) -> bool {
        self.accounts
            .get(account_id)
            .is_some_and(|acct| acct.is_critical)
    }
}

/// Stub source — replace `load` with a real query.
pub trait CriticalAccountsSource: Send + Sync {
    fn load(&self) -> Vec<CriticalAccount>;
}

#[derive(Debug, Default)]
pub struct StubCriticalAccountsSource;

impl CriticalAccountsSource for StubCriticalAccountsSource {
    fn load(&self) -> Vec<CriticalAccount> {
        vec![
            CriticalAccount {
                account_id: "account:svc-deploy".to_string(),
                account_type: "service".to_string(),
                is_critical: true,
                allowed_hosts: vec!["host:web-prod-01".to_string()],
                sensitivity_score: 0.9,
            },
            CriticalAccount {
                account_id: "account:root".to_string(),
                account_type: "root".to_string(),
                is_critical: true,
                allowed_hosts: vec![],
                sensitivity_score: 1.0,
            },
            CriticalAccount {
                account_id: "account:alice-admin".to_string(),
                account_type: "human".to_string(),
                is_critical: true,
                allowed_hosts: vec!["host:bastion-01".to_string(), "host:app-dev-02".to_string()],
                sensitivity_score: 0.7,
            },
        ]
    }
}

pub fn build_cache(source: &dyn CriticalAccountsSource) -> CriticalAccountsCache {
    let accounts = source
        .load()
        .into_iter()
        .map(|acct| (acct.account_id.clone(), acct))
        .collect();
    CriticalAccountsCache { accounts }
}
