// Vault enrichment — host_id -> set of expected keytab paths.

use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Default)]
pub struct VaultCache {
    pub keytabs_by_host: HashMap<String, HashSet<String>>,
}

impl VaultCache {
    pub fn is_keytab_expected(&self, host_id: &str, keytab_path: &str) -> bool {
        self.keytabs_by_host
            .get(host_id)
            .is_some_and(|paths| paths.contains(keytab_path))
    }

    pub fn is_keytab_in_vault(&self, keytab_path: &str) -> bool {
        self.keytabs_by_host
            .values()
            .any(|paths| paths.contains(keytab_path))
    }
}

/// Stub source — replace `load` with a real vault API/DB query.
pub trait VaultSource: Send + Sync {
    fn load(&self) -> HashMap<String, HashSet<String>>;
}

#[derive(Debug, Default)]
pub struct StubVaultSource;

impl VaultSource for StubVaultSource {
    fn load(&self) -> HashMap<String, HashSet<String>> {
        let mut map = HashMap::new();
        map.insert(
            "host:web-prod-01".to_string(),
            HashSet::from([
                "/etc/krb5.keytab".to_string(),
                "/etc/http.keytab".to_string(),
            ]),
        );
        map.insert(
            "host:db-prod-01".to_string(),
            HashSet::from([
                "/etc/krb5.keytab".to_string(),
                "/var/lib/postgresql/pg.keytab".to_string(),
            ]),
        );
        map.insert(
            "host:bastion-01".to_string(),
            HashSet::from(["/etc/krb5.keytab".to_string()]),
        );
        map.insert(
            "host:app-dev-02".to_string(),
            HashSet::from(["/etc/krb5.keytab".to_string()]),
        );
        map
    }
}

pub fn build_cache(source: &dyn VaultSource) -> VaultCache {
    VaultCache {
        keytabs_by_host: source.load(),
    }
}
