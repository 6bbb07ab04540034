// Typed configuration record. A missing or unparseable file is never fatal — falls back to
// defaults with a logged warning; environment overrides always apply on top.

use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BurstConfig {
    pub window_seconds: i64,
    pub distinct_account_threshold: usize,
    pub max_events_tracked: usize,
}

impl Default for BurstConfig {
    fn default() -> Self {
        Self {
            window_seconds: 60,
            distinct_account_threshold: 5,
            max_events_tracked: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChainConfig {
    pub max_chain_length: usize,
    pub max_graph_nodes: usize,
    pub cycle_detection: bool,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            max_chain_length: 4,
            max_graph_nodes: 50_000,
            cycle_detection: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PrivEscConfig {
    pub enabled: bool,
}

impl Default for PrivEscConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct KeytabSmugglingConfig {
    pub enabled: bool,
}

impl Default for KeytabSmugglingConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EnrichmentConfig {
    pub refresh_interval_seconds: u64,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            refresh_interval_seconds: 300,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub auth_burst: BurstConfig,
    pub auth_chain: ChainConfig,
    pub privilege_escalation: PrivEscConfig,
    pub keytab_smuggling: KeytabSmugglingConfig,
    pub enrichment: EnrichmentConfig,
    pub mongo_uri: String,
    pub mongo_db: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            auth_burst: BurstConfig::default(),
            auth_chain: ChainConfig::default(),
            privilege_escalation: PrivEscConfig::default(),
            keytab_smuggling: KeytabSmugglingConfig::default(),
            enrichment: EnrichmentConfig::default(),
            mongo_uri: "mongodb://localhost:27017".to_string(),
            mongo_db: "privesc_detector".to_string(),
        }
    }
}

/// Loads configuration from `path` if it exists and parses; otherwise falls back to
/// defaults. Environment overrides (`MONGO_URI`, `MONGO_DB`) are always applied last.
pub fn load_config(path: Option<&Path>) -> AppConfig {
    let mut config = match path {
        Some(p) if p.exists() => match std::fs::read_to_string(p) {
            Ok(contents) => match serde_yaml::from_str::<AppConfig>(&contents) {
                Ok(cfg) => cfg,
                Err(err) => {
                    tracing::warn!(error = %err, path = %p.display(), "failed to parse config file, using defaults");
                    AppConfig::default()
                }
            },
            Err(err) => {
                tracing::warn!(error = %err, path = %p.display(), "failed to read config file, using defaults");
                AppConfig::default()
            }
        },
        Some(p) => {
            tracing::warn!(path = %p.display(), "config file not found, using defaults");
            AppConfig::default()
        }
        None => AppConfig::default(),
    };

    if let Ok(uri) = std::env::var("MONGO_URI") {
        config.mongo_uri = uri;
    }
    if let Ok(db) = std::env::var("MONGO_DB") {
        config.mongo_db = db;
    }
    config
}
