// Detection B — fires when a host sees too many distinct source accounts within a window.
//
// Stateful: records into `BurstWindowState` before evaluating, so every ingest (matching or
// not) still contributes to future windows.

use std::collections::HashMap;

use crate::config::BurstConfig;
use crate::events::{AuthEvent, DetectionResult, DetectionType, Severity};
use crate::state::BurstWindowState;

pub fn detect(
    event: &AuthEvent,
    state: &BurstWindowState,
    config: &BurstConfig,
) -> Option<DetectionResult> {
    let ts = event.timestamp();
    let host_id = event.host_id();

    let distinct = state.record_and_get_distinct(
        host_id,
        ts,
        event.src_account_id(),
        config.max_events_tracked,
        config.window_seconds,
    );
    if distinct.len() < config.distinct_account_threshold {
        return None;
    }

    let distinct_accounts: Vec<String> = distinct.into_iter().collect();
    let mut metadata = HashMap::new();
    metadata.insert(
        "distinct_account_count".into(),
        serde_json::json!(distinct_accounts.len()),
    );
    metadata.insert("distinct_accounts".into(), serde_json::json!(distinct_accounts));
    metadata.insert("window_seconds".into(), serde_json::json!(config.window_seconds));

    Some(DetectionResult {
        detection_type: DetectionType::AuthBurst,
        severity: Severity::High,
        edge_ids: vec![event.id().to_string()],
        node_ids: distinct_accounts.clone(),
        host_id: host_id.to_string(),
        description: format!(
            "Auth burst on {}: {} distinct accounts within {}s window (threshold: {})",
            host_id,
            distinct_accounts.len(),
            config.window_seconds,
            config.distinct_account_threshold,
        ),
        metadata,
    })
}
