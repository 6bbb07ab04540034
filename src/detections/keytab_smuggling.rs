// Detection D — a confirmed kinit whose keytab isn't vault-registered or isn't in the
// expected location for the host it was used on.

use std::collections::HashMap;

use crate::config::KeytabSmugglingConfig;
use crate::enrichment::AllEnrichments;
use crate::events::{AuthenticationEvent, DetectionResult, DetectionType, Severity};

pub fn detect(
    event: &AuthenticationEvent,
    enrichments: &AllEnrichments,
    config: &KeytabSmugglingConfig,
) -> Option<DetectionResult> {
    if !config.enabled {
        return None;
    }
    let keytab_path = event.keytab_path.as_ref()?;

    let vault = &enrichments.vault;
    let in_vault = vault.is_keytab_in_vault(keytab_path);
    let in_expected_location = vault.is_keytab_expected(&event.host_id, keytab_path);

    if in_vault && in_expected_location {
        return None;
    }

    let reason = if !in_vault {
        "keytab not registered in vault".to_string()
    } else {
        format!("keytab '{keytab_path}' not expected on {}", event.host_id)
    };
    let is_critical = enrichments.critical_accounts.is_critical(&event.src_account_id);
    let severity = if is_critical {
        Severity::Critical
    } else {
        Severity::High
    };

    let mut metadata = HashMap::new();
    metadata.insert("keytab_path".into(), serde_json::json!(keytab_path));
    metadata.insert("in_vault".into(), serde_json::json!(in_vault));
    metadata.insert("in_expected_location".into(), serde_json::json!(in_expected_location));
    metadata.insert("account_is_critical".into(), serde_json::json!(is_critical));

    let src_node_id = format!("{}|{}", event.src_account_id, event.src_host_id);
    let dst_node_id = format!("{}|{}", event.dst_account_id, event.dst_host_id);

    Some(DetectionResult {
        detection_type: DetectionType::KeytabSmuggling,
        severity,
        edge_ids: vec![event.id.to_string()],
        node_ids: vec![src_node_id, dst_node_id],
        host_id: event.host_id.clone(),
        description: format!(
            "Keytab smuggling on {}: {reason} (account: {})",
            event.host_id, event.src_account_id
        ),
        metadata,
    })
}
