// Detection A — fires when an event's destination privilege tier exceeds its source tier.

use std::collections::HashMap;

use crate::config::PrivEscConfig;
use crate::events::{AuthEvent, DetectionResult, DetectionType, Severity};

pub fn detect(event: &AuthEvent, config: &PrivEscConfig) -> Option<DetectionResult> {
    if !config.enabled {
        return None;
    }

    let delta = event.dst_privilege() - event.src_privilege();
    if delta <= 0.0 {
        return None;
    }

    let mechanism = event.mechanism_str();
    let mut metadata = HashMap::new();
    metadata.insert("delta".into(), serde_json::json!(round4(delta)));
    metadata.insert("mechanism".into(), serde_json::json!(mechanism));
    metadata.insert("event_category".into(), serde_json::json!(event.event_category()));
    metadata.insert("src_privilege".into(), serde_json::json!(event.src_privilege()));
    metadata.insert("dst_privilege".into(), serde_json::json!(event.dst_privilege()));

    Some(DetectionResult {
        detection_type: DetectionType::PrivilegeEscalation,
        severity: severity(delta),
        edge_ids: vec![event.id().to_string()],
        node_ids: vec![event.src_node_id(), event.dst_node_id()],
        host_id: event.host_id().to_string(),
        description: format!(
            "Privilege escalation on {}: {:.2} → {:.2} (+{:.2}) via {}",
            event.host_id(),
            event.src_privilege(),
            event.dst_privilege(),
            delta,
            mechanism,
        ),
        metadata,
    })
}

fn severity(delta: f64) -> Severity {
    if delta < 0.2 {
        Severity::Low
    } else if delta < 0.5 {
        Severity::Medium
    } else if delta < 0.8 {
        Severity::High
    } else {
        Severity::Critical
    }
}

fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{RawSource, SessionEvent, SessionMechanism};
    use chrono::Utc;
    use std::collections::HashMap as Map;
    use uuid::Uuid;

    fn event(src: f64, dst: f64) -> AuthEvent {
        AuthEvent::Session(SessionEvent {
            id: Uuid::new_v4(),
            src_account_id: "account:a".into(),
            src_host_id: "host:h1".into(),
            dst_account_id: "account:b".into(),
            dst_host_id: "host:h1".into(),
            mechanism: SessionMechanism::Ssh,
            src_privilege: src,
            dst_privilege: dst,
            timestamp: Utc::now(),
            session_id: None,
            host_id: "host:h1".into(),
            raw_source: RawSource::UnixAuth,
            metadata: Map::new(),
            auth_method: None,
            command_line: None,
        })
    }

    #[test]
    fn s1_fires_with_medium_severity() {
        let result = detect(&event(0.2, 0.5), &PrivEscConfig { enabled: true }).unwrap();
        assert_eq!(result.severity, Severity::Medium);
        assert_eq!(result.metadata["delta"], serde_json::json!(0.3));
    }

    #[test]
    fn does_not_fire_on_non_positive_delta() {
        assert!(detect(&event(0.5, 0.5), &PrivEscConfig { enabled: true }).is_none());
        assert!(detect(&event(0.5, 0.2), &PrivEscConfig { enabled: true }).is_none());
    }

    #[test]
    fn disabled_config_suppresses_detection() {
        assert!(detect(&event(0.1, 0.9), &PrivEscConfig { enabled: false }).is_none());
    }

    #[test]
    fn severity_bands() {
        assert_eq!(severity(0.1), Severity::Low);
        assert_eq!(severity(0.3), Severity::Medium);
        assert_eq!(severity(0.6), Severity::High);
        assert_eq!(severity(0.9), Severity::Critical);
    }
}
