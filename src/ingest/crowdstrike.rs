// CrowdStrike Falcon ingest stub. A real deployment replaces `fetch_events` with a Falcon
// Event Streams / Detections API client; the return type contract (`Vec<AuthEvent>` of
// confirmed outcomes) must be preserved.

use std::collections::HashMap;

use chrono::Utc;
use uuid::Uuid;

use crate::events::{AuthEvent, RawSource, SessionEvent, SessionMechanism};

pub fn fetch_events() -> Vec<AuthEvent> {
    let now = Utc::now();
    vec![
        AuthEvent::Session(SessionEvent {
            id: Uuid::new_v4(),
            src_account_id: "account:jsmith".into(),
            src_host_id: "host:web-prod-01".into(),
            dst_account_id: "account:svc-deploy".into(),
            dst_host_id: "host:web-prod-01".into(),
            mechanism: SessionMechanism::Su,
            src_privilege: 0.2,
            dst_privilege: 0.7,
            timestamp: now,
            session_id: None,
            host_id: "host:web-prod-01".into(),
            raw_source: RawSource::Crowdstrike,
            metadata: HashMap::from([
                ("falcon_event_id".to_string(), serde_json::json!("cs-event-001")),
                ("process".to_string(), serde_json::json!("sudo")),
                ("command_line".to_string(), serde_json::json!("sudo -u svc-deploy bash")),
            ]),
            auth_method: None,
            command_line: Some("sudo -u svc-deploy bash".into()),
        }),
        AuthEvent::Session(SessionEvent {
            id: Uuid::new_v4(),
            src_account_id: "account:svc-deploy".into(),
            src_host_id: "host:web-prod-01".into(),
            dst_account_id: "account:root".into(),
            dst_host_id: "host:web-prod-01".into(),
            mechanism: SessionMechanism::Su,
            src_privilege: 0.7,
            dst_privilege: 1.0,
            timestamp: now,
            session_id: None,
            host_id: "host:web-prod-01".into(),
            raw_source: RawSource::Crowdstrike,
            metadata: HashMap::from([
                ("falcon_event_id".to_string(), serde_json::json!("cs-event-002")),
                ("process".to_string(), serde_json::json!("su")),
                ("command_line".to_string(), serde_json::json!("su -")),
            ]),
            auth_method: None,
            command_line: Some("su -".into()),
        }),
        AuthEvent::Session(SessionEvent {
            id: Uuid::new_v4(),
            src_account_id: "account:jsmith".into(),
            src_host_id: "host:web-prod-01".into(),
            dst_account_id: "account:jsmith".into(),
            dst_host_id: "host:db-prod-01".into(),
            mechanism: SessionMechanism::Ssh,
            src_privilege: 0.5,
            dst_privilege: 0.5,
            timestamp: now,
            session_id: None,
            host_id: "host:db-prod-01".into(),
            raw_source: RawSource::Crowdstrike,
            metadata: HashMap::from([
                ("falcon_event_id".to_string(), serde_json::json!("cs-event-003")),
                ("remote_host".to_string(), serde_json::json!("db-prod-01")),
            ]),
            auth_method: None,
            command_line: None,
        }),
    ]
}
