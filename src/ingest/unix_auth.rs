// Unix auth log ingest stub. A real deployment replaces `fetch_events` with a file-tail or
// syslog consumer; all events are confirmed outcomes — failed attempts are never ingested.

use std::collections::HashMap;

use chrono::Utc;
use uuid::Uuid;

use crate::events::{
    AuthenticationEvent, AuthenticationMechanism, AuthEvent, RawSource, SessionEvent,
    SessionMechanism,
};

pub fn fetch_events() -> Vec<AuthEvent> {
    let now = Utc::now();
    vec![
        AuthEvent::Session(SessionEvent {
            id: Uuid::new_v4(),
            src_account_id: "account:alice".into(),
            src_host_id: "host:alice-workstation".into(),
            dst_account_id: "account:alice".into(),
            dst_host_id: "host:app-dev-02".into(),
            mechanism: SessionMechanism::Ssh,
            src_privilege: 0.1,
            dst_privilege: 0.3,
            timestamp: now,
            session_id: None,
            host_id: "host:app-dev-02".into(),
            raw_source: RawSource::UnixAuth,
            metadata: HashMap::from([(
                "log_line".to_string(),
                serde_json::json!("sshd[1234]: Accepted publickey for alice from 10.0.0.5"),
            )]),
            auth_method: Some("publickey".into()),
            command_line: None,
        }),
        AuthEvent::Authentication(AuthenticationEvent {
            id: Uuid::new_v4(),
            src_account_id: "account:alice".into(),
            src_host_id: "host:app-dev-02".into(),
            dst_account_id: "account:alice-admin".into(),
            dst_host_id: "host:app-dev-02".into(),
            mechanism: AuthenticationMechanism::Kinit,
            src_privilege: 0.1,
            dst_privilege: 0.6,
            timestamp: now,
            session_id: None,
            host_id: "host:app-dev-02".into(),
            raw_source: RawSource::UnixAuth,
            metadata: HashMap::from([(
                "log_line".to_string(),
                serde_json::json!("kinit[5678]: TGT obtained for alice-admin@REALM.CORP"),
            )]),
            keytab_path: Some("/tmp/smuggled.keytab".into()),
            realm: Some("REALM.CORP".into()),
            principal: Some("alice-admin@REALM.CORP".into()),
        }),
        AuthEvent::Session(SessionEvent {
            id: Uuid::new_v4(),
            src_account_id: "account:alice-admin".into(),
            src_host_id: "host:app-dev-02".into(),
            dst_account_id: "account:alice-admin".into(),
            dst_host_id: "host:bastion-01".into(),
            mechanism: SessionMechanism::Ssh,
            src_privilege: 0.6,
            dst_privilege: 0.8,
            timestamp: now,
            session_id: None,
            host_id: "host:bastion-01".into(),
            raw_source: RawSource::UnixAuth,
            metadata: HashMap::from([(
                "log_line".to_string(),
                serde_json::json!("sshd[9012]: Accepted gssapi-with-mic for alice-admin"),
            )]),
            auth_method: Some("gssapi-with-mic".into()),
            command_line: None,
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_includes_the_smuggled_keytab_kinit_event() {
        let events = fetch_events();
        let kinit = events.iter().find_map(|e| e.as_kinit()).unwrap();
        assert_eq!(kinit.keytab_path.as_deref(), Some("/tmp/smuggled.keytab"));
        assert_eq!(kinit.src_account_id, "account:alice");
        assert_eq!(kinit.dst_account_id, "account:alice-admin");
    }
}
