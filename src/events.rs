// Event, alert and detection-result types flowing through the dispatcher.
//
// `AuthEvent` is a discriminated union keyed on `event_category`; node identity is a
// compound `{account_id}|{host_id}` string computed from the event, never stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

fn node_id(account_id: &str, host_id: &str) -> String {
    format!("{account_id}|{host_id}")
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RawSource {
    Crowdstrike,
    UnixAuth,
}

impl std::fmt::Display for RawSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Crowdstrike => write!(f, "crowdstrike"),
            Self::UnixAuth => write!(f, "unix_auth"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AuthenticationMechanism {
    Kinit,
    Oidc,
    Certificate,
    Fido2,
}

impl std::fmt::Display for AuthenticationMechanism {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Kinit => write!(f, "kinit"),
            Self::Oidc => write!(f, "oidc"),
            Self::Certificate => write!(f, "certificate"),
            Self::Fido2 => write!(f, "fido2"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SessionMechanism {
    Ssh,
    Su,
    Sudo,
    Rdp,
    Winrm,
}

impl std::fmt::Display for SessionMechanism {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ssh => write!(f, "ssh"),
            Self::Su => write!(f, "su"),
            Self::Sudo => write!(f, "sudo"),
            Self::Rdp => write!(f, "rdp"),
            Self::Winrm => write!(f, "winrm"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticationEvent {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub src_account_id: String,
    pub src_host_id: String,
    pub dst_account_id: String,
    pub dst_host_id: String,
    pub mechanism: AuthenticationMechanism,
    pub src_privilege: f64,
    pub dst_privilege: f64,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    pub session_id: Option<String>,
    pub host_id: String,
    pub raw_source: RawSource,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    pub keytab_path: Option<String>,
    pub realm: Option<String>,
    pub principal: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEvent {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub src_account_id: String,
    pub src_host_id: String,
    pub dst_account_id: String,
    pub dst_host_id: String,
    pub mechanism: SessionMechanism,
    pub src_privilege: f64,
    pub dst_privilege: f64,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    pub session_id: Option<String>,
    pub host_id: String,
    pub raw_source: RawSource,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    pub auth_method: Option<String>,
    pub command_line: Option<String>,
}

/// Confirmed authentication/session outcome. Failed attempts must never reach this type —
/// validation happens at the ingest boundary, not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_category")]
pub enum AuthEvent {
    #[serde(rename = "authentication")]
    Authentication(AuthenticationEvent),
    #[serde(rename = "session")]
    Session(SessionEvent),
}

macro_rules! common_field {
    ($self:expr, $field:ident) => {
        match $self {
            AuthEvent::Authentication(e) => &e.$field,
            AuthEvent::Session(e) => &e.$field,
        }
    };
}

impl AuthEvent {
    pub fn id(&self) -> Uuid {
        *match self {
            AuthEvent::Authentication(e) => &e.id,
            AuthEvent::Session(e) => &e.id,
        }
    }

    pub fn src_account_id(&self) -> &str {
        common_field!(self, src_account_id)
    }

    pub fn src_host_id(&self) -> &str {
        common_field!(self, src_host_id)
    }

    pub fn dst_account_id(&self) -> &str {
        common_field!(self, dst_account_id)
    }

    pub fn dst_host_id(&self) -> &str {
        common_field!(self, dst_host_id)
    }

    pub fn src_privilege(&self) -> f64 {
        *match self {
            AuthEvent::Authentication(e) => &e.src_privilege,
            AuthEvent::Session(e) => &e.src_privilege,
        }
    }

    pub fn dst_privilege(&self) -> f64 {
        *match self {
            AuthEvent::Authentication(e) => &e.dst_privilege,
            AuthEvent::Session(e) => &e.dst_privilege,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        *match self {
            AuthEvent::Authentication(e) => &e.timestamp,
            AuthEvent::Session(e) => &e.timestamp,
        }
    }

    pub fn session_id(&self) -> Option<&str> {
        match self {
            AuthEvent::Authentication(e) => e.session_id.as_deref(),
            AuthEvent::Session(e) => e.session_id.as_deref(),
        }
    }

    pub fn host_id(&self) -> &str {
        common_field!(self, host_id)
    }

    pub fn raw_source(&self) -> RawSource {
        *match self {
            AuthEvent::Authentication(e) => &e.raw_source,
            AuthEvent::Session(e) => &e.raw_source,
        }
    }

    pub fn metadata(&self) -> &HashMap<String, serde_json::Value> {
        common_field!(self, metadata)
    }

    pub fn src_node_id(&self) -> String {
        node_id(self.src_account_id(), self.src_host_id())
    }

    pub fn dst_node_id(&self) -> String {
        node_id(self.dst_account_id(), self.dst_host_id())
    }

    pub fn event_category(&self) -> &'static str {
        match self {
            AuthEvent::Authentication(_) => "authentication",
            AuthEvent::Session(_) => "session",
        }
    }

    pub fn mechanism_str(&self) -> String {
        match self {
            AuthEvent::Authentication(e) => e.mechanism.to_string(),
            AuthEvent::Session(e) => e.mechanism.to_string(),
        }
    }

    /// `Some` only for `AuthenticationEvent` with `mechanism == kinit`.
    pub fn as_kinit(&self) -> Option<&AuthenticationEvent> {
        match self {
            AuthEvent::Authentication(e) if e.mechanism == AuthenticationMechanism::Kinit => {
                Some(e)
            }
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<(), crate::error::SentinelError> {
        let (src, dst) = (self.src_privilege(), self.dst_privilege());
        if !(0.0..=1.0).contains(&src) || !(0.0..=1.0).contains(&dst) {
            return Err(crate::error::SentinelError::Validation(format!(
                "privilege out of range [0,1]: src={src}, dst={dst}"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DetectionType {
    PrivilegeEscalation,
    AuthBurst,
    AuthChain,
    KeytabSmuggling,
}

impl std::fmt::Display for DetectionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PrivilegeEscalation => write!(f, "privilege_escalation"),
            Self::AuthBurst => write!(f, "auth_burst"),
            Self::AuthChain => write!(f, "auth_chain"),
            Self::KeytabSmuggling => write!(f, "keytab_smuggling"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// Detector output before it becomes a persisted `Alert` — no id, no `triggered_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionResult {
    pub detection_type: DetectionType,
    pub severity: Severity,
    pub edge_ids: Vec<String>,
    pub node_ids: Vec<String>,
    pub host_id: String,
    pub description: String,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    pub detection_type: DetectionType,
    pub severity: Severity,
    pub triggered_at: DateTime<Utc>,
    pub edge_ids: Vec<String>,
    pub node_ids: Vec<String>,
    pub host_id: String,
    pub description: String,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub acknowledged: bool,
}

impl From<DetectionResult> for Alert {
    fn from(result: DetectionResult) -> Self {
        Self {
            id: Uuid::new_v4(),
            detection_type: result.detection_type,
            severity: result.severity,
            triggered_at: Utc::now(),
            edge_ids: result.edge_ids,
            node_ids: result.node_ids,
            host_id: result.host_id,
            description: result.description,
            metadata: result.metadata,
            acknowledged: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_event() -> AuthEvent {
        AuthEvent::Session(SessionEvent {
            id: Uuid::new_v4(),
            src_account_id: "account:alice".into(),
            src_host_id: "host:h1".into(),
            dst_account_id: "account:bob".into(),
            dst_host_id: "host:h2".into(),
            mechanism: SessionMechanism::Ssh,
            src_privilege: 0.2,
            dst_privilege: 0.5,
            timestamp: Utc::now(),
            session_id: None,
            host_id: "host:h1".into(),
            raw_source: RawSource::UnixAuth,
            metadata: HashMap::new(),
            auth_method: None,
            command_line: None,
        })
    }

    #[test]
    fn node_ids_are_compound() {
        let e = session_event();
        assert_eq!(e.src_node_id(), "account:alice|host:h1");
        assert_eq!(e.dst_node_id(), "account:bob|host:h2");
    }

    #[test]
    fn round_trip_preserves_canonical_form() {
        let e = session_event();
        let json = serde_json::to_string(&e).unwrap();
        let back: AuthEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(e.src_node_id(), back.src_node_id());
        assert_eq!(e.dst_node_id(), back.dst_node_id());
        assert_eq!(e.event_category(), back.event_category());
    }

    #[test]
    fn validate_rejects_out_of_range_privilege() {
        let mut e = session_event();
        if let AuthEvent::Session(ref mut s) = e {
            s.dst_privilege = 1.2;
        }
        assert!(e.validate().is_err());
    }

    #[test]
    fn kinit_extraction_only_matches_authentication_kinit() {
        let e = session_event();
        assert!(e.as_kinit().is_none());
    }
}
