// Event/alert persistence behind a trait. The document store is treated as an opaque
// external collaborator; `MemoryStore` is the in-process stand-in that backs the binary
// here. A real deployment swaps the trait implementation without touching callers.

use std::future::Future;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::error::{Result, SentinelError};
use crate::events::{Alert, AuthEvent, DetectionType};

/// Every method returns `impl Future<..> + Send` rather than using plain `async fn` sugar:
/// `Server::serve` (see `server.rs`) hands connection futures to `tokio::spawn`, which
/// requires `Send + 'static`, and the compiler can't prove that for a generic `S: Store`
/// unless the trait itself promises `Send` futures.
pub trait Store: Send + Sync {
    fn ensure_indexes(&self) -> impl Future<Output = Result<()>> + Send;

    fn insert_event(&self, event: AuthEvent) -> impl Future<Output = Result<()>> + Send;
    fn all_events(&self) -> impl Future<Output = Result<Vec<AuthEvent>>> + Send;

    fn insert_alert(&self, alert: Alert) -> impl Future<Output = Result<()>> + Send;
    fn list_alerts(
        &self,
        skip: usize,
        limit: usize,
        detection_type: Option<DetectionType>,
        since: Option<DateTime<Utc>>,
    ) -> impl Future<Output = Result<Vec<Alert>>> + Send;
    fn get_alert(&self, id: &str) -> impl Future<Output = Result<Option<Alert>>> + Send;
    fn acknowledge_alert(&self, id: &str) -> impl Future<Output = Result<bool>> + Send;
}

/// In-memory `Store`. Events/alerts indexed only by their natural (host_id, timestamp)
/// ordering is reproduced at query time rather than maintained incrementally — acceptable
/// because nothing in this crate queries at a scale where that matters.
#[derive(Default)]
pub struct MemoryStore {
    events: RwLock<Vec<AuthEvent>>,
    alerts: RwLock<Vec<Alert>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    async fn ensure_indexes(&self) -> Result<()> {
        Ok(())
    }

    async fn insert_event(&self, event: AuthEvent) -> Result<()> {
        self.events.write().await.push(event);
        Ok(())
    }

    async fn all_events(&self) -> Result<Vec<AuthEvent>> {
        Ok(self.events.read().await.clone())
    }

    async fn insert_alert(&self, alert: Alert) -> Result<()> {
        self.alerts.write().await.push(alert);
        Ok(())
    }

    async fn list_alerts(
        &self,
        skip: usize,
        limit: usize,
        detection_type: Option<DetectionType>,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Alert>> {
        let mut alerts: Vec<Alert> = self
            .alerts
            .read()
            .await
            .iter()
            .filter(|a| detection_type.is_none_or(|dt| a.detection_type == dt))
            .filter(|a| since.is_none_or(|s| a.triggered_at >= s))
            .cloned()
            .collect();
        alerts.sort_by(|a, b| b.triggered_at.cmp(&a.triggered_at));
        Ok(alerts.into_iter().skip(skip).take(limit).collect())
    }

    async fn get_alert(&self, id: &str) -> Result<Option<Alert>> {
        Ok(self
            .alerts
            .read()
            .await
            .iter()
            .find(|a| a.id.to_string() == id)
            .cloned())
    }

    async fn acknowledge_alert(&self, id: &str) -> Result<bool> {
        let mut alerts = self.alerts.write().await;
        match alerts.iter_mut().find(|a| a.id.to_string() == id) {
            Some(alert) => {
                alert.acknowledged = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

pub fn not_found(id: &str) -> SentinelError {
    SentinelError::NotFound(format!("alert {id}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{DetectionResult, Severity};
    use std::collections::HashMap;

    fn detection_result(detection_type: DetectionType) -> DetectionResult {
        DetectionResult {
            detection_type,
            severity: Severity::High,
            edge_ids: vec!["e1".into()],
            node_ids: vec!["n1".into()],
            host_id: "host:h1".into(),
            description: "test".into(),
            metadata: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn insert_then_get_round_trips() {
        let store = MemoryStore::new();
        let alert: Alert = detection_result(DetectionType::AuthBurst).into();
        store.insert_alert(alert.clone()).await.unwrap();
        let fetched = store.get_alert(&alert.id.to_string()).await.unwrap();
        assert_eq!(fetched.unwrap().id, alert.id);
    }

    #[tokio::test]
    async fn get_unknown_alert_returns_none() {
        let store = MemoryStore::new();
        assert!(store.get_alert("does-not-exist").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn acknowledge_flips_flag_and_reports_unknown() {
        let store = MemoryStore::new();
        let alert: Alert = detection_result(DetectionType::AuthChain).into();
        store.insert_alert(alert.clone()).await.unwrap();
        assert!(store.acknowledge_alert(&alert.id.to_string()).await.unwrap());
        assert!(!store.acknowledge_alert("missing").await.unwrap());
        let fetched = store.get_alert(&alert.id.to_string()).await.unwrap().unwrap();
        assert!(fetched.acknowledged);
    }

    #[tokio::test]
    async fn list_alerts_filters_by_detection_type_and_paginates() {
        let store = MemoryStore::new();
        for dt in [DetectionType::AuthBurst, DetectionType::AuthChain, DetectionType::AuthBurst] {
            store.insert_alert(detection_result(dt).into()).await.unwrap();
        }
        let bursts = store
            .list_alerts(0, 500, Some(DetectionType::AuthBurst), None)
            .await
            .unwrap();
        assert_eq!(bursts.len(), 2);
        let page = store.list_alerts(1, 1, None, None).await.unwrap();
        assert_eq!(page.len(), 1);
    }
}
