// Bridges the store layer to the detection layer. Called after a new event is persisted
// and the graph rebuilt; routes to every applicable detector in a fixed order and persists
// whatever alerts fire.

use std::sync::Arc;

use tracing::debug;

use crate::config::AppConfig;
use crate::detections::{auth_burst, auth_chain, keytab_smuggling, privilege_escalation};
use crate::enrichment::EnrichmentManager;
use crate::error::Result;
use crate::events::{Alert, AuthEvent};
use crate::graph::DirectedGraph;
use crate::state::BurstWindowState;
use crate::store::Store;

pub struct Dispatcher<S: Store> {
    store: Arc<S>,
    burst_state: BurstWindowState,
    enrichment: Arc<EnrichmentManager>,
    config: AppConfig,
}

impl<S: Store> Dispatcher<S> {
    pub fn new(store: Arc<S>, enrichment: Arc<EnrichmentManager>, config: AppConfig) -> Self {
        Self {
            store,
            burst_state: BurstWindowState::new(),
            enrichment,
            config,
        }
    }

    /// Runs privilege escalation, auth burst, auth chain, then (kinit-only) keytab
    /// smuggling against `event` and the freshly rebuilt `graph`, persisting and returning
    /// every alert that fires.
    pub async fn on_event_inserted(
        &self,
        event: &AuthEvent,
        graph: &DirectedGraph,
    ) -> Result<Vec<Alert>> {
        let mut fired = Vec::new();

        if let Some(result) = privilege_escalation::detect(event, &self.config.privilege_escalation)
        {
            fired.push(self.persist(result).await?);
        }

        if let Some(result) =
            auth_burst::detect(event, &self.burst_state, &self.config.auth_burst)
        {
            fired.push(self.persist(result).await?);
        }

        for result in auth_chain::detect(graph, &self.config.auth_chain, &event.src_node_id()) {
            fired.push(self.persist(result).await?);
        }

        if let Some(auth_event) = event.as_kinit() {
            let enrichments = self.enrichment.current()?;
            if let Some(result) =
                keytab_smuggling::detect(auth_event, &enrichments, &self.config.keytab_smuggling)
            {
                fired.push(self.persist(result).await?);
            }
        }

        debug!(event_id = %event.id(), alerts_fired = fired.len(), "dispatch complete");
        Ok(fired)
    }

    async fn persist(&self, result: crate::events::DetectionResult) -> Result<Alert> {
        let alert: Alert = result.into();
        self.store.insert_alert(alert.clone()).await?;
        Ok(alert)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EnrichmentConfig;
    use crate::events::{RawSource, SessionEvent, SessionMechanism};
    use crate::graph::build_graph;
    use crate::store::MemoryStore;
    use chrono::Utc;
    use std::collections::HashMap as Map;
    use uuid::Uuid;

    fn dispatcher() -> Dispatcher<MemoryStore> {
        let manager = Arc::new(EnrichmentManager::new(EnrichmentConfig::default()));
        manager.load_sync();
        Dispatcher::new(Arc::new(MemoryStore::new()), manager, AppConfig::default())
    }

    fn escalation_event() -> AuthEvent {
        AuthEvent::Session(SessionEvent {
            id: Uuid::new_v4(),
            src_account_id: "account:a".into(),
            src_host_id: "host:h1".into(),
            dst_account_id: "account:b".into(),
            dst_host_id: "host:h1".into(),
            mechanism: SessionMechanism::Sudo,
            src_privilege: 0.1,
            dst_privilege: 0.9,
            timestamp: Utc::now(),
            session_id: None,
            host_id: "host:h1".into(),
            raw_source: RawSource::UnixAuth,
            metadata: Map::new(),
            auth_method: None,
            command_line: None,
        })
    }

    #[tokio::test]
    async fn privilege_escalation_fires_and_persists() {
        let dispatcher = dispatcher();
        let event = escalation_event();
        let graph = build_graph(&[event.clone()]);
        let fired = dispatcher.on_event_inserted(&event, &graph).await.unwrap();
        assert_eq!(fired.len(), 1);
        assert_eq!(
            fired[0].detection_type,
            crate::events::DetectionType::PrivilegeEscalation
        );
    }

    #[tokio::test]
    async fn non_kinit_event_skips_keytab_detector() {
        let dispatcher = dispatcher();
        let event = AuthEvent::Session(SessionEvent {
            id: Uuid::new_v4(),
            src_account_id: "account:a".into(),
            src_host_id: "host:h1".into(),
            dst_account_id: "account:a".into(),
            dst_host_id: "host:h1".into(),
            mechanism: SessionMechanism::Ssh,
            src_privilege: 0.1,
            dst_privilege: 0.1,
            timestamp: Utc::now(),
            session_id: None,
            host_id: "host:h1".into(),
            raw_source: RawSource::UnixAuth,
            metadata: Map::new(),
            auth_method: None,
            command_line: None,
        });
        let graph = build_graph(&[event.clone()]);
        let fired = dispatcher.on_event_inserted(&event, &graph).await.unwrap();
        assert!(fired.is_empty());
    }
}
