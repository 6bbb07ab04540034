// Directed graph of cross-account/cross-host authentication relationships.
//
// `build_graph` is a pure function: no I/O, no failure modes beyond what the event model
// already rejects at the ingest boundary. The graph is always rebuilt from scratch from the
// full event collection — never mutated incrementally in place.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::Direction;
use serde::{Deserialize, Serialize};

use crate::events::AuthEvent;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub event_id: String,
    pub event_category: String,
    pub mechanism: String,
    pub timestamp: String,
    pub session_id: Option<String>,
    pub src_privilege: f64,
    pub dst_privilege: f64,
}

#[derive(Debug, Clone)]
pub struct NodeAttrs {
    pub node_id: String,
    pub privilege_tier: f64,
    pub host_id: String,
}

#[derive(Debug, Clone)]
pub struct EdgeAttrs {
    pub event_category: String,
    pub mechanism: String,
    pub edge_list: Vec<EdgeRecord>,
}

/// Directed graph keyed by compound node id. Between any (src, dst) pair there is at most
/// one edge; parallel events are folded into that edge's `edge_list` rather than promoting
/// the graph to a multigraph.
#[derive(Debug, Clone, Default)]
pub struct DirectedGraph {
    inner: DiGraph<NodeAttrs, EdgeAttrs>,
    index: HashMap<String, NodeIndex>,
}

impl DirectedGraph {
    pub fn new() -> Self {
        Self {
            inner: DiGraph::new(),
            index: HashMap::new(),
        }
    }

    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn contains_node(&self, node_id: &str) -> bool {
        self.index.contains_key(node_id)
    }

    pub fn node_attrs(&self, node_id: &str) -> Option<&NodeAttrs> {
        self.index.get(node_id).map(|&ix| &self.inner[ix])
    }

    /// Outgoing neighbor node ids, most-recently-added edge first (LIFO discovery order).
    pub fn neighbors(&self, node_id: &str) -> Vec<String> {
        match self.index.get(node_id) {
            Some(&ix) => self
                .inner
                .neighbors_directed(ix, Direction::Outgoing)
                .map(|n| self.inner[n].node_id.clone())
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn edge_between(&self, src: &str, dst: &str) -> Option<&EdgeAttrs> {
        let (src_ix, dst_ix) = (*self.index.get(src)?, *self.index.get(dst)?);
        self.inner
            .find_edge(src_ix, dst_ix)
            .map(|ix| &self.inner[ix])
    }

    fn ensure_node(&mut self, node_id: &str, privilege: f64, host_id: &str) -> NodeIndex {
        if let Some(&ix) = self.index.get(node_id) {
            let attrs = &mut self.inner[ix];
            if privilege > attrs.privilege_tier {
                attrs.privilege_tier = privilege;
            }
            ix
        } else {
            let ix = self.inner.add_node(NodeAttrs {
                node_id: node_id.to_string(),
                privilege_tier: privilege,
                host_id: host_id.to_string(),
            });
            self.index.insert(node_id.to_string(), ix);
            ix
        }
    }

    fn upsert_edge(&mut self, src: NodeIndex, dst: NodeIndex, record: EdgeRecord) -> EdgeIndex {
        if let Some(ix) = self.inner.find_edge(src, dst) {
            self.inner[ix].edge_list.push(record);
            ix
        } else {
            let attrs = EdgeAttrs {
                event_category: record.event_category.clone(),
                mechanism: record.mechanism.clone(),
                edge_list: vec![record],
            };
            self.inner.add_edge(src, dst, attrs)
        }
    }
}

fn event_record(event: &AuthEvent) -> EdgeRecord {
    EdgeRecord {
        event_id: event.id().to_string(),
        event_category: event.event_category().to_string(),
        mechanism: event.mechanism_str(),
        timestamp: event.timestamp().to_rfc3339(),
        session_id: event.session_id().map(str::to_string),
        src_privilege: event.src_privilege(),
        dst_privilege: event.dst_privilege(),
    }
}

pub fn build_graph(events: &[AuthEvent]) -> DirectedGraph {
    let mut graph = DirectedGraph::new();
    for event in events {
        let src = graph.ensure_node(&event.src_node_id(), event.src_privilege(), event.src_host_id());
        let dst = graph.ensure_node(&event.dst_node_id(), event.dst_privilege(), event.dst_host_id());
        graph.upsert_edge(src, dst, event_record(event));
    }
    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{AuthEvent, RawSource, SessionEvent, SessionMechanism};
    use chrono::Utc;
    use std::collections::HashMap as Map;
    use uuid::Uuid;

    fn session(src_a: &str, src_h: &str, dst_a: &str, dst_h: &str, sp: f64, dp: f64) -> AuthEvent {
        AuthEvent::Session(SessionEvent {
            id: Uuid::new_v4(),
            src_account_id: src_a.into(),
            src_host_id: src_h.into(),
            dst_account_id: dst_a.into(),
            dst_host_id: dst_h.into(),
            mechanism: SessionMechanism::Ssh,
            src_privilege: sp,
            dst_privilege: dp,
            timestamp: Utc::now(),
            session_id: None,
            host_id: src_h.into(),
            raw_source: RawSource::UnixAuth,
            metadata: Map::new(),
            auth_method: None,
            command_line: None,
        })
    }

    #[test]
    fn nodes_are_created_with_derived_ids() {
        let events = vec![session("account:a", "host:h1", "account:b", "host:h2", 0.1, 0.4)];
        let graph = build_graph(&events);
        assert!(graph.contains_node("account:a|host:h1"));
        assert!(graph.contains_node("account:b|host:h2"));
        assert_eq!(graph.node_count(), 2);
    }

    #[test]
    fn privilege_tier_never_downgrades() {
        let events = vec![
            session("account:a", "host:h1", "account:b", "host:h2", 0.1, 0.9),
            session("account:a", "host:h1", "account:c", "host:h3", 0.0, 0.2),
        ];
        let graph = build_graph(&events);
        let attrs = graph.node_attrs("account:a|host:h1").unwrap();
        assert_eq!(attrs.privilege_tier, 0.1);
    }

    #[test]
    fn parallel_events_fold_into_one_edge() {
        let events = vec![
            session("account:a", "host:h1", "account:b", "host:h2", 0.1, 0.2),
            session("account:a", "host:h1", "account:b", "host:h2", 0.2, 0.3),
        ];
        let graph = build_graph(&events);
        assert_eq!(graph.node_count(), 2);
        let edge = graph.edge_between("account:a|host:h1", "account:b|host:h2").unwrap();
        assert_eq!(edge.edge_list.len(), 2);
    }
}
