// Detection C — excessive auth chain, found via iterative DFS over the auth graph.
//
// The stack holds (node, path-so-far) pairs; popping it last-in-first-out naturally yields
// DFS discovery order. A node already on the current path is never re-extended, so a cycle
// terminates that branch instead of looping forever.

use std::collections::HashMap;

use crate::config::ChainConfig;
use crate::events::{DetectionResult, DetectionType, Severity};
use crate::graph::DirectedGraph;

pub fn detect(
    graph: &DirectedGraph,
    config: &ChainConfig,
    starting_node: &str,
) -> Vec<DetectionResult> {
    let mut results = Vec::new();

    if graph.node_count() > config.max_graph_nodes {
        return results;
    }
    if !graph.contains_node(starting_node) {
        return results;
    }

    let cutoff = config.max_chain_length + 1;

    for path in all_simple_paths_from(graph, starting_node, cutoff) {
        let hop_count = path.len() - 1;
        if hop_count <= config.max_chain_length {
            continue;
        }

        let edge_ids = collect_edge_ids(graph, &path);
        let host_id = graph
            .node_attrs(starting_node)
            .map(|attrs| attrs.host_id.clone())
            .unwrap_or_else(|| "unknown".to_string());

        let mut metadata = HashMap::new();
        metadata.insert("path".into(), serde_json::json!(path));
        metadata.insert("hop_count".into(), serde_json::json!(hop_count));
        metadata.insert("starting_node".into(), serde_json::json!(starting_node));

        results.push(DetectionResult {
            detection_type: DetectionType::AuthChain,
            severity: Severity::High,
            edge_ids,
            node_ids: path.clone(),
            host_id,
            description: format!(
                "Excessive auth chain from {starting_node}: {hop_count} hops (threshold: {})",
                config.max_chain_length
            ),
            metadata,
        });
    }

    results
}

/// Iterative DFS, LIFO neighbor expansion; never yields the zero-hop path `[source]`.
fn all_simple_paths_from(graph: &DirectedGraph, source: &str, cutoff: usize) -> Vec<Vec<String>> {
    let mut paths = Vec::new();
    let mut stack: Vec<(String, Vec<String>)> = vec![(source.to_string(), vec![source.to_string()])];

    while let Some((node, path)) = stack.pop() {
        if path.len() > 1 {
            paths.push(path.clone());
        }
        if path.len() - 1 >= cutoff {
            continue;
        }
        let visited: std::collections::HashSet<&str> = path.iter().map(String::as_str).collect();
        for neighbor in graph.neighbors(&node) {
            if !visited.contains(neighbor.as_str()) {
                let mut next_path = path.clone();
                next_path.push(neighbor);
                stack.push((next_path.last().unwrap().clone(), next_path));
            }
        }
    }

    paths
}

fn collect_edge_ids(graph: &DirectedGraph, path: &[String]) -> Vec<String> {
    path.windows(2)
        .filter_map(|pair| {
            graph
                .edge_between(&pair[0], &pair[1])
                .and_then(|edge| edge.edge_list.first())
                .map(|record| record.event_id.clone())
        })
        .collect()
}
