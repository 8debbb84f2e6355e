use std::collections::HashSet;

use record::PageRef;
use serde::Serialize;

use crate::model::{EvidenceItem, GraphOutput};

/// Deduplicated evidence for a selected node or edge, with a display title.
#[derive(Debug, Clone, Serialize)]
pub struct EvidenceBundle {
    pub title: String,
    pub evidence: Vec<EvidenceItem>,
}

/// Order-preserving dedup keyed on (source_id, page, snippet). The first
/// occurrence wins, so duplicates carrying different timestamps keep the
/// earliest-inserted one. Idempotent.
pub fn dedup_evidence(items: impl IntoIterator<Item = EvidenceItem>) -> Vec<EvidenceItem> {
    let mut seen: HashSet<(String, Option<PageRef>, String)> = HashSet::new();
    let mut out = Vec::new();
    for item in items {
        let key = (item.source_id.clone(), item.page.clone(), item.snippet.clone());
        if seen.insert(key) {
            out.push(item);
        }
    }
    out
}

/// Evidence gathered from every edge incident to the node, deduplicated.
pub fn evidence_for_node(graph: &GraphOutput, node_id: &str) -> Option<EvidenceBundle> {
    let node = graph.node(node_id)?;
    let items = graph
        .edges
        .iter()
        .filter(|e| e.source == node_id || e.target == node_id)
        .flat_map(|e| e.evidence.iter().cloned());
    Some(EvidenceBundle {
        title: format!("Evidence for {}", node.name),
        evidence: dedup_evidence(items),
    })
}

/// Evidence for a single edge; endpoint order does not matter.
pub fn evidence_for_edge(graph: &GraphOutput, a: &str, b: &str) -> Option<EvidenceBundle> {
    let edge = graph.edge(a, b)?;
    let source_name = graph
        .node(&edge.source)
        .map(|n| n.name.clone())
        .unwrap_or_else(|| edge.source.clone());
    let target_name = graph
        .node(&edge.target)
        .map(|n| n.name.clone())
        .unwrap_or_else(|| edge.target.clone());
    Some(EvidenceBundle {
        title: format!("Evidence for {} and {}", source_name, target_name),
        evidence: dedup_evidence(edge.evidence.iter().cloned()),
    })
}
