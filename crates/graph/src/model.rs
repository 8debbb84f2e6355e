use chrono::NaiveDate;
use record::{NodeKind, PageRef, Source};
use serde::{Deserialize, Serialize};

use crate::temporal::TimeWindow;

/// Canonical unordered-pair edge identity. The constructor orders the two
/// endpoint ids lexicographically so (A,B) and (B,A) collapse to one key,
/// independent of any time window on the contributing facts.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeKey {
    a: String,
    b: String,
}

impl EdgeKey {
    pub fn new(x: &str, y: &str) -> EdgeKey {
        if x <= y {
            EdgeKey {
                a: x.to_string(),
                b: y.to_string(),
            }
        } else {
            EdgeKey {
                a: y.to_string(),
                b: x.to_string(),
            }
        }
    }

    pub fn source(&self) -> &str {
        &self.a
    }

    pub fn target(&self) -> &str {
        &self.b
    }
}

/// One citation supporting an edge: where the underlying fact was found.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceItem {
    pub source_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<PageRef>,
    pub snippet: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Number of surviving facts this entity participates in.
    pub mention_count: usize,
    /// Min/max merge over surviving fact windows. A fact with a single
    /// present endpoint applies that endpoint to both bounds, so these can
    /// be narrower than `timeline_range` (preserved source behavior).
    pub first_seen: Option<NaiveDate>,
    pub last_seen: Option<NaiveDate>,
    /// Sorted set of source ids that mention this entity.
    pub documents: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
    /// Number of facts merged into this edge.
    pub weight: usize,
    pub evidence: Vec<EvidenceItem>,
}

/// Global min/max over all included facts' time endpoints; null when no
/// dated fact survived the filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphOutput {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub sources: Vec<Source>,
    pub timeline_range: TimelineRange,
    pub filter_applied: TimeWindow,
}

impl GraphOutput {
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn edge(&self, a: &str, b: &str) -> Option<&Edge> {
        let key = EdgeKey::new(a, b);
        self.edges
            .iter()
            .find(|e| e.source == key.source() && e.target == key.target())
    }
}
