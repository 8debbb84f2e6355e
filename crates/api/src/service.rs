#![allow(dead_code)]
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use dashmap::DashMap;
use graph::{BuildOptions, EvidenceBundle, GraphError, GraphOutput, TimeWindow};
use layout::{DragDebouncer, LayoutNode, Position, PositionCache};
use serde::Serialize;
use thiserror::Error;

use crate::config::AppConfig;
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::store::DatasetStore;

/// One graph request: the dataset is always explicit, the window bounds are
/// the raw `date_start`/`date_end` query parameters.
#[derive(Debug, Clone, Default)]
pub struct GraphQuery {
    pub dataset: String,
    pub date_start: Option<String>,
    pub date_end: Option<String>,
}

#[derive(Debug, Clone)]
pub enum EvidenceTarget {
    Node(String),
    Edge(String, String),
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("invalid {param} value '{value}': expected an ISO date (YYYY-MM-DD)")]
    InvalidDate { param: &'static str, value: String },

    #[error("no node or edge matches '{target}'")]
    UnknownTarget { target: String },
}

impl ServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::Graph(e) => e.kind(),
            ServiceError::InvalidDate { .. } => "invalid_date",
            ServiceError::UnknownTarget { .. } => "unknown_target",
        }
    }
}

/// The graph plus the per-node positions assigned by the layout engine.
#[derive(Debug, Serialize)]
pub struct PositionedGraph {
    #[serde(flatten)]
    pub graph: GraphOutput,
    pub positions: HashMap<String, Position>,
}

#[derive(Debug, Serialize)]
pub struct ServiceStats {
    pub datasets: usize,
    pub cached_positions: usize,
    pub store_revision: u64,
    #[serde(flatten)]
    pub metrics: MetricsSnapshot,
}

/// Orchestrates parse -> build -> layout -> cache write-back.
///
/// Every build takes a sequence number up front; position write-back is
/// last-writer-wins by that number, so a build superseded by a newer date
/// window can still return its graph but never overwrites newer positions.
pub struct GraphService {
    store: Arc<DatasetStore>,
    config: AppConfig,
    positions: PositionCache,
    debouncer: DragDebouncer,
    metrics: Arc<Metrics>,
    build_seq: AtomicU64,
    applied_seq: DashMap<String, u64>,
}

impl GraphService {
    pub fn new(store: Arc<DatasetStore>, config: AppConfig) -> Self {
        let debounce = Duration::from_millis(config.drag_debounce_ms);
        Self {
            store,
            config,
            positions: PositionCache::new(),
            debouncer: DragDebouncer::new(debounce),
            metrics: Metrics::new(),
            build_seq: AtomicU64::new(0),
            applied_seq: DashMap::new(),
        }
    }

    pub fn graph(&self, query: &GraphQuery) -> Result<PositionedGraph, ServiceError> {
        let seq = self.build_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let window = parse_window(query)?;
        let built = self.build(&query.dataset, &window)?;

        // Commit quiet drag positions first so a just-moved node is treated
        // as already cached by this layout run.
        self.debouncer.flush_ready(&self.positions);

        let nodes: Vec<LayoutNode> = built
            .nodes
            .iter()
            .map(|n| LayoutNode {
                id: n.id.clone(),
                kind: n.kind,
            })
            .collect();
        let edges: Vec<(String, String)> = built
            .edges
            .iter()
            .map(|e| (e.source.clone(), e.target.clone()))
            .collect();

        let previous = self.positions.snapshot(&query.dataset);
        let started = Instant::now();
        let positions = layout::layout(&nodes, &edges, &previous, &self.config.layout);
        self.metrics.record_layout(started.elapsed());

        let mut applied = self
            .applied_seq
            .entry(query.dataset.clone())
            .or_insert(0);
        if *applied < seq {
            self.positions.store(&query.dataset, &positions);
            *applied = seq;
        } else {
            self.metrics.record_superseded();
            tracing::debug!(
                dataset = %query.dataset,
                seq,
                applied = *applied,
                "superseded build, cache write skipped"
            );
        }

        Ok(PositionedGraph {
            graph: built,
            positions,
        })
    }

    pub fn evidence(
        &self,
        query: &GraphQuery,
        target: &EvidenceTarget,
    ) -> Result<EvidenceBundle, ServiceError> {
        let window = parse_window(query)?;
        let built = self.build(&query.dataset, &window)?;
        let bundle = match target {
            EvidenceTarget::Node(id) => graph::evidence_for_node(&built, id),
            EvidenceTarget::Edge(a, b) => graph::evidence_for_edge(&built, a, b),
        };
        bundle.ok_or_else(|| ServiceError::UnknownTarget {
            target: match target {
                EvidenceTarget::Node(id) => id.clone(),
                EvidenceTarget::Edge(a, b) => format!("{} / {}", a, b),
            },
        })
    }

    /// Record a manual node drag. The write lands in the cache once the
    /// pointer has been quiet for the configured interval.
    pub fn drag(&self, dataset: &str, node: &str, x: f64, y: f64) {
        self.debouncer.push(dataset, node, Position { x, y });
        self.debouncer.flush_ready(&self.positions);
    }

    /// Force out any pending drags (dataset switch, shutdown).
    pub fn flush_drags(&self) -> usize {
        self.debouncer.flush_all(&self.positions)
    }

    pub fn stats(&self) -> ServiceStats {
        ServiceStats {
            datasets: self.store.list().len(),
            cached_positions: self.positions.len(),
            store_revision: self.store.revision(),
            metrics: self.metrics.snapshot(),
        }
    }

    fn build(&self, dataset: &str, window: &TimeWindow) -> Result<GraphOutput, ServiceError> {
        // A missing dataset is a failed build too, as far as counters go.
        let record = match self.store.get(dataset) {
            Ok(record) => record,
            Err(e) => {
                self.metrics.record_failure();
                return Err(e.into());
            }
        };
        let options = BuildOptions {
            window: window.clone(),
            include_page_co_mentions: self.config.include_page_co_mentions,
        };
        let started = Instant::now();
        match graph::build_graph_with_options(&record, &options) {
            Ok(built) => {
                self.metrics
                    .record_build(started.elapsed(), built.nodes.len(), built.edges.len());
                Ok(built)
            }
            Err(e) => {
                self.metrics.record_failure();
                Err(e.into())
            }
        }
    }
}

fn parse_window(query: &GraphQuery) -> Result<TimeWindow, ServiceError> {
    let date_start = parse_date("date_start", query.date_start.as_deref())?;
    let date_end = parse_date("date_end", query.date_end.as_deref())?;
    Ok(TimeWindow::new(date_start, date_end))
}

fn parse_date(
    param: &'static str,
    value: Option<&str>,
) -> Result<Option<NaiveDate>, ServiceError> {
    match value {
        None => Ok(None),
        Some(raw) => raw
            .parse::<NaiveDate>()
            .map(Some)
            .map_err(|_| ServiceError::InvalidDate {
                param,
                value: raw.to_string(),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_record() -> &'static str {
        r#"{
            "sources": [{"source_id": "doc_1", "title": "Case file"}],
            "entities": [
                {"entity_id": "p1", "type": "person", "name": "John Doe"},
                {"entity_id": "p2", "type": "person", "name": "Jane Smith"},
                {"entity_id": "g1", "type": "place", "name": "Lisbon"}
            ],
            "claims": [
                {
                    "subject": "p1", "object": "p2",
                    "time": {"start": "2004-04-12"},
                    "summary": "met in Lisbon",
                    "evidence": [{"source_id": "doc_1", "page": 3}]
                },
                {
                    "subject": "p1", "object": "g1",
                    "time": {"start": "2004-08-15"},
                    "summary": "travelled to Lisbon",
                    "evidence": [{"source_id": "doc_1", "page": 9}]
                }
            ]
        }"#
    }

    fn service() -> GraphService {
        let store = Arc::new(DatasetStore::new());
        store.insert_json("demo", demo_record()).unwrap();
        GraphService::new(store, AppConfig::default())
    }

    fn query(dataset: &str) -> GraphQuery {
        GraphQuery {
            dataset: dataset.to_string(),
            date_start: None,
            date_end: None,
        }
    }

    #[test]
    fn graph_request_returns_positions_for_every_node() {
        let service = service();
        let result = service.graph(&query("demo")).unwrap();
        assert_eq!(result.graph.nodes.len(), 3);
        assert_eq!(result.positions.len(), 3);
        for node in &result.graph.nodes {
            assert!(result.positions.contains_key(&node.id));
        }
    }

    #[test]
    fn refiltering_keeps_surviving_positions_stable() {
        let service = service();
        let full = service.graph(&query("demo")).unwrap();

        let mut narrowed = query("demo");
        narrowed.date_end = Some("2004-06-01".to_string());
        let filtered = service.graph(&narrowed).unwrap();

        // Only the first claim survives; its endpoints keep their spots.
        assert_eq!(filtered.graph.nodes.len(), 2);
        for node in &filtered.graph.nodes {
            assert_eq!(filtered.positions[&node.id], full.positions[&node.id]);
        }
    }

    #[test]
    fn unknown_dataset_maps_to_record_missing() {
        let service = service();
        let err = service.graph(&query("absent")).unwrap_err();
        assert_eq!(err.kind(), "record_missing");
    }

    #[test]
    fn malformed_date_is_rejected() {
        let service = service();
        let mut q = query("demo");
        q.date_start = Some("yesterday".to_string());
        let err = service.graph(&q).unwrap_err();
        assert_eq!(err.kind(), "invalid_date");
        assert!(err.to_string().contains("date_start"));
    }

    #[test]
    fn evidence_lookup_by_node_and_edge() {
        let service = service();
        let node = service
            .evidence(&query("demo"), &EvidenceTarget::Node("p1".to_string()))
            .unwrap();
        assert_eq!(node.title, "Evidence for John Doe");
        assert_eq!(node.evidence.len(), 2);

        let edge = service
            .evidence(
                &query("demo"),
                &EvidenceTarget::Edge("p2".to_string(), "p1".to_string()),
            )
            .unwrap();
        assert_eq!(edge.evidence.len(), 1);
        assert_eq!(edge.evidence[0].snippet, "met in Lisbon");

        let err = service
            .evidence(&query("demo"), &EvidenceTarget::Node("ghost".to_string()))
            .unwrap_err();
        assert_eq!(err.kind(), "unknown_target");
    }

    #[test]
    fn dragged_position_sticks_across_rebuilds() {
        let store = Arc::new(DatasetStore::new());
        store.insert_json("demo", demo_record()).unwrap();
        let config = AppConfig {
            drag_debounce_ms: 0,
            ..AppConfig::default()
        };
        let service = GraphService::new(store, config);

        service.graph(&query("demo")).unwrap();
        service.drag("demo", "p1", 42.0, 24.0);
        service.flush_drags();

        let rebuilt = service.graph(&query("demo")).unwrap();
        assert_eq!(rebuilt.positions["p1"], Position { x: 42.0, y: 24.0 });
    }

    #[test]
    fn stats_track_builds() {
        let service = service();
        service.graph(&query("demo")).unwrap();
        let _ = service.graph(&query("absent"));
        let stats = service.stats();
        assert_eq!(stats.datasets, 1);
        assert_eq!(stats.metrics.total_builds, 1);
        assert_eq!(stats.metrics.failed_builds, 1);
        assert!(stats.cached_positions >= 3);
    }
}
