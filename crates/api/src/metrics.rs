#![allow(dead_code)]
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use serde::Serialize;

pub struct Metrics {
    total_builds: AtomicUsize,
    failed_builds: AtomicUsize,
    superseded_builds: AtomicUsize,

    // Timing (in microseconds)
    total_build_time_us: AtomicU64,
    total_layout_time_us: AtomicU64,

    nodes_produced: AtomicUsize,
    edges_produced: AtomicUsize,
}

impl Metrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            total_builds: AtomicUsize::new(0),
            failed_builds: AtomicUsize::new(0),
            superseded_builds: AtomicUsize::new(0),
            total_build_time_us: AtomicU64::new(0),
            total_layout_time_us: AtomicU64::new(0),
            nodes_produced: AtomicUsize::new(0),
            edges_produced: AtomicUsize::new(0),
        })
    }

    pub fn record_build(&self, duration: Duration, nodes: usize, edges: usize) {
        self.total_builds.fetch_add(1, Ordering::Relaxed);
        self.total_build_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
        self.nodes_produced.fetch_add(nodes, Ordering::Relaxed);
        self.edges_produced.fetch_add(edges, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failed_builds.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_superseded(&self) {
        self.superseded_builds.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_layout(&self, duration: Duration) {
        self.total_layout_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let builds = self.total_builds.load(Ordering::Relaxed);
        MetricsSnapshot {
            total_builds: builds,
            failed_builds: self.failed_builds.load(Ordering::Relaxed),
            superseded_builds: self.superseded_builds.load(Ordering::Relaxed),
            avg_build_time_ms: self.avg_time_ms(&self.total_build_time_us, builds),
            avg_layout_time_ms: self.avg_time_ms(&self.total_layout_time_us, builds),
            nodes_produced: self.nodes_produced.load(Ordering::Relaxed),
            edges_produced: self.edges_produced.load(Ordering::Relaxed),
        }
    }

    fn avg_time_ms(&self, total_us: &AtomicU64, count: usize) -> f64 {
        let total = total_us.load(Ordering::Relaxed) as f64;
        if count > 0 {
            total / count as f64 / 1000.0
        } else {
            0.0
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub total_builds: usize,
    pub failed_builds: usize,
    pub superseded_builds: usize,
    pub avg_build_time_ms: f64,
    pub avg_layout_time_ms: f64,
    pub nodes_produced: usize,
    pub edges_produced: usize,
}
