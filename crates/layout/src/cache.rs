use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::sim::Position;

/// Process-wide position cache keyed by (dataset identity, node id).
///
/// Entries are created on first layout of a node and preserved verbatim by
/// later relaxation passes; manual drags overwrite entries directly.
#[derive(Default)]
pub struct PositionCache {
    inner: DashMap<(String, String), Position>,
}

impl PositionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, dataset: &str, node: &str) -> Option<Position> {
        self.inner
            .get(&(dataset.to_string(), node.to_string()))
            .map(|r| *r.value())
    }

    /// All cached positions for one dataset, as the `previous` input to a
    /// layout run.
    pub fn snapshot(&self, dataset: &str) -> HashMap<String, Position> {
        self.inner
            .iter()
            .filter(|r| r.key().0 == dataset)
            .map(|r| (r.key().1.clone(), *r.value()))
            .collect()
    }

    /// Write back the result of a relaxation pass.
    pub fn store(&self, dataset: &str, positions: &HashMap<String, Position>) {
        for (node, pos) in positions {
            self.inner
                .insert((dataset.to_string(), node.clone()), *pos);
        }
    }

    /// Direct write from a manual drag, bypassing relaxation. The node is
    /// "already cached" from now on and never re-relaxed.
    pub fn set_manual(&self, dataset: &str, node: &str, pos: Position) {
        self.inner
            .insert((dataset.to_string(), node.to_string()), pos);
    }

    pub fn remove_dataset(&self, dataset: &str) {
        self.inner.retain(|key, _| key.0 != dataset);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

struct PendingDrag {
    pos: Position,
    last_update: Instant,
}

/// Coalesces bursts of drag updates so a node being moved produces one
/// cache write once the pointer goes quiet, not one per mouse event.
pub struct DragDebouncer {
    quiet: Duration,
    pending: Mutex<HashMap<(String, String), PendingDrag>>,
}

impl DragDebouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: Mutex::new(HashMap::new()),
        }
    }

    pub fn push(&self, dataset: &str, node: &str, pos: Position) {
        let mut pending = self.pending.lock().unwrap();
        pending.insert(
            (dataset.to_string(), node.to_string()),
            PendingDrag {
                pos,
                last_update: Instant::now(),
            },
        );
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    /// Flush entries that have been quiet long enough. Returns the number
    /// of positions written.
    pub fn flush_ready(&self, cache: &PositionCache) -> usize {
        let mut pending = self.pending.lock().unwrap();
        let ready: Vec<(String, String)> = pending
            .iter()
            .filter(|(_, drag)| drag.last_update.elapsed() >= self.quiet)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &ready {
            let drag = pending.remove(key).unwrap();
            cache.set_manual(&key.0, &key.1, drag.pos);
        }
        ready.len()
    }

    /// Flush everything regardless of age (shutdown, dataset switch).
    pub fn flush_all(&self, cache: &PositionCache) -> usize {
        let mut pending = self.pending.lock().unwrap();
        let count = pending.len();
        for ((dataset, node), drag) in pending.drain() {
            cache.set_manual(&dataset, &node, drag.pos);
        }
        count
    }
}
