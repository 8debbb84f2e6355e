use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use record::NodeKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Minimal view of a graph node the simulation needs: identity plus the
/// kind that selects rest lengths and collision radii.
#[derive(Debug, Clone)]
pub struct LayoutNode {
    pub id: String,
    pub kind: NodeKind,
}

/// All force constants and the iteration count are configuration so tests
/// can pin exact or tolerance-bounded final positions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub iterations: usize,
    pub canvas_width: f64,
    pub canvas_height: f64,
    /// Pairwise push, proportional to inverse distance.
    pub repulsion: f64,
    /// Pull toward the per-edge rest length.
    pub spring: f64,
    /// Pull of every node toward the canvas center.
    pub centering: f64,
    /// Push resolving minimum-separation overlap.
    pub collision: f64,
    pub entity_rest_length: f64,
    /// Edges touching an image node settle shorter, keeping thumbnails
    /// close to the entity they depict.
    pub image_rest_length: f64,
    pub seed: u64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            iterations: 300,
            canvas_width: 1600.0,
            canvas_height: 900.0,
            repulsion: 2500.0,
            spring: 0.05,
            centering: 0.01,
            collision: 0.5,
            entity_rest_length: 180.0,
            image_rest_length: 90.0,
            seed: 42,
        }
    }
}

/// Minimum-separation radius per node kind, reflecting rendered footprint.
fn collision_radius(kind: NodeKind) -> f64 {
    match kind {
        NodeKind::Image => 16.0,
        NodeKind::Place => 34.0,
        _ => 24.0,
    }
}

fn rest_length(a: NodeKind, b: NodeKind, config: &LayoutConfig) -> f64 {
    if a == NodeKind::Image || b == NodeKind::Image {
        config.image_rest_length
    } else {
        config.entity_rest_length
    }
}

/// Assign 2D positions to every node.
///
/// Nodes present in `previous` are pinned anchors: their cached positions
/// are returned value-identical and never re-relaxed. Only the presence of
/// at least one uncached node triggers a relaxation pass, so re-filters
/// that introduce no new nodes cannot move anything.
pub fn layout(
    nodes: &[LayoutNode],
    edges: &[(String, String)],
    previous: &HashMap<String, Position>,
    config: &LayoutConfig,
) -> HashMap<String, Position> {
    let new_count = nodes
        .iter()
        .filter(|n| !previous.contains_key(&n.id))
        .count();
    if new_count == 0 {
        return nodes
            .iter()
            .map(|n| (n.id.clone(), previous[&n.id]))
            .collect();
    }
    tracing::debug!(total = nodes.len(), new = new_count, "relaxation pass");

    let center_x = config.canvas_width / 2.0;
    let center_y = config.canvas_height / 2.0;
    let mut rng = StdRng::seed_from_u64(config.seed);

    let index: HashMap<&str, usize> = nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.id.as_str(), i))
        .collect();
    let mut pos: Vec<Position> = Vec::with_capacity(nodes.len());
    let mut pinned: Vec<bool> = Vec::with_capacity(nodes.len());
    for node in nodes {
        match previous.get(&node.id) {
            Some(cached) => {
                pos.push(*cached);
                pinned.push(true);
            }
            None => {
                pos.push(Position {
                    x: center_x + rng.gen_range(-60.0..60.0),
                    y: center_y + rng.gen_range(-60.0..60.0),
                });
                pinned.push(false);
            }
        }
    }

    let springs: Vec<(usize, usize, f64)> = edges
        .iter()
        .filter_map(|(a, b)| {
            let i = *index.get(a.as_str())?;
            let j = *index.get(b.as_str())?;
            if i == j {
                return None;
            }
            Some((i, j, rest_length(nodes[i].kind, nodes[j].kind, config)))
        })
        .collect();

    let n = nodes.len();
    for step in 0..config.iterations {
        let mut forces = vec![(0.0f64, 0.0f64); n];

        for i in 0..n {
            for j in (i + 1)..n {
                let dx = pos[i].x - pos[j].x;
                let dy = pos[i].y - pos[j].y;
                let dist = (dx * dx + dy * dy).sqrt();
                let (ux, uy) = if dist > 1e-4 {
                    (dx / dist, dy / dist)
                } else {
                    // Coincident nodes: deterministic separation angle.
                    let angle = (i as f64 * 0.618_034 + j as f64 * 0.414_214)
                        * std::f64::consts::TAU;
                    (angle.cos(), angle.sin())
                };
                let dist = dist.max(1e-4);

                let push = config.repulsion / dist;
                forces[i].0 += ux * push;
                forces[i].1 += uy * push;
                forces[j].0 -= ux * push;
                forces[j].1 -= uy * push;

                let min_sep = collision_radius(nodes[i].kind) + collision_radius(nodes[j].kind);
                if dist < min_sep {
                    let overlap = (min_sep - dist) * config.collision;
                    forces[i].0 += ux * overlap;
                    forces[i].1 += uy * overlap;
                    forces[j].0 -= ux * overlap;
                    forces[j].1 -= uy * overlap;
                }
            }
        }

        for &(i, j, rest) in &springs {
            let dx = pos[i].x - pos[j].x;
            let dy = pos[i].y - pos[j].y;
            let dist = (dx * dx + dy * dy).sqrt().max(1e-4);
            let (ux, uy) = (dx / dist, dy / dist);
            let pull = (dist - rest) * config.spring;
            forces[i].0 -= ux * pull;
            forces[i].1 -= uy * pull;
            forces[j].0 += ux * pull;
            forces[j].1 += uy * pull;
        }

        for i in 0..n {
            forces[i].0 += (center_x - pos[i].x) * config.centering;
            forces[i].1 += (center_y - pos[i].y) * config.centering;
        }

        // Cooling: step cap shrinks linearly so late iterations settle.
        let cap = 30.0 * (1.0 - step as f64 / config.iterations as f64) + 1.0;
        for i in 0..n {
            if pinned[i] {
                continue;
            }
            let (fx, fy) = forces[i];
            let magnitude = (fx * fx + fy * fy).sqrt();
            let scale = if magnitude > cap { cap / magnitude } else { 1.0 };
            pos[i].x += fx * scale;
            pos[i].y += fy * scale;
        }
    }

    nodes
        .iter()
        .enumerate()
        .map(|(i, node)| {
            if pinned[i] {
                // Return the cached value verbatim, not the copy that went
                // through the force arrays.
                return (node.id.clone(), previous[&node.id]);
            }
            let p = pos[i];
            let p = if p.x.is_finite() && p.y.is_finite() {
                p
            } else {
                // Relaxation has no error path: fall back to a jittered
                // center position.
                let angle = i as f64 * 0.618_034 * std::f64::consts::TAU;
                Position {
                    x: center_x + angle.cos() * 30.0,
                    y: center_y + angle.sin() * 30.0,
                }
            };
            (node.id.clone(), p)
        })
        .collect()
}
