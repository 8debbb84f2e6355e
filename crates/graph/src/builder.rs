use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;
use record::{NodeKind, PageRef, Record, SourceRef, TimeSpan};

use crate::error::GraphError;
use crate::model::{Edge, EdgeKey, EvidenceItem, GraphOutput, Node, TimelineRange};
use crate::temporal::TimeWindow;

#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub window: TimeWindow,
    /// Also derive edges from entities cited on the same page of the same
    /// source, independent of explicit claims/relationships. Off by default.
    pub include_page_co_mentions: bool,
}

/// Build the co-occurrence graph from an extraction record, keeping only
/// facts that overlap the given window.
pub fn build_graph(record: &Record, window: &TimeWindow) -> Result<GraphOutput, GraphError> {
    build_graph_with_options(
        record,
        &BuildOptions {
            window: window.clone(),
            include_page_co_mentions: false,
        },
    )
}

pub fn build_graph_with_options(
    record: &Record,
    options: &BuildOptions,
) -> Result<GraphOutput, GraphError> {
    let entities = record
        .entities
        .as_ref()
        .ok_or_else(GraphError::missing_entities)?;

    // Seed one accumulator per entity, in record order.
    let mut order: Vec<String> = Vec::with_capacity(entities.len());
    let mut nodes: HashMap<String, NodeAccum> = HashMap::with_capacity(entities.len());
    for entity in entities {
        order.push(entity.entity_id.clone());
        let mut accum = NodeAccum::new(&entity.name, NodeKind::normalize(&entity.entity_type));
        for source_ref in &entity.source_refs {
            accum.documents.insert(source_ref.source_id.clone());
        }
        nodes.insert(entity.entity_id.clone(), accum);
    }

    let mut edges: BTreeMap<EdgeKey, EdgeAccum> = BTreeMap::new();
    let mut timeline = TimelineRange::default();

    // Claims first, then relationships. Edge identity is key-based so the
    // order only determines evidence insertion order.
    for claim in &record.claims {
        apply_pair_fact(
            &mut nodes,
            &mut edges,
            &mut timeline,
            &options.window,
            &claim.subject,
            &claim.object,
            claim.time.as_ref(),
            claim.summary.clone(),
            &claim.evidence,
        );
    }
    for rel in &record.relationships {
        let summary = rel.summary.clone().or_else(|| {
            synthesize_relationship_summary(&nodes, &rel.subject, &rel.predicate, &rel.object)
        });
        apply_pair_fact(
            &mut nodes,
            &mut edges,
            &mut timeline,
            &options.window,
            &rel.subject,
            &rel.object,
            rel.time.as_ref(),
            summary,
            &rel.evidence,
        );
    }

    if options.include_page_co_mentions {
        apply_page_co_mentions(record, &mut edges, &mut nodes);
    }

    // Events only widen node first/last-seen bounds; they never add edges.
    for event in &record.events {
        if !options.window.contains(event.time.as_ref()) {
            continue;
        }
        let mut touched = false;
        for participant in &event.participants {
            let Some(accum) = nodes.get_mut(participant.as_str()) else {
                continue;
            };
            touched = true;
            accum.touch(event.time.as_ref());
            accum.mention_count += 1;
            for source_ref in &event.source_refs {
                accum.documents.insert(source_ref.source_id.clone());
            }
        }
        if touched {
            merge_timeline(&mut timeline, event.time.as_ref());
        }
    }

    // Prune entities that ended up with no incident edge.
    let survivors: BTreeSet<String> = nodes
        .iter()
        .filter(|(_, accum)| accum.has_edge)
        .map(|(id, _)| id.clone())
        .collect();

    // Auxiliary image nodes, connected to surviving entities only. Repeated
    // records for one path merge into a single node, and an entity listed
    // twice still gets one trivial edge.
    let mut image_order: Vec<String> = Vec::new();
    let mut image_entities: HashMap<String, BTreeSet<String>> = HashMap::new();
    for image in &record.images {
        let listed = image_entities.entry(image.path.clone()).or_insert_with(|| {
            image_order.push(image.path.clone());
            BTreeSet::new()
        });
        listed.extend(image.entities.iter().cloned());
    }

    let mut image_nodes: Vec<Node> = Vec::new();
    for path in &image_order {
        let connected: Vec<&String> = image_entities[path.as_str()]
            .iter()
            .filter(|id| survivors.contains(id.as_str()))
            .collect();
        if connected.is_empty() {
            continue;
        }
        let image_id = format!("image:{}", path);
        let name = image_name(path);
        for entity_id in &connected {
            let key = EdgeKey::new(&image_id, entity_id.as_str());
            let accum = edges.entry(key).or_default();
            accum.weight += 1;
            accum.evidence.push(EvidenceItem {
                source_id: path.clone(),
                page: None,
                snippet: format!("Image: {}", name),
                date: None,
            });
        }
        image_nodes.push(Node {
            id: image_id,
            name,
            kind: NodeKind::Image,
            mention_count: connected.len(),
            first_seen: None,
            last_seen: None,
            documents: Vec::new(),
        });
    }

    let mut out_nodes: Vec<Node> = Vec::with_capacity(survivors.len() + image_nodes.len());
    for id in &order {
        if !survivors.contains(id.as_str()) {
            continue;
        }
        let accum = &nodes[id.as_str()];
        out_nodes.push(Node {
            id: id.clone(),
            name: accum.name.clone(),
            kind: accum.kind,
            mention_count: accum.mention_count,
            first_seen: accum.first_seen,
            last_seen: accum.last_seen,
            documents: accum.documents.iter().cloned().collect(),
        });
    }
    out_nodes.extend(image_nodes);

    let out_edges: Vec<Edge> = edges
        .into_iter()
        .map(|(key, accum)| Edge {
            source: key.source().to_string(),
            target: key.target().to_string(),
            weight: accum.weight,
            evidence: accum.evidence,
        })
        .collect();

    tracing::debug!(
        nodes = out_nodes.len(),
        edges = out_edges.len(),
        claims = record.claims.len(),
        relationships = record.relationships.len(),
        events = record.events.len(),
        "graph built"
    );

    Ok(GraphOutput {
        nodes: out_nodes,
        edges: out_edges,
        sources: record.sources.clone(),
        timeline_range: timeline,
        filter_applied: options.window.clone(),
    })
}

#[derive(Debug)]
struct NodeAccum {
    name: String,
    kind: NodeKind,
    mention_count: usize,
    first_seen: Option<NaiveDate>,
    last_seen: Option<NaiveDate>,
    documents: BTreeSet<String>,
    has_edge: bool,
}

impl NodeAccum {
    fn new(name: &str, kind: NodeKind) -> NodeAccum {
        NodeAccum {
            name: name.to_string(),
            kind,
            mention_count: 0,
            first_seen: None,
            last_seen: None,
            documents: BTreeSet::new(),
            has_edge: false,
        }
    }

    /// Min/max merge of a fact window into this node's bounds. A window
    /// with a single present endpoint applies that endpoint to both bounds
    /// (kept as-is from the source system; see DESIGN.md).
    fn touch(&mut self, span: Option<&TimeSpan>) {
        let Some(span) = span else { return };
        let start = span.start.or(span.end);
        let end = span.end.or(span.start);
        if let Some(start) = start {
            self.first_seen = Some(match self.first_seen {
                Some(current) => current.min(start),
                None => start,
            });
        }
        if let Some(end) = end {
            self.last_seen = Some(match self.last_seen {
                Some(current) => current.max(end),
                None => end,
            });
        }
    }
}

#[derive(Debug, Default)]
struct EdgeAccum {
    weight: usize,
    evidence: Vec<EvidenceItem>,
}

#[allow(clippy::too_many_arguments)]
fn apply_pair_fact(
    nodes: &mut HashMap<String, NodeAccum>,
    edges: &mut BTreeMap<EdgeKey, EdgeAccum>,
    timeline: &mut TimelineRange,
    window: &TimeWindow,
    subject: &str,
    object: &str,
    time: Option<&TimeSpan>,
    summary: Option<String>,
    refs: &[SourceRef],
) {
    // Unresolved references are expected with partial extraction; a
    // self-referential pair cannot form an undirected co-occurrence.
    if !nodes.contains_key(subject) || !nodes.contains_key(object) || subject == object {
        return;
    }
    if !window.contains(time) {
        return;
    }

    merge_timeline(timeline, time);
    let fact_date = time.and_then(|span| span.start.or(span.end));

    for endpoint in [subject, object] {
        let Some(accum) = nodes.get_mut(endpoint) else {
            continue;
        };
        accum.touch(time);
        accum.mention_count += 1;
        accum.has_edge = true;
        for source_ref in refs {
            accum.documents.insert(source_ref.source_id.clone());
        }
    }

    let accum = edges.entry(EdgeKey::new(subject, object)).or_default();
    accum.weight += 1;
    if refs.is_empty() {
        // Keep one evidence entry per merged fact even without citations,
        // as long as there is something human-readable to show.
        if let Some(snippet) = summary {
            accum.evidence.push(EvidenceItem {
                source_id: String::new(),
                page: None,
                snippet,
                date: fact_date,
            });
        }
        return;
    }
    for source_ref in refs {
        let snippet = summary
            .clone()
            .or_else(|| source_ref.text.clone())
            .unwrap_or_default();
        accum.evidence.push(EvidenceItem {
            source_id: source_ref.source_id.clone(),
            page: source_ref.page.clone(),
            snippet,
            date: fact_date,
        });
    }
}

fn synthesize_relationship_summary(
    nodes: &HashMap<String, NodeAccum>,
    subject: &str,
    predicate: &str,
    object: &str,
) -> Option<String> {
    let subject_name = nodes.get(subject).map(|n| n.name.as_str())?;
    let object_name = nodes.get(object).map(|n| n.name.as_str())?;
    Some(format!(
        "{} {} {}.",
        subject_name,
        predicate.replace('_', " "),
        object_name
    ))
}

fn merge_timeline(timeline: &mut TimelineRange, span: Option<&TimeSpan>) {
    let Some(span) = span else { return };
    for date in [span.start, span.end].into_iter().flatten() {
        timeline.start = Some(match timeline.start {
            Some(current) => current.min(date),
            None => date,
        });
        timeline.end = Some(match timeline.end {
            Some(current) => current.max(date),
            None => date,
        });
    }
}

/// Page-level co-occurrence: entities cited on the same page of the same
/// source get an edge per shared page, merged through the regular edge
/// machinery. These synthesized facts carry no dates.
fn apply_page_co_mentions(
    record: &Record,
    edges: &mut BTreeMap<EdgeKey, EdgeAccum>,
    nodes: &mut HashMap<String, NodeAccum>,
) {
    let entities = record.entities.as_deref().unwrap_or_default();
    let mut cells: BTreeMap<(String, PageRef), BTreeSet<String>> = BTreeMap::new();
    for entity in entities {
        for source_ref in &entity.source_refs {
            let Some(page) = &source_ref.page else {
                continue;
            };
            cells
                .entry((source_ref.source_id.clone(), page.clone()))
                .or_default()
                .insert(entity.entity_id.clone());
        }
    }

    for ((source_id, page), ids) in cells {
        let ids: Vec<&String> = ids.iter().collect();
        for i in 0..ids.len() {
            for j in (i + 1)..ids.len() {
                let accum = edges.entry(EdgeKey::new(ids[i], ids[j])).or_default();
                accum.weight += 1;
                accum.evidence.push(EvidenceItem {
                    source_id: source_id.clone(),
                    page: Some(page.clone()),
                    snippet: format!("Co-mentioned on page {} of {}", page, source_id),
                    date: None,
                });
                for id in [ids[i], ids[j]] {
                    if let Some(node) = nodes.get_mut(id.as_str()) {
                        node.has_edge = true;
                    }
                }
            }
        }
    }
}

fn image_name(path: &str) -> String {
    let base = path.rsplit(['/', '\\']).next().unwrap_or(path);
    match base.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => base.to_string(),
    }
}
