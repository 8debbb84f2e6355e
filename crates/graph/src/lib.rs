pub mod builder;
pub mod error;
pub mod evidence;
pub mod model;
pub mod temporal;

pub use builder::{BuildOptions, build_graph, build_graph_with_options};
pub use error::GraphError;
pub use evidence::{EvidenceBundle, dedup_evidence, evidence_for_edge, evidence_for_node};
pub use model::{Edge, EdgeKey, EvidenceItem, GraphOutput, Node, TimelineRange};
pub use temporal::{TimeWindow, in_range};
