pub mod kind;
pub mod schema;

pub use kind::NodeKind;
pub use schema::{
    Claim, Entity, Event, ImageRecord, PageRef, Record, Relationship, Source, SourceRef, TimeSpan,
};

/// Parse an extraction record from raw JSON.
///
/// Presence of the required `entities` array is checked later by the graph
/// builder, which reports it as a distinct schema error; here a record with
/// no `entities` key still parses (as `entities: None`).
pub fn parse_record(json: &str) -> Result<Record, serde_json::Error> {
    serde_json::from_str(json)
}
