use thiserror::Error;

/// Boundary error taxonomy. Dangling entity references are deliberately not
/// represented here: a fact pointing at an unknown entity id is skipped
/// during the build, since partial extraction is expected.
#[derive(Debug, Error)]
pub enum GraphError {
    /// No extraction record exists for the requested dataset.
    #[error("no extraction record available for dataset '{dataset}'; ingest a record first")]
    RecordMissing { dataset: String },

    /// A record was found but does not satisfy the input schema.
    #[error("record schema invalid: {detail}")]
    SchemaInvalid { detail: String },

    /// The data source cannot be reached from this execution context.
    #[error(
        "data source not accessible from this deployment ({detail}); \
         store records in persistent storage instead of local files"
    )]
    UnsupportedEnvironment { detail: String },
}

impl GraphError {
    pub fn missing_entities() -> GraphError {
        GraphError::SchemaInvalid {
            detail: "missing required `entities` array".to_string(),
        }
    }

    /// Stable machine-readable kind, paired with the Display message when
    /// errors cross the boundary as structured results.
    pub fn kind(&self) -> &'static str {
        match self {
            GraphError::RecordMissing { .. } => "record_missing",
            GraphError::SchemaInvalid { .. } => "schema_invalid",
            GraphError::UnsupportedEnvironment { .. } => "unsupported_environment",
        }
    }
}
