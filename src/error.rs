use thiserror::Error;

/// Errors surfaced at the crate edges: store I/O, page snapshots, config,
/// transport and the tool bridge.
///
/// The detection, resolution, fill and validation stages never return these
/// to the host page; they degrade locally instead.
#[derive(Debug, Error)]
pub enum FormPilotError {
    /// File could not be read or written (store, snapshot, trace output)
    #[error("I/O error ({context}): {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON parsing failed (snapshot, store file, bridge envelope)
    #[error("JSON parse error ({context}): {source}")]
    JsonParse {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// JSON serialization failed
    #[error("JSON serialize error ({context}): {source}")]
    JsonSerialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// Page snapshot has a structure the DOM model cannot represent
    #[error("Unexpected page structure: {0}")]
    PageStructure(String),

    /// Remote service call failed and no fallback exists for the operation
    #[error("Service error: {0}")]
    Service(#[from] crate::mapping::service::ServiceError),

    /// Tool bridge transport failure
    #[error("Bridge error: {0}")]
    Bridge(String),

    /// Field index given on the command line does not exist on the page
    #[error("Field {index} not found: {context}")]
    FieldNotFound { index: usize, context: String },
}

pub type Result<T> = std::result::Result<T, FormPilotError>;
