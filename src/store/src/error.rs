use thiserror::Error;

/// Errors surfaced by the store boundary.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("invalid uuid: {0}")]
    BadUuid(String),

    #[error("cannot open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("duplicate uuid {0} in exclude file {1}")]
    DuplicateExclude(String, String),

    #[error("invalid line {line} in window file {path}: {reason}")]
    BadWindowLine {
        path: String,
        line: u64,
        reason: String,
    },

    #[error("invalid line {line} in exclude file {path}: {reason}")]
    BadExcludeLine {
        path: String,
        line: u64,
        reason: String,
    },

    #[error("invalid event filter: {0}")]
    BadFilter(String),

    #[error("trail id {0} out of bounds for store")]
    TrailOutOfBounds(u64),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}
