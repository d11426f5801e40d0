use thiserror::Error;

/// Errors surfaced by the groupby engine itself, as distinct from store
/// errors (`trck_store::StoreError`) or matcher errors, which are an
/// external collaborator's concern.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("parameter {0} has no bound value and no default in the traildb")]
    UnboundParameter(String),

    #[error("parameter name {0} must start with '%', '#' or '@'")]
    BadParamName(String),

    #[error("invalid params json: {0}")]
    BadParamsJson(#[source] serde_json::Error),

    #[error("foreach tuple {0} has wrong arity: expected {1} vars, got {2}")]
    BadTupleArity(usize, usize, usize),

    #[error("programs using rewind (restart-from-start) are not supported with multiple stores ({0} given)")]
    RewindUnsupportedMultiStore(usize),

    #[error(transparent)]
    Store(#[from] trck_store::StoreError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}
