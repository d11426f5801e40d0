use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("cannot read {0}: {1}")]
    ReadFile(PathBuf, #[source] std::io::Error),

    #[error("cannot parse fixture store {0}: {1}")]
    ParseFixture(PathBuf, #[source] serde_json::Error),

    #[error("pattern compilation is supplied by an external component not linked into this build (pattern file: {0})")]
    MatcherUnavailable(PathBuf),

    #[error("output format {0:?} is not supported by this build (its encoder is an external component)")]
    UnsupportedOutputFormat(crate::config::OutputFormat),

    #[error("failed to write output: {0}")]
    Write(#[source] std::io::Error),

    #[error(transparent)]
    Store(#[from] trck_store::StoreError),

    #[error(transparent)]
    Engine(#[from] trck_engine::EngineError),
}
