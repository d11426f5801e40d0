use std::path::Path;

use clap::Parser;

use trck_cli::config::Opts;
use trck_cli::error::CliError;

/// Loads a compiled pattern from `path`. The pattern compiler lives
/// outside this workspace, so this build can only report that it would
/// need one — it never fabricates a matcher.
fn load_matcher(path: &Path) -> Result<std::convert::Infallible, CliError> {
    Err(CliError::MatcherUnavailable(path.to_path_buf()))
}

fn main() -> anyhow::Result<()> {
    let opts = Opts::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(opts.log_filter()))
        .init();

    match load_matcher(&opts.pattern) {
        Ok(matcher) => match matcher {},
        Err(err) => Err(err.into()),
    }
}
