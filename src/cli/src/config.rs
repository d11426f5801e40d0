//! Command-line surface.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Msgpack,
}

/// `trck STORE_PATH... [options]`
#[derive(Parser, Debug)]
#[command(
    version,
    about = "Evaluate a compiled pattern against one or more event trail stores"
)]
pub struct Opts {
    /// Store paths, applied in order; state carries over between them.
    #[arg(required = true)]
    pub store_paths: Vec<PathBuf>,

    /// Path to the compiled pattern this run evaluates. Pattern
    /// compilation is an external component — this
    /// binary expects an artifact it knows how to load, not source text.
    #[arg(long)]
    pub pattern: PathBuf,

    /// JSON file of scalar/set parameter bindings and, optionally, an
    /// explicit FOREACH tuple list.
    #[arg(long)]
    pub params: Option<PathBuf>,

    /// JSON event filter applied before trails reach the matcher.
    #[arg(long)]
    pub filter: Option<PathBuf>,

    /// CSV window file: `uuid,start_ts,end_ts[,id]` per line.
    #[arg(long = "window-file")]
    pub window_file: Option<PathBuf>,

    /// File of hex UUIDs to skip entirely.
    #[arg(long = "exclude-file")]
    pub exclude_file: Option<PathBuf>,

    #[arg(long = "output-format", value_enum, default_value_t = OutputFormat::Json)]
    pub output_format: OutputFormat,

    /// Worker thread count for the per-store parallel sweep.
    /// Defaults to the params file's `threads`, or the number of
    /// available cores if neither is set.
    #[arg(long)]
    pub threads: Option<usize>,

    /// Repeatable; `-v` for debug logging, `-vv` for trace.
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Opts {
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}
