//! CLI orchestration: wires together parameter/filter/window/exclude file
//! loading, store construction, and the cross-store engine, and formats
//! whatever the matcher returns.
//!
//! The compiled pattern itself is supplied by the caller as a `Matcher`
//! implementation — this crate never constructs one; that's `main`'s job,
//! and in this build `main` always fails with `CliError::MatcherUnavailable`
//! since the pattern compiler isn't part of this workspace. Everything
//! else here is fully wired and tested against the JSON fixture store.

pub mod config;
pub mod error;
pub mod fixture;
pub mod output;

use std::fs;

use trck_engine::{materialize_tuples, EngineConfig, Matcher, ParamTuple, RawParams};
use trck_store::{EventStore, ExcludeSet, FilterSpec, FilteredStore, WindowSet};

use crate::config::Opts;
use crate::error::CliError;
use crate::fixture::load_fixture_store;
use crate::output::{JsonSink, MsgpackSink, ResultSink};

/// Number of worker threads to use: `--threads`, falling back to the
/// params file's `threads`, falling back to the available parallelism.
fn resolve_threads(opts: &Opts, params: &RawParams) -> usize {
    opts.threads
        .or(params.threads)
        .unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1))
}

/// Runs `matcher` over every store named in `opts.store_paths`, in order,
/// and returns the per-tuple (or merged) result list the matcher produced.
pub fn run<M>(opts: &Opts, matcher: &M) -> Result<Vec<M::Results>, CliError>
where
    M: Matcher + Sync,
    M::State: Send,
    M::Results: Send + serde::Serialize,
{
    let params = match &opts.params {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|e| CliError::ReadFile(path.clone(), e))?;
            RawParams::from_json(&text)?
        }
        None => RawParams::default(),
    };

    let filter_spec = match &opts.filter {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|e| CliError::ReadFile(path.clone(), e))?;
            FilterSpec::from_json(&text)?
        }
        None => FilterSpec { clauses: Vec::new() },
    };

    let window_set = opts.window_file.as_deref().map(WindowSet::parse).transpose()?;
    let exclude_set = opts.exclude_file.as_deref().map(ExcludeSet::parse).transpose()?;

    let mut stores = Vec::with_capacity(opts.store_paths.len());
    for path in &opts.store_paths {
        let store = load_fixture_store(path)?;
        let compiled = filter_spec.compile(&store);
        stores.push(FilteredStore::new(store, compiled));
    }

    // Tuples are materialised once, against the first store's lexicon.
    // A run with genuinely divergent per-store lexicons would need to
    // re-translate tuples per store (see DESIGN.md); this harness assumes
    // a shared vocabulary across stores instead.
    let first = stores.first().ok_or_else(|| {
        CliError::ReadFile(
            opts.store_paths.first().cloned().unwrap_or_default(),
            std::io::Error::new(std::io::ErrorKind::NotFound, "no store paths given"),
        )
    })?;
    let free_vars = matcher.free_vars();
    let tuples: Vec<ParamTuple> = materialize_tuples(first, free_vars, &params)?;
    let var_fields: Vec<(String, trck_store::FieldId)> = free_vars
        .iter()
        .filter_map(|v| first.field_id(&v.field).map(|f| (v.name.clone(), f)))
        .collect();

    let config = EngineConfig {
        num_threads: resolve_threads(opts, &params),
        merge_results: params.merge_results.unwrap_or_else(|| matcher.declared_merge_results()),
    };

    let results = trck_engine::run_cross_store(
        matcher,
        &stores,
        &tuples,
        &var_fields,
        window_set.as_ref(),
        exclude_set.as_ref(),
        &config,
    )?;

    let stdout = std::io::stdout();
    match opts.output_format {
        config::OutputFormat::Json => JsonSink::new(stdout.lock()).write_results(&results)?,
        config::OutputFormat::Msgpack => MsgpackSink.write_results(&results)?,
    }

    Ok(results)
}
