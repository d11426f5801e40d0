//! Groupby pattern-matching engine: drives a compiled matcher (an
//! external collaborator, see [`matcher::Matcher`]) over one or more
//! event stores, evaluating every bound FOREACH tuple against every
//! trail while exploiting the state/parameter independence shortcuts
//! described by the design this crate implements.

pub mod controller;
pub mod error;
pub mod foreach_index;
pub mod groupby;
pub mod hash;
pub mod matcher;
pub mod params;
pub mod results;
pub mod statevec;

pub use controller::{run_cross_store, EngineConfig};
pub use error::EngineError;
pub use groupby::{run_groupby_for_trail, TrailOutcome};
pub use matcher::{FreeVar, MatchOutcome, Matcher, VarKind};
pub use params::{materialize_tuples, ParamBindings, ParamTuple, ParamValue, RawParams};
pub use results::{finalize_trail, ResultTable, FINAL_TIMESTAMP};
pub use statevec::{StateVec, StateVecBuilder, MAX_COUNTER_VALUE};
