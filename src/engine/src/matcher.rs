//! The matcher capability: a compiled pattern's state machine.
//! The compiler that turns a pattern source into a [`Matcher`] impl is an
//! external collaborator, out of scope here — this module only fixes the
//! contract the groupby engine drives it through.

use trck_store::Event;

use crate::params::ParamBindings;

/// One free variable the compiled matcher reads via `%name`/`#name`
/// parameter binding. `field` is the store column the
/// variable's values are drawn from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FreeVar {
    pub name: String,
    pub field: String,
    pub kind: VarKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VarKind {
    /// `%name`: a single bound value.
    Scalar,
    /// `#name`: a set of bound values, matched as "is one of".
    Set,
}

/// Outcome of one `match_trail` call: the resulting state, the results
/// accumulated along the way, and whether evaluation actually touched any
/// bound groupby variable, reset on every call.
pub struct MatchOutcome<S, R> {
    pub state: S,
    pub results: R,
    pub used_group_vars: bool,
}

/// A compiled pattern, driven once per `(state, trail, parameter
/// binding)` triple by the groupby engine.
pub trait Matcher {
    type State: Clone + PartialEq + Send;
    type Results: Default + Send;

    fn initial_state(&self) -> Self::State;
    fn is_initial_state(&self, state: &Self::State) -> bool;

    /// This matcher's free variables, in declaration order — the
    /// materialiser uses this to know what a FOREACH tuple must
    /// bind.
    fn free_vars(&self) -> &[FreeVar];

    /// Runs the matcher over `events` starting from `state`, with
    /// `params` bound for the duration of the call. Must have no side
    /// effects beyond the returned outcome — the engine relies on this to
    /// memoize and replay calls.
    fn match_trail(
        &self,
        state: &Self::State,
        events: &[Event],
        params: &ParamBindings,
    ) -> MatchOutcome<Self::State, Self::Results>;

    fn merge_results(into: &mut Self::Results, other: &Self::Results);

    /// This matcher's compile-time `merge_results` constant: when set, every
    /// foreach group writes into a single shared result slot instead of its
    /// own. An embedder may still override this per run (see
    /// `trck_cli`'s `RawParams::merge_results`); the default here is what
    /// the matcher was compiled with.
    fn declared_merge_results(&self) -> bool {
        false
    }

    /// This matcher's compile-time `no_rewind` property, inverted: `true`
    /// means the pattern restarts matching from the trail's origin
    /// mid-stream, which is incompatible with cross-store state
    /// continuity (§4.4). The engine refuses multi-store runs when this is
    /// set.
    fn uses_rewind(&self) -> bool {
        false
    }

    /// Merges `other` into `into` as if `match_trail` had been called
    /// `times` times and all `times` results merged — the "early break"
    /// and "non-distinct series" shortcuts depend on this being
    /// equivalent to, but cheaper than, calling `merge_results` in a loop.
    fn add_results_times(into: &mut Self::Results, times: u32, other: &Self::Results) {
        for _ in 0..times {
            Self::merge_results(into, other);
        }
    }
}
