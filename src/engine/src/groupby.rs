//! Groupby engine hot path: evaluates one trail against every
//! bound foreach tuple, short-circuiting whenever consecutive tuples are
//! provably equivalent.
//!
//! Three regimes, cheapest first:
//!
//! 1. The matcher never reads a groupby variable (`!used_group_vars`):
//!    one call covers the whole run of tuples sharing an input state.
//! 2. The matcher does read a groupby variable, but the trail doesn't
//!    witness most foreach values at all: one call covers the whole run
//!    of tuples that share an input state *and* are absent from the
//!    trail (`non_distinct_series`).
//! 3. Everything else: the matcher runs once per witnessed tuple.

use trck_store::Event;

use crate::foreach_index::DistinctVals;
use crate::matcher::Matcher;
use crate::params::ParamTuple;
use crate::statevec::{StateVec, StateVecBuilder};

/// Per-trail evaluation result: the compacted output state vector (input
/// to the next store in the cross-store chain) and, per foreach tuple
/// (or a single merged slot, if `merge_results` is set), the accumulated
/// results.
pub struct TrailOutcome<M: Matcher> {
    pub state_vec: StateVec<M::State>,
    pub results: Vec<M::Results>,
}

/// Runs the groupby loop for one trail.
///
/// `compute_distinct` is invoked at most once, lazily, the first time a
/// tuple turns out to actually depend on a groupby variable — most trails
/// that never exercise the pattern at all never pay for it.
pub fn run_groupby_for_trail<M: Matcher>(
    matcher: &M,
    events: &[Event],
    in_sv: Option<&StateVec<M::State>>,
    tuples: &[ParamTuple],
    merge_results: bool,
    mut compute_distinct: impl FnMut(&[Event]) -> DistinctVals,
) -> TrailOutcome<M> {
    let num_tuples = tuples.len();
    let mut out = StateVecBuilder::new();
    let result_slots = if merge_results { 1 } else { num_tuples };
    let mut results: Vec<M::Results> = (0..result_slots).map(|_| M::Results::default()).collect();
    let slot = |idx: usize| if merge_results { 0 } else { idx };

    let mut edges = in_sv.map(|sv| sv.iter_edges());
    let mut distinct: Option<DistinctVals> = None;

    let mut j = 0usize;
    while j < num_tuples {
        let (saved_state, num_eq_states) = match edges.as_mut().and_then(|e| e.next()) {
            Some((state, count)) => (state, count as usize),
            None => (None, num_tuples - j),
        };

        let start_state = match saved_state {
            Some(s) => s.clone(),
            None => matcher.initial_state(),
        };

        let outcome = matcher.match_trail(&start_state, events, &tuples[j].bindings);

        if !outcome.used_group_vars {
            out.append(
                outcome.state.clone(),
                matcher.is_initial_state(&outcome.state),
                num_eq_states as u32,
            );
            M::add_results_times(&mut results[slot(j)], num_eq_states as u32, &outcome.results);
            j += num_eq_states;
            continue;
        }

        // The matcher genuinely depends on this tuple's bound value:
        // record just its own result, then figure out how much of the
        // remaining run we can still short-circuit.
        M::add_results_times(&mut results[slot(j)], 1, &outcome.results);
        out.append(
            outcome.state.clone(),
            matcher.is_initial_state(&outcome.state),
            1,
        );
        j += 1;

        let next_diff_state = j + num_eq_states - 1;
        if distinct.is_none() {
            distinct = Some(compute_distinct(events));
        }
        let dv = distinct.as_ref().expect("just populated");

        let mut memo: Option<(M::State, M::Results)> = None;
        let mut k = j;
        while k < next_diff_state {
            let ndn = dv.non_distinct_series(k, next_diff_state);
            if ndn == 0 {
                let outcome_k = matcher.match_trail(&start_state, events, &tuples[k].bindings);
                M::add_results_times(&mut results[slot(k)], 1, &outcome_k.results);
                out.append(
                    outcome_k.state.clone(),
                    matcher.is_initial_state(&outcome_k.state),
                    1,
                );
                k += 1;
            } else {
                if memo.is_none() {
                    let outcome_k = matcher.match_trail(&start_state, events, &tuples[k].bindings);
                    memo = Some((outcome_k.state, outcome_k.results));
                }
                let (nds, ndr) = memo.as_ref().expect("just populated");
                M::add_results_times(&mut results[slot(k)], ndn as u32, ndr);
                out.append(nds.clone(), matcher.is_initial_state(nds), ndn as u32);
                k += ndn;
            }
        }
        j = next_diff_state;
    }

    TrailOutcome {
        state_vec: out.finish(),
        results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::{FreeVar, MatchOutcome, VarKind};
    use crate::params::ParamValue;

    /// A matcher whose state is "has this tuple's bound value id ever been
    /// seen", used purely to exercise the groupby loop's control flow.
    struct ToggleMatcher;

    impl Matcher for ToggleMatcher {
        type State = bool;
        type Results = u32;

        fn initial_state(&self) -> bool {
            false
        }

        fn is_initial_state(&self, state: &bool) -> bool {
            !state
        }

        fn free_vars(&self) -> &[FreeVar] {
            &[]
        }

        fn match_trail(
            &self,
            state: &bool,
            events: &[Event],
            params: &crate::params::ParamBindings,
        ) -> MatchOutcome<bool, u32> {
            let bound = params.iter().find_map(|(_, v)| match v {
                ParamValue::Scalar { value_id, .. } => Some(*value_id),
                _ => None,
            });
            let used = bound.is_some();
            let seen = bound
                .map(|vid| events.iter().any(|e| e.value(0) == vid))
                .unwrap_or(false);
            MatchOutcome {
                state: *state || seen,
                results: if seen { 1 } else { 0 },
                used_group_vars: used,
            }
        }

        fn merge_results(into: &mut u32, other: &u32) {
            *into += *other;
        }
    }

    fn tuple(value_id: i32) -> ParamTuple {
        ParamTuple {
            bindings: vec![("%x".to_string(), ParamValue::Scalar { value_id, raw: value_id.to_string() })],
        }
    }

    #[test]
    fn groupby_not_used_produces_identical_results_for_every_tuple() {
        // A matcher with no free vars never reads params, so every tuple
        // should share one early-break call and one identical result.
        struct Ignore;
        impl Matcher for Ignore {
            type State = bool;
            type Results = u32;
            fn initial_state(&self) -> bool { false }
            fn is_initial_state(&self, s: &bool) -> bool { !s }
            fn free_vars(&self) -> &[FreeVar] { &[] }
            fn match_trail(&self, state: &bool, _events: &[Event], _params: &crate::params::ParamBindings) -> MatchOutcome<bool, u32> {
                MatchOutcome { state: *state, results: 1, used_group_vars: false }
            }
            fn merge_results(into: &mut u32, other: &u32) { *into += *other; }
        }

        let matcher = Ignore;
        let events = vec![Event::new(1, vec![9])];
        let tuples = vec![tuple(1), tuple(2), tuple(3)];
        let outcome = run_groupby_for_trail(&matcher, &events, None, &tuples, false, |_| DistinctVals::new(0));
        assert_eq!(outcome.results, vec![1, 1, 1]);
    }

    #[test]
    fn groupby_used_only_witnessed_values_get_a_nonzero_result() {
        let matcher = ToggleMatcher;
        let events = vec![Event::new(1, vec![2])];
        let tuples = vec![tuple(1), tuple(2), tuple(3), tuple(2)];
        let outcome = run_groupby_for_trail(&matcher, &events, None, &tuples, false, |evs| {
            let mut dv = DistinctVals::new(4);
            for (i, t) in [1, 2, 3, 2].into_iter().enumerate() {
                if evs.iter().any(|e| e.value(0) == t) {
                    dv.mark(i);
                }
            }
            dv
        });
        assert_eq!(outcome.results, vec![0, 1, 0, 1]);
    }

    #[test]
    fn merge_results_collapses_into_a_single_slot() {
        let matcher = ToggleMatcher;
        let events = vec![Event::new(1, vec![2])];
        let tuples = vec![tuple(1), tuple(2), tuple(3)];
        let outcome = run_groupby_for_trail(&matcher, &events, None, &tuples, true, |evs| {
            let mut dv = DistinctVals::new(3);
            for (i, t) in [1, 2, 3].into_iter().enumerate() {
                if evs.iter().any(|e| e.value(0) == t) {
                    dv.mark(i);
                }
            }
            dv
        });
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0], 1);
    }
}
