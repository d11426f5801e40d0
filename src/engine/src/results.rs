//! Result aggregation and trail finalisation.
//!
//! Per-trail, per-tuple results produced by [`crate::groupby`] are summed
//! into one table per foreach tuple (or a single merged slot) across
//! every trail in every store. After the last store in the chain, any
//! trail left in a non-initial state is replayed against one synthetic
//! event to flush any pending `after`-style clauses.

use trck_store::Event;

use crate::matcher::Matcher;

/// One less than the sentinel "no timestamp" value, used so ordering
/// comparisons against real timestamps still make sense.
pub const FINAL_TIMESTAMP: u64 = u64::MAX - 1;

/// Runs the matcher once more against a single dummy event at
/// [`FINAL_TIMESTAMP`], with no bound parameters, to let any trailing
/// `after`/timeout clauses fire before a trail's state is discarded for
/// good.
pub fn finalize_trail<M: Matcher>(matcher: &M, state: &M::State) -> M::Results {
    let dummy = [Event::new(FINAL_TIMESTAMP, Vec::new())];
    matcher
        .match_trail(state, &dummy, &Vec::new())
        .results
}

/// Accumulates results across trails, one slot per foreach tuple (or a
/// single slot when `merge_results` collapses them).
pub struct ResultTable<M: Matcher> {
    slots: Vec<M::Results>,
}

impl<M: Matcher> ResultTable<M> {
    pub fn new(num_slots: usize) -> Self {
        Self {
            slots: (0..num_slots).map(|_| M::Results::default()).collect(),
        }
    }

    pub fn num_slots(&self) -> usize {
        self.slots.len()
    }

    /// Merges one trail's per-tuple results into the running totals.
    pub fn merge_trail(&mut self, trail_results: &[M::Results]) {
        for (slot, r) in self.slots.iter_mut().zip(trail_results.iter()) {
            M::merge_results(slot, r);
        }
    }

    /// Merges a single finalisation result into one tuple's slot.
    pub fn merge_one(&mut self, slot_idx: usize, result: &M::Results) {
        M::merge_results(&mut self.slots[slot_idx], result);
    }

    /// Merges another table's totals into this one (used to fold a
    /// per-shard table into the cross-shard total).
    pub fn merge_table(&mut self, other: ResultTable<M>) {
        for (a, b) in self.slots.iter_mut().zip(other.slots.into_iter()) {
            M::merge_results(a, &b);
        }
    }

    pub fn into_inner(self) -> Vec<M::Results> {
        self.slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::{FreeVar, MatchOutcome};

    struct CountingMatcher;
    impl Matcher for CountingMatcher {
        type State = u32;
        type Results = u32;
        fn initial_state(&self) -> u32 {
            0
        }
        fn is_initial_state(&self, s: &u32) -> bool {
            *s == 0
        }
        fn free_vars(&self) -> &[FreeVar] {
            &[]
        }
        fn match_trail(
            &self,
            state: &u32,
            events: &[Event],
            _params: &crate::params::ParamBindings,
        ) -> MatchOutcome<u32, u32> {
            MatchOutcome {
                state: *state + events.len() as u32,
                results: events.len() as u32,
                used_group_vars: false,
            }
        }
        fn merge_results(into: &mut u32, other: &u32) {
            *into += *other;
        }
    }

    #[test]
    fn merge_trail_sums_into_existing_slots() {
        let mut table = ResultTable::<CountingMatcher>::new(2);
        table.merge_trail(&[1, 2]);
        table.merge_trail(&[3, 4]);
        assert_eq!(table.into_inner(), vec![4, 6]);
    }

    #[test]
    fn merge_table_folds_shard_totals_together() {
        let mut a = ResultTable::<CountingMatcher>::new(2);
        a.merge_trail(&[1, 1]);
        let mut b = ResultTable::<CountingMatcher>::new(2);
        b.merge_trail(&[2, 2]);
        a.merge_table(b);
        assert_eq!(a.into_inner(), vec![3, 3]);
    }

    #[test]
    fn finalize_trail_runs_against_a_single_dummy_event() {
        let matcher = CountingMatcher;
        let result = finalize_trail(&matcher, &5);
        assert_eq!(result, 1);
    }
}
