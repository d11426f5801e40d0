//! Cross-store controller: drives the groupby engine over
//! one or more stores in sequence, parallelising the per-trail work within
//! each store across a fixed worker pool.
//!
//! Per-subject matcher state survives across stores via a single global
//! state map, keyed by the subject's *state key* — ordinarily its own
//! UUID, but when a window set with an `id` column is in play, the
//! window's `id` instead (so the same physical trail can be read under
//! several independent logical subjects, or vice versa). Workers only
//! ever see the state map through a lock taken once per trail read and
//! once per trail write; the bulk of the work (reading and matching) runs
//! lock-free.

use parking_lot::Mutex;

use trck_store::{Event, EventStore, ExcludeSet, FieldId, TrailCursor, Uuid, WindowSet};

use crate::error::EngineError;
use crate::foreach_index::ForeachIndex;
use crate::groupby::run_groupby_for_trail;
use crate::hash::UuidMap;
use crate::matcher::Matcher;
use crate::params::ParamTuple;
use crate::results::{finalize_trail, ResultTable};
use crate::statevec::StateVec;

pub struct EngineConfig {
    /// Worker thread count for the per-store parallel sweep.
    pub num_threads: usize,
    pub merge_results: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            num_threads: 1,
            merge_results: false,
        }
    }
}

struct WorkItem {
    trail_id: u64,
    state_key: Uuid,
    read_uuid: Uuid,
    window_start: u64,
    window_end: u64,
}

fn plan_work(
    store: &impl EventStore,
    window_set: Option<&WindowSet>,
    exclude_set: Option<&ExcludeSet>,
    min_ts: u64,
) -> Vec<WorkItem> {
    let mut items = Vec::new();
    match window_set {
        Some(ws) => {
            for (state_key, entry) in ws.iter() {
                let Some(trail_id) = store.trail_id(&entry.uuid) else {
                    continue;
                };
                if exclude_set.is_some_and(|e| e.contains(&entry.uuid)) {
                    continue;
                }
                let window_start = entry.start.max(min_ts);
                items.push(WorkItem {
                    trail_id,
                    state_key: *state_key,
                    read_uuid: entry.uuid,
                    window_start,
                    window_end: entry.end,
                });
            }
        }
        None => {
            for trail_id in 0..store.num_trails() {
                let uuid = store.trail_uuid(trail_id);
                if exclude_set.is_some_and(|e| e.contains(&uuid)) {
                    continue;
                }
                items.push(WorkItem {
                    trail_id,
                    state_key: uuid,
                    read_uuid: uuid,
                    window_start: min_ts,
                    window_end: 0,
                });
            }
        }
    }
    items
}

fn split_into_shards<T>(items: Vec<T>, shard_count: usize) -> Vec<Vec<T>> {
    let shard_count = shard_count.max(1);
    let mut shards: Vec<Vec<T>> = (0..shard_count).map(|_| Vec::new()).collect();
    for (i, item) in items.into_iter().enumerate() {
        shards[i % shard_count].push(item);
    }
    shards.retain(|s| !s.is_empty());
    shards
}

/// Runs the matcher over `stores` in order, returning the final
/// per-tuple (or single merged) result table after cross-store state
/// propagation and trail finalisation.
pub fn run_cross_store<M, S>(
    matcher: &M,
    stores: &[S],
    tuples: &[ParamTuple],
    var_fields: &[(String, FieldId)],
    window_set: Option<&WindowSet>,
    exclude_set: Option<&ExcludeSet>,
    config: &EngineConfig,
) -> Result<Vec<M::Results>, EngineError>
where
    M: Matcher + Sync,
    M::State: Send,
    M::Results: Send,
    S: EventStore,
{
    if stores.len() > 1 && matcher.uses_rewind() {
        return Err(EngineError::RewindUnsupportedMultiStore(stores.len()));
    }

    let num_tuples = tuples.len();
    let result_slots = if config.merge_results { 1 } else { num_tuples };

    let mut global_states: UuidMap<StateVec<M::State>> = UuidMap::default();
    let mut totals = ResultTable::<M>::new(result_slots);
    let mut min_ts = 0u64;

    for store in stores {
        let foreach_index = ForeachIndex::build(tuples, var_fields);
        let work = plan_work(store, window_set, exclude_set, min_ts);
        let shards = split_into_shards(work, config.num_threads);

        let states_lock = Mutex::new(std::mem::take(&mut global_states));
        let store_totals = Mutex::new(ResultTable::<M>::new(result_slots));

        crossbeam::scope(|scope| {
            for shard in shards {
                let states_lock = &states_lock;
                let store_totals = &store_totals;
                let foreach_index = &foreach_index;
                scope.spawn(move |_| {
                    let mut local_states: UuidMap<StateVec<M::State>> = UuidMap::default();
                    let mut local_totals = ResultTable::<M>::new(result_slots);
                    let mut cursor = TrailCursor::new(store);

                    for item in shard {
                        let in_sv = states_lock.lock().get(&item.state_key).cloned();
                        cursor.read_trail(item.trail_id, item.window_start, item.window_end);
                        let outcome = run_groupby_for_trail(
                            matcher,
                            cursor.events(),
                            in_sv.as_ref(),
                            tuples,
                            config.merge_results,
                            |events: &[Event]| {
                                foreach_index.distinct_for_trail(events, var_fields, num_tuples)
                            },
                        );
                        local_totals.merge_trail(&outcome.results);
                        if !outcome.state_vec.is_empty() {
                            local_states.insert(item.state_key, outcome.state_vec);
                        }
                    }

                    store_totals.lock().merge_table(local_totals);
                    let mut states = states_lock.lock();
                    for (key, sv) in local_states {
                        states.insert(key, sv);
                    }
                });
            }
        })
        .expect("a groupby worker thread panicked");

        totals.merge_table(store_totals.into_inner());
        global_states = states_lock.into_inner();
        min_ts = min_ts.max(store.max_timestamp());
    }

    finalize_into(matcher, global_states, num_tuples, config.merge_results, &mut totals);
    Ok(totals.into_inner())
}

fn finalize_into<M: Matcher>(
    matcher: &M,
    states: UuidMap<StateVec<M::State>>,
    num_tuples: usize,
    merge_results: bool,
    totals: &mut ResultTable<M>,
) {
    for (_, sv) in states {
        let mut edges = sv.iter_edges();
        let mut j = 0usize;
        while j < num_tuples {
            let (state, count) = match edges.next() {
                Some((s, c)) => (s, c as usize),
                None => (None, num_tuples - j),
            };
            let result = match state {
                Some(s) if !matcher.is_initial_state(s) => finalize_trail(matcher, s),
                _ => M::Results::default(),
            };
            if merge_results {
                for _ in 0..count {
                    totals.merge_one(0, &result);
                }
            } else {
                for idx in j..j + count {
                    totals.merge_one(idx, &result);
                }
            }
            j += count;
        }
    }
}
