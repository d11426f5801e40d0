//! FOREACH value/tuple index: maps a `(field, value)` pair to
//! the foreach tuple indices that bind it, and tracks which tuples are
//! actually witnessed by one trail.

use std::collections::HashMap;

use fixedbitset::FixedBitSet;
use smallvec::SmallVec;

use trck_store::{Event, FieldId, ValueId};

use crate::params::{ParamTuple, ParamValue};

/// Bit `i` set means foreach tuple `i` appears (is "touched by") the
/// trail currently being scanned.
pub struct DistinctVals {
    bits: FixedBitSet,
}

impl DistinctVals {
    pub fn new(len: usize) -> Self {
        Self {
            bits: FixedBitSet::with_capacity(len),
        }
    }

    pub fn mark(&mut self, idx: usize) {
        self.bits.insert(idx);
    }

    pub fn contains(&self, idx: usize) -> bool {
        self.bits.contains(idx)
    }

    /// Length of the run of consecutive tuple indices in `[val, limit)`
    /// that do *not* appear in the trail. Zero means `val` itself
    /// appears.
    pub fn non_distinct_series(&self, val: usize, limit: usize) -> usize {
        if val >= limit || self.bits.contains(val) {
            return 0;
        }
        let mut n = 0;
        let mut i = val;
        while i < limit && !self.bits.contains(i) {
            n += 1;
            i += 1;
        }
        n
    }
}

/// Reverse index from `(field_id, value_id)` to the foreach tuple indices
/// that bind that value for that field, built once per query and reused
/// across all trails.
#[derive(Default)]
pub struct ForeachIndex {
    map: HashMap<(FieldId, ValueId), SmallVec<[u32; 4]>>,
}

impl ForeachIndex {
    /// `var_fields` names the groupby variables and the store field each
    /// is drawn from; only bindings for those variables are indexed.
    pub fn build(tuples: &[ParamTuple], var_fields: &[(String, FieldId)]) -> Self {
        let mut map: HashMap<(FieldId, ValueId), SmallVec<[u32; 4]>> = HashMap::new();
        for (tuple_idx, tuple) in tuples.iter().enumerate() {
            for (var_name, field_id) in var_fields {
                let Some((_, value)) = tuple.bindings.iter().find(|(n, _)| n == var_name) else {
                    continue;
                };
                match value {
                    ParamValue::Scalar { value_id, .. } => {
                        map.entry((*field_id, *value_id))
                            .or_default()
                            .push(tuple_idx as u32);
                    }
                    ParamValue::Set { entries } => {
                        for (value_id, _) in entries {
                            map.entry((*field_id, *value_id))
                                .or_default()
                                .push(tuple_idx as u32);
                        }
                    }
                }
            }
        }
        Self { map }
    }

    /// Scans `events` once per relevant field and marks every foreach
    /// tuple whose bound value is witnessed somewhere in the trail.
    pub fn distinct_for_trail(
        &self,
        events: &[Event],
        var_fields: &[(String, FieldId)],
        num_tuples: usize,
    ) -> DistinctVals {
        let mut dv = DistinctVals::new(num_tuples);
        for event in events {
            for (_, field_id) in var_fields {
                let value_id = event.value(*field_id);
                if let Some(idxs) = self.map.get(&(*field_id, value_id)) {
                    for &idx in idxs {
                        dv.mark(idx as usize);
                    }
                }
            }
        }
        dv
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tuple(name: &str, value_id: ValueId) -> ParamTuple {
        ParamTuple {
            bindings: vec![(
                name.to_string(),
                ParamValue::Scalar {
                    value_id,
                    raw: value_id.to_string(),
                },
            )],
        }
    }

    #[test]
    fn non_distinct_series_counts_consecutive_absent_tuples() {
        let mut dv = DistinctVals::new(4);
        dv.mark(0);
        dv.mark(1);
        assert_eq!(dv.non_distinct_series(0, 4), 0);
        assert_eq!(dv.non_distinct_series(1, 4), 0);
        assert_eq!(dv.non_distinct_series(2, 4), 2);
        assert_eq!(dv.non_distinct_series(3, 4), 1);
    }

    #[test]
    fn distinct_for_trail_marks_only_witnessed_tuples() {
        let tuples = vec![tuple("%action", 1), tuple("%action", 2), tuple("%action", 3)];
        let var_fields = vec![("%action".to_string(), 7i64)];
        let index = ForeachIndex::build(&tuples, &var_fields);

        let events = vec![Event::new(1, vec![0, 0, 0, 0, 0, 0, 0, 2])];
        let dv = index.distinct_for_trail(&events, &var_fields, tuples.len());
        assert!(!dv.contains(0));
        assert!(dv.contains(1));
        assert!(!dv.contains(2));
    }
}
