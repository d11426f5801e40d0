//! Event filter: a JSON predicate applied to raw events
//! before they ever reach the matcher, AND of OR-clauses over `(field,
//! value, op)` terms.

use serde::Deserialize;

use crate::error::StoreError;
use crate::event::{Event, FieldId, ValueId, MISSING_FIELD_ID, TIMESTAMP_FIELD_ID};
use crate::EventStore;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOp {
    Equal,
    Notequal,
}

#[derive(Clone, Debug, Deserialize)]
pub struct FilterTerm {
    pub field: String,
    pub value: String,
    pub op: FilterOp,
}

/// The filter as written by the caller, field names not yet resolved
/// against any particular store.
#[derive(Clone, Debug, Deserialize)]
pub struct FilterSpec {
    pub clauses: Vec<Vec<FilterTerm>>,
}

impl FilterSpec {
    pub fn from_json(s: &str) -> Result<Self, StoreError> {
        serde_json::from_str(s).map_err(|e| StoreError::BadFilter(e.to_string()))
    }

    /// Resolve every term's field and value against `store`'s lexicon. A
    /// term whose field name does not exist in the store resolves to
    /// [`MISSING_FIELD_ID`], which never matches `Equal` and always
    /// matches `Notequal` (an event cannot carry a field the store
    /// doesn't have).
    pub fn compile(&self, store: &impl EventStore) -> CompiledFilter {
        let clauses = self
            .clauses
            .iter()
            .map(|clause| {
                clause
                    .iter()
                    .map(|term| {
                        let field_id = if term.field == "timestamp" {
                            TIMESTAMP_FIELD_ID
                        } else {
                            store.field_id(&term.field).unwrap_or(MISSING_FIELD_ID)
                        };
                        let value_id = if field_id == MISSING_FIELD_ID {
                            ValueId::default()
                        } else {
                            store.resolve_scalar(field_id, &term.value)
                        };
                        (field_id, value_id, term.op)
                    })
                    .collect()
            })
            .collect();
        CompiledFilter { clauses }
    }
}

/// A filter with every term resolved to `(field_id, value_id, op)`,
/// cheap to evaluate per event.
#[derive(Clone, Debug, Default)]
pub struct CompiledFilter {
    clauses: Vec<Vec<(FieldId, ValueId, FilterOp)>>,
}

impl CompiledFilter {
    /// An empty filter (no clauses) matches every event.
    pub fn passthrough() -> Self {
        Self::default()
    }

    /// AND across clauses, OR within each clause's terms.
    pub fn matches(&self, event: &Event) -> bool {
        self.clauses.iter().all(|clause| {
            clause.iter().any(|&(field_id, value_id, op)| {
                if field_id == MISSING_FIELD_ID {
                    return op == FilterOp::Notequal;
                }
                let actual = event.value(field_id);
                match op {
                    FilterOp::Equal => actual == value_id,
                    FilterOp::Notequal => actual != value_id,
                }
            })
        })
    }
}

/// Wraps any [`EventStore`] so its raw events are pre-filtered through a
/// [`CompiledFilter`], the way the engine expects filtering to have
/// already happened by the time a trail reaches the matcher.
pub struct FilteredStore<S> {
    inner: S,
    filter: CompiledFilter,
}

impl<S: EventStore> FilteredStore<S> {
    pub fn new(inner: S, filter: CompiledFilter) -> Self {
        Self { inner, filter }
    }
}

impl<S: EventStore> EventStore for FilteredStore<S> {
    fn field_id(&self, name: &str) -> Option<FieldId> {
        self.inner.field_id(name)
    }

    fn num_trails(&self) -> u64 {
        self.inner.num_trails()
    }

    fn trail_uuid(&self, trail_id: u64) -> crate::uuid::Uuid {
        self.inner.trail_uuid(trail_id)
    }

    fn trail_id(&self, uuid: &crate::uuid::Uuid) -> Option<u64> {
        self.inner.trail_id(uuid)
    }

    fn max_timestamp(&self) -> u64 {
        self.inner.max_timestamp()
    }

    fn raw_events(&self, trail_id: u64) -> Vec<Event> {
        self.inner
            .raw_events(trail_id)
            .into_iter()
            .filter(|e| self.filter.matches(e))
            .collect()
    }

    fn resolve_scalar(&self, field_id: FieldId, value: &str) -> ValueId {
        self.inner.resolve_scalar(field_id, value)
    }

    fn lexicon(&self, field_id: FieldId) -> Vec<(ValueId, String)> {
        self.inner.lexicon(field_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mem::MemStoreBuilder;

    #[test]
    fn parses_clauses() {
        let spec = FilterSpec::from_json(
            r#"{"clauses":[[{"field":"action","value":"click","op":"equal"}]]}"#,
        )
        .unwrap();
        assert_eq!(spec.clauses.len(), 1);
        assert_eq!(spec.clauses[0][0].field, "action");
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(FilterSpec::from_json("not json").is_err());
    }

    #[test]
    fn equal_and_notequal_match_expected_events() {
        let mut b = MemStoreBuilder::new();
        let f = b.field("action");
        let uuid = b.uuid(1);
        b.event(uuid, 1, &[(f, "click")]);
        b.event(uuid, 2, &[(f, "view")]);
        let store = b.build();

        let spec = FilterSpec::from_json(
            r#"{"clauses":[[{"field":"action","value":"click","op":"equal"}]]}"#,
        )
        .unwrap();
        let compiled = spec.compile(&store);

        let events = store.raw_events(store.trail_id(&uuid).unwrap());
        assert!(compiled.matches(&events[0]));
        assert!(!compiled.matches(&events[1]));
    }

    #[test]
    fn empty_filter_passes_everything() {
        let mut b = MemStoreBuilder::new();
        let f = b.field("action");
        let uuid = b.uuid(1);
        b.event(uuid, 1, &[(f, "click")]);
        let store = b.build();
        let events = store.raw_events(store.trail_id(&uuid).unwrap());
        assert!(CompiledFilter::passthrough().matches(&events[0]));
    }

    #[test]
    fn filtered_store_hides_non_matching_events() {
        let mut b = MemStoreBuilder::new();
        let f = b.field("action");
        let uuid = b.uuid(1);
        b.event(uuid, 1, &[(f, "click")]);
        b.event(uuid, 2, &[(f, "view")]);
        let store = b.build();

        let spec = FilterSpec::from_json(
            r#"{"clauses":[[{"field":"action","value":"click","op":"equal"}]]}"#,
        )
        .unwrap();
        let compiled = spec.compile(&store);
        let trail_id = store.trail_id(&uuid).unwrap();
        let filtered = FilteredStore::new(store, compiled);

        let events = filtered.raw_events(trail_id);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn missing_field_never_matches_equal() {
        let mut b = MemStoreBuilder::new();
        let f = b.field("action");
        let uuid = b.uuid(1);
        b.event(uuid, 1, &[(f, "click")]);
        let store = b.build();

        let spec = FilterSpec::from_json(
            r#"{"clauses":[[{"field":"nope","value":"x","op":"equal"}]]}"#,
        )
        .unwrap();
        let compiled = spec.compile(&store);
        let events = store.raw_events(store.trail_id(&uuid).unwrap());
        assert!(!compiled.matches(&events[0]));
    }
}
