//! In-memory reference [`EventStore`] implementation. Not a production
//! store — it exists so `trck_engine`'s test suite has a real store to
//! point the matcher and groupby engine at without depending on any
//! particular on-disk format.

use std::collections::HashMap;

use smallvec::SmallVec;

use crate::event::{Event, FieldId, ValueId, EMPTY_VALUE, TIMESTAMP_FIELD_ID, UNRESOLVED_VALUE};
use crate::uuid::Uuid;
use crate::EventStore;

#[derive(Default)]
pub struct MemStoreBuilder {
    field_ids: HashMap<String, FieldId>,
    next_field: FieldId,
    trails: Vec<Uuid>,
    trail_index: HashMap<Uuid, u64>,
    events: HashMap<u64, Vec<Event>>,
    value_index: HashMap<(FieldId, String), ValueId>,
    next_value: HashMap<FieldId, ValueId>,
}

impl MemStoreBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns a field name, returning the same id on repeat calls. Field
    /// ids double as the positional index into every event's `items`, so
    /// fields must be registered before any event referencing them.
    pub fn field(&mut self, name: &str) -> FieldId {
        if let Some(&id) = self.field_ids.get(name) {
            return id;
        }
        let id = self.next_field;
        self.next_field += 1;
        self.field_ids.insert(name.to_string(), id);
        id
    }

    /// Registers (or looks up) a trail by a caller-chosen seed, which
    /// becomes the low bits of its [`Uuid`].
    pub fn uuid(&mut self, seed: u128) -> Uuid {
        let uuid = Uuid(seed);
        if self.trail_index.contains_key(&uuid) {
            return uuid;
        }
        let trail_id = self.trails.len() as u64;
        self.trails.push(uuid);
        self.trail_index.insert(uuid, trail_id);
        self.events.entry(trail_id).or_default();
        uuid
    }

    /// Appends an event to `uuid`'s trail. `items` need not be given in
    /// field-id order or cover every registered field; omitted fields read
    /// back as [`EMPTY_VALUE`].
    pub fn event(&mut self, uuid: Uuid, timestamp: u64, items: &[(FieldId, &str)]) {
        let trail_id = *self
            .trail_index
            .get(&uuid)
            .expect("uuid must be registered via MemStoreBuilder::uuid first");
        let width = items.iter().map(|(f, _)| *f as usize + 1).max().unwrap_or(0);
        let mut values: SmallVec<[ValueId; 8]> = SmallVec::from_elem(EMPTY_VALUE, width);
        for &(field_id, s) in items {
            values[field_id as usize] = self.intern(field_id, s);
        }
        self.events
            .entry(trail_id)
            .or_default()
            .push(Event::new(timestamp, values));
    }

    fn intern(&mut self, field_id: FieldId, s: &str) -> ValueId {
        if s.is_empty() {
            return EMPTY_VALUE;
        }
        let key = (field_id, s.to_string());
        if let Some(&id) = self.value_index.get(&key) {
            return id;
        }
        let counter = self.next_value.entry(field_id).or_insert(1);
        let id = *counter;
        *counter += 1;
        self.value_index.insert(key, id);
        id
    }

    pub fn build(self) -> MemStore {
        let mut lexicons: HashMap<FieldId, Vec<(ValueId, String)>> = HashMap::new();
        for ((field_id, s), id) in &self.value_index {
            lexicons.entry(*field_id).or_default().push((*id, s.clone()));
        }
        let max_timestamp = self
            .events
            .values()
            .flatten()
            .map(|e| e.timestamp)
            .max()
            .unwrap_or(0);
        MemStore {
            field_ids: self.field_ids,
            trails: self.trails,
            trail_index: self.trail_index,
            events: self.events,
            value_index: self.value_index,
            lexicons,
            max_timestamp,
        }
    }
}

pub struct MemStore {
    field_ids: HashMap<String, FieldId>,
    trails: Vec<Uuid>,
    trail_index: HashMap<Uuid, u64>,
    events: HashMap<u64, Vec<Event>>,
    value_index: HashMap<(FieldId, String), ValueId>,
    lexicons: HashMap<FieldId, Vec<(ValueId, String)>>,
    max_timestamp: u64,
}

impl EventStore for MemStore {
    fn field_id(&self, name: &str) -> Option<FieldId> {
        self.field_ids.get(name).copied()
    }

    fn num_trails(&self) -> u64 {
        self.trails.len() as u64
    }

    fn trail_uuid(&self, trail_id: u64) -> Uuid {
        self.trails[trail_id as usize]
    }

    fn trail_id(&self, uuid: &Uuid) -> Option<u64> {
        self.trail_index.get(uuid).copied()
    }

    fn max_timestamp(&self) -> u64 {
        self.max_timestamp
    }

    fn raw_events(&self, trail_id: u64) -> Vec<Event> {
        self.events.get(&trail_id).cloned().unwrap_or_default()
    }

    fn resolve_scalar(&self, field_id: FieldId, value: &str) -> ValueId {
        if field_id == TIMESTAMP_FIELD_ID {
            return value.parse::<u64>().map(|v| v as ValueId).unwrap_or(UNRESOLVED_VALUE);
        }
        if value.is_empty() {
            return EMPTY_VALUE;
        }
        self.value_index
            .get(&(field_id, value.to_string()))
            .copied()
            .unwrap_or(UNRESOLVED_VALUE)
    }

    fn lexicon(&self, field_id: FieldId) -> Vec<(ValueId, String)> {
        self.lexicons.get(&field_id).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeat_field_registration_is_idempotent() {
        let mut b = MemStoreBuilder::new();
        assert_eq!(b.field("x"), b.field("x"));
    }

    #[test]
    fn resolve_scalar_finds_interned_values() {
        let mut b = MemStoreBuilder::new();
        let f = b.field("action");
        let uuid = b.uuid(1);
        b.event(uuid, 1, &[(f, "click")]);
        let store = b.build();
        let value_id = store.resolve_scalar(f, "click");
        assert_ne!(value_id, UNRESOLVED_VALUE);
        assert_eq!(store.resolve_scalar(f, "never-seen"), UNRESOLVED_VALUE);
    }

    #[test]
    fn timestamp_field_resolves_by_parsing() {
        let b = MemStoreBuilder::new();
        let store = b.build();
        assert_eq!(store.resolve_scalar(TIMESTAMP_FIELD_ID, "42"), 42);
        assert_eq!(
            store.resolve_scalar(TIMESTAMP_FIELD_ID, "not-a-number"),
            UNRESOLVED_VALUE
        );
    }

    #[test]
    fn lexicon_excludes_empty_value() {
        let mut b = MemStoreBuilder::new();
        let f = b.field("action");
        let uuid = b.uuid(1);
        b.event(uuid, 1, &[(f, "click")]);
        b.event(uuid, 2, &[]);
        let store = b.build();
        let lex = store.lexicon(f);
        assert_eq!(lex.len(), 1);
        assert_eq!(lex[0].1, "click");
    }
}
