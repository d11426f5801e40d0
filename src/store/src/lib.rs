//! Narrow interface to the columnar event store (TrailDB-style) consumed by
//! `trck_engine`. The real store — lexicon, on-disk layout, filter pushdown —
//! is an external collaborator; this crate only fixes the contract and ships
//! an in-memory reference implementation used by `trck_engine`'s own test
//! suite.

pub mod cursor;
pub mod error;
pub mod event;
pub mod exclude;
pub mod filter;
pub mod mem;
pub mod uuid;
pub mod window;

pub use cursor::TrailCursor;
pub use error::StoreError;
pub use event::{Event, FieldId, ValueId, EMPTY_VALUE, MISSING_FIELD_ID, TIMESTAMP_FIELD_ID, UNRESOLVED_VALUE};
pub use exclude::ExcludeSet;
pub use filter::{CompiledFilter, FilteredStore, FilterOp, FilterSpec, FilterTerm};
pub use uuid::Uuid;
pub use window::{WindowEntry, WindowSet};

/// The narrow store capability the engine depends on: open a handle, resolve
/// field/value names against the store's lexicon, and pull raw (window- and
/// dedup-unaware) events for a trail id.
///
/// Implementations own whatever on-disk or in-memory representation they
/// like; the engine never reaches past this trait.
pub trait EventStore: Send + Sync {
    /// Resolve a column name to a field id, or `None` if this store has no
    /// such column. The caller is responsible for special-casing the
    /// `"timestamp"` name to [`TIMESTAMP_FIELD_ID`] before calling, since
    /// that id never needs lexicon lookups.
    fn field_id(&self, name: &str) -> Option<FieldId>;

    /// Number of trails in this store, for static work partitioning.
    fn num_trails(&self) -> u64;

    /// UUID for a trail id; fatal (store malformed) if out of range.
    fn trail_uuid(&self, trail_id: u64) -> Uuid;

    /// Trail id for a UUID, if present in this store.
    fn trail_id(&self, uuid: &Uuid) -> Option<u64>;

    /// Max event timestamp across the whole store (0 if empty), used by the
    /// cross-store controller to clamp the next store's window.
    fn max_timestamp(&self) -> u64;

    /// Raw, store-filter-applied, window- and dedup-unaware events for one
    /// trail, in trail order.
    fn raw_events(&self, trail_id: u64) -> Vec<Event>;

    /// Resolve a literal string to a value id on this store's lexicon for
    /// `field_id`. Returns [`UNRESOLVED_VALUE`] if the value does not
    /// appear in this store's lexicon (a soft miss). Special-cases the
    /// timestamp field by parsing `value` as a base-10 integer instead of
    /// doing a lexicon lookup.
    fn resolve_scalar(&self, field_id: FieldId, value: &str) -> ValueId;

    /// Full lexicon for a field, as `(value_id, string)` pairs, used by the
    /// implicit FOREACH array derivation. Value id 0 ("empty") is not
    /// included.
    fn lexicon(&self, field_id: FieldId) -> Vec<(ValueId, String)>;
}
