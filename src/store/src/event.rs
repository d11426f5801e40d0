use smallvec::SmallVec;

/// Field id. Real columns are small non-negative indices into the store's
/// schema; [`TIMESTAMP_FIELD_ID`] is a synthetic field distinct from any
/// real column; [`MISSING_FIELD_ID`] marks a field name that does not
/// resolve against a given store at all.
pub type FieldId = i64;

pub const TIMESTAMP_FIELD_ID: FieldId = 10000;
pub const MISSING_FIELD_ID: FieldId = -1;

/// A value id on some store's lexicon. `0` is the reserved "empty/absent"
/// value; any negative id means "not present in this store's lexicon" (a
/// soft miss) and must never be treated as equal to `0` except at the one
/// matcher-facing boundary where both collapse to "no match" when
/// constructing the value handed to the matcher.
pub type ValueId = i32;

pub const EMPTY_VALUE: ValueId = 0;
pub const UNRESOLVED_VALUE: ValueId = -1;

/// One event in a trail: a timestamp plus one slot per configured real
/// field. The synthetic timestamp field is never stored as an item —
/// callers read it via [`Event::timestamp`] instead of indexing into
/// `items`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    pub timestamp: u64,
    pub items: SmallVec<[ValueId; 8]>,
}

impl Event {
    pub fn new(timestamp: u64, items: impl IntoIterator<Item = ValueId>) -> Self {
        Self {
            timestamp,
            items: items.into_iter().collect(),
        }
    }

    /// Value for `field_id` on this event, or `EMPTY_VALUE` if `field_id` is
    /// positional but out of range for this event's schema width.
    ///
    /// The synthetic timestamp field id returns the event's timestamp
    /// itself, truncated to the value-id's width — callers that need the full
    /// 64-bit timestamp should use [`Event::timestamp`] directly.
    pub fn value(&self, field_id: FieldId) -> ValueId {
        if field_id == TIMESTAMP_FIELD_ID {
            self.timestamp as ValueId
        } else if field_id == MISSING_FIELD_ID {
            EMPTY_VALUE
        } else {
            self.items
                .get(field_id as usize)
                .copied()
                .unwrap_or(EMPTY_VALUE)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
