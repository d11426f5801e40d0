//! Trail cursor: materialises one UUID's events into a
//! contiguous, deduplicated, window-clipped buffer that is reused across
//! trails.

use crate::event::Event;
use crate::EventStore;

/// Per-store trail cursor. Owns a reusable event buffer (a `Vec` grows by
/// doubling under the hood, giving the same amortised cost as a hand-rolled
/// growth scheme) and exposes random access into it for repeated FOREACH
/// re-evaluation.
pub struct TrailCursor<'s, S: EventStore> {
    store: &'s S,
    buf: Vec<Event>,
    position: usize,
}

impl<'s, S: EventStore> TrailCursor<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self {
            store,
            buf: Vec::new(),
            position: 0,
        }
    }

    /// Materialise `trail_id`'s events into the buffer: applies the
    /// `[window_start, window_end)` clip (0 = open on that side) and
    /// collapses consecutive exact duplicates, then
    /// resets the read position to the start.
    ///
    /// Only *consecutive* duplicates are collapsed, so doing it once while
    /// filling the buffer yields the same visited sequence as re-checking
    /// on every `advance` call.
    pub fn read_trail(&mut self, trail_id: u64, window_start: u64, window_end: u64) {
        self.buf.clear();
        for event in self.store.raw_events(trail_id) {
            if window_start != 0 && event.timestamp < window_start {
                continue;
            }
            if window_end != 0 && event.timestamp >= window_end {
                break;
            }
            match self.buf.last() {
                Some(prev) if *prev == event => continue,
                _ => self.buf.push(event),
            }
        }
        self.position = 0;
    }

    pub fn reset_position(&mut self) {
        self.position = 0;
    }

    pub fn end_of_trail(&self) -> bool {
        self.position >= self.buf.len()
    }

    pub fn current(&self) -> Option<&Event> {
        self.buf.get(self.position)
    }

    pub fn advance(&mut self) {
        self.position += 1;
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// All buffered events in trail order (used by the distinct-value scan,
    /// which needs to walk the whole trail once per relevant field).
    pub fn events(&self) -> &[Event] {
        &self.buf
    }
}
