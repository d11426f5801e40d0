//! Window set: a CSV file of per-UUID
//! time-window overrides, iterated instead of the store's full trail list
//! when present.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::StoreError;
use crate::uuid::Uuid;

/// One window-set row: the trail to read (`uuid`) and the half-open
/// `[start, end)` timestamp clip to apply to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowEntry {
    pub uuid: Uuid,
    pub start: u64,
    pub end: u64,
}

/// Maps a lookup key (the optional 4th CSV column, or the row's own UUID
/// when absent) to a [`WindowEntry`]. Duplicate-id behaviour is otherwise
/// unspecified; this implementation resolves it as
/// last-writer-wins and logs once per overwritten id whose target UUID
/// changes, per the documented resolution in DESIGN.md.
#[derive(Default, Debug)]
pub struct WindowSet {
    by_id: HashMap<Uuid, WindowEntry>,
}

impl WindowSet {
    pub fn parse(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| StoreError::Open {
            path: path.display().to_string(),
            source: e,
        })?;

        let mut by_id = HashMap::new();
        for (idx, raw_line) in contents.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() {
                continue;
            }
            let line_no = idx as u64 + 1;
            let fields: Vec<&str> = line.split(',').map(str::trim).collect();
            if fields.len() != 3 && fields.len() != 4 {
                return Err(StoreError::BadWindowLine {
                    path: path.display().to_string(),
                    line: line_no,
                    reason: "expected uuid,start_ts,end_ts[,id]".to_string(),
                });
            }

            let uuid = Uuid::from_hex(fields[0]).map_err(|_| StoreError::BadWindowLine {
                path: path.display().to_string(),
                line: line_no,
                reason: "invalid uuid".to_string(),
            })?;
            let start: u64 = fields[1].parse().map_err(|_| StoreError::BadWindowLine {
                path: path.display().to_string(),
                line: line_no,
                reason: "invalid start_ts".to_string(),
            })?;
            let end: u64 = fields[2].parse().map_err(|_| StoreError::BadWindowLine {
                path: path.display().to_string(),
                line: line_no,
                reason: "invalid end_ts".to_string(),
            })?;

            let id = if fields.len() == 4 {
                Uuid::from_hex(fields[3]).map_err(|_| StoreError::BadWindowLine {
                    path: path.display().to_string(),
                    line: line_no,
                    reason: "invalid id".to_string(),
                })?
            } else {
                uuid
            };

            let entry = WindowEntry { uuid, start, end };
            if let Some(prev) = by_id.insert(id, entry) {
                if prev.uuid != uuid {
                    tracing::warn!(
                        id = %id,
                        previous_uuid = %prev.uuid,
                        new_uuid = %uuid,
                        "window file id remapped to a different uuid, last writer wins"
                    );
                }
            }
        }

        Ok(Self { by_id })
    }

    pub fn get(&self, id: &Uuid) -> Option<&WindowEntry> {
        self.by_id.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Uuid, &WindowEntry)> {
        self.by_id.iter()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
