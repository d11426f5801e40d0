//! Exclude set: a file of hex-encoded UUIDs, one per line,
//! skipped entirely by the engine.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::error::StoreError;
use crate::uuid::Uuid;

#[derive(Default, Debug)]
pub struct ExcludeSet {
    uuids: HashSet<Uuid>,
}

impl ExcludeSet {
    pub fn parse(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| StoreError::Open {
            path: path.display().to_string(),
            source: e,
        })?;

        let mut uuids = HashSet::new();
        for (idx, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let uuid = Uuid::from_hex(line).map_err(|_| StoreError::BadExcludeLine {
                path: path.display().to_string(),
                line: idx as u64 + 1,
                reason: "expected 32 hex chars".to_string(),
            })?;
            if !uuids.insert(uuid) {
                return Err(StoreError::DuplicateExclude(
                    uuid.to_hex(),
                    path.display().to_string(),
                ));
            }
        }
        Ok(Self { uuids })
    }

    pub fn contains(&self, uuid: &Uuid) -> bool {
        self.uuids.contains(uuid)
    }

    pub fn len(&self) -> usize {
        self.uuids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uuids.is_empty()
    }
}
