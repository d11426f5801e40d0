//! JSON fixture store loader.
//!
//! The production on-disk store format is an external component; this
//! loader exists so the CLI's argument plumbing, params
//! materialisation, and engine wiring can be exercised end-to-end against
//! a plain JSON description of a handful of trails, the way the test
//! suite does, without pretending to read the real binary format.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use trck_store::mem::{MemStore, MemStoreBuilder};
use trck_store::{FieldId, Uuid};

use crate::error::CliError;

#[derive(Deserialize)]
struct FixtureEvent {
    ts: u64,
    #[serde(flatten)]
    fields: HashMap<String, String>,
}

#[derive(Deserialize)]
struct FixtureTrail {
    uuid: String,
    events: Vec<FixtureEvent>,
}

#[derive(Deserialize)]
struct FixtureStore {
    fields: Vec<String>,
    trails: Vec<FixtureTrail>,
}

pub fn load_fixture_store(path: &Path) -> Result<MemStore, CliError> {
    let text =
        fs::read_to_string(path).map_err(|e| CliError::ReadFile(path.to_path_buf(), e))?;
    let fixture: FixtureStore = serde_json::from_str(&text)
        .map_err(|e| CliError::ParseFixture(path.to_path_buf(), e))?;

    let mut builder = MemStoreBuilder::new();
    let field_ids: HashMap<String, FieldId> = fixture
        .fields
        .iter()
        .map(|name| (name.clone(), builder.field(name)))
        .collect();

    for trail in fixture.trails {
        let uuid = Uuid::from_hex(&trail.uuid)?;
        let uuid = builder.uuid(uuid.0);
        for event in trail.events {
            let items: Vec<(FieldId, &str)> = event
                .fields
                .iter()
                .filter_map(|(name, value)| field_ids.get(name).map(|&id| (id, value.as_str())))
                .collect();
            builder.event(uuid, event.ts, &items);
        }
    }

    Ok(builder.build())
}
