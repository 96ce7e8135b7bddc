//! In-process state provider backed by a JSON fixture.
//!
//! # Fixture Format
//!
//! ```json
//! {
//!   "states": [
//!     {
//!       "entity_id": "sensor.temp",
//!       "state": "21.5",
//!       "attributes": { "unit_of_measurement": "°C" },
//!       "history": [ { "ago_secs": 3600, "state": "20.1" }, { "at": "2026-10-16T10:00:00Z", "state": "20.7" } ]
//!     }
//!   ]
//! }
//! ```
//!
//! `ago_secs` entries are placed relative to the end of each history query,
//! so demo fixtures stay inside the chart window however old they are.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};

use super::{EntityState, HistoryEntry, StateProvider};
use crate::error::ConfigResult;

#[derive(Deserialize)]
struct Fixture {
    #[serde(default)]
    states: Vec<FixtureEntity>,
}

#[derive(Deserialize)]
struct FixtureEntity {
    entity_id: String,
    state: String,
    #[serde(default)]
    attributes: Map<String, Value>,
    #[serde(default)]
    history: Vec<FixtureSample>,
}

#[derive(Clone, Debug, Deserialize)]
struct FixtureSample {
    #[serde(default)]
    at: Option<DateTime<Utc>>,
    #[serde(default)]
    ago_secs: Option<i64>,
    state: String,
}

#[derive(Clone, Debug)]
enum Sample {
    At(HistoryEntry),
    Ago { secs: i64, state: String },
}

#[derive(Default)]
struct Store {
    states: HashMap<String, EntityState>,
    history: HashMap<String, Vec<Sample>>,
    artwork: HashMap<String, Vec<u8>>,
}

/// Thread-safe in-memory [`StateProvider`].
#[derive(Default)]
pub struct MemoryStateProvider {
    store: RwLock<Store>,
}

impl MemoryStateProvider {
    pub fn new() -> Self { Self::default() }

    /// Load a fixture file.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Parse fixture JSON. Samples with neither `at` nor `ago_secs` are skipped.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let fixture: Fixture = serde_json::from_str(json)?;
        let provider = Self::new();
        {
            let mut store = provider.store.write().unwrap_or_else(PoisonError::into_inner);
            for entity in fixture.states {
                let samples = entity
                    .history
                    .into_iter()
                    .filter_map(|s| match (s.at, s.ago_secs) {
                        (Some(at), _) => Some(Sample::At(HistoryEntry { at, state: s.state })),
                        (None, Some(secs)) => Some(Sample::Ago { secs, state: s.state }),
                        (None, None) => None,
                    })
                    .collect::<Vec<_>>();
                if !samples.is_empty() {
                    store.history.insert(entity.entity_id.clone(), samples);
                }
                store.states.insert(
                    entity.entity_id.clone(),
                    EntityState { entity_id: entity.entity_id, state: entity.state, attributes: entity.attributes },
                );
            }
        }
        Ok(provider)
    }

    /// Insert or replace an entity state.
    pub fn set_state(
        &self,
        state: EntityState,
    ) {
        let mut store = self.store.write().unwrap_or_else(PoisonError::into_inner);
        store.states.insert(state.entity_id.clone(), state);
    }

    pub fn remove_state(
        &self,
        entity_id: &str,
    ) {
        self.store.write().unwrap_or_else(PoisonError::into_inner).states.remove(entity_id);
    }

    /// Replace the recorded history of an entity.
    pub fn set_history(
        &self,
        entity_id: &str,
        entries: Vec<HistoryEntry>,
    ) {
        let samples = entries.into_iter().map(Sample::At).collect();
        self.store.write().unwrap_or_else(PoisonError::into_inner).history.insert(entity_id.to_string(), samples);
    }

    pub fn set_artwork(
        &self,
        entity_id: &str,
        bytes: Vec<u8>,
    ) {
        self.store.write().unwrap_or_else(PoisonError::into_inner).artwork.insert(entity_id.to_string(), bytes);
    }

    /// Known entity ids, sorted.
    pub fn entity_ids(&self) -> Vec<String> {
        let store = self.store.read().unwrap_or_else(PoisonError::into_inner);
        let mut ids: Vec<String> = store.states.keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl StateProvider for MemoryStateProvider {
    fn state(
        &self,
        entity_id: &str,
    ) -> Option<EntityState> {
        self.store.read().unwrap_or_else(PoisonError::into_inner).states.get(entity_id).cloned()
    }

    fn history(
        &self,
        entity_id: &str,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Vec<HistoryEntry> {
        let store = self.store.read().unwrap_or_else(PoisonError::into_inner);
        let Some(samples) = store.history.get(entity_id) else {
            return Vec::new();
        };
        samples
            .iter()
            .filter_map(|sample| match sample {
                Sample::At(entry) => Some(entry.clone()),
                Sample::Ago { secs, state } => Duration::try_seconds(*secs)
                    .and_then(|ago| until.checked_sub_signed(ago))
                    .map(|at| HistoryEntry { at, state: state.clone() }),
            })
            .filter(|entry| entry.at >= since && entry.at <= until)
            .collect()
    }

    fn artwork(
        &self,
        entity_id: &str,
    ) -> Option<Vec<u8>> {
        self.store.read().unwrap_or_else(PoisonError::into_inner).artwork.get(entity_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::error::ConfigError;
    use chrono::TimeZone;

    const FIXTURE: &str = r#"{
        "states": [
            {
                "entity_id": "sensor.temp",
                "state": "21.5",
                "attributes": {"unit_of_measurement": "°C"},
                "history": [
                    {"ago_secs": 600, "state": "20.0"},
                    {"at": "2026-10-16T11:30:00Z", "state": "21.0"},
                    {"state": "dropped"}
                ]
            },
            {"entity_id": "light.desk", "state": "on"}
        ]
    }"#;

    #[test]
    fn test_fixture_loads_states() {
        let provider = MemoryStateProvider::from_json(FIXTURE).unwrap();
        assert_eq!(provider.entity_ids(), vec!["light.desk", "sensor.temp"]);
        let temp = provider.state("sensor.temp").unwrap();
        assert_eq!(temp.state, "21.5");
        assert_eq!(temp.attributes.get("unit_of_measurement"), Some(&Value::from("°C")));
    }

    #[test]
    fn test_relative_history_follows_query_end() {
        let provider = MemoryStateProvider::from_json(FIXTURE).unwrap();
        let until = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();
        let history = provider.history("sensor.temp", until - Duration::hours(1), until);
        assert_eq!(history.len(), 2);
        assert!(history.iter().any(|e| e.at == until - Duration::seconds(600) && e.state == "20.0"));

        // The absolute sample falls out of a later window
        let later = until + Duration::hours(2);
        assert_eq!(provider.history("sensor.temp", later - Duration::hours(1), later).len(), 1);
    }

    #[test]
    fn test_out_of_range_relative_sample_is_skipped() {
        let fixture = r#"{"states": [{
            "entity_id": "sensor.t",
            "state": "1",
            "history": [{"ago_secs": 9223372036854775807, "state": "9"}, {"ago_secs": 60, "state": "2"}]
        }]}"#;
        let provider = MemoryStateProvider::from_json(fixture).unwrap();
        let until = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();
        let history = provider.history("sensor.t", until - Duration::hours(1), until);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].state, "2");
    }

    #[test]
    fn test_set_state_replaces() {
        let provider = MemoryStateProvider::new();
        provider.set_state(EntityState::new("light.a", "off"));
        provider.set_state(EntityState::new("light.a", "on"));
        assert_eq!(provider.state("light.a").map(|s| s.state), Some("on".to_string()));
        provider.remove_state("light.a");
        assert!(provider.state("light.a").is_none());
    }

    #[test]
    fn test_from_file_and_bad_fixture() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FIXTURE.as_bytes()).unwrap();
        assert!(MemoryStateProvider::from_file(file.path()).is_ok());

        assert!(matches!(MemoryStateProvider::from_json("{"), Err(ConfigError::Fixture(_))));
        assert!(matches!(MemoryStateProvider::from_file(Path::new("/nonexistent.json")), Err(ConfigError::Io(_))));
    }
}
