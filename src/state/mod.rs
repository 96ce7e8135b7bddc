//! Entity state: the provider seam, the resolver and per-render snapshots.
//!
//! The host platform owns entity state. This module only sees it through
//! [`StateProvider`], and everything downstream only sees [`ResolvedState`]:
//! a value that always exists, even when the entity does not.
//!
//! # Unavailable Sentinel
//!
//! Missing entities, and entities the provider reports as `unavailable` or
//! `unknown`, resolve to a state with `available = false` and the value
//! `"unavailable"`. Widgets draw a placeholder for it; nothing propagates.

mod memory;
mod resolver;
mod snapshot;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use memory::MemoryStateProvider;
pub use resolver::{EntityStateResolver, MAX_HISTORY_POINTS};
pub use snapshot::{SlotState, StateSnapshot};

/// Value of the unavailable sentinel.
pub const UNAVAILABLE: &str = "unavailable";

// =============================================================================
// Provider Seam
// =============================================================================

/// Raw entity state as reported by the host.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    pub entity_id: String,
    pub state: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl EntityState {
    pub fn new(
        entity_id: &str,
        state: &str,
    ) -> Self {
        Self { entity_id: entity_id.to_string(), state: state.to_string(), attributes: Map::new() }
    }

    #[must_use]
    pub fn attribute(
        mut self,
        key: &str,
        value: impl Into<Value>,
    ) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }
}

/// Raw recorded state change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub at: DateTime<Utc>,
    pub state: String,
}

/// Host state source. `history` and `artwork` are optional capabilities.
pub trait StateProvider: Send + Sync {
    fn state(
        &self,
        entity_id: &str,
    ) -> Option<EntityState>;

    /// Recorded changes in `[since, until]`, any order.
    fn history(
        &self,
        _entity_id: &str,
        _since: DateTime<Utc>,
        _until: DateTime<Utc>,
    ) -> Vec<HistoryEntry> {
        Vec::new()
    }

    /// Encoded (JPEG/PNG) media artwork or camera snapshot.
    fn artwork(
        &self,
        _entity_id: &str,
    ) -> Option<Vec<u8>> {
        None
    }
}

// =============================================================================
// Resolved State
// =============================================================================

/// One numeric history sample.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HistoryPoint {
    pub at: DateTime<Utc>,
    pub value: f64,
}

/// Render-ready view of one entity.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedState {
    pub entity_id: String,
    pub available: bool,
    pub value: String,
    pub unit: Option<String>,
    pub friendly_name: Option<String>,
    pub icon: Option<String>,
    /// Requested attribute, or the primary value when it is missing.
    pub attribute: Option<Value>,
    pub attributes: Map<String, Value>,
    /// Chronological, bounded to [`MAX_HISTORY_POINTS`].
    pub history: Vec<HistoryPoint>,
}

impl ResolvedState {
    /// The unavailable sentinel for `entity_id`.
    pub fn unavailable(entity_id: &str) -> Self {
        Self {
            entity_id: entity_id.to_string(),
            available: false,
            value: UNAVAILABLE.to_string(),
            unit: None,
            friendly_name: None,
            icon: None,
            attribute: None,
            attributes: Map::new(),
            history: Vec::new(),
        }
    }

    /// Friendly name, falling back to the entity id.
    pub fn name(&self) -> &str { self.friendly_name.as_deref().unwrap_or(&self.entity_id) }

    /// Primary value as a number.
    pub fn numeric(&self) -> Option<f64> {
        if !self.available {
            return None;
        }
        self.value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
    }

    /// The requested attribute as a number, else the primary value.
    pub fn attribute_numeric(&self) -> Option<f64> {
        match &self.attribute {
            Some(value) if self.available => as_f64(value),
            _ => None,
        }
        .or_else(|| self.numeric())
    }

    /// Attribute by dotted path (`forecast.0.temperature`).
    pub fn attr(
        &self,
        path: &str,
    ) -> Option<&Value> {
        lookup_path(&self.attributes, path)
    }

    pub fn attr_f64(
        &self,
        path: &str,
    ) -> Option<f64> {
        self.attr(path).and_then(as_f64)
    }

    pub fn attr_str(
        &self,
        path: &str,
    ) -> Option<&str> {
        self.attr(path).and_then(Value::as_str)
    }

    /// Whether the state reads as "on" for status indicators.
    pub fn is_on(&self) -> bool { self.available && is_on_state(&self.value) }
}

/// States that status widgets treat as "on".
pub fn is_on_state(state: &str) -> bool {
    const ON_STATES: [&str; 7] = ["on", "true", "1", "home", "open", "unlocked", "playing"];
    let state = state.trim();
    ON_STATES.iter().any(|on| on.eq_ignore_ascii_case(state))
}

/// Walk a dotted path through objects and arrays.
pub fn lookup_path<'a>(
    root: &'a Map<String, Value>,
    path: &str,
) -> Option<&'a Value> {
    let mut segments = path.split('.').filter(|s| !s.is_empty());
    let mut current = root.get(segments.next()?)?;
    for segment in segments {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Numbers and numeric strings.
pub fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .filter(|v: &f64| v.is_finite())
}
