//! Entity state resolver.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use tracing::debug;

use super::{EntityState, HistoryEntry, HistoryPoint, ResolvedState, StateProvider, UNAVAILABLE, lookup_path};
use crate::canvas::Bitmap;

/// Upper bound on history samples handed to a widget.
pub const MAX_HISTORY_POINTS: usize = 240;

/// Adapter between the host provider and the renderers. Never fails.
#[derive(Clone)]
pub struct EntityStateResolver {
    provider: Arc<dyn StateProvider>,
}

impl EntityStateResolver {
    pub fn new(provider: Arc<dyn StateProvider>) -> Self { Self { provider } }

    /// Resolve an entity, optionally with one attribute.
    ///
    /// An empty reference, a missing entity, or a provider state of
    /// `unavailable`/`unknown` gives the unavailable sentinel. A missing
    /// attribute resolves to the primary value.
    pub fn resolve(
        &self,
        entity_id: &str,
        attribute: Option<&str>,
    ) -> ResolvedState {
        let entity_id = entity_id.trim();
        if entity_id.is_empty() {
            return ResolvedState::unavailable(entity_id);
        }
        match self.provider.state(entity_id) {
            Some(state) if is_available(&state) => from_entity(state, attribute),
            Some(_) => ResolvedState::unavailable(entity_id),
            None => {
                debug!(entity = entity_id, "entity not found");
                ResolvedState::unavailable(entity_id)
            }
        }
    }

    /// Numeric history over the last `hours` before `now`.
    ///
    /// Chronological and bounded to [`MAX_HISTORY_POINTS`]. Empty when the
    /// provider has nothing for the window.
    pub fn resolve_history(
        &self,
        entity_id: &str,
        hours: f64,
        now: DateTime<Utc>,
    ) -> Vec<HistoryPoint> {
        if entity_id.trim().is_empty() || !(hours > 0.0) {
            return Vec::new();
        }
        // Windows beyond what chrono can represent resolve to nothing
        let Some(since) =
            Duration::try_seconds((hours * 3600.0).round() as i64).and_then(|window| now.checked_sub_signed(window))
        else {
            return Vec::new();
        };
        let mut points: Vec<HistoryPoint> = self
            .provider
            .history(entity_id.trim(), since, now)
            .into_iter()
            .filter(|entry| entry.at >= since && entry.at <= now)
            .filter_map(numeric_point)
            .collect();
        points.sort_by_key(|p| p.at);
        downsample(points, MAX_HISTORY_POINTS)
    }

    /// Decoded artwork, if the provider has some and it decodes.
    pub fn artwork(
        &self,
        entity_id: &str,
    ) -> Option<Bitmap> {
        let bytes = self.provider.artwork(entity_id)?;
        match Bitmap::decode(&bytes) {
            Ok(bitmap) => Some(bitmap),
            Err(err) => {
                debug!(entity = entity_id, error = %err, "artwork did not decode");
                None
            }
        }
    }
}

fn is_available(state: &EntityState) -> bool {
    let value = state.state.trim();
    !value.eq_ignore_ascii_case(UNAVAILABLE) && !value.eq_ignore_ascii_case("unknown")
}

fn from_entity(
    state: EntityState,
    attribute: Option<&str>,
) -> ResolvedState {
    let text = |key: &str| state.attributes.get(key).and_then(Value::as_str).map(str::to_string);
    let unit = text("unit_of_measurement");
    let friendly_name = text("friendly_name");
    let icon = text("icon");
    let attribute = attribute
        .filter(|path| !path.trim().is_empty())
        .map(|path| lookup_path(&state.attributes, path.trim()).cloned().unwrap_or_else(|| Value::String(state.state.clone())));

    ResolvedState {
        entity_id: state.entity_id,
        available: true,
        value: state.state,
        unit,
        friendly_name,
        icon,
        attribute,
        attributes: state.attributes,
        history: Vec::new(),
    }
}

/// Numeric states parse as numbers; `on`/`off` map to 1/0; the rest is dropped.
fn numeric_point(entry: HistoryEntry) -> Option<HistoryPoint> {
    let state = entry.state.trim();
    let value = if state.eq_ignore_ascii_case("on") {
        1.0
    } else if state.eq_ignore_ascii_case("off") {
        0.0
    } else {
        state.parse::<f64>().ok().filter(|v| v.is_finite())?
    };
    Some(HistoryPoint { at: entry.at, value })
}

/// Even-stride downsampling that keeps the first and the newest point.
fn downsample(
    points: Vec<HistoryPoint>,
    max: usize,
) -> Vec<HistoryPoint> {
    if points.len() <= max || max < 2 {
        return points;
    }
    let last = points.len() - 1;
    (0..max).map(|i| points[i * last / (max - 1)]).collect()
}
