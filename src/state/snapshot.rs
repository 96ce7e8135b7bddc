//! Per-render state snapshots.
//!
//! A snapshot resolves everything a screen needs once, at one instant, so
//! every slot of a frame renders against the same data.

use std::borrow::Cow;
use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, Utc};

use super::{EntityStateResolver, ResolvedState};
use crate::canvas::Bitmap;
use crate::config::Screen;
use crate::widgets::{WidgetKind, chart};

/// Resolved data for one slot.
#[derive(Clone, Debug, PartialEq)]
pub struct SlotState {
    /// The slot's first entity, with the `attribute` option applied and
    /// history filled in for charts.
    pub primary: ResolvedState,
    /// Media artwork or camera snapshot, when the provider has it.
    pub artwork: Option<Bitmap>,
}

impl SlotState {
    pub fn new(primary: ResolvedState) -> Self { Self { primary, artwork: None } }

    /// Slot without any entity.
    pub fn detached() -> Self { Self::new(ResolvedState::unavailable("")) }
}

/// Immutable input of one composition.
#[derive(Clone, Debug, PartialEq)]
pub struct StateSnapshot {
    now: DateTime<FixedOffset>,
    slots: Vec<SlotState>,
    entities: BTreeMap<String, ResolvedState>,
}

impl StateSnapshot {
    pub fn new(now: DateTime<FixedOffset>) -> Self { Self { now, slots: Vec::new(), entities: BTreeMap::new() } }

    /// Resolve every entity referenced by `screen`.
    pub fn capture(
        screen: &Screen,
        resolver: &EntityStateResolver,
        now: DateTime<FixedOffset>,
    ) -> Self {
        let mut snapshot = Self::new(now);
        let utc = now.with_timezone(&Utc);

        for slot in &screen.slots {
            let kind = WidgetKind::from_tag(&slot.widget);
            let state = match slot.primary_entity() {
                Some(id) => {
                    let mut primary = resolver.resolve(id, slot.options.text("attribute"));
                    if kind == Some(WidgetKind::Chart) {
                        primary.history = resolver.resolve_history(id, chart::window_hours(&slot.options), utc);
                    }
                    let has_image = matches!(kind, Some(WidgetKind::Media | WidgetKind::Camera));
                    let artwork = if has_image && primary.available { resolver.artwork(id) } else { None };
                    SlotState { primary, artwork }
                }
                None => SlotState::detached(),
            };
            snapshot.slots.push(state);

            for id in slot.entity_refs() {
                if !snapshot.entities.contains_key(&id) {
                    let state = resolver.resolve(&id, None);
                    snapshot.entities.insert(id, state);
                }
            }
        }
        snapshot
    }

    #[must_use]
    pub fn with_slot(
        mut self,
        state: SlotState,
    ) -> Self {
        self.slots.push(state);
        self
    }

    #[must_use]
    pub fn with_entity(
        mut self,
        state: ResolvedState,
    ) -> Self {
        self.entities.insert(state.entity_id.clone(), state);
        self
    }

    pub fn now(&self) -> DateTime<FixedOffset> { self.now }

    pub fn slot(
        &self,
        index: usize,
    ) -> Option<&SlotState> {
        self.slots.get(index)
    }

    /// Any referenced entity; unknown ids give the unavailable sentinel.
    pub fn entity(
        &self,
        entity_id: &str,
    ) -> Cow<'_, ResolvedState> {
        match self.entities.get(entity_id) {
            Some(state) => Cow::Borrowed(state),
            None => Cow::Owned(ResolvedState::unavailable(entity_id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::{Slot, WidgetOptions};
    use crate::state::{EntityState, HistoryEntry, MemoryStateProvider};
    use chrono::{Duration, TimeZone};
    use serde_json::json;
    use smalltv_common::LayoutType;

    fn now() -> DateTime<FixedOffset> { FixedOffset::east_opt(3600).unwrap().with_ymd_and_hms(2026, 10, 16, 13, 0, 0).unwrap() }

    #[test]
    fn test_capture_resolves_every_reference() {
        let provider = MemoryStateProvider::new();
        provider.set_state(EntityState::new("sensor.temp", "21").attribute("friendly_name", "Temp"));
        provider.set_state(EntityState::new("light.a", "on"));
        provider.set_history(
            "sensor.temp",
            vec![HistoryEntry { at: now().with_timezone(&Utc) - Duration::minutes(5), state: "20".into() }],
        );
        let resolver = EntityStateResolver::new(Arc::new(provider));

        let screen = Screen::new(
            "s",
            LayoutType::Grid2x2,
            vec![
                Slot::new("chart").entity("sensor.temp"),
                Slot::new("status_list").options(WidgetOptions::new().with("entities", json!(["light.a", "lock.gone"]))),
                Slot::new("entity").entity("sensor.missing"),
                Slot::new("clock"),
            ],
        );
        let snapshot = StateSnapshot::capture(&screen, &resolver, now());

        assert_eq!(snapshot.slot(0).map(|s| s.primary.history.len()), Some(1));
        assert_eq!(snapshot.slot(0).map(|s| s.primary.name()), Some("Temp"));
        assert!(snapshot.entity("light.a").available);
        assert!(!snapshot.entity("lock.gone").available);
        assert!(!snapshot.slot(2).map(|s| s.primary.available).unwrap_or(true));
        assert_eq!(snapshot.slot(3), Some(&SlotState::detached()));
        assert!(snapshot.slot(4).is_none());
    }

    #[test]
    fn test_history_only_for_charts() {
        let provider = MemoryStateProvider::new();
        provider.set_state(EntityState::new("sensor.temp", "21"));
        provider.set_history(
            "sensor.temp",
            vec![HistoryEntry { at: now().with_timezone(&Utc) - Duration::minutes(5), state: "20".into() }],
        );
        let resolver = EntityStateResolver::new(Arc::new(provider));
        let screen = Screen::new("s", LayoutType::Fullscreen, vec![Slot::new("entity").entity("sensor.temp")]);
        let snapshot = StateSnapshot::capture(&screen, &resolver, now());
        assert_eq!(snapshot.slot(0).map(|s| s.primary.history.len()), Some(0));
    }

    #[test]
    fn test_images_only_for_media_and_camera() {
        let png = crate::canvas::Frame::from_canvas(&crate::canvas::Canvas::new(2, 2), "img", 0).to_png().unwrap();
        let provider = MemoryStateProvider::new();
        for id in ["camera.porch", "media_player.den", "sensor.temp"] {
            provider.set_state(EntityState::new(id, "idle"));
            provider.set_artwork(id, png.clone());
        }
        let resolver = EntityStateResolver::new(Arc::new(provider));
        let screen = Screen::new(
            "s",
            LayoutType::ThreeRow,
            vec![
                Slot::new("camera").entity("camera.porch"),
                Slot::new("media").entity("media_player.den"),
                Slot::new("entity").entity("sensor.temp"),
            ],
        );
        let snapshot = StateSnapshot::capture(&screen, &resolver, now());
        let has_image: Vec<bool> = (0..3).map(|i| snapshot.slot(i).is_some_and(|s| s.artwork.is_some())).collect();
        assert_eq!(has_image, [true, true, false]);
    }
}
