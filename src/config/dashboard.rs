//! Dashboard description: screens, their layouts and slots.

use std::collections::BTreeSet;

use embedded_graphics::pixelcolor::Rgb565;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use smalltv_common::{LayoutOptions, LayoutType};

use super::options::{WidgetOptions, parse_color};
use crate::controls::SCREEN_COUNT;
use crate::error::{ConfigError, ConfigResult};

/// Ordered screens; order is the cycle order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default)]
    pub screens: Vec<Screen>,
}

impl DashboardConfig {
    pub fn new(screens: Vec<Screen>) -> Self { Self { screens } }

    /// Enforce the configuration-boundary invariants.
    ///
    /// Screens with `fill_empty` set are padded with empty slots up to their
    /// layout's slot count; every other mismatch is rejected.
    pub fn validate(&mut self) -> ConfigResult<()> {
        if self.screens.len() > SCREEN_COUNT.max as usize {
            return Err(ConfigError::ScreenCount(self.screens.len()));
        }

        let mut ids = BTreeSet::new();
        for screen in &mut self.screens {
            if !ids.insert(screen.id.clone()) {
                return Err(ConfigError::DuplicateScreenId(screen.id.clone()));
            }

            let layout = screen.layout_type()?;
            let expected = layout.slot_count(&screen.layout_options());
            if screen.fill_empty && screen.slots.len() < expected {
                screen.slots.resize_with(expected, Slot::empty);
            }
            if screen.slots.len() != expected {
                return Err(ConfigError::SlotCountMismatch {
                    screen: screen.id.clone(),
                    layout: layout.tag().to_string(),
                    expected,
                    actual: screen.slots.len(),
                });
            }
        }
        Ok(())
    }

    /// Grow or shrink to `count` screens, clamped to the screen-count control.
    ///
    /// Removed screens come off the end. Added screens are `grid_2x2` with a
    /// clock in the first slot. Returns the new length.
    pub fn resize(
        &mut self,
        count: usize,
    ) -> usize {
        let count = SCREEN_COUNT.clamp(u32::try_from(count).unwrap_or(u32::MAX)) as usize;
        self.screens.truncate(count);
        while self.screens.len() < count {
            let number = self.screens.len() + 1;
            let mut id = format!("screen_{number}");
            while self.screens.iter().any(|s| s.id == id) {
                id.push('_');
            }
            self.screens.push(Screen::placeholder(&id, number));
        }
        count
    }

    pub fn screen(
        &self,
        index: usize,
    ) -> Option<&Screen> {
        self.screens.get(index)
    }

    pub fn len(&self) -> usize { self.screens.len() }

    pub fn is_empty(&self) -> bool { self.screens.is_empty() }
}

/// One full-canvas page of widgets.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Screen {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub layout: String,
    #[serde(default)]
    pub layout_options: LayoutSettings,
    #[serde(default)]
    pub slots: Vec<Slot>,
    /// Pad missing slots with empty ones instead of rejecting the screen.
    #[serde(default)]
    pub fill_empty: bool,
}

impl Screen {
    pub fn new(
        id: &str,
        layout: LayoutType,
        slots: Vec<Slot>,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: String::new(),
            layout: layout.tag().to_string(),
            layout_options: LayoutSettings::default(),
            slots,
            fill_empty: false,
        }
    }

    /// Default screen added when the dashboard grows.
    pub fn placeholder(
        id: &str,
        number: usize,
    ) -> Self {
        let count = LayoutType::Grid2x2.slot_count(&LayoutOptions::default());
        let slots = std::iter::once(Slot::new("clock")).chain(std::iter::repeat_with(Slot::empty)).take(count).collect();
        Self::new(id, LayoutType::Grid2x2, slots).named(&format!("Screen {number}"))
    }

    #[must_use]
    pub fn named(
        mut self,
        name: &str,
    ) -> Self {
        self.name = name.to_string();
        self
    }

    /// Display name, falling back to the id.
    pub fn display_name(&self) -> &str { if self.name.is_empty() { &self.id } else { &self.name } }

    /// Parse the layout tag. Unknown tags are a configuration error.
    pub fn layout_type(&self) -> ConfigResult<LayoutType> {
        self.layout.parse().map_err(|_| ConfigError::UnknownLayout(self.layout.clone()))
    }

    pub fn layout_options(&self) -> LayoutOptions { self.layout_options.to_options() }

    /// Every entity id referenced by any slot, without duplicates.
    pub fn entity_ids(&self) -> BTreeSet<String> { self.slots.iter().flat_map(Slot::entity_refs).collect() }
}

/// Layout options as written in configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutSettings {
    #[serde(default)]
    pub hero_ratio: Option<f32>,
    #[serde(default)]
    pub footer_slots: Option<u32>,
    #[serde(default)]
    pub ratio: Option<f32>,
    #[serde(default)]
    pub horizontal: bool,
    #[serde(default)]
    pub ratios: Option<Vec<f32>>,
}

impl LayoutSettings {
    pub fn to_options(&self) -> LayoutOptions {
        LayoutOptions {
            hero_ratio: self.hero_ratio,
            footer_slots: self.footer_slots,
            ratio: self.ratio,
            horizontal: self.horizontal,
            ratios: self.ratios.as_deref().and_then(|r| <[f32; 3]>::try_from(r).ok()),
        }
    }
}

/// Widget tag used for padded, intentionally blank slots.
pub const EMPTY_WIDGET: &str = "empty";

/// One widget placement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    pub widget: String,
    #[serde(default)]
    pub entities: Vec<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub color: Option<Value>,
    #[serde(default)]
    pub options: WidgetOptions,
}

impl Slot {
    pub fn new(widget: &str) -> Self {
        Self { widget: widget.to_string(), entities: Vec::new(), label: None, color: None, options: WidgetOptions::new() }
    }

    pub fn empty() -> Self { Self::new(EMPTY_WIDGET) }

    #[must_use]
    pub fn entity(
        mut self,
        entity_id: &str,
    ) -> Self {
        self.entities.push(entity_id.to_string());
        self
    }

    #[must_use]
    pub fn label(
        mut self,
        label: &str,
    ) -> Self {
        self.label = Some(label.to_string());
        self
    }

    #[must_use]
    pub fn color(
        mut self,
        rgb: [u8; 3],
    ) -> Self {
        self.color = Some(Value::from(rgb.to_vec()));
        self
    }

    #[must_use]
    pub fn options(
        mut self,
        options: WidgetOptions,
    ) -> Self {
        self.options = options;
        self
    }

    /// First configured entity.
    pub fn primary_entity(&self) -> Option<&str> { self.entities.first().map(String::as_str) }

    /// Slot accent color, if configured and valid.
    pub fn accent(&self) -> Option<Rgb565> { self.color.as_ref().and_then(parse_color) }

    /// Entities referenced by this slot: slot entities, `items[].entity_id`
    /// and the `entities` option list (plain ids or `[id, label]` pairs).
    pub fn entity_refs(&self) -> Vec<String> {
        let mut refs = self.entities.clone();
        for item in self.options.list("items") {
            if let Some(id) = item.get("entity_id").and_then(Value::as_str) {
                refs.push(id.to_string());
            }
        }
        for entry in self.options.list("entities") {
            let id = match entry {
                Value::String(id) => Some(id.as_str()),
                Value::Array(pair) => pair.first().and_then(Value::as_str),
                _ => None,
            };
            if let Some(id) = id {
                refs.push(id.to_string());
            }
        }
        let mut seen = BTreeSet::new();
        refs.retain(|id| !id.is_empty() && seen.insert(id.clone()));
        refs
    }
}
