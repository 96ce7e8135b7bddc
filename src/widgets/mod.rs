//! Widget renderers and the registry that dispatches to them.
//!
//! Every widget type is a variant of [`WidgetKind`] with one [`Widget`]
//! implementation registered in [`WidgetRegistry`]. Adding a widget means one
//! variant and one registry entry.
//!
//! - [`clock`]: time and date, no entity
//! - [`entity`]: one value with unit, icon and name
//! - [`media`]: now playing, artwork and progress
//! - [`chart`]: sparkline or on/off timeline over history
//! - [`text`]: static or templated text
//! - [`gauge`]: bar, ring and arc gauges
//! - [`progress`]: progress toward a target, single and multi-row
//! - [`weather`]: current condition and forecast strip
//! - [`status`]: on/off indicators, single and list
//! - [`attribute_list`]: chosen attributes as label/value rows
//! - [`camera`]: camera snapshot
//!
//! # Render Contract
//!
//! A widget draws into a [`Region`] whose origin is the slot corner. The
//! region clips, so a widget cannot touch pixels outside its slot no matter
//! what it draws. Widgets never fail: missing data draws a placeholder and
//! bad options fall back to their defaults.
//!
//! # Size Variants
//!
//! Before rendering, the composer picks a [`SizeVariant`] from the widget's
//! [`SizeTable`] and passes it in [`RenderContext::variant`]. Widgets branch
//! on the variant, not on raw pixel sizes, for their arrangement.

pub mod attribute_list;
pub mod camera;
pub mod chart;
pub mod clock;
mod draw;
pub mod entity;
pub mod gauge;
pub mod media;
pub mod progress;
pub mod status;
pub mod text;
pub mod weather;

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, FixedOffset};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use smalltv_common::colors::ORANGE;
use smalltv_common::{FontTier, SizeTable, SizeVariant};

pub use draw::{Align, draw_fitted, draw_line, draw_unavailable, format_value, truncate};

use crate::canvas::Region;
use crate::config::{Slot, WidgetOptions};
use crate::icons::IconCatalog;
use crate::state::{ResolvedState, SlotState, StateSnapshot};

// =============================================================================
// Widget Kinds
// =============================================================================

/// Closed set of widget types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WidgetKind {
    Clock,
    Entity,
    Media,
    Chart,
    Text,
    Gauge,
    Progress,
    MultiProgress,
    Weather,
    Status,
    StatusList,
    AttributeList,
    Camera,
    /// Intentionally blank slot.
    Empty,
}

impl WidgetKind {
    pub const ALL: [Self; 14] = [
        Self::Clock,
        Self::Entity,
        Self::Media,
        Self::Chart,
        Self::Text,
        Self::Gauge,
        Self::Progress,
        Self::MultiProgress,
        Self::Weather,
        Self::Status,
        Self::StatusList,
        Self::AttributeList,
        Self::Camera,
        Self::Empty,
    ];

    pub const fn tag(self) -> &'static str {
        match self {
            Self::Clock => "clock",
            Self::Entity => "entity",
            Self::Media => "media",
            Self::Chart => "chart",
            Self::Text => "text",
            Self::Gauge => "gauge",
            Self::Progress => "progress",
            Self::MultiProgress => "multi_progress",
            Self::Weather => "weather",
            Self::Status => "status",
            Self::StatusList => "status_list",
            Self::AttributeList => "attribute_list",
            Self::Camera => "camera",
            Self::Empty => crate::config::EMPTY_WIDGET,
        }
    }

    /// Case-insensitive tag lookup.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        Self::ALL.into_iter().find(|kind| kind.tag().eq_ignore_ascii_case(tag))
    }
}

impl fmt::Display for WidgetKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.tag())
    }
}

// =============================================================================
// Render Context
// =============================================================================

/// Everything a widget may read while rendering one slot.
pub struct RenderContext<'a> {
    pub slot: &'a Slot,
    pub state: &'a SlotState,
    pub snapshot: &'a StateSnapshot,
    pub icons: &'a IconCatalog,
    pub variant: SizeVariant,
}

impl RenderContext<'_> {
    pub fn options(&self) -> &WidgetOptions { &self.slot.options }

    /// The slot's primary entity.
    pub fn primary(&self) -> &ResolvedState { &self.state.primary }

    /// Composition instant.
    pub fn now(&self) -> DateTime<FixedOffset> { self.snapshot.now() }

    /// Slot label override, else the primary entity's friendly name.
    pub fn label(&self) -> Cow<'_, str> {
        match &self.slot.label {
            Some(label) => Cow::Borrowed(label.as_str()),
            None => Cow::Borrowed(self.primary().name()),
        }
    }

    /// Slot accent color, else `default`.
    pub fn accent(
        &self,
        default: Rgb565,
    ) -> Rgb565 {
        self.slot.accent().unwrap_or(default)
    }

    /// Any entity captured in the snapshot.
    pub fn entity(
        &self,
        entity_id: &str,
    ) -> Cow<'_, ResolvedState> {
        self.snapshot.entity(entity_id)
    }

    /// Preferred value tier for the current variant.
    pub fn value_tier(&self) -> FontTier {
        match self.variant {
            SizeVariant::S1x1 => FontTier::Regular,
            SizeVariant::S1x2 | SizeVariant::S2x1 => FontTier::Large,
            SizeVariant::S2x2 | SizeVariant::S2x3 | SizeVariant::S3x3 => FontTier::XLarge,
        }
    }

    /// Tier for labels and secondary lines.
    pub fn label_tier(&self) -> FontTier { if self.variant.is_compact() { FontTier::Tiny } else { FontTier::Small } }
}

// =============================================================================
// Widget Trait and Registry
// =============================================================================

/// Variants for widgets whose content gains nothing from a third row.
pub const SQUARE_SIZES: SizeTable =
    SizeTable::new(&[SizeVariant::S1x1, SizeVariant::S1x2, SizeVariant::S2x1, SizeVariant::S2x2, SizeVariant::S3x3]);

/// Variants for widgets that stay single-cell until they are two cells wide.
pub const WIDE_SIZES: SizeTable =
    SizeTable::new(&[SizeVariant::S1x1, SizeVariant::S2x1, SizeVariant::S2x2, SizeVariant::S2x3, SizeVariant::S3x3]);

/// One widget renderer.
pub trait Widget: Send + Sync {
    fn kind(&self) -> WidgetKind;

    /// Breakpoint table; the composer applies the configured unit.
    fn sizes(&self) -> SizeTable { SizeTable::ALL }

    fn render(
        &self,
        target: &mut Region<'_>,
        ctx: &RenderContext<'_>,
    );
}

/// Renders nothing.
pub struct EmptyWidget;

impl Widget for EmptyWidget {
    fn kind(&self) -> WidgetKind { WidgetKind::Empty }

    fn render(
        &self,
        _target: &mut Region<'_>,
        _ctx: &RenderContext<'_>,
    ) {
    }
}

/// Widget tag to renderer.
pub struct WidgetRegistry {
    widgets: BTreeMap<WidgetKind, Box<dyn Widget>>,
}

impl Default for WidgetRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(clock::ClockWidget));
        registry.register(Box::new(entity::EntityWidget));
        registry.register(Box::new(media::MediaWidget));
        registry.register(Box::new(chart::ChartWidget));
        registry.register(Box::new(text::TextWidget));
        registry.register(Box::new(gauge::GaugeWidget));
        registry.register(Box::new(progress::ProgressWidget));
        registry.register(Box::new(progress::MultiProgressWidget));
        registry.register(Box::new(weather::WeatherWidget));
        registry.register(Box::new(status::StatusWidget));
        registry.register(Box::new(status::StatusListWidget));
        registry.register(Box::new(attribute_list::AttributeListWidget));
        registry.register(Box::new(camera::CameraWidget));
        registry.register(Box::new(EmptyWidget));
        registry
    }
}

impl WidgetRegistry {
    /// Registry with every built-in widget.
    pub fn new() -> Self { Self::default() }

    /// Registry without any widget; every tag renders the unknown placeholder.
    pub fn empty() -> Self { Self { widgets: BTreeMap::new() } }

    /// Add or replace the renderer for a kind.
    pub fn register(
        &mut self,
        widget: Box<dyn Widget>,
    ) {
        self.widgets.insert(widget.kind(), widget);
    }

    pub fn get(
        &self,
        tag: &str,
    ) -> Option<&dyn Widget> {
        let kind = WidgetKind::from_tag(tag)?;
        self.widgets.get(&kind).map(Box::as_ref)
    }

    pub fn len(&self) -> usize { self.widgets.len() }

    pub fn is_empty(&self) -> bool { self.widgets.is_empty() }
}

/// Placeholder for a widget tag with no renderer: outlined box plus the tag.
pub fn draw_unknown(
    target: &mut Region<'_>,
    tag: &str,
) {
    let area = Rectangle::new(Point::zero(), target.size());
    area.into_styled(PrimitiveStyle::with_stroke(ORANGE, 1)).draw(target).ok();
    let inner = area.offset(-3);
    let half = inner.size.height / 2;
    let top = Rectangle::new(inner.top_left, Size::new(inner.size.width, half));
    let bottom = Rectangle::new(inner.top_left + Point::new(0, half as i32), Size::new(inner.size.width, inner.size.height - half));
    draw_fitted(target, "unknown", top, FontTier::Small, ORANGE, Align::Center);
    draw_fitted(target, tag, bottom, FontTier::Regular, ORANGE, Align::Center);
}
