//! Screen composition: layout, snapshot, widgets, frame.
//!
//! ```text
//! Screen ──> LayoutType::compute ──> slot rects
//!    │                                   │
//!    └──> StateSnapshot::capture ──> widget.render(region, ctx) per slot ──> Frame
//! ```
//!
//! Composition is split in two. [`ScreenComposer::compose`] captures the
//! snapshot and then calls [`ScreenComposer::compose_snapshot`], which is a
//! pure function of the screen, the profile and the snapshot. Rendering the
//! same inputs twice gives byte-identical frames.

use chrono::{DateTime, FixedOffset};
use embedded_graphics::prelude::*;
use smalltv_common::{LayoutType, SizeVariant};
use tracing::{debug, warn};

use crate::canvas::{Canvas, Frame};
use crate::config::{DashboardConfig, DeviceProfile, Screen, Slot, WidgetOptions};
use crate::error::ConfigResult;
use crate::icons::IconCatalog;
use crate::state::{EntityStateResolver, SlotState, StateSnapshot};
use crate::widgets::{RenderContext, WidgetRegistry, draw_unknown};

/// Id of the built-in screen shown when no screens are configured.
pub const WELCOME_SCREEN_ID: &str = "welcome";

/// Renders screens into frames.
pub struct ScreenComposer {
    registry: WidgetRegistry,
    icons: &'static IconCatalog,
    unit_px: u32,
}

impl Default for ScreenComposer {
    fn default() -> Self { Self::new(WidgetRegistry::new(), smalltv_common::variant::DEFAULT_UNIT_PX) }
}

impl ScreenComposer {
    pub fn new(
        registry: WidgetRegistry,
        unit_px: u32,
    ) -> Self {
        Self { registry, icons: IconCatalog::bundled(), unit_px: unit_px.max(1) }
    }

    pub fn registry(&self) -> &WidgetRegistry { &self.registry }

    /// Resolve the screen's entities at `now` and render it.
    pub fn compose(
        &self,
        screen: &Screen,
        profile: &DeviceProfile,
        resolver: &EntityStateResolver,
        now: DateTime<FixedOffset>,
        generation: u64,
    ) -> ConfigResult<Frame> {
        // Reject bad layouts before touching the state provider
        screen.layout_type()?;
        let snapshot = StateSnapshot::capture(screen, resolver, now);
        self.compose_snapshot(screen, profile, &snapshot, generation)
    }

    /// Render the screen at `index`, or the welcome screen when the dashboard
    /// has none. `index` wraps around the screen count.
    pub fn compose_dashboard(
        &self,
        dashboard: &DashboardConfig,
        index: usize,
        profile: &DeviceProfile,
        resolver: &EntityStateResolver,
        now: DateTime<FixedOffset>,
        generation: u64,
    ) -> ConfigResult<Frame> {
        if dashboard.is_empty() {
            return self.compose(&welcome_screen(profile), profile, resolver, now, generation);
        }
        let screen = &dashboard.screens[index % dashboard.len()];
        self.compose(screen, profile, resolver, now, generation)
    }

    /// Render from an already captured snapshot.
    pub fn compose_snapshot(
        &self,
        screen: &Screen,
        profile: &DeviceProfile,
        snapshot: &StateSnapshot,
        generation: u64,
    ) -> ConfigResult<Frame> {
        let layout = screen.layout_type()?;
        let rects = smalltv_common::layout::compute(layout, &screen.layout_options(), profile.width, profile.height);
        if screen.slots.len() > rects.len() {
            warn!(screen = %screen.id, slots = screen.slots.len(), rects = rects.len(), "extra slots ignored");
        }

        let mut canvas = Canvas::new(profile.width, profile.height);
        let detached = SlotState::detached();
        for (index, (rect, slot)) in rects.iter().zip(&screen.slots).enumerate() {
            let mut region = canvas.region(*rect);
            let Some(widget) = self.registry.get(&slot.widget) else {
                debug!(screen = %screen.id, slot = index, widget = %slot.widget, "unknown widget");
                draw_unknown(&mut region, &slot.widget);
                continue;
            };
            let ctx = RenderContext {
                slot,
                state: snapshot.slot(index).unwrap_or(&detached),
                snapshot,
                icons: self.icons,
                variant: self.variant_for(widget.sizes(), rect.size),
            };
            widget.render(&mut region, &ctx);
        }

        debug!(screen = %screen.id, generation, layout = %layout, "composed");
        Ok(Frame::from_canvas(&canvas, &screen.id, generation))
    }

    fn variant_for(
        &self,
        sizes: smalltv_common::SizeTable,
        size: Size,
    ) -> SizeVariant {
        sizes.with_unit(self.unit_px).select(size)
    }
}

/// Built-in first-run screen: a clock over three hint tiles.
pub fn welcome_screen(profile: &DeviceProfile) -> Screen {
    let host = if profile.host.trim().is_empty() { "no device" } else { profile.host.trim() };
    let tile = |text: &str, color: [u8; 3]| {
        Slot::new("text").color(color).options(WidgetOptions::new().with("text", text).with("size", "small"))
    };
    Screen::new(
        WELCOME_SCREEN_ID,
        LayoutType::Hero,
        vec![
            Slot::new("clock"),
            tile("0 screens", [128, 128, 128]),
            tile(host, [0, 255, 255]),
            tile("Configure", [255, 128, 0]),
        ],
    )
    .named("Welcome")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::TimeZone;
    use smalltv_common::colors::{BLACK, ORANGE};

    use super::*;
    use crate::config::EMPTY_WIDGET;
    use crate::error::ConfigError;
    use crate::state::{EntityState, MemoryStateProvider};

    fn now() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(3600).and_then(|tz| tz.with_ymd_and_hms(2026, 10, 16, 9, 5, 7).single()).unwrap()
    }

    fn resolver() -> EntityStateResolver {
        let provider = MemoryStateProvider::new();
        provider.set_state(
            EntityState::new("sensor.temperature", "21.5")
                .attribute("unit_of_measurement", "°C")
                .attribute("friendly_name", "Living Room"),
        );
        provider.set_state(EntityState::new("light.kitchen", "on"));
        EntityStateResolver::new(Arc::new(provider))
    }

    fn screen() -> Screen {
        Screen::new(
            "home",
            LayoutType::Grid2x2,
            vec![
                Slot::new("clock"),
                Slot::new("entity").entity("sensor.temperature"),
                Slot::new("status").entity("light.kitchen"),
                Slot::new("gauge").entity("sensor.temperature").options(WidgetOptions::new().with("max", 40)),
            ],
        )
    }

    fn pixel(
        frame: &Frame,
        x: u32,
        y: u32,
    ) -> [u8; 3] {
        let i = ((y * frame.width + x) * 3) as usize;
        [frame.raster[i], frame.raster[i + 1], frame.raster[i + 2]]
    }

    #[test]
    fn test_compose_is_deterministic() {
        let composer = ScreenComposer::default();
        let profile = DeviceProfile::default();
        let first = composer.compose(&screen(), &profile, &resolver(), now(), 7).unwrap();
        let second = composer.compose(&screen(), &profile, &resolver(), now(), 7).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.generation, 7);
        assert_eq!(first.screen_id, "home");
        assert_eq!(first.raster.len(), 240 * 240 * 3);
        assert_eq!(first.encode(profile.format, 90).unwrap(), second.encode(profile.format, 90).unwrap());
    }

    #[test]
    fn test_unknown_entity_still_composes() {
        let mut screen = screen();
        screen.slots[1] = Slot::new("entity").entity("sensor.does_not_exist");
        let frame = ScreenComposer::default().compose(&screen, &DeviceProfile::default(), &resolver(), now(), 1).unwrap();
        // Other slots still drew something
        let inked = frame.raster.chunks(3).filter(|p| *p != [0, 0, 0]).count();
        assert!(inked > 500);
    }

    #[test]
    fn test_unknown_widget_draws_placeholder() {
        let mut screen = screen();
        screen.slots[0] = Slot::new("camera");
        let frame = ScreenComposer::default().compose(&screen, &DeviceProfile::default(), &resolver(), now(), 1).unwrap();
        let orange = smalltv_common::colors::to_rgb8(ORANGE);
        // Outline starts at the first slot's corner
        assert_eq!(pixel(&frame, 8, 8), orange);
        assert_eq!(pixel(&frame, 7, 7), smalltv_common::colors::to_rgb8(BLACK));
    }

    #[test]
    fn test_unknown_layout_is_config_error() {
        let mut screen = screen();
        screen.layout = "mosaic".into();
        let err = ScreenComposer::default().compose(&screen, &DeviceProfile::default(), &resolver(), now(), 1).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownLayout(tag) if tag == "mosaic"));
    }

    #[test]
    fn test_missing_and_extra_slots() {
        let mut short = screen();
        short.slots.truncate(1);
        let frame = ScreenComposer::default().compose(&short, &DeviceProfile::default(), &resolver(), now(), 1).unwrap();
        // Bottom-right slot was never drawn
        assert!(frame.raster.chunks(3).skip(200 * 240).all(|p| p == [0, 0, 0]));

        let mut long = screen();
        long.slots.push(Slot::new(EMPTY_WIDGET));
        assert!(ScreenComposer::default().compose(&long, &DeviceProfile::default(), &resolver(), now(), 1).is_ok());
    }

    #[test]
    fn test_empty_dashboard_shows_welcome() {
        let profile = DeviceProfile { host: "192.168.1.50".into(), ..DeviceProfile::default() };
        let frame = ScreenComposer::default()
            .compose_dashboard(&DashboardConfig::default(), 3, &profile, &resolver(), now(), 2)
            .unwrap();
        assert_eq!(frame.screen_id, WELCOME_SCREEN_ID);
        assert!(frame.raster.chunks(3).any(|p| p != [0, 0, 0]));
    }

    #[test]
    fn test_dashboard_index_wraps() {
        let mut other = screen();
        other.id = "second".into();
        let dashboard = DashboardConfig::new(vec![screen(), other]);
        let frame = ScreenComposer::default()
            .compose_dashboard(&dashboard, 3, &DeviceProfile::default(), &resolver(), now(), 1)
            .unwrap();
        assert_eq!(frame.screen_id, "second");
    }
}
