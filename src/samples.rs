//! Demo dashboard: one screen per layout over bundled entity states.
//!
//! Used by the `samples` command to render every layout to disk, and by
//! tests as a realistic end-to-end fixture.

use smalltv_common::{LayoutOptions, LayoutType};

use crate::config::{DashboardConfig, Screen, Slot, WidgetOptions};
use crate::controls::SCREEN_COUNT;
use crate::error::ConfigResult;
use crate::state::MemoryStateProvider;

/// Fixture with every entity the demo screens reference.
pub const DEMO_STATES: &str = include_str!("../data/demo_states.json");

pub fn demo_provider() -> ConfigResult<MemoryStateProvider> { MemoryStateProvider::from_json(DEMO_STATES) }

/// Slot pool the demo screens draw from, in rotation.
fn demo_slots() -> [Slot; 12] {
    [
        Slot::new("clock"),
        Slot::new("entity").entity("sensor.living_room_temperature"),
        Slot::new("gauge")
            .entity("sensor.power")
            .options(WidgetOptions::new().with("max", 3000).with("style", "ring")),
        Slot::new("chart").entity("sensor.power").options(WidgetOptions::new().with("period", "6 hours")),
        Slot::new("status").entity("light.kitchen").color([255, 200, 0]),
        Slot::new("media").entity("media_player.living_room"),
        Slot::new("progress").entity("sensor.steps").options(WidgetOptions::new().with("target", 10000)),
        Slot::new("weather").entity("weather.home"),
        Slot::new("status_list").label("House").options(WidgetOptions::new().with(
            "entities",
            serde_json::json!(["light.kitchen", "switch.fan", ["lock.front_door", "Door"]]),
        )),
        Slot::new("multi_progress").options(WidgetOptions::new().with(
            "items",
            serde_json::json!([
                { "entity_id": "sensor.steps", "label": "Steps", "target": 10000 },
                { "entity_id": "sensor.water", "label": "Water", "target": 2.5 },
                { "entity_id": "sensor.phone_battery", "label": "Phone" }
            ]),
        )),
        Slot::new("text").options(WidgetOptions::new().with("text", "SmallTV").with("size", "large")),
        Slot::new("attribute_list").entity("weather.home").options(WidgetOptions::new().with(
            "attributes",
            serde_json::json!([
                "temperature",
                "humidity",
                { "key": "wind_speed", "label": "Wind" },
                { "key": "forecast.0.condition", "label": "Tomorrow" }
            ]),
        )),
    ]
}

/// Demo screen for `layout`. Each layout starts at a different point of the
/// slot pool so the set as a whole shows every widget in several sizes.
pub fn demo_screen(layout: LayoutType) -> Screen {
    let start = LayoutType::ALL.iter().position(|l| *l == layout).unwrap_or(0);
    let count = layout.slot_count(&LayoutOptions::default());
    let slots = demo_slots().into_iter().cycle().skip(start).take(count).collect();
    Screen::new(layout.tag(), layout, slots)
}

/// One screen per layout, in [`LayoutType::ALL`] order.
pub fn demo_screens() -> Vec<Screen> { LayoutType::ALL.into_iter().map(demo_screen).collect() }

/// The leading demo screens that fit on one device.
pub fn demo_dashboard() -> DashboardConfig {
    DashboardConfig::new(demo_screens().into_iter().take(SCREEN_COUNT.max as usize).collect())
}
