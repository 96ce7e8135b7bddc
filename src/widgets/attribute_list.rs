//! Attribute list widget: selected attributes of one entity as label/value rows.
//!
//! | Option | Values | Default |
//! |--------|--------|---------|
//! | `title` | text | friendly name when no attributes are listed |
//! | `attributes` | list of keys or `{key, label, color}` | none |
//!
//! The key `state` reads the entity state instead of an attribute. Keys are
//! dotted paths, so `forecast.0.condition` works.

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use serde_json::Value;
use smalltv_common::FontTier;
use smalltv_common::colors::{CYAN, GRAY};

use super::draw::{Align, draw_fitted, draw_line, local_area, split_left, split_top};
use super::{RenderContext, Widget, WidgetKind};
use crate::canvas::Region;
use crate::config::parse_color;
use crate::state::ResolvedState;

pub struct AttributeListWidget;

/// One configured row.
#[derive(Clone, Debug, PartialEq)]
pub struct AttributeRow<'a> {
    pub key: &'a str,
    pub label: &'a str,
    pub color: Option<Rgb565>,
}

/// Rows from the `attributes` option. Entries without a key are skipped.
pub fn rows<'a>(attributes: &'a [Value]) -> Vec<AttributeRow<'a>> {
    attributes
        .iter()
        .filter_map(|entry| match entry {
            Value::String(key) => Some(AttributeRow { key: key.as_str(), label: key.as_str(), color: None }),
            Value::Object(map) => {
                let key = map.get("key").and_then(Value::as_str).filter(|k| !k.is_empty())?;
                let label = map.get("label").and_then(Value::as_str).unwrap_or(key);
                Some(AttributeRow { key, label, color: map.get("color").and_then(parse_color) })
            }
            _ => None,
        })
        .collect()
}

/// Display text for an attribute value.
pub fn format_attribute(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "--".to_string(),
        Some(Value::Bool(b)) => String::from(if *b { "Yes" } else { "No" }),
        Some(Value::Number(n)) => match n.as_f64() {
            Some(v) if n.is_f64() && v.fract() != 0.0 => format!("{v:.1}"),
            Some(v) if n.is_f64() => format!("{v:.0}"),
            _ => n.to_string(),
        },
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => format!("[{} items]", items.len()),
        Some(Value::Object(map)) => format!("{{{} keys}}", map.len()),
    }
}

fn row_value(
    state: &ResolvedState,
    key: &str,
) -> String {
    if !state.available {
        return "--".to_string();
    }
    if key == "state" {
        return state.value.clone();
    }
    format_attribute(state.attr(key))
}

impl Widget for AttributeListWidget {
    fn kind(&self) -> WidgetKind { WidgetKind::AttributeList }

    fn render(
        &self,
        target: &mut Region<'_>,
        ctx: &RenderContext<'_>,
    ) {
        let options = ctx.options();
        let state = ctx.primary();
        let rows = rows(options.list("attributes"));
        let accent = ctx.accent(CYAN);
        let tier = ctx.label_tier();

        let pad = local_area(target).size.width / 20;
        let mut area = local_area(target).offset(-(pad as i32));

        let title = match options.text("title") {
            Some(title) => Some(title.to_string()),
            None if rows.is_empty() => Some(ctx.label().into_owned()),
            None => None,
        };
        if let Some(title) = title {
            let (title_area, rest) = split_top(area, tier.line_height() + 4);
            draw_line(target, &title.to_uppercase(), title_area, tier, GRAY, Align::Left);
            area = rest;
        }

        if rows.is_empty() {
            draw_fitted(target, "No attributes", area, FontTier::Small, GRAY, Align::Center);
            return;
        }

        let min_row = tier.line_height() + 2;
        let fit = (area.size.height / min_row).max(1) as usize;
        let row_h = (area.size.height / rows.len().min(fit) as u32).min(min_row * 2);

        for (i, row) in rows.iter().take(fit).enumerate() {
            let band = Rectangle::new(area.top_left + Point::new(0, (i as u32 * row_h) as i32), Size::new(area.size.width, row_h));
            let value = row_value(state, row.key);
            let (label_area, value_area) = split_left(band, band.size.width / 2);
            draw_line(target, row.label, label_area, tier, GRAY, Align::Left);
            draw_line(target, &value, value_area, tier, row.color.unwrap_or(accent), Align::Right);
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use smalltv_common::colors::{ORANGE, RED};

    use super::*;
    use crate::config::{Slot, WidgetOptions};
    use crate::state::{SlotState, StateSnapshot};
    use crate::widgets::testing::{count, now, render};

    fn bus() -> ResolvedState {
        let mut state = ResolvedState::unavailable("sensor.bus");
        state.available = true;
        state.value = "4 min".into();
        state.friendly_name = Some("Bus".into());
        for (key, value) in [("route", json!("42")), ("late", json!(true)), ("stops", json!([1, 2, 3]))] {
            state.attributes.insert(key.to_string(), value);
        }
        state
    }

    #[test]
    fn test_rows_accept_keys_and_objects() {
        let attributes = [json!("route"), json!({"key": "state", "label": "Arrives", "color": "#ff0000"}), json!({"label": "no key"}), json!(3)];
        let rows = rows(&attributes);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], AttributeRow { key: "route", label: "route", color: None });
        assert_eq!(rows[1].label, "Arrives");
        assert!(rows[1].color.is_some());
    }

    #[test]
    fn test_format_attribute() {
        assert_eq!(format_attribute(None), "--");
        assert_eq!(format_attribute(Some(&json!(false))), "No");
        assert_eq!(format_attribute(Some(&json!(21.0))), "21");
        assert_eq!(format_attribute(Some(&json!(21.46))), "21.5");
        assert_eq!(format_attribute(Some(&json!(7))), "7");
        assert_eq!(format_attribute(Some(&json!(["a", "b"]))), "[2 items]");
        assert_eq!(format_attribute(Some(&json!({"a": 1}))), "{1 keys}");
    }

    #[test]
    fn test_state_key_and_unavailable_entity() {
        assert_eq!(row_value(&bus(), "state"), "4 min");
        assert_eq!(row_value(&bus(), "late"), "Yes");
        assert_eq!(row_value(&bus(), "missing"), "--");
        assert_eq!(row_value(&ResolvedState::unavailable("sensor.bus"), "route"), "--");
    }

    #[test]
    fn test_renders_rows_in_row_color() {
        let slot = Slot::new("attribute_list").entity("sensor.bus").color([255, 128, 0]).options(
            WidgetOptions::new().with("attributes", json!(["route", {"key": "state", "label": "Arrives", "color": [255, 0, 0]}])),
        );
        let canvas = render(&AttributeListWidget, &slot, SlotState::new(bus()), StateSnapshot::new(now()), Size::new(108, 108));
        assert!(count(&canvas, ORANGE) > 0);
        assert!(count(&canvas, RED) > 0);
        assert!(count(&canvas, GRAY) > 0);
    }

    #[test]
    fn test_without_attributes_shows_title_and_hint() {
        let slot = Slot::new("attribute_list").entity("sensor.bus");
        let canvas = render(&AttributeListWidget, &slot, SlotState::new(bus()), StateSnapshot::new(now()), Size::new(108, 69));
        assert!(count(&canvas, GRAY) > 0);
        assert_eq!(count(&canvas, CYAN), 0);
    }
}
