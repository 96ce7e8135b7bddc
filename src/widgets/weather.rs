//! Weather widget: current condition plus an optional forecast strip.
//!
//! | Option | Values | Default |
//! |--------|--------|---------|
//! | `show_forecast`, `show_humidity`, `show_wind`, `show_high_low` | bool | true, true, false, true |
//! | `forecast_days` | 1-5, then clamped to the forecast length | 3 |
//!
//! Reads the weather entity's state as the condition and the attributes
//! `temperature`, `temperature_unit`, `humidity`, `wind_speed`,
//! `wind_speed_unit` and `forecast` (a list of `{datetime, condition,
//! temperature, templow}`). Short slots skip the forecast strip.

use chrono::{DateTime, Datelike};
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use serde_json::Value;
use smalltv_common::colors::{GRAY, WHITE, YELLOW};
use smalltv_common::{FontTier, SizeVariant};

use super::draw::{Align, draw_fitted, draw_line, draw_unavailable, local_area, split_bottom, split_left, split_top};
use super::{RenderContext, Widget, WidgetKind};
use crate::canvas::Region;
use crate::icons::icon_for_condition;
use crate::state::{ResolvedState, as_f64};

pub struct WeatherWidget;

const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// One forecast entry.
#[derive(Clone, Debug, PartialEq)]
pub struct ForecastDay {
    pub day: String,
    pub condition: String,
    pub high: Option<f64>,
    pub low: Option<f64>,
}

/// Weekday abbreviation for a forecast `datetime`, else the first three
/// letters when it already looks like a day name, else `fallback`.
pub fn day_name(
    datetime: &str,
    fallback: &str,
) -> String {
    if let Ok(at) = DateTime::parse_from_rfc3339(datetime.trim()) {
        return WEEKDAYS[at.weekday().num_days_from_monday() as usize].to_string();
    }
    let prefix: String = datetime.trim().chars().take(3).collect();
    if prefix.chars().count() == 3 && prefix.chars().all(char::is_alphabetic) { prefix } else { fallback.to_string() }
}

/// First `days` entries of the `forecast` attribute; `days` is clamped to 1-5
/// and then to what the entity provides.
pub fn forecast(
    state: &ResolvedState,
    days: usize,
) -> Vec<ForecastDay> {
    let Some(Value::Array(entries)) = state.attr("forecast") else {
        return Vec::new();
    };
    entries
        .iter()
        .take(days.clamp(1, 5))
        .enumerate()
        .map(|(i, entry)| ForecastDay {
            day: day_name(entry.get("datetime").and_then(Value::as_str).unwrap_or_default(), &format!("D{}", i + 1)),
            condition: entry.get("condition").and_then(Value::as_str).unwrap_or("sunny").to_string(),
            high: entry.get("temperature").and_then(as_f64),
            low: entry.get("templow").and_then(as_f64),
        })
        .collect()
}

fn degrees(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.0}°"),
        None => "--".to_string(),
    }
}

fn day_temps(
    day: &ForecastDay,
    high_low: bool,
) -> String {
    match (high_low, day.low) {
        (true, Some(low)) => format!("{}/{}", degrees(day.high), degrees(Some(low))),
        _ => degrees(day.high),
    }
}

fn condition_label(condition: &str) -> String {
    let spaced = condition.replace(['-', '_'], " ");
    match spaced.as_str() {
        "partlycloudy" => "partly cloudy".to_string(),
        "clear night" => "clear".to_string(),
        _ => spaced,
    }
}

impl WeatherWidget {
    fn draw_strip(
        target: &mut Region<'_>,
        ctx: &RenderContext<'_>,
        area: Rectangle,
        days: &[ForecastDay],
        high_low: bool,
    ) {
        if days.is_empty() || area.size.height < FontTier::Tiny.line_height() * 2 {
            return;
        }
        let col_w = area.size.width / days.len() as u32;
        let tiny_h = FontTier::Tiny.line_height();
        for (i, day) in days.iter().enumerate() {
            let column = Rectangle::new(area.top_left + Point::new((i as u32 * col_w) as i32, 0), Size::new(col_w, area.size.height));
            let (name_area, rest) = split_top(column, tiny_h);
            let (icon_area, temp_area) = split_bottom(rest, tiny_h);
            draw_line(target, &day.day.to_uppercase(), name_area, FontTier::Tiny, GRAY, Align::Center);
            ctx.icons.resolve(icon_for_condition(&day.condition)).draw_centered(target, icon_area, 1, GRAY);
            draw_line(target, &day_temps(day, high_low), temp_area, FontTier::Tiny, WHITE, Align::Center);
        }
    }
}

impl Widget for WeatherWidget {
    fn kind(&self) -> WidgetKind { WidgetKind::Weather }

    fn render(
        &self,
        target: &mut Region<'_>,
        ctx: &RenderContext<'_>,
    ) {
        let area = local_area(target);
        let state = ctx.primary();
        if !state.available {
            draw_unavailable(target, area, ctx.icons, &ctx.label());
            return;
        }

        let options = ctx.options();
        let show_forecast = options.flag("show_forecast", true) && !ctx.variant.is_short();
        let show_humidity = options.flag("show_humidity", true);
        let show_wind = options.flag("show_wind", false);
        let high_low = options.flag("show_high_low", true);
        let days = options.number("forecast_days", 3.0, 1.0, 5.0) as usize;

        let glyph = ctx.icons.resolve(icon_for_condition(&state.value));
        let temperature = degrees(state.attr_f64("temperature"));
        let icon_color = ctx.accent(YELLOW);

        if ctx.variant == SizeVariant::S1x1 {
            let (top, label_area) = split_bottom(area, FontTier::Tiny.line_height() + 1);
            let (icon_area, temp_area) = split_left(top, top.size.width / 2);
            glyph.draw_centered(target, icon_area, 2, icon_color);
            draw_fitted(target, &temperature, temp_area, FontTier::Regular, WHITE, Align::Center);
            draw_line(target, &condition_label(&state.value), label_area, FontTier::Tiny, GRAY, Align::Center);
            return;
        }

        let mut details = Vec::new();
        if show_humidity {
            if let Some(humidity) = state.attr_f64("humidity") {
                details.push(format!("{humidity:.0}%"));
            }
        }
        if show_wind {
            if let Some(wind) = state.attr_f64("wind_speed") {
                let unit = state.attr_str("wind_speed_unit").unwrap_or("km/h");
                details.push(format!("{wind:.0} {unit}"));
            }
        }
        let days = if show_forecast { forecast(state, days) } else { Vec::new() };

        let strip_h = if days.is_empty() { 0 } else { (FontTier::Tiny.line_height() * 2 + 18).min(area.size.height / 2) };
        let (top, strip) = split_bottom(area, strip_h);
        let details_h = if details.is_empty() { 0 } else { FontTier::Small.line_height() + 2 };
        let (main, details_area) = split_bottom(top, details_h);

        let (icon_area, text_area) = split_left(main, main.size.width * 2 / 5);
        let scale = if ctx.variant == SizeVariant::S3x3 { 4 } else { 3 };
        glyph.draw_centered(target, icon_area, scale, icon_color);
        let (temp_area, condition_area) = split_bottom(text_area, FontTier::Small.line_height() + 2);
        draw_fitted(target, &temperature, temp_area, ctx.value_tier(), WHITE, Align::Center);
        draw_line(target, &condition_label(&state.value), condition_area, FontTier::Small, GRAY, Align::Center);

        if !details.is_empty() {
            draw_line(target, &details.join("  "), details_area, FontTier::Small, GRAY, Align::Center);
        }
        Self::draw_strip(target, ctx, strip, &days, high_low);
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::config::{Slot, WidgetOptions};
    use crate::state::{SlotState, StateSnapshot};
    use crate::widgets::testing::{count, now, render};

    fn weather() -> ResolvedState {
        let mut state = ResolvedState::unavailable("weather.home");
        state.available = true;
        state.value = "partlycloudy".into();
        state.attributes.insert("temperature".into(), json!(21.4));
        state.attributes.insert("humidity".into(), json!(56));
        state.attributes.insert(
            "forecast".into(),
            json!([
                {"datetime": "2026-10-17T00:00:00+00:00", "condition": "rainy", "temperature": 18, "templow": 11},
                {"datetime": "2026-10-18T00:00:00Z", "condition": "sunny", "temperature": 20},
            ]),
        );
        state
    }

    #[test]
    fn test_day_name() {
        assert_eq!(day_name("2026-10-17T00:00:00+00:00", "D1"), "Sat");
        assert_eq!(day_name("2026-10-19T06:00:00Z", "D1"), "Mon");
        assert_eq!(day_name("Tuesday", "D1"), "Tue");
        assert_eq!(day_name("", "D2"), "D2");
        assert_eq!(day_name("12", "D3"), "D3");
    }

    #[test]
    fn test_forecast_days_clamped_to_available() {
        let days = forecast(&weather(), 5);
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].day, "Sat");
        assert_eq!(days[0].low, Some(11.0));
        assert_eq!(days[1].low, None);
        assert_eq!(forecast(&weather(), 0).len(), 1);
        assert!(forecast(&ResolvedState::unavailable("weather.x"), 3).is_empty());
    }

    #[test]
    fn test_day_temps() {
        let day = ForecastDay { day: "Sat".into(), condition: "rainy".into(), high: Some(18.0), low: Some(11.0) };
        assert_eq!(day_temps(&day, true), "18°/11°");
        assert_eq!(day_temps(&day, false), "18°");
    }

    #[test]
    fn test_renders_condition_icon_and_strip() {
        let slot = Slot::new("weather").entity("weather.home").options(WidgetOptions::new().with("forecast_days", 9));
        let canvas = render(&WeatherWidget, &slot, SlotState::new(weather()), StateSnapshot::new(now()), Size::new(224, 151));
        assert!(count(&canvas, YELLOW) > 0);
        assert!(count(&canvas, WHITE) > 0);
        assert!(count(&canvas, GRAY) > 0);
    }

    #[test]
    fn test_compact_and_unavailable() {
        let slot = Slot::new("weather").entity("weather.home");
        let canvas = render(&WeatherWidget, &slot, SlotState::new(weather()), StateSnapshot::new(now()), Size::new(69, 69));
        assert!(count(&canvas, YELLOW) > 0);

        let canvas = render(&WeatherWidget, &slot, SlotState::new(ResolvedState::unavailable("weather.home")), StateSnapshot::new(now()), Size::new(108, 108));
        assert_eq!(count(&canvas, YELLOW), 0);
    }
}
