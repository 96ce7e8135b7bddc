//! Gauge widget: a value mapped from `[min, max]` onto a bar, ring or arc.
//!
//! | Option | Values | Default |
//! |--------|--------|---------|
//! | `style` | `bar`, `ring`, `arc` | `bar` |
//! | `min`, `max` | number | 0, 100 |
//! | `unit` | string | entity unit |
//! | `attribute` | attribute path | primary value |
//! | `icon` | icon name | none |
//! | `color_thresholds` | list of `{value, color}` | none |
//!
//! The fill fraction is clamped to [0, 1], so values outside the declared
//! range draw an empty or full gauge. `max <= min` always draws empty.
//!
//! # Geometry
//!
//! ```text
//!   ring: full circle, fill starts at 12 o'clock, clockwise
//!   arc:  270 degree sweep from 7:30 to 4:30, gap at the bottom
//! ```

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Arc, PrimitiveStyleBuilder, Rectangle, StrokeAlignment};
use smalltv_common::colors::{CYAN, DARK_GRAY, GRAY, WHITE};
use smalltv_common::widgets::draw_bar;

use super::draw::{Align, draw_fitted, draw_line, draw_unavailable, format_value, local_area, split_bottom, split_top};
use super::{RenderContext, Widget, WidgetKind};
use crate::canvas::Region;
use crate::config::{WidgetOptions, parse_color};
use crate::state::as_f64;

pub struct GaugeWidget;

/// Fill fraction for `value` in `[min, max]`.
pub fn gauge_fraction(
    value: f64,
    min: f64,
    max: f64,
) -> f32 {
    if !(max > min) || !value.is_finite() {
        return 0.0;
    }
    ((value - min) / (max - min)).clamp(0.0, 1.0) as f32
}

/// Color of the highest threshold at or below `value`.
pub fn threshold_color(
    options: &WidgetOptions,
    value: f64,
) -> Option<Rgb565> {
    options
        .list("color_thresholds")
        .iter()
        .filter_map(|entry| {
            let at = entry.get("value").and_then(as_f64)?;
            let color = entry.get("color").and_then(parse_color)?;
            Some((at, color))
        })
        .filter(|(at, _)| *at <= value)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, color)| color)
}

fn draw_arc<D>(
    target: &mut D,
    bounds: Rectangle,
    start_deg: f32,
    sweep_deg: f32,
    fraction: f32,
    fill: Rgb565,
) where
    D: DrawTarget<Color = Rgb565>,
{
    let diameter = bounds.size.width.min(bounds.size.height);
    if diameter < 8 {
        return;
    }
    let stroke = (diameter / 9).max(3);
    let top_left = bounds.top_left
        + Point::new(((bounds.size.width - diameter) / 2) as i32, ((bounds.size.height - diameter) / 2) as i32);
    let style = |color: Rgb565| {
        PrimitiveStyleBuilder::new()
            .stroke_color(color)
            .stroke_width(stroke)
            .stroke_alignment(StrokeAlignment::Inside)
            .build()
    };

    Arc::new(top_left, diameter, Angle::from_degrees(start_deg), Angle::from_degrees(sweep_deg))
        .into_styled(style(DARK_GRAY))
        .draw(target)
        .ok();
    if fraction > 0.0 {
        Arc::new(top_left, diameter, Angle::from_degrees(start_deg), Angle::from_degrees(sweep_deg * fraction))
            .into_styled(style(fill))
            .draw(target)
            .ok();
    }
}

impl Widget for GaugeWidget {
    fn kind(&self) -> WidgetKind { WidgetKind::Gauge }

    fn render(
        &self,
        target: &mut Region<'_>,
        ctx: &RenderContext<'_>,
    ) {
        let area = local_area(target);
        let state = ctx.primary();
        let Some(value) = state.attribute_numeric() else {
            draw_unavailable(target, area, ctx.icons, &ctx.label());
            return;
        };

        let options = ctx.options();
        let style = options.choice("style", &["bar", "ring", "arc"], "bar");
        let min = options.raw_number("min").filter(|v| v.is_finite()).unwrap_or(0.0);
        let max = options.raw_number("max").filter(|v| v.is_finite()).unwrap_or(100.0);
        let fraction = gauge_fraction(value, min, max);
        let fill = threshold_color(options, value).unwrap_or_else(|| ctx.accent(CYAN));
        let unit = options.text("unit").or(state.unit.as_deref());
        let shown = if state.attribute.is_some() { trim_number(value) } else { state.value.clone() };
        let text = format_value(&shown, unit, None);
        let label_tier = ctx.label_tier();

        let (header, body) = split_top(area, label_tier.line_height() + 2);
        draw_line(target, &ctx.label(), header, label_tier, GRAY, Align::Left);
        if let Some(icon) = options.text("icon") {
            let icon_area = Rectangle::new(
                header.top_left + Point::new(header.size.width.saturating_sub(header.size.height) as i32, 0),
                Size::new(header.size.height, header.size.height),
            );
            ctx.icons.resolve(icon).draw_centered(target, icon_area, 1, fill);
        }

        match style {
            "ring" | "arc" => {
                let (start, sweep) = if style == "ring" { (-90.0, 360.0) } else { (135.0, 270.0) };
                draw_arc(target, body, start, sweep, fraction, fill);
                let diameter = body.size.width.min(body.size.height);
                let inner = Rectangle::with_center(body.center(), Size::new(diameter * 2 / 3, diameter / 2));
                draw_fitted(target, &text, inner, ctx.value_tier(), WHITE, Align::Center);
            }
            _ => {
                let bar_h = if ctx.variant.is_compact() { 6 } else { 10 };
                let (value_area, bar_band) = split_bottom(body, bar_h + 2);
                draw_fitted(target, &text, value_area, ctx.value_tier(), WHITE, Align::Center);
                let bar = Rectangle::new(bar_band.top_left, Size::new(bar_band.size.width, bar_h.min(bar_band.size.height)));
                draw_bar(target, bar, fraction, fill, DARK_GRAY);
            }
        }
    }
}

fn trim_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 { format!("{value:.0}") } else { format!("{value:.1}") }
}
