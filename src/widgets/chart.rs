//! Chart widget: history of one entity as a sparkline.
//!
//! | Option | Values | Default |
//! |--------|--------|---------|
//! | `hours` | 0.1-168 | 24 |
//! | `period` | `5 min`, `15 min`, `1 hour`, `6 hours`, `24 hours` | overrides `hours` |
//! | `show_value`, `show_range` | bool | true, true |
//!
//! The series is scaled to its own min/max. Empty and single-point series
//! draw a flat baseline. Series made only of 0 and 1 (on/off history) draw
//! as a timeline bar instead.

use embedded_graphics::primitives::Rectangle;
use smalltv_common::{FontTier, SizeTable};
use smalltv_common::colors::{CYAN, DARK_GRAY, GRAY, WHITE};
use smalltv_common::widgets::{draw_sparkline, draw_timeline, series_range};

use super::draw::{Align, draw_line, draw_unavailable, format_value, local_area, split_bottom, split_left, split_top};
use super::{WIDE_SIZES, RenderContext, Widget, WidgetKind};
use crate::canvas::Region;
use crate::config::WidgetOptions;

pub struct ChartWidget;

const PERIODS: [&str; 5] = ["5 min", "15 min", "1 hour", "6 hours", "24 hours"];

/// History window in hours.
pub fn window_hours(options: &WidgetOptions) -> f64 {
    if options.text("period").is_some() {
        match options.choice("period", &PERIODS, "") {
            "5 min" => return 5.0 / 60.0,
            "15 min" => return 0.25,
            "1 hour" => return 1.0,
            "6 hours" => return 6.0,
            "24 hours" => return 24.0,
            _ => {}
        }
    }
    options.number("hours", 24.0, 0.1, 168.0)
}

/// Whether a series of two or more samples is made only of 0 and 1.
pub fn is_binary(values: &[f32]) -> bool { values.len() >= 2 && values.iter().all(|v| *v == 0.0 || *v == 1.0) }

fn compact_number(value: f32) -> String {
    if value.abs() >= 100.0 || value.fract() == 0.0 { format!("{value:.0}") } else { format!("{value:.1}") }
}

impl Widget for ChartWidget {
    fn kind(&self) -> WidgetKind { WidgetKind::Chart }

    fn sizes(&self) -> SizeTable { WIDE_SIZES }

    fn render(
        &self,
        target: &mut Region<'_>,
        ctx: &RenderContext<'_>,
    ) {
        let area = local_area(target);
        let state = ctx.primary();
        if !state.available && state.history.is_empty() {
            draw_unavailable(target, area, ctx.icons, &ctx.label());
            return;
        }

        let options = ctx.options();
        let show_value = options.flag("show_value", true);
        let show_range = options.flag("show_range", true) && !ctx.variant.is_short();
        let color = ctx.accent(CYAN);
        let label_tier = ctx.label_tier();
        let values: Vec<f32> = state.history.iter().map(|p| p.value as f32).collect();

        let (header, rest) = split_top(area, label_tier.line_height() + 2);
        let label = ctx.label();
        if show_value && state.available {
            let value = format_value(&state.value, state.unit.as_deref(), None);
            let value_w = label_tier.text_width(&value).min(header.size.width);
            let (name_area, value_area) = split_left(header, header.size.width.saturating_sub(value_w + label_tier.advance()));
            draw_line(target, &label, name_area, label_tier, GRAY, Align::Left);
            draw_line(target, &value, value_area, label_tier, WHITE, Align::Right);
        } else {
            draw_line(target, &label, header, label_tier, GRAY, Align::Left);
        }

        let range_h = if show_range { FontTier::Tiny.line_height() + 1 } else { 0 };
        let (graph, footer) = split_bottom(rest, range_h);

        if is_binary(&values) {
            let band_h = (graph.size.height / 3).clamp(4, 16).min(graph.size.height);
            let band = center_band(graph, band_h);
            draw_timeline(target, band, &values, color, DARK_GRAY);
        } else {
            draw_sparkline(target, graph, &values, color);
        }

        if show_range {
            if let Some((lo, hi)) = series_range(&values) {
                draw_line(target, &compact_number(lo), footer, FontTier::Tiny, GRAY, Align::Left);
                draw_line(target, &compact_number(hi), footer, FontTier::Tiny, GRAY, Align::Right);
            }
        }
    }
}

/// Horizontal band of `height` centered vertically in `area`.
fn center_band(
    area: Rectangle,
    height: u32,
) -> Rectangle {
    let (_, rest) = split_top(area, area.size.height.saturating_sub(height) / 2);
    split_top(rest, height).0
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use embedded_graphics::prelude::*;

    use super::*;
    use crate::config::Slot;
    use crate::state::{HistoryPoint, ResolvedState, SlotState, StateSnapshot};
    use crate::widgets::testing::{count, now, render};

    fn series(values: &[f64]) -> ResolvedState {
        let start = now().with_timezone(&Utc) - Duration::hours(1);
        let mut state = ResolvedState::unavailable("sensor.temp");
        state.available = true;
        state.value = values.last().map(|v| v.to_string()).unwrap_or_default();
        state.history = values
            .iter()
            .enumerate()
            .map(|(i, v)| HistoryPoint { at: start + Duration::minutes(i as i64), value: *v })
            .collect();
        state
    }

    #[test]
    fn test_window_hours() {
        assert_eq!(window_hours(&WidgetOptions::new()), 24.0);
        assert_eq!(window_hours(&WidgetOptions::new().with("hours", 500)), 168.0);
        assert_eq!(window_hours(&WidgetOptions::new().with("hours", 0)), 0.1);
        assert_eq!(window_hours(&WidgetOptions::new().with("period", "6 hours").with("hours", 2)), 6.0);
        assert_eq!(window_hours(&WidgetOptions::new().with("period", "fortnight").with("hours", 2)), 2.0);
    }

    #[test]
    fn test_constant_series_draws_midline() {
        let slot = Slot::new("chart").entity("sensor.temp").options(WidgetOptions::new().with("show_range", false));
        let size = Size::new(108, 108);
        let canvas = render(&ChartWidget, &slot, SlotState::new(series(&[10.0, 10.0])), StateSnapshot::new(now()), size);

        // Graph spans y = 12..108 (header is 10 + 2); sparkline mid row is 12 + 1 + (94 - 1) / 2
        let mid = 12 + 1 + 46;
        assert_eq!(canvas.pixel(Point::new(1, mid)), Some(CYAN));
        assert_eq!(canvas.pixel(Point::new(106, mid)), Some(CYAN));
        let cyan_rows = (0..108).filter(|y| (0..108).any(|x| canvas.pixel(Point::new(x, *y)) == Some(CYAN))).count();
        assert_eq!(cyan_rows, 1);
    }

    #[test]
    fn test_empty_and_single_point_series() {
        let slot = Slot::new("chart").entity("sensor.temp");
        for values in [&[][..], &[4.0][..]] {
            let canvas = render(&ChartWidget, &slot, SlotState::new(series(values)), StateSnapshot::new(now()), Size::new(69, 69));
            assert!(count(&canvas, CYAN) > 0);
        }
    }

    #[test]
    fn test_binary_series_draws_timeline() {
        let slot = Slot::new("chart").entity("switch.pump");
        let canvas = render(&ChartWidget, &slot, SlotState::new(series(&[0.0, 1.0, 1.0, 0.0])), StateSnapshot::new(now()), Size::new(108, 108));
        assert!(count(&canvas, DARK_GRAY) > 20);
        assert!(count(&canvas, CYAN) > 20);
        assert!(is_binary(&[0.0, 1.0]));
        assert!(!is_binary(&[0.0, 0.5]));
        assert!(!is_binary(&[]));
        assert!(!is_binary(&[1.0]));
    }

    #[test]
    fn test_unavailable_without_history() {
        let slot = Slot::new("chart").entity("sensor.ghost");
        let canvas = render(
            &ChartWidget,
            &slot,
            SlotState::new(ResolvedState::unavailable("sensor.ghost")),
            StateSnapshot::new(now()),
            Size::new(108, 108),
        );
        assert_eq!(count(&canvas, CYAN), 0);
        assert!(count(&canvas, DARK_GRAY) > 0);
    }
}
