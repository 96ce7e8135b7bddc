//! Progress widgets: one bar toward a target, or one row per item.
//!
//! | Widget | Option | Values | Default |
//! |--------|--------|--------|---------|
//! | progress | `target` | > 0 | 100 |
//! | progress | `unit`, `icon` | string | entity unit, none |
//! | progress | `show_target` | bool | true |
//! | multi_progress | `items` | `{entity_id, label?, target?, color?, icon?, unit?}` | [] |
//! | multi_progress | `title` | string | none |
//!
//! Fraction is `current / target` clamped to [0, 1]. Each multi_progress
//! item resolves its own entity; an unavailable item shows an empty bar.

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use serde_json::Value;
use smalltv_common::FontTier;
use smalltv_common::colors::{CYAN, DARK_GRAY, GRAY, LIME, ORANGE, PURPLE, WHITE};
use smalltv_common::widgets::draw_bar;

use super::draw::{
    Align, draw_fitted, draw_line, draw_unavailable, format_value, local_area, split_bottom, split_left, split_top,
};
use super::{RenderContext, Widget, WidgetKind};
use crate::canvas::Region;
use crate::config::parse_color;
use crate::icons::GLYPH_SIZE;
use crate::state::as_f64;

const DEFAULT_TARGET: f64 = 100.0;

/// Row colors used when an item has none configured.
const ITEM_COLORS: [Rgb565; 4] = [CYAN, LIME, ORANGE, PURPLE];

/// `current / target` clamped to [0, 1]; non-positive targets count as empty.
pub fn progress_fraction(
    current: f64,
    target: f64,
) -> f32 {
    if !(target > 0.0) || !current.is_finite() {
        return 0.0;
    }
    (current / target).clamp(0.0, 1.0) as f32
}

fn positive_target(value: Option<f64>) -> f64 { value.filter(|t| t.is_finite() && *t > 0.0).unwrap_or(DEFAULT_TARGET) }

fn short_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 { format!("{value:.0}") } else { format!("{value:.1}") }
}

// =============================================================================
// Progress
// =============================================================================

pub struct ProgressWidget;

impl Widget for ProgressWidget {
    fn kind(&self) -> WidgetKind { WidgetKind::Progress }

    fn render(
        &self,
        target: &mut Region<'_>,
        ctx: &RenderContext<'_>,
    ) {
        let area = local_area(target);
        let state = ctx.primary();
        let Some(current) = state.attribute_numeric() else {
            draw_unavailable(target, area, ctx.icons, &ctx.label());
            return;
        };

        let options = ctx.options();
        let goal = positive_target(options.raw_number("target"));
        let fraction = progress_fraction(current, goal);
        let unit = options.text("unit").or(state.unit.as_deref());
        let color = ctx.accent(CYAN);
        let label_tier = ctx.label_tier();

        let value = if options.flag("show_target", true) {
            format_value(&format!("{} / {}", short_number(current), short_number(goal)), unit, None)
        } else {
            format_value(&short_number(current), unit, None)
        };
        let percent = format!("{:.0}%", fraction * 100.0);

        let (header, body) = split_top(area, label_tier.line_height() + 2);
        let (title_area, percent_area) =
            split_left(header, header.size.width.saturating_sub(label_tier.text_width(&percent) + 2));
        let title_area = match options.text("icon") {
            Some(icon) => {
                let (icon_area, rest) = split_left(title_area, title_area.size.height.min(GLYPH_SIZE) + 2);
                ctx.icons.resolve(icon).draw_centered(target, icon_area, 1, color);
                rest
            }
            None => title_area,
        };
        draw_line(target, &ctx.label(), title_area, label_tier, GRAY, Align::Left);
        draw_line(target, &percent, percent_area, label_tier, WHITE, Align::Right);

        let bar_h = if ctx.variant.is_compact() { 6 } else { 10 };
        let (value_area, bar_band) = split_bottom(body, bar_h + 2);
        let preferred = if ctx.variant.is_compact() { FontTier::Small } else { FontTier::Large };
        draw_fitted(target, &value, value_area, preferred, WHITE, Align::Center);
        let bar = Rectangle::new(bar_band.top_left, Size::new(bar_band.size.width, bar_h.min(bar_band.size.height)));
        draw_bar(target, bar, fraction, color, DARK_GRAY);
    }
}

// =============================================================================
// Multi Progress
// =============================================================================

pub struct MultiProgressWidget;

/// One configured row.
struct Item<'a> {
    entity_id: &'a str,
    label: Option<&'a str>,
    target: f64,
    color: Option<Rgb565>,
    icon: Option<&'a str>,
    unit: Option<&'a str>,
}

impl<'a> Item<'a> {
    fn parse(value: &'a Value) -> Option<Self> {
        let entity_id = value.get("entity_id")?.as_str()?;
        Some(Self {
            entity_id,
            label: value.get("label").and_then(Value::as_str),
            target: positive_target(value.get("target").and_then(as_f64)),
            color: value.get("color").and_then(parse_color),
            icon: value.get("icon").and_then(Value::as_str),
            unit: value.get("unit").and_then(Value::as_str),
        })
    }
}

impl Widget for MultiProgressWidget {
    fn kind(&self) -> WidgetKind { WidgetKind::MultiProgress }

    fn render(
        &self,
        target: &mut Region<'_>,
        ctx: &RenderContext<'_>,
    ) {
        let mut area = local_area(target);
        let options = ctx.options();
        let tier = ctx.label_tier();

        if let Some(title) = options.text("title") {
            let (title_area, rest) = split_top(area, tier.line_height() + 2);
            draw_line(target, title, title_area, tier, WHITE, Align::Left);
            area = rest;
        }

        let items: Vec<Item<'_>> = options.list("items").iter().filter_map(Item::parse).collect();
        if items.is_empty() {
            draw_fitted(target, "No items", area, FontTier::Small, GRAY, Align::Center);
            return;
        }

        let bar_h: u32 = if ctx.variant.is_compact() { 3 } else { 5 };
        let min_row = tier.line_height() + bar_h + 3;
        let rows = (area.size.height / min_row).max(1) as usize;
        let row_h = area.size.height / items.len().min(rows) as u32;

        for (i, item) in items.iter().take(rows).enumerate() {
            let row = Rectangle::new(area.top_left + Point::new(0, (i as u32 * row_h) as i32), Size::new(area.size.width, row_h));
            let state = ctx.entity(item.entity_id);
            let color = item.color.unwrap_or(ITEM_COLORS[i % ITEM_COLORS.len()]);
            let current = state.numeric();
            let fraction = current.map_or(0.0, |c| progress_fraction(c, item.target));

            let (text_row, _) = split_top(row, tier.line_height());
            let text_row = match item.icon {
                Some(icon) if !ctx.variant.is_compact() => {
                    let (icon_area, rest) = split_left(text_row, text_row.size.height + 2);
                    ctx.icons.resolve(icon).draw_centered(target, icon_area, 1, color);
                    rest
                }
                _ => text_row,
            };
            let value = match current {
                Some(c) => format_value(&short_number(c), item.unit.or(state.unit.as_deref()), None),
                None => "N/A".to_string(),
            };
            let value_w = tier.text_width(&value).min(text_row.size.width);
            let (name_area, value_area) = split_left(text_row, text_row.size.width.saturating_sub(value_w));
            draw_line(target, item.label.unwrap_or_else(|| state.name()), name_area, tier, GRAY, Align::Left);
            draw_line(target, &value, value_area, tier, WHITE, Align::Right);

            let bar = Rectangle::new(row.top_left + Point::new(0, (tier.line_height() + 1) as i32), Size::new(row.size.width, bar_h));
            draw_bar(target, bar, fraction, color, DARK_GRAY);
        }
    }
}
