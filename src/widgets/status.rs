//! Status widgets: color-coded on/off indicators.
//!
//! | Widget | Option | Values | Default |
//! |--------|--------|--------|---------|
//! | both | `on_color`, `off_color` | color | lime, red |
//! | status | `on_text`, `off_text` | string | `ON`, `OFF` |
//! | status | `icon`, `show_status_text` | string, bool | entity icon, true |
//! | status_list | `on_text`, `off_text` | string | none |
//! | status_list | `title` | string | none |
//! | status_list | `entities` | entity ids or `[entity_id, label]` pairs | slot entities |
//!
//! An entity that cannot be resolved reads as off.

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Circle, PrimitiveStyle, Rectangle};
use serde_json::Value;
use smalltv_common::{FontTier, SizeTable};
use smalltv_common::colors::{GRAY, LIME, RED, WHITE};

use super::draw::{Align, draw_fitted, draw_line, local_area, split_bottom, split_left, split_top};
use super::entity::icon_name;
use super::{SQUARE_SIZES, RenderContext, Widget, WidgetKind};
use crate::canvas::Region;
use crate::config::WidgetOptions;

/// Resolved on/off styling for one widget.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Indicator<'a> {
    pub on_color: Rgb565,
    pub off_color: Rgb565,
    pub on_text: Option<&'a str>,
    pub off_text: Option<&'a str>,
}

impl<'a> Indicator<'a> {
    /// Read colors and texts from options; `texts` supplies the default texts.
    pub fn from_options(
        options: &'a WidgetOptions,
        texts: (Option<&'a str>, Option<&'a str>),
    ) -> Self {
        Self {
            on_color: options.color("on_color").unwrap_or(LIME),
            off_color: options.color("off_color").unwrap_or(RED),
            on_text: options.text("on_text").or(texts.0),
            off_text: options.text("off_text").or(texts.1),
        }
    }

    pub fn color(
        &self,
        on: bool,
    ) -> Rgb565 {
        if on { self.on_color } else { self.off_color }
    }

    pub fn text(
        &self,
        on: bool,
    ) -> Option<&'a str> {
        if on { self.on_text } else { self.off_text }
    }
}

fn draw_dot<D>(
    target: &mut D,
    area: Rectangle,
    color: Rgb565,
) where
    D: DrawTarget<Color = Rgb565>,
{
    let diameter = area.size.width.min(area.size.height).saturating_sub(2).max(2);
    Circle::with_center(area.center(), diameter).into_styled(PrimitiveStyle::with_fill(color)).draw(target).ok();
}

// =============================================================================
// Status
// =============================================================================

pub struct StatusWidget;

impl Widget for StatusWidget {
    fn kind(&self) -> WidgetKind { WidgetKind::Status }

    fn sizes(&self) -> SizeTable { SQUARE_SIZES }

    fn render(
        &self,
        target: &mut Region<'_>,
        ctx: &RenderContext<'_>,
    ) {
        let area = local_area(target);
        let options = ctx.options();
        let indicator = Indicator::from_options(options, (Some("ON"), Some("OFF")));
        let on = ctx.primary().is_on();
        let color = indicator.color(on);
        let label_tier = ctx.label_tier();

        let text = indicator.text(on).filter(|_| options.flag("show_status_text", true));
        let text_h = if text.is_some() { label_tier.line_height() + 2 } else { 0 };
        let (body, label_area) = split_bottom(area, label_tier.line_height() + 2);
        let (icon_area, text_area) = split_bottom(body, text_h);

        let scale = if ctx.variant.is_compact() { 2 } else { 3 };
        ctx.icons.resolve(icon_name(ctx)).draw_centered(target, icon_area, scale, color);
        if let Some(text) = text {
            let tier = if ctx.variant.is_compact() { FontTier::Small } else { FontTier::Regular };
            draw_fitted(target, text, text_area, tier, color, Align::Center);
        }
        draw_line(target, &ctx.label(), label_area, label_tier, GRAY, Align::Center);
    }
}

// =============================================================================
// Status List
// =============================================================================

pub struct StatusListWidget;

/// Entity ids and optional labels from the `entities` option, else the slot
/// entities.
fn list_entries<'a>(ctx: &'a RenderContext<'a>) -> Vec<(&'a str, Option<&'a str>)> {
    let configured = ctx.options().list("entities");
    if configured.is_empty() {
        return ctx.slot.entities.iter().map(|id| (id.as_str(), None)).collect();
    }
    configured
        .iter()
        .filter_map(|entry| match entry {
            Value::String(id) => Some((id.as_str(), None)),
            Value::Array(pair) => {
                let id = pair.first()?.as_str()?;
                Some((id, pair.get(1).and_then(Value::as_str)))
            }
            _ => None,
        })
        .collect()
}

impl Widget for StatusListWidget {
    fn kind(&self) -> WidgetKind { WidgetKind::StatusList }

    fn render(
        &self,
        target: &mut Region<'_>,
        ctx: &RenderContext<'_>,
    ) {
        let mut area = local_area(target);
        let options = ctx.options();
        let indicator = Indicator::from_options(options, (None, None));
        let tier = ctx.label_tier();

        if let Some(title) = options.text("title") {
            let (title_area, rest) = split_top(area, tier.line_height() + 2);
            draw_line(target, title, title_area, tier, WHITE, Align::Left);
            area = rest;
        }

        let entries = list_entries(ctx);
        if entries.is_empty() {
            draw_fitted(target, "No entities", area, FontTier::Small, GRAY, Align::Center);
            return;
        }

        let min_row = tier.line_height() + 2;
        let rows = (area.size.height / min_row).max(1) as usize;
        let row_h = (area.size.height / entries.len().min(rows) as u32).min(min_row * 2);

        for (i, (entity_id, label)) in entries.into_iter().take(rows).enumerate() {
            let row = Rectangle::new(area.top_left + Point::new(0, (i as u32 * row_h) as i32), Size::new(area.size.width, row_h));
            let state = ctx.entity(entity_id);
            let on = state.is_on();
            let color = indicator.color(on);

            let (dot_area, rest) = split_left(row, tier.line_height() + 2);
            draw_dot(target, Rectangle::with_center(dot_area.center(), Size::new(tier.line_height(), tier.line_height())), color);
            let name = label.unwrap_or_else(|| state.name());
            match indicator.text(on) {
                Some(text) => {
                    let text_w = tier.text_width(text).min(rest.size.width);
                    let (name_area, text_area) = split_left(rest, rest.size.width.saturating_sub(text_w));
                    draw_line(target, name, name_area, tier, WHITE, Align::Left);
                    draw_line(target, text, text_area, tier, color, Align::Right);
                }
                None => draw_line(target, name, rest, tier, WHITE, Align::Left),
            }
        }
    }
}
