//! Entity widget: one value with unit, icon and name.
//!
//! | Option | Values | Default |
//! |--------|--------|---------|
//! | `show_icon`, `show_name`, `show_panel` | bool | true, true, false |
//! | `icon` | icon name | entity icon, else by domain |
//! | `precision` | 0-4 | as reported |
//!
//! # Arrangement
//!
//! - `1x1`: name on top, small icon, value
//! - `2x1`: icon on the left, value over name on the right
//! - taller variants: icon, value and name stacked

use smalltv_common::colors::{GRAY, PANEL, PANEL_BORDER, WHITE};
use smalltv_common::widgets::draw_panel;
use smalltv_common::{FontTier, SizeTable, SizeVariant};

use super::draw::{Align, draw_fitted, draw_line, draw_unavailable, format_value, local_area, split_bottom, split_left, split_top};
use super::{SQUARE_SIZES, RenderContext, Widget, WidgetKind};
use crate::canvas::Region;
use crate::icons::{GLYPH_SIZE, icon_for_entity};

pub struct EntityWidget;

/// Icon name for the slot: option, then entity hint, then domain default.
pub(super) fn icon_name<'a>(ctx: &'a RenderContext<'_>) -> &'a str {
    ctx.options()
        .text("icon")
        .or(ctx.primary().icon.as_deref())
        .unwrap_or_else(|| icon_for_entity(&ctx.primary().entity_id))
}

impl Widget for EntityWidget {
    fn kind(&self) -> WidgetKind { WidgetKind::Entity }

    fn sizes(&self) -> SizeTable { SQUARE_SIZES }

    fn render(
        &self,
        target: &mut Region<'_>,
        ctx: &RenderContext<'_>,
    ) {
        let mut area = local_area(target);
        let state = ctx.primary();
        if !state.available {
            draw_unavailable(target, area, ctx.icons, &ctx.label());
            return;
        }

        let options = ctx.options();
        let show_icon = options.flag("show_icon", true);
        let show_name = options.flag("show_name", true);
        if options.flag("show_panel", false) {
            draw_panel(target, area, PANEL, Some(PANEL_BORDER));
            area = area.offset(-4);
        }
        let precision = options.raw_number("precision").map(|p| p.clamp(0.0, 4.0) as usize);
        let value = format_value(&state.value, state.unit.as_deref(), precision);
        let color = ctx.accent(WHITE);
        let glyph = ctx.icons.resolve(icon_name(ctx));
        let label = ctx.label();
        let label_tier = ctx.label_tier();

        match ctx.variant {
            SizeVariant::S1x1 => {
                let (name_area, rest) = split_top(area, if show_name { label_tier.line_height() } else { 0 });
                draw_line(target, &label, name_area, label_tier, GRAY, Align::Center);
                let (icon_area, value_area) = split_top(rest, if show_icon { GLYPH_SIZE + 2 } else { 0 });
                if show_icon {
                    glyph.draw_centered(target, icon_area, 1, color);
                }
                draw_fitted(target, &value, value_area, ctx.value_tier(), color, Align::Center);
            }
            SizeVariant::S2x1 => {
                let icon_w = if show_icon { area.size.height.min(area.size.width / 3) } else { 0 };
                let (icon_area, text_area) = split_left(area, icon_w);
                if show_icon {
                    glyph.draw_centered(target, icon_area, 2, color);
                }
                let (value_area, name_area) = split_bottom(text_area, if show_name { label_tier.line_height() + 2 } else { 0 });
                draw_fitted(target, &value, value_area, ctx.value_tier(), color, Align::Center);
                draw_line(target, &label, name_area, label_tier, GRAY, Align::Center);
            }
            _ => {
                let scale = if ctx.variant == SizeVariant::S3x3 { 3 } else { 2 };
                let (icon_area, rest) = split_top(area, if show_icon { GLYPH_SIZE * scale + 4 } else { 0 });
                if show_icon {
                    glyph.draw_centered(target, icon_area, scale, color);
                }
                let (value_area, name_area) = split_bottom(rest, if show_name { FontTier::Small.line_height() + 2 } else { 0 });
                draw_fitted(target, &value, value_area, ctx.value_tier(), color, Align::Center);
                draw_line(target, &label, name_area, FontTier::Small, GRAY, Align::Center);
            }
        }
    }
}
