//! Camera widget: latest snapshot of a camera entity.
//!
//! | Option | Values | Default |
//! |--------|--------|---------|
//! | `fit` | `contain`, `cover` | `contain` |
//! | `show_label` | bool | false |
//!
//! The snapshot comes from the state provider's image capability, the same
//! path media artwork takes.

use embedded_graphics::prelude::*;
use smalltv_common::colors::{DARK_GRAY, GRAY, WHITE};

use super::draw::{Align, draw_fitted, draw_line, local_area, split_bottom};
use super::{RenderContext, Widget, WidgetKind};
use crate::canvas::Region;

pub struct CameraWidget;

/// Label under the image: slot label, then friendly name, then "Camera".
fn camera_label<'a>(ctx: &'a RenderContext<'_>) -> &'a str {
    match &ctx.slot.label {
        Some(label) => label.as_str(),
        None => ctx.primary().friendly_name.as_deref().unwrap_or("Camera"),
    }
}

impl Widget for CameraWidget {
    fn kind(&self) -> WidgetKind { WidgetKind::Camera }

    fn render(
        &self,
        target: &mut Region<'_>,
        ctx: &RenderContext<'_>,
    ) {
        let area = local_area(target);
        let tier = ctx.label_tier();

        let Some(image) = &ctx.state.artwork else {
            let (icon_area, text_area) = split_bottom(area, tier.line_height() + 4);
            ctx.icons.resolve("camera").draw_centered(target, icon_area, 3, DARK_GRAY);
            let text = ctx.slot.label.as_deref().unwrap_or("No Image");
            draw_fitted(target, text, text_area, tier, GRAY, Align::Center);
            return;
        };

        let options = ctx.options();
        let label_h = if options.flag("show_label", false) { (area.size.height * 15 / 100).max(tier.line_height()) } else { 0 };
        let (image_area, label_area) = split_bottom(area, label_h);
        match options.choice("fit", &["contain", "cover"], "contain") {
            "cover" => image.draw_cover(target, image_area),
            _ => image.draw_contain(target, image_area),
        }
        if label_h > 0 {
            draw_line(target, camera_label(ctx), label_area, tier, ctx.accent(WHITE), Align::Center);
        }
    }
}
