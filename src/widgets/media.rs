//! Media widget: now playing with artwork and progress.
//!
//! | Option | Values | Default |
//! |--------|--------|---------|
//! | `show_artist`, `show_album`, `show_progress` | bool | true, false, true |
//!
//! Reads the media attributes `media_title`, `media_artist`,
//! `media_album_name`, `media_position` and `media_duration`. A player that is
//! unavailable, off, idle or in standby draws the idle placeholder.

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use smalltv_common::colors::{DARK_GRAY, GRAY, PANEL, WHITE};
use smalltv_common::widgets::{draw_bar, draw_panel};
use smalltv_common::{FontTier, SizeTable, SizeVariant};

use super::draw::{Align, draw_fitted, draw_line, local_area, split_bottom, split_left, split_top};
use super::{WIDE_SIZES, RenderContext, Widget, WidgetKind};
use crate::canvas::Region;
use crate::state::ResolvedState;

pub struct MediaWidget;

const IDLE_STATES: [&str; 4] = ["off", "idle", "standby", "unknown"];

/// Whether the player has nothing to show.
pub fn is_idle(state: &ResolvedState) -> bool {
    !state.available || IDLE_STATES.iter().any(|s| s.eq_ignore_ascii_case(state.value.trim()))
}

/// Playback fraction from position and duration, when both are known.
pub fn playback_fraction(state: &ResolvedState) -> Option<f32> {
    let duration = state.attr_f64("media_duration").filter(|d| *d > 0.0)?;
    let position = state.attr_f64("media_position")?;
    Some((position / duration).clamp(0.0, 1.0) as f32)
}

fn draw_artwork<D>(
    target: &mut D,
    ctx: &RenderContext<'_>,
    area: Rectangle,
) where
    D: DrawTarget<Color = Rgb565>,
{
    match &ctx.state.artwork {
        Some(bitmap) => bitmap.draw_cover(target, area),
        None => {
            draw_panel(target, area, PANEL, None);
            ctx.icons.resolve("music").draw_centered(target, area, 3, DARK_GRAY);
        }
    }
}

impl Widget for MediaWidget {
    fn kind(&self) -> WidgetKind { WidgetKind::Media }

    fn sizes(&self) -> SizeTable { WIDE_SIZES }

    fn render(
        &self,
        target: &mut Region<'_>,
        ctx: &RenderContext<'_>,
    ) {
        let area = local_area(target);
        let state = ctx.primary();
        let label_tier = ctx.label_tier();

        if is_idle(state) {
            let (body, label_area) = split_bottom(area, label_tier.line_height() + 2);
            let (icon_area, text_area) = split_bottom(body, label_tier.line_height() + 2);
            ctx.icons.resolve("music").draw_centered(target, icon_area, 2, DARK_GRAY);
            draw_line(target, "Idle", text_area, label_tier, GRAY, Align::Center);
            draw_line(target, &ctx.label(), label_area, label_tier, GRAY, Align::Center);
            return;
        }

        let options = ctx.options();
        let show_artist = options.flag("show_artist", true);
        let show_album = options.flag("show_album", false);
        let progress = if options.flag("show_progress", true) { playback_fraction(state) } else { None };
        let title = state.attr_str("media_title").unwrap_or_else(|| state.name());
        let artist = state.attr_str("media_artist").filter(|_| show_artist);
        let album = state.attr_str("media_album_name").filter(|_| show_album);
        let accent = ctx.accent(WHITE);

        let bar_h = if progress.is_some() { 4 } else { 0 };
        let (content, bar_band) = split_bottom(area, bar_h + if bar_h > 0 { 2 } else { 0 });

        let text_area = match ctx.variant {
            SizeVariant::S1x1 | SizeVariant::S1x2 => {
                let (art, text) = split_bottom(content, label_tier.line_height() + 1);
                let side = art.size.width.min(art.size.height);
                draw_artwork(target, ctx, Rectangle::with_center(art.center(), Size::new(side, side)));
                draw_line(target, title, text, label_tier, accent, Align::Center);
                None
            }
            SizeVariant::S2x3 => {
                let side = content.size.width.min(content.size.height / 2);
                let (art, text) = split_top(content, side + 2);
                draw_artwork(target, ctx, Rectangle::with_center(art.center(), Size::new(side, side)));
                Some(text)
            }
            _ => {
                let side = content.size.height.min(content.size.width / 2);
                let (art, text) = split_left(content, side + 4);
                draw_artwork(target, ctx, Rectangle::new(art.top_left, Size::new(side, side)));
                Some(text)
            }
        };

        if let Some(text) = text_area {
            let title_tier = if ctx.variant == SizeVariant::S3x3 { FontTier::Large } else { FontTier::Regular };
            let lines = 1 + usize::from(artist.is_some()) + usize::from(album.is_some());
            let block = title_tier.line_height() + (lines as u32 - 1) * (FontTier::Small.line_height() + 2);
            let (_, rest) = split_top(text, text.size.height.saturating_sub(block) / 2);
            let (title_area, mut rest) = split_top(rest, title_tier.line_height() + 2);
            draw_fitted(target, title, title_area, title_tier, accent, Align::Left);
            for line in [artist, album].into_iter().flatten() {
                let (line_area, next) = split_top(rest, FontTier::Small.line_height() + 2);
                draw_line(target, line, line_area, FontTier::Small, GRAY, Align::Left);
                rest = next;
            }
        }

        if let Some(fraction) = progress {
            let bar = Rectangle::new(bar_band.top_left + Point::new(0, 2), Size::new(bar_band.size.width, bar_h));
            draw_bar(target, bar, fraction, accent, DARK_GRAY);
        }
    }
}
