//! Text widget: a static string or a template over the slot's entity.
//!
//! | Option | Values | Default |
//! |--------|--------|---------|
//! | `text` | string with `${state}`, `${name}`, `${unit}`, `${time}`, `${date}` | `${state}` with an entity, else empty |
//! | `size` | `small`, `regular`, `large`, `xlarge` | `regular` |
//! | `align` | `left`, `center`, `right` | `center` |
//!
//! Long text wraps at word boundaries. When it still does not fit, the font
//! steps down a tier at a time and the last visible line is truncated.

use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use smalltv_common::FontTier;
use smalltv_common::colors::WHITE;

use super::clock::{format_date, format_time};
use super::draw::{Align, draw_line, local_area};
use super::{RenderContext, Widget, WidgetKind};
use crate::canvas::Region;
use crate::state::ResolvedState;

pub struct TextWidget;

/// Substitute `${key}` placeholders.
pub fn expand_template(
    template: &str,
    state: &ResolvedState,
    now: chrono::DateTime<chrono::FixedOffset>,
) -> String {
    let time = format_time(now, false, false);
    let date = format_date(now);
    let vars = [
        ("state", state.value.as_str()),
        ("name", state.name()),
        ("unit", state.unit.as_deref().unwrap_or("")),
        ("time", time.as_str()),
        ("date", date.as_str()),
    ];
    let mut result = template.to_string();
    for (key, value) in vars {
        let placeholder = format!("${{{key}}}");
        result = result.replace(&placeholder, value);
    }
    result
}

/// Greedy word wrap to `max_chars` per line. Words longer than a line are split.
pub fn wrap(
    text: &str,
    max_chars: usize,
) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > max_chars {
                if !line.is_empty() {
                    lines.push(std::mem::take(&mut line));
                }
                lines.push(word.drain(..max_chars).collect());
            }
            let line_len = line.chars().count();
            if !line.is_empty() && line_len + 1 + word.len() > max_chars {
                lines.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.extend(word);
        }
        if !line.is_empty() {
            lines.push(line);
        }
    }
    lines
}

fn size_tier(size: &str) -> FontTier {
    match size {
        "small" => FontTier::Small,
        "large" => FontTier::Large,
        "xlarge" => FontTier::XLarge,
        _ => FontTier::Regular,
    }
}

impl Widget for TextWidget {
    fn kind(&self) -> WidgetKind { WidgetKind::Text }

    fn render(
        &self,
        target: &mut Region<'_>,
        ctx: &RenderContext<'_>,
    ) {
        let options = ctx.options();
        let default = if ctx.slot.primary_entity().is_some() { "${state}" } else { "" };
        let template = options.text("text").unwrap_or(default);
        let text = expand_template(template, ctx.primary(), ctx.now());
        if text.trim().is_empty() {
            return;
        }

        let preferred = size_tier(options.choice("size", &["small", "regular", "large", "xlarge"], "regular"));
        let align = Align::parse(options.choice("align", &["left", "center", "right"], "center"));
        let color = ctx.accent(WHITE);
        let area = local_area(target);

        // Largest tier whose wrapped lines fit the height
        let mut tier = preferred;
        let mut lines = wrap(&text, tier.max_chars(area.size.width));
        while tier != FontTier::Tiny && lines.len() as u32 * tier.line_height() > area.size.height {
            tier = tier.smaller();
            lines = wrap(&text, tier.max_chars(area.size.width));
        }

        let visible = ((area.size.height / tier.line_height().max(1)) as usize).max(1);
        if lines.len() > visible {
            lines.truncate(visible);
            if let Some(last) = lines.last_mut() {
                let keep = last.chars().count().min(tier.max_chars(area.size.width).saturating_sub(2));
                *last = format!("{}..", last.chars().take(keep).collect::<String>());
            }
        }

        let block_h = lines.len() as u32 * tier.line_height();
        let mut y = area.size.height.saturating_sub(block_h) as i32 / 2;
        for line in &lines {
            let row = Rectangle::new(Point::new(0, y), Size::new(area.size.width, tier.line_height()));
            draw_line(target, line, row, tier, color, align);
            y += tier.line_height() as i32;
        }
    }
}
