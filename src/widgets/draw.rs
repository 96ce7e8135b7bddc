//! Text and placeholder helpers shared by the widgets.
//!
//! All text is drawn left-aligned at a computed x so that truncation and
//! alignment use the same width arithmetic ([`FontTier::text_width`]).

use std::borrow::Cow;

use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use embedded_graphics::text::Text;
use smalltv_common::FontTier;
use smalltv_common::colors::{DARK_GRAY, GRAY};
use smalltv_common::styles::LEFT_ALIGNED;

use crate::icons::IconCatalog;
use crate::state::ResolvedState;

/// Horizontal text alignment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Align {
    Left,
    #[default]
    Center,
    Right,
}

impl Align {
    pub fn parse(value: &str) -> Self {
        match value {
            "left" => Self::Left,
            "right" => Self::Right,
            _ => Self::Center,
        }
    }
}

/// Shorten to `max_chars`, marking the cut with `..`.
pub fn truncate(
    text: &str,
    max_chars: usize,
) -> Cow<'_, str> {
    let count = text.chars().count();
    if count <= max_chars {
        return Cow::Borrowed(text);
    }
    if max_chars < 3 {
        return Cow::Owned(text.chars().take(max_chars).collect());
    }
    let mut out: String = text.chars().take(max_chars - 2).collect();
    out.push_str("..");
    Cow::Owned(out)
}

/// Draw one line at the top of `area`, truncated to its width.
pub fn draw_line<D>(
    target: &mut D,
    text: &str,
    area: Rectangle,
    tier: FontTier,
    color: Rgb565,
    align: Align,
) where
    D: DrawTarget<Color = Rgb565>,
{
    if text.is_empty() || area.size.width == 0 {
        return;
    }
    let text = truncate(text, tier.max_chars(area.size.width));
    let width = tier.text_width(&text);
    let slack = area.size.width.saturating_sub(width) as i32;
    let x = match align {
        Align::Left => 0,
        Align::Center => slack / 2,
        Align::Right => slack,
    };
    let style = MonoTextStyle::new(tier.font(), color);
    Text::with_text_style(&text, area.top_left + Point::new(x, 0), style, LEFT_ALIGNED).draw(target).ok();
}

/// Draw `text` vertically centered in `area` at the largest tier up to
/// `preferred` that fits, truncating at the smallest tier. Returns the tier used.
pub fn draw_fitted<D>(
    target: &mut D,
    text: &str,
    area: Rectangle,
    preferred: FontTier,
    color: Rgb565,
    align: Align,
) -> FontTier
where
    D: DrawTarget<Color = Rgb565>,
{
    let tier = FontTier::fit(text, area.size.width, area.size.height, preferred);
    let top = area.size.height.saturating_sub(tier.line_height()) as i32 / 2;
    let line = Rectangle::new(area.top_left + Point::new(0, top), Size::new(area.size.width, tier.line_height()));
    draw_line(target, text, line, tier, color, align);
    tier
}

/// Format a state value with optional fixed precision and unit.
///
/// Units that read as suffixes (`%`, `°C`) attach directly; others get a space.
pub fn format_value(
    value: &str,
    unit: Option<&str>,
    precision: Option<usize>,
) -> String {
    let number = match precision {
        Some(p) => match value.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => format!("{v:.p$}"),
            _ => value.to_string(),
        },
        None => value.to_string(),
    };
    match unit.map(str::trim).filter(|u| !u.is_empty()) {
        Some(unit) if unit.starts_with('%') || unit.starts_with('°') => format!("{number}{unit}"),
        Some(unit) => format!("{number} {unit}"),
        None => number,
    }
}

/// Split `area` into a top band of `height` and the rest.
pub fn split_top(
    area: Rectangle,
    height: u32,
) -> (Rectangle, Rectangle) {
    let height = height.min(area.size.height);
    let top = Rectangle::new(area.top_left, Size::new(area.size.width, height));
    let rest = Rectangle::new(
        area.top_left + Point::new(0, height as i32),
        Size::new(area.size.width, area.size.height - height),
    );
    (top, rest)
}

/// Split `area` into the rest and a bottom band of `height`.
pub fn split_bottom(
    area: Rectangle,
    height: u32,
) -> (Rectangle, Rectangle) {
    let (rest, bottom) = split_top(area, area.size.height.saturating_sub(height));
    (rest, bottom)
}

/// Split `area` into a left band of `width` and the rest.
pub fn split_left(
    area: Rectangle,
    width: u32,
) -> (Rectangle, Rectangle) {
    let width = width.min(area.size.width);
    let left = Rectangle::new(area.top_left, Size::new(width, area.size.height));
    let rest = Rectangle::new(
        area.top_left + Point::new(width as i32, 0),
        Size::new(area.size.width - width, area.size.height),
    );
    (left, rest)
}

/// Local bounds of a target.
pub fn local_area<D>(target: &D) -> Rectangle
where
    D: OriginDimensions,
{
    Rectangle::new(Point::zero(), target.size())
}

/// Placeholder for an entity that could not be resolved: dimmed fallback
/// glyph, "N/A", and the label when there is room.
pub fn draw_unavailable<D>(
    target: &mut D,
    area: Rectangle,
    icons: &IconCatalog,
    label: &str,
) where
    D: DrawTarget<Color = Rgb565>,
{
    let label_h = if area.size.height >= 48 && !label.is_empty() { FontTier::Small.line_height() } else { 0 };
    let (body, label_area) = split_bottom(area, label_h);
    let (icon_area, text_area) = split_bottom(body, FontTier::Small.line_height() + 2);
    icons.resolve(crate::icons::FALLBACK_ICON).draw_centered(target, icon_area, 2, DARK_GRAY);
    draw_fitted(target, "N/A", text_area, FontTier::Small, GRAY, Align::Center);
    if label_h > 0 {
        draw_line(target, label, label_area, FontTier::Small, GRAY, Align::Center);
    }
}

/// Entity label for a state, with an optional override.
pub fn label_for<'a>(
    state: &'a ResolvedState,
    label: Option<&'a str>,
) -> &'a str {
    label.unwrap_or_else(|| state.name())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Canvas;
    use smalltv_common::colors::{BLACK, WHITE};

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("kitchen", 10), "kitchen");
        assert_eq!(truncate("kitchen", 7), "kitchen");
        assert_eq!(truncate("kitchen", 6), "kitc..");
        assert_eq!(truncate("kitchen", 2), "ki");
        assert_eq!(truncate("kitchen", 0), "");
        assert_eq!(truncate("température", 5), "tem..");
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value("21.456", Some("°C"), Some(1)), "21.5°C");
        assert_eq!(format_value("55", Some("%"), None), "55%");
        assert_eq!(format_value("3.2", Some("kWh"), None), "3.2 kWh");
        assert_eq!(format_value("on", Some(""), Some(2)), "on");
    }

    #[test]
    fn test_splits() {
        let area = Rectangle::new(Point::new(2, 4), Size::new(10, 20));
        let (top, rest) = split_top(area, 5);
        assert_eq!(top, Rectangle::new(Point::new(2, 4), Size::new(10, 5)));
        assert_eq!(rest, Rectangle::new(Point::new(2, 9), Size::new(10, 15)));
        let (rest, bottom) = split_bottom(area, 50);
        assert_eq!(rest.size.height, 0);
        assert_eq!(bottom, area);
        let (left, right) = split_left(area, 4);
        assert_eq!(left.size, Size::new(4, 20));
        assert_eq!(right.top_left, Point::new(6, 4));
    }

    #[test]
    fn test_draw_line_alignment() {
        let mut canvas = Canvas::new(60, 12);
        let area = Rectangle::new(Point::zero(), Size::new(60, 12));
        draw_line(&mut canvas, "II", area, FontTier::Small, WHITE, Align::Right);
        // 6x10 "II" is 12px wide, right-aligned it starts at x = 48
        assert!((0..12).all(|y| (0..48).all(|x| canvas.pixel(Point::new(x, y)) == Some(BLACK))));
        assert!((0..12).any(|y| (48..60).any(|x| canvas.pixel(Point::new(x, y)) == Some(WHITE))));
    }

    #[test]
    fn test_draw_fitted_steps_down() {
        let mut canvas = Canvas::new(40, 40);
        let area = local_area(&canvas);
        let tier = draw_fitted(&mut canvas, "123456", area, FontTier::XLarge, WHITE, Align::Center);
        assert!(tier < FontTier::XLarge);
        assert!(tier.text_width("123456") <= 40);
    }
}
