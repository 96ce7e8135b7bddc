//! Low-level drawing primitives shared across widgets.

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{
    Line, PrimitiveStyle, PrimitiveStyleBuilder, Rectangle, RoundedRectangle,
};

/// Corner radius for panels and bars.
const CORNER_RADIUS: u32 = 4;

/// Draw a panel background with rounded corners and an optional 1px border.
pub fn draw_panel<D>(
    display: &mut D,
    area: Rectangle,
    bg_color: Rgb565,
    border: Option<Rgb565>,
) where
    D: DrawTarget<Color = Rgb565>,
{
    if area.size.width < 4 || area.size.height < 4 {
        return;
    }
    let style = match border {
        Some(stroke) => PrimitiveStyleBuilder::new().fill_color(bg_color).stroke_color(stroke).stroke_width(1).build(),
        None => PrimitiveStyle::with_fill(bg_color),
    };
    RoundedRectangle::with_equal_corners(area, Size::new(CORNER_RADIUS, CORNER_RADIUS))
        .into_styled(style)
        .draw(display)
        .ok();
}

/// Width in pixels of a fill covering `fraction` of `width`.
///
/// `fraction` is clamped to [0, 1]; NaN counts as empty.
pub fn fill_width(
    width: u32,
    fraction: f32,
) -> u32 {
    let f = if fraction.is_nan() { 0.0 } else { fraction.clamp(0.0, 1.0) };
    ((width as f32 * f + 0.5) as u32).min(width)
}

/// Draw a horizontal bar: dim track plus a fill covering `fraction` of it.
pub fn draw_bar<D>(
    display: &mut D,
    area: Rectangle,
    fraction: f32,
    fill: Rgb565,
    track: Rgb565,
) where
    D: DrawTarget<Color = Rgb565>,
{
    if area.size.width == 0 || area.size.height == 0 {
        return;
    }
    let radius = Size::new(CORNER_RADIUS.min(area.size.height / 2), CORNER_RADIUS.min(area.size.height / 2));
    RoundedRectangle::with_equal_corners(area, radius)
        .into_styled(PrimitiveStyle::with_fill(track))
        .draw(display)
        .ok();

    let filled = fill_width(area.size.width, fraction);
    if filled > 0 {
        let bar = Rectangle::new(area.top_left, Size::new(filled, area.size.height));
        RoundedRectangle::with_equal_corners(bar, radius)
            .into_styled(PrimitiveStyle::with_fill(fill))
            .draw(display)
            .ok();
    }
}

/// Minimum and maximum of a series, ignoring non-finite samples.
pub fn series_range(values: &[f32]) -> Option<(f32, f32)> {
    values.iter().copied().filter(|v| v.is_finite()).fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

/// Draw a sparkline over `values`, auto-scaled to the local min/max.
///
/// # Graph Behavior
/// - X-axis: oldest sample left, newest right, spread across the full width
/// - Y-axis: scaled to the series' own range with 1px padding
/// - Fewer than two samples, or a zero range, draws a flat line at mid-height
/// - Coordinates are clamped to `area`, so nothing is drawn outside it
pub fn draw_sparkline<D>(
    display: &mut D,
    area: Rectangle,
    values: &[f32],
    color: Rgb565,
) where
    D: DrawTarget<Color = Rgb565>,
{
    if area.size.width < 3 || area.size.height < 3 {
        return;
    }

    let graph_x = area.top_left.x + 1;
    let graph_y = area.top_left.y + 1;
    let graph_width = area.size.width as i32 - 2;
    let graph_height = area.size.height as i32 - 2;
    let max_x = graph_x + graph_width - 1;
    let max_y = graph_y + graph_height - 1;
    let mid_y = graph_y + (graph_height - 1) / 2;
    let style = PrimitiveStyle::with_stroke(color, 1);

    let (data_min, data_max) = series_range(values).unwrap_or((0.0, 0.0));
    let data_range = data_max - data_min;
    if values.len() < 2 || !(data_range > f32::EPSILON) {
        Line::new(Point::new(graph_x, mid_y), Point::new(max_x, mid_y)).into_styled(style).draw(display).ok();
        return;
    }

    let y_scale = (graph_height - 1) as f32 / data_range;
    let x_step = (graph_width - 1) as f32 / (values.len() - 1) as f32;

    let mut prev: Option<Point> = None;
    for (i, value) in values.iter().enumerate() {
        let screen_x = (graph_x + (i as f32 * x_step) as i32).min(max_x);
        let screen_y = if value.is_finite() {
            (max_y - ((value - data_min) * y_scale) as i32).clamp(graph_y, max_y)
        } else {
            mid_y
        };
        let point = Point::new(screen_x, screen_y);
        if let Some(p) = prev {
            Line::new(p, point).into_styled(style).draw(display).ok();
        }
        prev = Some(point);
    }
}

/// Draw an on/off timeline: one column band per sample, `on_color` where the
/// sample is above 0.5, `off_color` elsewhere.
pub fn draw_timeline<D>(
    display: &mut D,
    area: Rectangle,
    values: &[f32],
    on_color: Rgb565,
    off_color: Rgb565,
) where
    D: DrawTarget<Color = Rgb565>,
{
    if values.is_empty() || area.size.width == 0 || area.size.height == 0 {
        return;
    }
    let width = area.size.width;
    let count = values.len() as u32;
    for (i, value) in values.iter().enumerate() {
        let i = i as u32;
        let x0 = i * width / count;
        let x1 = ((i + 1) * width / count).max(x0 + 1).min(width);
        let color = if *value > 0.5 { on_color } else { off_color };
        Rectangle::new(area.top_left + Point::new(x0 as i32, 0), Size::new(x1 - x0, area.size.height))
            .into_styled(PrimitiveStyle::with_fill(color))
            .draw(display)
            .ok();
    }
}
