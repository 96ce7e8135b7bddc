//! Clock widget: current time and an optional date line.
//!
//! | Option | Values | Default |
//! |--------|--------|---------|
//! | `time_format` | `24h`, `12h` | `24h` |
//! | `show_date` | bool | true |
//! | `show_seconds` | bool | false |

use core::fmt::Write;

use chrono::{DateTime, FixedOffset};
use heapless::String;
use smalltv_common::{FontTier, SizeTable};
use smalltv_common::colors::{GRAY, WHITE};

use super::draw::{Align, draw_fitted, local_area, split_bottom};
use super::{SQUARE_SIZES, RenderContext, Widget, WidgetKind};
use crate::canvas::Region;

pub struct ClockWidget;

/// Time string for `now`. 12h format appends AM/PM.
pub fn format_time(
    now: DateTime<FixedOffset>,
    twelve_hour: bool,
    seconds: bool,
) -> String<16> {
    let pattern = match (twelve_hour, seconds) {
        (false, false) => "%H:%M",
        (false, true) => "%H:%M:%S",
        (true, false) => "%-I:%M %p",
        (true, true) => "%-I:%M:%S %p",
    };
    // Longest output is "12:59:59 PM"
    let mut out: String<16> = String::new();
    write!(out, "{}", now.format(pattern)).ok();
    out
}

/// Short date line, e.g. `Fri 16 Oct`.
pub fn format_date(now: DateTime<FixedOffset>) -> String<16> {
    // At most "Wed 30 Sep"
    let mut out: String<16> = String::new();
    write!(out, "{}", now.format("%a %-d %b")).ok();
    out
}

impl Widget for ClockWidget {
    fn kind(&self) -> WidgetKind { WidgetKind::Clock }

    fn sizes(&self) -> SizeTable { SQUARE_SIZES }

    fn render(
        &self,
        target: &mut Region<'_>,
        ctx: &RenderContext<'_>,
    ) {
        let options = ctx.options();
        let twelve_hour = options.choice("time_format", &["24h", "12h"], "24h") == "12h";
        let show_date = options.flag("show_date", true);
        let show_seconds = options.flag("show_seconds", false);
        let color = ctx.accent(WHITE);

        let area = local_area(target);
        let date_h = if show_date { (area.size.height * 3 / 10).max(ctx.label_tier().line_height()) } else { 0 };
        let (time_area, date_area) = split_bottom(area, date_h);

        let time = format_time(ctx.now(), twelve_hour, show_seconds);
        draw_fitted(target, &time, time_area, ctx.value_tier(), color, Align::Center);
        if show_date {
            let date = format_date(ctx.now());
            let tier = if ctx.variant.is_compact() { FontTier::Tiny } else { FontTier::Regular };
            draw_fitted(target, &date, date_area, tier, GRAY, Align::Center);
        }
    }
}
