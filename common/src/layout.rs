//! Slot geometry for dashboard layouts.
//!
//! A layout partitions the canvas into an ordered list of slot rectangles.
//! Every layout keeps an outer [`PADDING`] around the canvas and a [`GAP`]
//! between adjacent slots; ratios apply to the space left after both.
//!
//! ```text
//!  grid_2x2        hero (3 footer)    split           three_column
//! +----+----+      +-----------+      +----+------+   +---+----+---+
//! | 0  | 1  |      |     0     |      |    |      |   |   |    |   |
//! +----+----+      |           |      | 0  |  1   |   | 0 | 1  | 2 |
//! | 2  | 3  |      +---+---+---+      |    |      |   |   |    |   |
//! +----+----+      | 1 | 2 | 3 |      +----+------+   +---+----+---+
//!                  +---+---+---+
//!
//!  hero_corner_tl  hero_simple       three_row
//! +------+---+     +-----------+     +-----------+
//! |      | 1 |     |     0     |     |     0     |
//! |  0   +---+     |           |     +-----------+
//! |      | 2 |     +-----------+     |     1     |
//! +--+---+---+     |     1     |     +-----------+
//! |3 | 4 | 5 |     +-----------+     |     2     |
//! +--+---+---+                       +-----------+
//! ```
//!
//! The other corner heroes mirror `hero_corner_tl` but list the upper side
//! cell, then the hero, then the lower side cell. When the hero sits at the
//! bottom the band of three comes first.
//!
//! Rectangles are axis-aligned, never overlap, and never leave the canvas.
//! Integer division leaves at most a few pixels of slack on the far edges.

use core::fmt;
use core::str::FromStr;

use embedded_graphics::prelude::{Point, Size};
use embedded_graphics::primitives::Rectangle;

// =============================================================================
// Geometry Constants
// =============================================================================

/// Margin between the canvas edge and the outermost slots.
pub const PADDING: u32 = 8;

/// Gutter between adjacent slots.
pub const GAP: u32 = 8;

/// Largest slot count of any layout (`grid_3x3`).
pub const MAX_SLOTS: usize = 9;

/// Ordered slot rectangles produced by [`compute`].
pub type Slots = heapless::Vec<Rectangle, MAX_SLOTS>;

/// Hero ratio bounds and default.
pub const HERO_RATIO_MIN: f32 = 0.5;
pub const HERO_RATIO_MAX: f32 = 0.8;
pub const HERO_RATIO_DEFAULT: f32 = 0.7;

/// Footer slot bounds and default for the hero layout.
pub const FOOTER_SLOTS_MIN: u32 = 1;
pub const FOOTER_SLOTS_MAX: u32 = 4;
pub const FOOTER_SLOTS_DEFAULT: u32 = 3;

/// Split ratio bounds and default.
pub const SPLIT_RATIO_MIN: f32 = 0.2;
pub const SPLIT_RATIO_MAX: f32 = 0.8;
pub const SPLIT_RATIO_DEFAULT: f32 = 0.5;

/// Sidebar main-panel ratio bounds and default.
pub const SIDEBAR_RATIO_MIN: f32 = 0.5;
pub const SIDEBAR_RATIO_MAX: f32 = 0.8;
pub const SIDEBAR_RATIO_DEFAULT: f32 = 0.67;

/// Default column proportions for `three_column`, and row proportions for
/// `three_row`.
pub const THREE_COLUMN_DEFAULT: [f32; 3] = [0.33, 0.34, 0.33];

/// Hero share of the height for `hero_simple` when none is configured.
pub const HERO_SIMPLE_RATIO_DEFAULT: f32 = 0.66;

/// Corner hero share of each axis, measured after one gutter.
pub const CORNER_HERO_RATIO: f32 = 0.67;

const _: () = assert!(HERO_RATIO_MIN < HERO_RATIO_DEFAULT && HERO_RATIO_DEFAULT < HERO_RATIO_MAX);
const _: () = assert!(HERO_RATIO_MIN < HERO_SIMPLE_RATIO_DEFAULT && HERO_SIMPLE_RATIO_DEFAULT < HERO_RATIO_MAX);
const _: () = assert!(FOOTER_SLOTS_MIN <= FOOTER_SLOTS_DEFAULT && FOOTER_SLOTS_DEFAULT <= FOOTER_SLOTS_MAX);
const _: () = assert!(SPLIT_RATIO_MIN < SPLIT_RATIO_DEFAULT && SPLIT_RATIO_DEFAULT < SPLIT_RATIO_MAX);
const _: () = assert!(SIDEBAR_RATIO_MIN < SIDEBAR_RATIO_DEFAULT && SIDEBAR_RATIO_DEFAULT < SIDEBAR_RATIO_MAX);
// Hero needs 1 + FOOTER_SLOTS_MAX slots
const _: () = assert!(1 + FOOTER_SLOTS_MAX as usize <= MAX_SLOTS);

// =============================================================================
// Layout Types
// =============================================================================

/// Supported layout tags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LayoutType {
    Grid2x2,
    Grid2x3,
    Grid3x2,
    Grid3x3,
    Hero,
    Split,
    ThreeColumn,
    Fullscreen,
    SidebarLeft,
    SidebarRight,
    HeroCornerTl,
    HeroCornerTr,
    HeroCornerBl,
    HeroCornerBr,
    HeroSimple,
    ThreeRow,
}

impl LayoutType {
    pub const ALL: [Self; 16] = [
        Self::Grid2x2,
        Self::Grid2x3,
        Self::Grid3x2,
        Self::Grid3x3,
        Self::Hero,
        Self::Split,
        Self::ThreeColumn,
        Self::Fullscreen,
        Self::SidebarLeft,
        Self::SidebarRight,
        Self::HeroCornerTl,
        Self::HeroCornerTr,
        Self::HeroCornerBl,
        Self::HeroCornerBr,
        Self::HeroSimple,
        Self::ThreeRow,
    ];

    /// Configuration tag for this layout.
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Grid2x2 => "grid_2x2",
            Self::Grid2x3 => "grid_2x3",
            Self::Grid3x2 => "grid_3x2",
            Self::Grid3x3 => "grid_3x3",
            Self::Hero => "hero",
            Self::Split => "split",
            Self::ThreeColumn => "three_column",
            Self::Fullscreen => "fullscreen",
            Self::SidebarLeft => "sidebar_left",
            Self::SidebarRight => "sidebar_right",
            Self::HeroCornerTl => "hero_corner_tl",
            Self::HeroCornerTr => "hero_corner_tr",
            Self::HeroCornerBl => "hero_corner_bl",
            Self::HeroCornerBr => "hero_corner_br",
            Self::HeroSimple => "hero_simple",
            Self::ThreeRow => "three_row",
        }
    }

    /// Number of slots this layout produces with the given options.
    pub fn slot_count(
        self,
        options: &LayoutOptions,
    ) -> usize {
        match self {
            Self::Grid2x2 | Self::SidebarLeft | Self::SidebarRight => 4,
            Self::Grid2x3 | Self::Grid3x2 => 6,
            Self::HeroCornerTl | Self::HeroCornerTr | Self::HeroCornerBl | Self::HeroCornerBr => 6,
            Self::Grid3x3 => 9,
            Self::Hero => 1 + options.footer_slots() as usize,
            Self::Split | Self::HeroSimple => 2,
            Self::ThreeColumn | Self::ThreeRow => 3,
            Self::Fullscreen => 1,
        }
    }

    /// Grid dimensions as (columns, rows), for grid layouts only.
    ///
    /// Tags name rows first: `grid_2x3` is two rows of three columns, so each
    /// slot is taller than it is wide.
    const fn grid(self) -> Option<(u32, u32)> {
        match self {
            Self::Grid2x2 => Some((2, 2)),
            Self::Grid2x3 => Some((3, 2)),
            Self::Grid3x2 => Some((2, 3)),
            Self::Grid3x3 => Some((3, 3)),
            _ => None,
        }
    }
}

impl fmt::Display for LayoutType {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Returned when a layout tag is not one of [`LayoutType::ALL`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnknownLayout;

impl fmt::Display for UnknownLayout {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str("unknown layout type")
    }
}

impl FromStr for LayoutType {
    type Err = UnknownLayout;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim();
        Self::ALL.into_iter().find(|layout| layout.tag().eq_ignore_ascii_case(tag)).ok_or(UnknownLayout)
    }
}

// =============================================================================
// Layout Options
// =============================================================================

/// Per-layout tuning. Fields that do not apply to a layout are ignored.
///
/// Accessors clamp to documented bounds, so out-of-range input never
/// produces degenerate geometry.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct LayoutOptions {
    /// Hero panel share of the height (`hero`, `hero_simple`).
    pub hero_ratio: Option<f32>,
    /// Number of columns under the hero panel (`hero`).
    pub footer_slots: Option<u32>,
    /// First-panel share (`split`, `sidebar_left`, `sidebar_right`).
    pub ratio: Option<f32>,
    /// Stack the split panels vertically instead of side by side (`split`).
    pub horizontal: bool,
    /// Column proportions (`three_column`), row proportions (`three_row`).
    pub ratios: Option<[f32; 3]>,
}

impl LayoutOptions {
    pub fn hero_ratio(&self) -> f32 {
        clamp_ratio(self.hero_ratio, HERO_RATIO_MIN, HERO_RATIO_MAX, HERO_RATIO_DEFAULT)
    }

    /// Same bounds as [`Self::hero_ratio`] with a shorter default.
    pub fn hero_simple_ratio(&self) -> f32 {
        clamp_ratio(self.hero_ratio, HERO_RATIO_MIN, HERO_RATIO_MAX, HERO_SIMPLE_RATIO_DEFAULT)
    }

    pub fn footer_slots(&self) -> u32 {
        self.footer_slots.unwrap_or(FOOTER_SLOTS_DEFAULT).clamp(FOOTER_SLOTS_MIN, FOOTER_SLOTS_MAX)
    }

    pub fn split_ratio(&self) -> f32 { clamp_ratio(self.ratio, SPLIT_RATIO_MIN, SPLIT_RATIO_MAX, SPLIT_RATIO_DEFAULT) }

    pub fn sidebar_ratio(&self) -> f32 {
        clamp_ratio(self.ratio, SIDEBAR_RATIO_MIN, SIDEBAR_RATIO_MAX, SIDEBAR_RATIO_DEFAULT)
    }

    /// Column proportions normalized to sum to 1.0.
    ///
    /// Negative or non-finite members, or a non-positive sum, fall back to
    /// [`THREE_COLUMN_DEFAULT`].
    pub fn column_ratios(&self) -> [f32; 3] {
        let raw = match self.ratios {
            Some(r) if r.iter().all(|v| v.is_finite() && *v >= 0.0) => r,
            _ => THREE_COLUMN_DEFAULT,
        };
        let sum: f32 = raw.iter().sum();
        if sum <= 0.0 || !sum.is_finite() {
            return normalize(THREE_COLUMN_DEFAULT);
        }
        normalize(raw)
    }
}

fn normalize(r: [f32; 3]) -> [f32; 3] {
    let sum: f32 = r.iter().sum();
    [r[0] / sum, r[1] / sum, r[2] / sum]
}

fn clamp_ratio(
    value: Option<f32>,
    min: f32,
    max: f32,
    default: f32,
) -> f32 {
    match value {
        Some(v) if v.is_finite() => v.clamp(min, max),
        _ => default,
    }
}

// =============================================================================
// Geometry
// =============================================================================

/// Partition a `width` x `height` canvas into the slot rectangles of `layout`.
///
/// The result length always equals `layout.slot_count(options)`. On a canvas
/// too small to hold the gutters, rectangles collapse to zero size instead of
/// wrapping around.
pub fn compute(
    layout: LayoutType,
    options: &LayoutOptions,
    width: u32,
    height: u32,
) -> Slots {
    let mut slots = Slots::new();
    if let Some((cols, rows)) = layout.grid() {
        grid(&mut slots, cols, rows, width, height);
        return slots;
    }

    match layout {
        LayoutType::Hero => hero(&mut slots, options.hero_ratio(), options.footer_slots(), width, height),
        LayoutType::Split => split(&mut slots, options.split_ratio(), options.horizontal, width, height),
        LayoutType::ThreeColumn => three_column(&mut slots, options.column_ratios(), width, height),
        LayoutType::Fullscreen => {
            push(&mut slots, PADDING, PADDING, inner(width, 0), inner(height, 0));
        }
        LayoutType::SidebarLeft => sidebar(&mut slots, options.sidebar_ratio(), true, width, height),
        LayoutType::SidebarRight => sidebar(&mut slots, options.sidebar_ratio(), false, width, height),
        LayoutType::HeroCornerTl => corner_hero(&mut slots, true, true, width, height),
        LayoutType::HeroCornerTr => corner_hero(&mut slots, false, true, width, height),
        LayoutType::HeroCornerBl => corner_hero(&mut slots, true, false, width, height),
        LayoutType::HeroCornerBr => corner_hero(&mut slots, false, false, width, height),
        LayoutType::HeroSimple => hero(&mut slots, options.hero_simple_ratio(), 1, width, height),
        LayoutType::ThreeRow => three_row(&mut slots, options.column_ratios(), width, height),
        // Grids are handled above
        LayoutType::Grid2x2 | LayoutType::Grid2x3 | LayoutType::Grid3x2 | LayoutType::Grid3x3 => {}
    }
    slots
}

/// Space left on one axis after padding and `gaps` gutters.
#[inline]
const fn inner(
    extent: u32,
    gaps: u32,
) -> u32 {
    extent.saturating_sub(2 * PADDING + gaps * GAP)
}

#[inline]
fn push(
    slots: &mut Slots,
    x: u32,
    y: u32,
    w: u32,
    h: u32,
) {
    // Capacity is guaranteed by MAX_SLOTS and the slot_count table
    let _ = slots.push(Rectangle::new(Point::new(x as i32, y as i32), Size::new(w, h)));
}

fn grid(
    slots: &mut Slots,
    cols: u32,
    rows: u32,
    width: u32,
    height: u32,
) {
    let cell_w = inner(width, cols - 1) / cols;
    let cell_h = inner(height, rows - 1) / rows;
    for row in 0..rows {
        for col in 0..cols {
            push(slots, PADDING + col * (cell_w + GAP), PADDING + row * (cell_h + GAP), cell_w, cell_h);
        }
    }
}

fn hero(
    slots: &mut Slots,
    ratio: f32,
    footer_slots: u32,
    width: u32,
    height: u32,
) {
    let avail_w = inner(width, 0);
    let avail_h = inner(height, 1);
    let hero_h = (avail_h as f32 * ratio) as u32;
    let footer_h = avail_h - hero_h;
    push(slots, PADDING, PADDING, avail_w, hero_h);

    let footer_y = PADDING + hero_h + GAP;
    let col_w = avail_w.saturating_sub((footer_slots - 1) * GAP) / footer_slots;
    for i in 0..footer_slots {
        push(slots, PADDING + i * (col_w + GAP), footer_y, col_w, footer_h);
    }
}

fn split(
    slots: &mut Slots,
    ratio: f32,
    horizontal: bool,
    width: u32,
    height: u32,
) {
    if horizontal {
        let avail_w = inner(width, 0);
        let avail_h = inner(height, 1);
        let top_h = (avail_h as f32 * ratio) as u32;
        push(slots, PADDING, PADDING, avail_w, top_h);
        push(slots, PADDING, PADDING + top_h + GAP, avail_w, avail_h - top_h);
    } else {
        let avail_w = inner(width, 1);
        let avail_h = inner(height, 0);
        let left_w = (avail_w as f32 * ratio) as u32;
        push(slots, PADDING, PADDING, left_w, avail_h);
        push(slots, PADDING + left_w + GAP, PADDING, avail_w - left_w, avail_h);
    }
}

fn three_column(
    slots: &mut Slots,
    ratios: [f32; 3],
    width: u32,
    height: u32,
) {
    let avail_w = inner(width, 2);
    let avail_h = inner(height, 0);
    let w0 = (avail_w as f32 * ratios[0]) as u32;
    let w1 = ((avail_w as f32 * ratios[1]) as u32).min(avail_w - w0);
    let w2 = avail_w - w0 - w1;

    let mut x = PADDING;
    for w in [w0, w1, w2] {
        push(slots, x, PADDING, w, avail_h);
        x += w + GAP;
    }
}

fn three_row(
    slots: &mut Slots,
    ratios: [f32; 3],
    width: u32,
    height: u32,
) {
    let avail_w = inner(width, 0);
    let avail_h = inner(height, 2);
    let h0 = (avail_h as f32 * ratios[0]) as u32;
    let h1 = ((avail_h as f32 * ratios[1]) as u32).min(avail_h - h0);
    let h2 = avail_h - h0 - h1;

    let mut y = PADDING;
    for h in [h0, h1, h2] {
        push(slots, PADDING, y, avail_w, h);
        y += h + GAP;
    }
}

/// Hero panel in one corner, two stacked cells beside it and a row of three
/// across the opposite edge.
fn corner_hero(
    slots: &mut Slots,
    hero_left: bool,
    hero_top: bool,
    width: u32,
    height: u32,
) {
    let avail_w = inner(width, 0);
    let avail_h = inner(height, 0);
    let hero_w = (avail_w.saturating_sub(GAP) as f32 * CORNER_HERO_RATIO) as u32;
    let hero_h = (avail_h.saturating_sub(GAP) as f32 * CORNER_HERO_RATIO) as u32;
    let side_w = avail_w.saturating_sub(hero_w + GAP);
    let band_h = avail_h.saturating_sub(hero_h + GAP);
    let side_h = hero_h.saturating_sub(GAP) / 2;
    let cell_w = avail_w.saturating_sub(2 * GAP) / 3;

    let (hero_y, band_y) = if hero_top { (PADDING, PADDING + hero_h + GAP) } else { (PADDING + band_h + GAP, PADDING) };
    let (hero_x, side_x) = if hero_left { (PADDING, PADDING + hero_w + GAP) } else { (PADDING + side_w + GAP, PADDING) };

    let band = |slots: &mut Slots| {
        for i in 0..3 {
            push(slots, PADDING + i * (cell_w + GAP), band_y, cell_w, band_h);
        }
    };

    if !hero_top {
        band(slots);
    }
    // Only the top-left variant lists its hero ahead of the side cells
    if hero_left && hero_top {
        push(slots, hero_x, hero_y, hero_w, hero_h);
        push(slots, side_x, hero_y, side_w, side_h);
    } else {
        push(slots, side_x, hero_y, side_w, side_h);
        push(slots, hero_x, hero_y, hero_w, hero_h);
    }
    push(slots, side_x, hero_y + side_h + GAP, side_w, hero_h.saturating_sub(side_h + GAP));
    if hero_top {
        band(slots);
    }
}

/// Wide panel plus three stacked rows. `main_left` puts the wide panel first.
fn sidebar(
    slots: &mut Slots,
    ratio: f32,
    main_left: bool,
    width: u32,
    height: u32,
) {
    let avail_w = inner(width, 1);
    let avail_h = inner(height, 0);
    let main_w = (avail_w as f32 * ratio) as u32;
    let side_w = avail_w - main_w;
    let row_h = avail_h.saturating_sub(2 * GAP) / 3;

    let (main_x, side_x) = if main_left {
        (PADDING, PADDING + main_w + GAP)
    } else {
        (PADDING + side_w + GAP, PADDING)
    };

    if main_left {
        push(slots, main_x, PADDING, main_w, avail_h);
    }
    for i in 0..3 {
        push(slots, side_x, PADDING + i * (row_h + GAP), side_w, row_h);
    }
    if !main_left {
        push(slots, main_x, PADDING, main_w, avail_h);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const W: u32 = 240;
    const H: u32 = 240;

    fn area(r: &Rectangle) -> u32 { r.size.width * r.size.height }

    fn assert_well_formed(
        layout: LayoutType,
        options: &LayoutOptions,
    ) {
        let slots = compute(layout, options, W, H);
        assert_eq!(slots.len(), layout.slot_count(options), "{layout}: slot count");

        let canvas = Rectangle::new(Point::zero(), Size::new(W, H));
        for (i, rect) in slots.iter().enumerate() {
            assert!(rect.size.width > 0 && rect.size.height > 0, "{layout}: slot {i} is empty");
            assert_eq!(canvas.intersection(rect), *rect, "{layout}: slot {i} leaves the canvas");
        }

        for (i, a) in slots.iter().enumerate() {
            for (j, b) in slots.iter().enumerate().skip(i + 1) {
                assert_eq!(area(&a.intersection(b)), 0, "{layout}: slots {i} and {j} overlap");
            }
        }
    }

    fn boundary_options() -> [LayoutOptions; 10] {
        [
            LayoutOptions::default(),
            LayoutOptions { hero_ratio: Some(HERO_RATIO_MIN), ..Default::default() },
            LayoutOptions { hero_ratio: Some(HERO_RATIO_MAX), ..Default::default() },
            LayoutOptions { footer_slots: Some(FOOTER_SLOTS_MIN), ..Default::default() },
            LayoutOptions { footer_slots: Some(FOOTER_SLOTS_MAX), ..Default::default() },
            LayoutOptions { ratio: Some(SPLIT_RATIO_MIN), ..Default::default() },
            LayoutOptions { ratio: Some(SPLIT_RATIO_MAX), ..Default::default() },
            LayoutOptions { ratio: Some(SPLIT_RATIO_MIN), horizontal: true, ..Default::default() },
            LayoutOptions { ratio: Some(SPLIT_RATIO_MAX), horizontal: true, ..Default::default() },
            LayoutOptions { ratios: Some([1.0, 0.0, 3.0]), ..Default::default() },
        ]
    }

    #[test]
    fn test_every_layout_well_formed_at_boundaries() {
        for layout in LayoutType::ALL {
            for options in &boundary_options() {
                let proportional = matches!(layout, LayoutType::ThreeColumn | LayoutType::ThreeRow);
                if proportional && options.ratios == Some([1.0, 0.0, 3.0]) {
                    // Zero-sized middle band is legal but empty
                    continue;
                }
                assert_well_formed(layout, options);
            }
        }
    }

    #[test]
    fn test_out_of_range_options_are_clamped() {
        let wild = LayoutOptions {
            hero_ratio: Some(5.0),
            footer_slots: Some(0),
            ratio: Some(-3.0),
            horizontal: false,
            ratios: Some([f32::NAN, 1.0, 1.0]),
        };
        assert_eq!(wild.hero_ratio(), HERO_RATIO_MAX);
        assert_eq!(wild.footer_slots(), FOOTER_SLOTS_MIN);
        assert_eq!(wild.split_ratio(), SPLIT_RATIO_MIN);
        assert_eq!(wild.sidebar_ratio(), SIDEBAR_RATIO_MIN);
        for layout in LayoutType::ALL {
            assert_well_formed(layout, &wild);
        }

        let many = LayoutOptions { footer_slots: Some(99), ..Default::default() };
        assert_eq!(LayoutType::Hero.slot_count(&many), 1 + FOOTER_SLOTS_MAX as usize);
    }

    #[test]
    fn test_grid_2x2_geometry() {
        let slots = compute(LayoutType::Grid2x2, &LayoutOptions::default(), W, H);
        // (240 - 16 - 8) / 2 = 108
        assert_eq!(slots[0], Rectangle::new(Point::new(8, 8), Size::new(108, 108)));
        assert_eq!(slots[1], Rectangle::new(Point::new(124, 8), Size::new(108, 108)));
        assert_eq!(slots[3], Rectangle::new(Point::new(124, 124), Size::new(108, 108)));
    }

    #[test]
    fn test_grid_slot_order_is_row_major() {
        let slots = compute(LayoutType::Grid3x3, &LayoutOptions::default(), W, H);
        assert!(slots[0].top_left.x < slots[1].top_left.x);
        assert_eq!(slots[0].top_left.y, slots[2].top_left.y);
        assert!(slots[3].top_left.y > slots[2].top_left.y);
    }

    #[test]
    fn test_grid_2x3_slots_are_tall() {
        let slots = compute(LayoutType::Grid2x3, &LayoutOptions::default(), W, H);
        assert_eq!(slots[0].size, Size::new(69, 108));
        assert_eq!(slots[3].top_left.y, slots[4].top_left.y);
        let slots = compute(LayoutType::Grid3x2, &LayoutOptions::default(), W, H);
        assert_eq!(slots[0].size, Size::new(108, 69));
    }

    #[test]
    fn test_hero_default_geometry() {
        let slots = compute(LayoutType::Hero, &LayoutOptions::default(), W, H);
        assert_eq!(slots.len(), 4);
        // avail_h = 240 - 16 - 8 = 216, hero = 216 * 0.7 = 151
        assert_eq!(slots[0].size, Size::new(224, 151));
        assert_eq!(slots[1].top_left.y, 8 + 151 + 8);
        assert_eq!(slots[1].size.height, 216 - 151);
        // Footer columns share the width equally
        assert_eq!(slots[1].size.width, slots[3].size.width);
    }

    #[test]
    fn test_split_orientation() {
        let side = compute(LayoutType::Split, &LayoutOptions::default(), W, H);
        assert_eq!(side[0].top_left.y, side[1].top_left.y);
        assert!(side[1].top_left.x > side[0].top_left.x);

        let stacked = compute(
            LayoutType::Split,
            &LayoutOptions { horizontal: true, ratio: Some(0.25), ..Default::default() },
            W,
            H,
        );
        assert_eq!(stacked[0].top_left.x, stacked[1].top_left.x);
        assert!(stacked[0].size.height < stacked[1].size.height);
    }

    #[test]
    fn test_three_column_ratios_normalized() {
        let opts = LayoutOptions { ratios: Some([2.0, 1.0, 1.0]), ..Default::default() };
        assert_eq!(opts.column_ratios(), [0.5, 0.25, 0.25]);

        let slots = compute(LayoutType::ThreeColumn, &opts, W, H);
        // avail = 240 - 16 - 16 = 208
        assert_eq!(slots[0].size.width, 104);
        assert_eq!(slots[1].size.width, 52);
        assert_eq!(slots[2].size.width, 52);
    }

    #[test]
    fn test_three_column_invalid_ratios_use_default() {
        let zero = LayoutOptions { ratios: Some([0.0, 0.0, 0.0]), ..Default::default() };
        let negative = LayoutOptions { ratios: Some([-1.0, 1.0, 1.0]), ..Default::default() };
        let default = LayoutOptions::default().column_ratios();
        assert_eq!(zero.column_ratios(), default);
        assert_eq!(negative.column_ratios(), default);
        let sum: f32 = default.iter().sum();
        assert!(sum > 0.999_999 && sum < 1.000_001);
    }

    #[test]
    fn test_sidebar_main_panel_position() {
        let left = compute(LayoutType::SidebarLeft, &LayoutOptions::default(), W, H);
        assert_eq!(left[0].top_left, Point::new(8, 8));
        assert!(left[0].size.width > left[1].size.width);

        let right = compute(LayoutType::SidebarRight, &LayoutOptions::default(), W, H);
        assert_eq!(right[0].top_left, Point::new(8, 8));
        assert!(right[3].size.width > right[0].size.width);
        assert!(right[3].top_left.x > right[0].top_left.x);
    }

    #[test]
    fn test_corner_hero_geometry() {
        let tl = compute(LayoutType::HeroCornerTl, &LayoutOptions::default(), W, H);
        // (224 - 8) * 0.67 = 144
        assert_eq!(tl[0], Rectangle::new(Point::new(8, 8), Size::new(144, 144)));
        assert_eq!(tl[1], Rectangle::new(Point::new(160, 8), Size::new(72, 68)));
        assert_eq!(tl[2].top_left, Point::new(160, 84));
        assert_eq!(tl[3], Rectangle::new(Point::new(8, 160), Size::new(69, 72)));
        assert_eq!(tl[5].top_left.x, 8 + 2 * (69 + 8));
    }

    #[test]
    fn test_corner_hero_slot_order() {
        let hero_at = |layout: LayoutType| {
            let slots = compute(layout, &LayoutOptions::default(), W, H);
            slots.iter().position(|r| r.size.width == 144).unwrap()
        };
        assert_eq!(hero_at(LayoutType::HeroCornerTl), 0);
        assert_eq!(hero_at(LayoutType::HeroCornerTr), 1);
        assert_eq!(hero_at(LayoutType::HeroCornerBl), 4);
        assert_eq!(hero_at(LayoutType::HeroCornerBr), 4);

        let tr = compute(LayoutType::HeroCornerTr, &LayoutOptions::default(), W, H);
        assert_eq!(tr[0].top_left, Point::new(8, 8));
        assert_eq!(tr[1].top_left, Point::new(88, 8));

        let br = compute(LayoutType::HeroCornerBr, &LayoutOptions::default(), W, H);
        assert_eq!(br[0].top_left, Point::new(8, 8));
        assert_eq!(br[3].top_left, Point::new(8, 88));
        assert_eq!(br[4].top_left, Point::new(88, 88));
        assert_eq!(br[5].top_left, Point::new(8, 164));
    }

    #[test]
    fn test_hero_simple_has_full_width_footer() {
        let slots = compute(LayoutType::HeroSimple, &LayoutOptions::default(), W, H);
        assert_eq!(slots.len(), 2);
        // 216 * 0.66 = 142
        assert_eq!(slots[0].size, Size::new(224, 142));
        assert_eq!(slots[1], Rectangle::new(Point::new(8, 158), Size::new(224, 74)));

        let tall = LayoutOptions { hero_ratio: Some(0.8), ..Default::default() };
        assert!(compute(LayoutType::HeroSimple, &tall, W, H)[0].size.height > slots[0].size.height);
    }

    #[test]
    fn test_three_row_stacks_full_width_rows() {
        let opts = LayoutOptions { ratios: Some([2.0, 1.0, 1.0]), ..Default::default() };
        let slots = compute(LayoutType::ThreeRow, &opts, W, H);
        // avail = 240 - 16 - 16 = 208
        assert_eq!(slots[0], Rectangle::new(Point::new(8, 8), Size::new(224, 104)));
        assert_eq!(slots[1], Rectangle::new(Point::new(8, 120), Size::new(224, 52)));
        assert_eq!(slots[2], Rectangle::new(Point::new(8, 180), Size::new(224, 52)));
    }

    #[test]
    fn test_parse_tags() {
        for layout in LayoutType::ALL {
            assert_eq!(layout.tag().parse::<LayoutType>(), Ok(layout));
        }
        assert_eq!("GRID_2X2".parse::<LayoutType>(), Ok(LayoutType::Grid2x2));
        assert_eq!("Hero_Corner_BR".parse::<LayoutType>(), Ok(LayoutType::HeroCornerBr));
        assert_eq!("mosaic".parse::<LayoutType>(), Err(UnknownLayout));
        assert_eq!("".parse::<LayoutType>(), Err(UnknownLayout));
    }

    #[test]
    fn test_tiny_canvas_does_not_underflow() {
        for layout in LayoutType::ALL {
            let opts = LayoutOptions::default();
            let slots = compute(layout, &opts, 10, 10);
            assert_eq!(slots.len(), layout.slot_count(&opts));
        }
    }
}
