//! Widget size variants.
//!
//! Widgets adapt to their slot by picking one of six fixed variants. A slot
//! is measured in base cell units (`round(dimension / unit)`, at least 1 per
//! axis) and the widget's [`SizeTable`] lists which variants it has a layout
//! for. Selection picks the largest listed variant whose footprint fits the
//! measured span, or the smallest listed variant when none fits.
//!
//! With the default 56 px unit on a 240 px canvas:
//!
//! | Slot | Pixels | Span | Variant |
//! |------|--------|------|---------|
//! | `grid_3x3` | 69 x 69 | 1x1 | `1x1` |
//! | `grid_2x3` | 69 x 108 | 1x2 | `1x2` |
//! | `grid_3x2` | 108 x 69 | 2x1 | `2x1` |
//! | `grid_2x2` | 108 x 108 | 2x2 | `2x2` |
//! | `hero` main | 224 x 151 | 4x3 | `3x3` |
//!
//! Variant names are `<columns>x<rows>`.

use core::fmt;

use embedded_graphics::prelude::Size;

/// Default base cell unit in pixels.
pub const DEFAULT_UNIT_PX: u32 = 56;

/// Fixed set of widget size variants, ordered smallest to largest.
///
/// Ordering is by cell area, then by column count, so `2x1` ranks above `1x2`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SizeVariant {
    S1x1,
    S1x2,
    S2x1,
    S2x2,
    S2x3,
    S3x3,
}

impl SizeVariant {
    pub const ALL: [Self; 6] = [Self::S1x1, Self::S1x2, Self::S2x1, Self::S2x2, Self::S2x3, Self::S3x3];

    pub const fn cols(self) -> u32 {
        match self {
            Self::S1x1 | Self::S1x2 => 1,
            Self::S2x1 | Self::S2x2 | Self::S2x3 => 2,
            Self::S3x3 => 3,
        }
    }

    pub const fn rows(self) -> u32 {
        match self {
            Self::S1x1 | Self::S2x1 => 1,
            Self::S1x2 | Self::S2x2 => 2,
            Self::S2x3 | Self::S3x3 => 3,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::S1x1 => "1x1",
            Self::S1x2 => "1x2",
            Self::S2x1 => "2x1",
            Self::S2x2 => "2x2",
            Self::S2x3 => "2x3",
            Self::S3x3 => "3x3",
        }
    }

    /// True for variants with only one cell row (short slots).
    #[inline]
    pub const fn is_short(self) -> bool { self.rows() == 1 }

    /// True for the single-cell variant.
    #[inline]
    pub const fn is_compact(self) -> bool { matches!(self, Self::S1x1) }

    #[inline]
    const fn fits(
        self,
        span: CellSpan,
    ) -> bool {
        self.cols() <= span.cols && self.rows() <= span.rows
    }
}

impl fmt::Display for SizeVariant {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A slot measured in base cell units.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellSpan {
    pub cols: u32,
    pub rows: u32,
}

impl CellSpan {
    /// Measure `size` in cells of `unit_px`, rounding to nearest, minimum 1.
    pub const fn of(
        size: Size,
        unit_px: u32,
    ) -> Self {
        let unit = if unit_px == 0 { 1 } else { unit_px };
        Self { cols: cells(size.width, unit), rows: cells(size.height, unit) }
    }
}

#[inline]
const fn cells(
    px: u32,
    unit: u32,
) -> u32 {
    let n = (px + unit / 2) / unit;
    if n == 0 { 1 } else { n }
}

/// Breakpoint table: base unit plus the variants a widget supports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SizeTable {
    pub unit_px: u32,
    pub variants: &'static [SizeVariant],
}

impl SizeTable {
    /// Every variant at the default unit.
    pub const ALL: Self = Self::new(&SizeVariant::ALL);

    pub const fn new(variants: &'static [SizeVariant]) -> Self { Self { unit_px: DEFAULT_UNIT_PX, variants } }

    /// Same variants measured against a different base unit.
    #[must_use]
    pub const fn with_unit(
        self,
        unit_px: u32,
    ) -> Self {
        Self { unit_px, variants: self.variants }
    }

    /// Pick the variant for a slot of `size` pixels.
    pub fn select(
        &self,
        size: Size,
    ) -> SizeVariant {
        let span = CellSpan::of(size, self.unit_px);
        let fitting = self.variants.iter().copied().filter(|v| v.fits(span)).max();
        fitting.or_else(|| self.variants.iter().copied().min()).unwrap_or(SizeVariant::S1x1)
    }
}
