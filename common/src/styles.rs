//! Font tiers and pre-computed text styles.
//!
//! Widgets never pick a font directly. They ask for a [`FontTier`] and, when
//! the text is dynamic, let [`FontTier::fit`] step down from the preferred
//! tier until the string fits its rectangle.
//!
//! All glyphs are monospaced, so text width is a pure function of the
//! character count:
//!
//! ```ignore
//! width = chars * (glyph_width + spacing) - spacing
//! ```
//!
//! Styles that only vary by alignment are `const` so they live in read-only
//! data. Styles that need a runtime color are built with
//! `MonoTextStyle::new(tier.font(), color)`.

use embedded_graphics::{
    mono_font::{MonoFont, MonoTextStyle, ascii::FONT_6X10},
    pixelcolor::Rgb565,
    text::{Alignment, Baseline, TextStyle, TextStyleBuilder},
};
use profont::{PROFONT_7_POINT, PROFONT_12_POINT, PROFONT_18_POINT, PROFONT_24_POINT};

use crate::colors::{GRAY, WHITE};

// =============================================================================
// Text Alignment Styles (const - zero runtime cost)
// =============================================================================
//
// Every style anchors on the top of the glyph cell so widgets can stack lines
// by adding `line_height()` without baseline arithmetic.

/// Centered text, `y` is the top of the line.
pub const CENTERED: TextStyle = TextStyleBuilder::new().alignment(Alignment::Center).baseline(Baseline::Top).build();

/// Left-aligned text, `y` is the top of the line.
pub const LEFT_ALIGNED: TextStyle = TextStyleBuilder::new().alignment(Alignment::Left).baseline(Baseline::Top).build();

/// Right-aligned text, `y` is the top of the line.
pub const RIGHT_ALIGNED: TextStyle = TextStyleBuilder::new().alignment(Alignment::Right).baseline(Baseline::Top).build();

/// Centered both ways around the anchor point. Used for single values in a box.
pub const CENTERED_MIDDLE: TextStyle = TextStyleBuilder::new()
    .alignment(Alignment::Center)
    .baseline(Baseline::Middle)
    .build();

// =============================================================================
// Pre-computed Text Styles
// =============================================================================

/// Small white text for labels.
pub const LABEL_STYLE_WHITE: MonoTextStyle<'static, Rgb565> = MonoTextStyle::new(&FONT_6X10, WHITE);

/// Small gray text for secondary labels and units.
pub const LABEL_STYLE_GRAY: MonoTextStyle<'static, Rgb565> = MonoTextStyle::new(&FONT_6X10, GRAY);

/// Tiny gray text for annotations such as chart ranges.
pub const TINY_STYLE_GRAY: MonoTextStyle<'static, Rgb565> = MonoTextStyle::new(&PROFONT_7_POINT, GRAY);

// =============================================================================
// Font Tiers
// =============================================================================

/// Text size tiers, smallest first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum FontTier {
    /// `ProFont` 7pt. Annotations in 1x1 slots.
    Tiny,
    /// 6x10. Labels.
    Small,
    /// `ProFont` 12pt. Body text.
    #[default]
    Regular,
    /// `ProFont` 18pt. Values in medium slots.
    Large,
    /// `ProFont` 24pt. Hero values and the clock.
    XLarge,
}

impl FontTier {
    /// All tiers, largest first (search order for [`FontTier::fit`]).
    pub const DESCENDING: [Self; 5] = [Self::XLarge, Self::Large, Self::Regular, Self::Small, Self::Tiny];

    pub const fn font(self) -> &'static MonoFont<'static> {
        match self {
            Self::Tiny => &PROFONT_7_POINT,
            Self::Small => &FONT_6X10,
            Self::Regular => &PROFONT_12_POINT,
            Self::Large => &PROFONT_18_POINT,
            Self::XLarge => &PROFONT_24_POINT,
        }
    }

    /// One tier down, saturating at [`FontTier::Tiny`].
    pub const fn smaller(self) -> Self {
        match self {
            Self::Tiny | Self::Small => Self::Tiny,
            Self::Regular => Self::Small,
            Self::Large => Self::Regular,
            Self::XLarge => Self::Large,
        }
    }

    /// Height of one line in pixels.
    #[inline]
    pub const fn line_height(self) -> u32 { self.font().character_size.height }

    /// Horizontal advance of one character including spacing.
    #[inline]
    pub const fn advance(self) -> u32 {
        let font = self.font();
        font.character_size.width + font.character_spacing
    }

    /// Rendered width of `chars` characters.
    #[inline]
    pub const fn width_of(
        self,
        chars: usize,
    ) -> u32 {
        if chars == 0 {
            return 0;
        }
        (chars as u32) * self.advance() - self.font().character_spacing
    }

    /// Rendered width of `text`.
    #[inline]
    pub fn text_width(
        self,
        text: &str,
    ) -> u32 {
        self.width_of(text.chars().count())
    }

    /// Number of characters that fit in `width` pixels.
    pub const fn max_chars(
        self,
        width: u32,
    ) -> usize {
        let spacing = self.font().character_spacing;
        ((width + spacing) / self.advance()) as usize
    }

    /// Largest tier not above `preferred` whose rendering of `text` fits in
    /// `max_width` x `max_height`. Falls back to [`FontTier::Tiny`] when
    /// nothing fits; callers truncate in that case.
    pub fn fit(
        text: &str,
        max_width: u32,
        max_height: u32,
        preferred: Self,
    ) -> Self {
        let chars = text.chars().count();
        Self::DESCENDING
            .into_iter()
            .filter(|tier| *tier <= preferred)
            .find(|tier| tier.width_of(chars) <= max_width && tier.line_height() <= max_height)
            .unwrap_or(Self::Tiny)
    }
}
