//! Color constants for the dashboard.
//!
//! # Rgb565 Color Format
//!
//! The canvas stores Rgb565 pixels: 5 bits red, 6 bits green, 5 bits blue.
//! - Red: 0-31 (5 bits)
//! - Green: 0-63 (6 bits)
//! - Blue: 0-31 (5 bits)
//!
//! Frames are expanded to RGB888 only when encoded for upload, so every
//! widget works in the same reduced palette the device panel can show.
//!
//! Where the `RgbColor` trait provides a constant it is used directly; the
//! remaining colors are the dashboard's own accents.

use embedded_graphics::pixelcolor::{Rgb565, Rgb888, RgbColor};

// =============================================================================
// Standard Colors (from RgbColor trait)
// =============================================================================

/// Pure black (0, 0, 0). Canvas background.
pub const BLACK: Rgb565 = Rgb565::BLACK;

/// Pure white (31, 63, 31). Primary text.
pub const WHITE: Rgb565 = Rgb565::WHITE;

/// Pure red (31, 0, 0). "Off" status and critical gauge ranges.
pub const RED: Rgb565 = Rgb565::RED;

/// Pure green (0, 63, 0).
pub const GREEN: Rgb565 = Rgb565::GREEN;

/// Pure blue (0, 0, 31).
pub const BLUE: Rgb565 = Rgb565::BLUE;

/// Pure yellow (31, 63, 0). Clock date line and weather sun.
pub const YELLOW: Rgb565 = Rgb565::YELLOW;

/// Cyan (0, 63, 31). Default accent for values, charts and gauges.
pub const CYAN: Rgb565 = Rgb565::CYAN;

/// Magenta (31, 0, 31).
pub const MAGENTA: Rgb565 = Rgb565::MAGENTA;

// =============================================================================
// Custom Colors (application-specific)
// =============================================================================

/// Orange (31, 32, 0). Warm accents and warning ranges.
pub const ORANGE: Rgb565 = Rgb565::new(31, 32, 0);

/// Lime (12, 63, 0). Default "on" color for status widgets.
pub const LIME: Rgb565 = Rgb565::new(12, 63, 0);

/// Purple (19, 8, 31). Media accent.
pub const PURPLE: Rgb565 = Rgb565::new(19, 8, 31);

/// Teal (0, 40, 20). Weather accent.
pub const TEAL: Rgb565 = Rgb565::new(0, 40, 20);

/// Mid gray (16, 32, 16). Secondary text such as units and labels.
pub const GRAY: Rgb565 = Rgb565::new(16, 32, 16);

/// Dark gray (8, 16, 8). Empty bar tracks and chart baselines.
pub const DARK_GRAY: Rgb565 = Rgb565::new(8, 16, 8);

/// Panel background (3, 6, 4). Slightly lifted from black so panels read as tiles.
pub const PANEL: Rgb565 = Rgb565::new(3, 6, 4);

/// Panel border (6, 12, 7).
pub const PANEL_BORDER: Rgb565 = Rgb565::new(6, 12, 7);

// =============================================================================
// Conversion and Contrast Helpers
// =============================================================================

/// Convert an 8-bit-per-channel color into the canvas format.
#[inline]
pub fn from_rgb8(r: u8, g: u8, b: u8) -> Rgb565 { Rgb565::from(Rgb888::new(r, g, b)) }

/// Expand a canvas color back to 8 bits per channel.
///
/// 5-bit and 6-bit channels are expanded by replicating their high bits into
/// the low bits, so pure white maps to (255, 255, 255) rather than (248, 252, 248).
#[inline]
pub fn to_rgb8(color: Rgb565) -> [u8; 3] {
    let r5 = color.r();
    let g6 = color.g();
    let b5 = color.b();
    [(r5 << 3) | (r5 >> 2), (g6 << 2) | (g6 >> 4), (b5 << 3) | (b5 >> 2)]
}

/// Calculate perceptual luminance from an Rgb565 color.
///
/// Uses ITU-R BT.601 weights: 0.299*R + 0.587*G + 0.114*B
/// Integer approximation: (77*R + 150*G + 29*B) >> 8
#[inline]
pub fn calculate_luminance(color: Rgb565) -> u32 {
    let [r8, g8, b8] = to_rgb8(color);
    (u32::from(r8) * 77 + u32::from(g8) * 150 + u32::from(b8) * 29) >> 8
}

/// Pick readable text color for a given background.
///
/// Returns WHITE for dark backgrounds and BLACK for light backgrounds.
pub fn text_color_for_bg(bg_color: Rgb565) -> Rgb565 {
    let luma = calculate_luminance(bg_color);
    if luma < 128 { WHITE } else { BLACK }
}

/// Scale a color towards black by `percent` (0 = black, 100 = unchanged).
///
/// Used for dimmed tracks behind a colored fill.
pub fn dim(
    color: Rgb565,
    percent: u8,
) -> Rgb565 {
    let p = u16::from(percent.min(100));
    let scale = |c: u8| ((u16::from(c) * p) / 100) as u8;
    Rgb565::new(scale(color.r()), scale(color.g()), scale(color.b()))
}
