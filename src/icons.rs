//! Icon catalog.
//!
//! Icons are 16x16 one-bit glyphs from `data/icons.json`, compiled into the
//! binary and parsed once per process. Names are normalized before lookup, so
//! `mdi:Weather_Sunny`, `weather sunny` and `weather-sunny` are the same icon.
//! Unknown and empty names resolve to a neutral fallback glyph.
//!
//! # Dataset Format
//!
//! ```json
//! { "version": "2026.10.1", "icons": { "eye": { "rows": ["....##....", ...] } } }
//! ```
//!
//! Each icon has 16 rows of 16 characters, `#` for ink.

use std::collections::HashMap;
use std::sync::OnceLock;

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use serde::Deserialize;
use tracing::warn;

/// Glyph edge length in pixels at scale 1.
pub const GLYPH_SIZE: u32 = 16;

/// Name of the fallback glyph.
pub const FALLBACK_ICON: &str = "help-circle";

const BUNDLED: &str = include_str!("../data/icons.json");

// Outlined circle with a question mark, used when the dataset is unusable
const FALLBACK_ROWS: [u16; 16] = [
    0b0000011111100000,
    0b0001100000011000,
    0b0010000000000100,
    0b0100001111000010,
    0b0100010000100010,
    0b1000000000100001,
    0b1000000001000001,
    0b1000000010000001,
    0b1000000010000001,
    0b1000000000000001,
    0b1000000010000001,
    0b0100000010000010,
    0b0100000000000010,
    0b0010000000000100,
    0b0001100000011000,
    0b0000011111100000,
];

// =============================================================================
// Glyph
// =============================================================================

/// One-bit 16x16 bitmap; bit 15 of each row is the leftmost pixel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Glyph {
    rows: [u16; 16],
}

impl Glyph {
    pub const fn from_rows(rows: [u16; 16]) -> Self { Self { rows } }

    pub const fn fallback() -> Self { Self::from_rows(FALLBACK_ROWS) }

    /// Parse 16 rows of 16 characters. Returns `None` on any other shape.
    fn parse(rows: &[String]) -> Option<Self> {
        if rows.len() != GLYPH_SIZE as usize {
            return None;
        }
        let mut bits = [0u16; 16];
        for (out, row) in bits.iter_mut().zip(rows) {
            if row.chars().count() != GLYPH_SIZE as usize {
                return None;
            }
            *out = row.chars().fold(0u16, |acc, c| (acc << 1) | u16::from(c == '#'));
        }
        Some(Self { rows: bits })
    }

    #[inline]
    pub fn is_set(
        &self,
        x: u32,
        y: u32,
    ) -> bool {
        x < GLYPH_SIZE && y < GLYPH_SIZE && self.rows[y as usize] & (0x8000 >> x) != 0
    }

    /// Draw with each glyph pixel as a `scale` x `scale` block.
    pub fn draw<D>(
        &self,
        target: &mut D,
        top_left: Point,
        scale: u32,
        color: Rgb565,
    ) where
        D: DrawTarget<Color = Rgb565>,
    {
        let scale = scale.max(1);
        for y in 0..GLYPH_SIZE {
            for x in 0..GLYPH_SIZE {
                if self.is_set(x, y) {
                    let corner = top_left + Point::new((x * scale) as i32, (y * scale) as i32);
                    target.fill_solid(&Rectangle::new(corner, Size::new(scale, scale)), color).ok();
                }
            }
        }
    }

    /// Draw centered in `area` at the largest integer scale that fits, capped at `max_scale`.
    pub fn draw_centered<D>(
        &self,
        target: &mut D,
        area: Rectangle,
        max_scale: u32,
        color: Rgb565,
    ) where
        D: DrawTarget<Color = Rgb565>,
    {
        let fit = area.size.width.min(area.size.height) / GLYPH_SIZE;
        let scale = fit.clamp(1, max_scale.max(1));
        let side = GLYPH_SIZE * scale;
        let offset = Point::new(
            (area.size.width as i32 - side as i32) / 2,
            (area.size.height as i32 - side as i32) / 2,
        );
        self.draw(target, area.top_left + offset, scale, color);
    }
}

// =============================================================================
// Catalog
// =============================================================================

#[derive(Deserialize)]
struct Dataset {
    version: String,
    icons: HashMap<String, IconEntry>,
}

#[derive(Deserialize)]
struct IconEntry {
    rows: Vec<String>,
}

/// Read-only icon lookup.
#[derive(Debug)]
pub struct IconCatalog {
    version: String,
    glyphs: HashMap<String, Glyph>,
    fallback: Glyph,
}

impl IconCatalog {
    /// The catalog bundled with the binary, parsed on first use.
    pub fn bundled() -> &'static Self {
        static CATALOG: OnceLock<IconCatalog> = OnceLock::new();
        CATALOG.get_or_init(|| {
            Self::from_json(BUNDLED).unwrap_or_else(|err| {
                warn!(error = %err, "bundled icon dataset is invalid, only the fallback glyph is available");
                Self::empty()
            })
        })
    }

    /// Catalog holding only the fallback glyph.
    pub fn empty() -> Self { Self { version: String::new(), glyphs: HashMap::new(), fallback: Glyph::fallback() } }

    /// Parse a dataset. Malformed entries are skipped with a warning.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let dataset: Dataset = serde_json::from_str(json)?;
        let mut glyphs = HashMap::with_capacity(dataset.icons.len());
        for (name, entry) in dataset.icons {
            match Glyph::parse(&entry.rows) {
                Some(glyph) => {
                    glyphs.insert(normalize(&name), glyph);
                }
                None => warn!(icon = %name, "skipping malformed icon"),
            }
        }
        let fallback = glyphs.get(FALLBACK_ICON).copied().unwrap_or_else(Glyph::fallback);
        Ok(Self { version: dataset.version, glyphs, fallback })
    }

    pub fn version(&self) -> &str { &self.version }

    pub fn len(&self) -> usize { self.glyphs.len() }

    pub fn is_empty(&self) -> bool { self.glyphs.is_empty() }

    pub fn contains(
        &self,
        name: &str,
    ) -> bool {
        self.glyphs.contains_key(&normalize(name))
    }

    /// Look up an icon; unknown or empty names give the fallback glyph.
    pub fn resolve(
        &self,
        name: &str,
    ) -> Glyph {
        self.glyphs.get(&normalize(name)).copied().unwrap_or(self.fallback)
    }
}

/// Lowercase, strip an `mdi:` prefix, and map `_` and spaces to `-`.
pub fn normalize(name: &str) -> String {
    let lower = name.trim().to_ascii_lowercase();
    let bare = lower.strip_prefix("mdi:").unwrap_or(&lower);
    bare.trim().chars().map(|c| if c == '_' || c == ' ' { '-' } else { c }).collect()
}

/// Icon for a weather condition string.
pub fn icon_for_condition(condition: &str) -> &'static str {
    match condition.trim().to_ascii_lowercase().as_str() {
        "clear-night" => "weather-night",
        "partlycloudy" | "partly-cloudy" => "weather-partly-cloudy",
        "cloudy" => "weather-cloudy",
        "rainy" => "weather-rainy",
        "pouring" => "weather-pouring",
        "snowy" | "snowy-rainy" | "hail" => "weather-snowy",
        "fog" => "weather-fog",
        "windy" | "windy-variant" => "weather-windy",
        "lightning" | "lightning-rainy" => "weather-lightning",
        "exceptional" => "alert",
        _ => "weather-sunny",
    }
}

/// Default icon for an entity id, by domain.
pub fn icon_for_entity(entity_id: &str) -> &'static str {
    let domain = entity_id.split('.').next().unwrap_or_default();
    match domain {
        "light" => "lightbulb",
        "switch" | "input_boolean" => "power",
        "lock" => "lock",
        "media_player" => "music",
        "weather" => "weather-partly-cloudy",
        "climate" => "thermostat",
        "fan" => "fan",
        "binary_sensor" => "check",
        "person" | "device_tracker" => "home",
        "cover" => "door",
        "camera" => "camera",
        _ => "eye",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Canvas;
    use smalltv_common::colors::{BLACK, WHITE};

    #[test]
    fn test_bundled_catalog_loads() {
        let catalog = IconCatalog::bundled();
        assert!(!catalog.version().is_empty());
        assert!(catalog.len() > 20);
        assert!(catalog.contains(FALLBACK_ICON));
    }

    #[test]
    fn test_lookup_is_normalized() {
        let catalog = IconCatalog::bundled();
        let sunny = catalog.resolve("weather-sunny");
        assert_eq!(catalog.resolve("mdi:weather-sunny"), sunny);
        assert_eq!(catalog.resolve("MDI:Weather_Sunny"), sunny);
        assert_eq!(catalog.resolve(" weather sunny "), sunny);
        assert_ne!(sunny, catalog.resolve(FALLBACK_ICON));
    }

    #[test]
    fn test_unknown_and_empty_resolve_to_fallback() {
        let catalog = IconCatalog::bundled();
        let fallback = catalog.resolve(FALLBACK_ICON);
        assert_eq!(catalog.resolve("no-such-icon"), fallback);
        assert_eq!(catalog.resolve(""), fallback);
        assert_eq!(catalog.resolve("mdi:"), fallback);
    }

    #[test]
    fn test_malformed_dataset_keeps_fallback() {
        assert!(IconCatalog::from_json("not json").is_err());

        let catalog = IconCatalog::from_json(r##"{"version": "t", "icons": {"short": {"rows": ["#"]}}}"##).unwrap();
        assert!(catalog.is_empty());
        assert_eq!(catalog.resolve("short"), Glyph::fallback());
        assert_eq!(IconCatalog::empty().resolve("anything"), Glyph::fallback());
    }

    #[test]
    fn test_glyph_bits() {
        let glyph = Glyph::fallback();
        assert!(!glyph.is_set(0, 0));
        assert!(glyph.is_set(5, 0));
        assert!(glyph.is_set(0, 5));
        assert!(!glyph.is_set(16, 0));
    }

    #[test]
    fn test_draw_scaled() {
        let mut canvas = Canvas::new(40, 40);
        Glyph::fallback().draw(&mut canvas, Point::new(0, 0), 2, WHITE);
        // Glyph pixel (5, 0) covers canvas (10..12, 0..2)
        assert_eq!(canvas.pixel(Point::new(10, 0)), Some(WHITE));
        assert_eq!(canvas.pixel(Point::new(11, 1)), Some(WHITE));
        assert_eq!(canvas.pixel(Point::new(0, 0)), Some(BLACK));
    }

    #[test]
    fn test_draw_centered_picks_scale() {
        let mut canvas = Canvas::new(40, 40);
        Glyph::fallback().draw_centered(&mut canvas, Rectangle::new(Point::zero(), Size::new(40, 40)), 4, WHITE);
        // 40 / 16 = 2, side 32, offset 4: glyph pixel (0, 5) lands at (4, 14)
        assert_eq!(canvas.pixel(Point::new(4, 14)), Some(WHITE));
    }

    #[test]
    fn test_condition_and_domain_icons_exist() {
        let catalog = IconCatalog::bundled();
        for condition in ["sunny", "clear-night", "partlycloudy", "cloudy", "rainy", "pouring", "snowy", "fog", "windy", "lightning", "exceptional", "hail"] {
            assert!(catalog.contains(icon_for_condition(condition)), "{condition}");
        }
        for entity in ["light.a", "switch.a", "lock.a", "media_player.a", "weather.a", "climate.a", "fan.a", "binary_sensor.a", "person.a", "cover.a", "sensor.a"] {
            assert!(catalog.contains(icon_for_entity(entity)), "{entity}");
        }
    }
}
