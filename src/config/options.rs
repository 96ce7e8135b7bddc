//! Widget option sets.
//!
//! Options arrive as loosely typed key/value pairs. Accessors here are the
//! only place values are interpreted, and none of them fail:
//!
//! - unknown keys are never read, so they are ignored
//! - numbers are clamped to the bounds the caller passes
//! - enum-like strings outside the allowed set fall back to the default
//! - values of the wrong JSON type count as missing

use std::collections::BTreeMap;

use embedded_graphics::pixelcolor::Rgb565;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use smalltv_common::colors::from_rgb8;

/// Ordered option map attached to a slot.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WidgetOptions(BTreeMap<String, Value>);

impl WidgetOptions {
    pub fn new() -> Self { Self::default() }

    /// Builder-style insert, used by samples and tests.
    #[must_use]
    pub fn with(
        mut self,
        key: &str,
        value: impl Into<Value>,
    ) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn get(
        &self,
        key: &str,
    ) -> Option<&Value> {
        self.0.get(key)
    }

    /// Boolean option. Accepts JSON booleans and the strings "true"/"false".
    pub fn flag(
        &self,
        key: &str,
        default: bool,
    ) -> bool {
        match self.0.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) if s.eq_ignore_ascii_case("true") => true,
            Some(Value::String(s)) if s.eq_ignore_ascii_case("false") => false,
            _ => default,
        }
    }

    /// Numeric option clamped to `[min, max]`. Numeric strings are accepted.
    pub fn number(
        &self,
        key: &str,
        default: f64,
        min: f64,
        max: f64,
    ) -> f64 {
        self.raw_number(key).filter(|v| v.is_finite()).unwrap_or(default).clamp(min, max)
    }

    /// Numeric option without bounds.
    pub fn raw_number(
        &self,
        key: &str,
    ) -> Option<f64> {
        match self.0.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// String option restricted to `allowed` (case-insensitive).
    ///
    /// Returns the matching entry of `allowed`, or `default` for anything else.
    pub fn choice(
        &self,
        key: &str,
        allowed: &[&'static str],
        default: &'static str,
    ) -> &'static str {
        self.text(key)
            .and_then(|v| allowed.iter().copied().find(|a| a.eq_ignore_ascii_case(v.trim())))
            .unwrap_or(default)
    }

    /// Free-form string option.
    pub fn text(
        &self,
        key: &str,
    ) -> Option<&str> {
        match self.0.get(key)? {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Color option, see [`parse_color`].
    pub fn color(
        &self,
        key: &str,
    ) -> Option<Rgb565> {
        self.0.get(key).and_then(parse_color)
    }

    /// List option. Non-list values count as an empty list.
    pub fn list(
        &self,
        key: &str,
    ) -> &[Value] {
        match self.0.get(key) {
            Some(Value::Array(items)) => items.as_slice(),
            _ => &[],
        }
    }
}

/// Parse a configured color: `[r, g, b]` with 0-255 members or `#rrggbb`.
pub fn parse_color(value: &Value) -> Option<Rgb565> {
    match value {
        Value::Array(items) if items.len() == 3 => {
            let mut rgb = [0u8; 3];
            for (slot, item) in rgb.iter_mut().zip(items) {
                *slot = u8::try_from(item.as_u64()?).ok()?;
            }
            Some(from_rgb8(rgb[0], rgb[1], rgb[2]))
        }
        Value::String(s) => {
            let hex = s.trim().strip_prefix('#')?;
            if hex.len() != 6 || !hex.is_ascii() {
                return None;
            }
            let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
            Some(from_rgb8(channel(0)?, channel(2)?, channel(4)?))
        }
        _ => None,
    }
}
