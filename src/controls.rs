//! Host-facing control surface: numeric bounds and action triggers.
//!
//! | Control | Range | Step |
//! |---------|-------|------|
//! | Brightness | 0-100 | 1 |
//! | Refresh interval (s) | 5-300 | 5 |
//! | Cycle interval (s) | 0-300, 0 = off | 5 |
//! | Screen count | 1-10 | 1 |

use std::fmt;
use std::str::FromStr;

/// Bounded, stepped numeric control.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NumberControl {
    pub min: u32,
    pub max: u32,
    pub step: u32,
}

impl NumberControl {
    /// Clamp into range and snap to the nearest step above `min`.
    pub const fn clamp(
        self,
        value: u32,
    ) -> u32 {
        let v = if value < self.min {
            self.min
        } else if value > self.max {
            self.max
        } else {
            value
        };
        let snapped = self.min + (v - self.min + self.step / 2) / self.step * self.step;
        if snapped > self.max { self.max } else { snapped }
    }
}

pub const BRIGHTNESS: NumberControl = NumberControl { min: 0, max: 100, step: 1 };
pub const REFRESH_INTERVAL: NumberControl = NumberControl { min: 5, max: 300, step: 5 };
pub const CYCLE_INTERVAL: NumberControl = NumberControl { min: 0, max: 300, step: 5 };
pub const SCREEN_COUNT: NumberControl = NumberControl { min: 1, max: 10, step: 1 };

/// Default refresh interval in seconds.
pub const DEFAULT_REFRESH_SECS: u32 = 10;

const _: () = assert!(REFRESH_INTERVAL.min <= DEFAULT_REFRESH_SECS && DEFAULT_REFRESH_SECS <= REFRESH_INTERVAL.max);

/// Cycle interval: 0 disables cycling, any other value is at least one step.
pub const fn clamp_cycle_interval(value: u32) -> u32 {
    if value == 0 {
        return 0;
    }
    let snapped = CYCLE_INTERVAL.clamp(value);
    if snapped == 0 { CYCLE_INTERVAL.step } else { snapped }
}

/// Brightness accepts any integer and clamps it to 0-100.
pub fn clamp_brightness(value: i64) -> u8 { value.clamp(0, i64::from(BRIGHTNESS.max)) as u8 }

/// Action triggers exposed to the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    Refresh,
    NextScreen,
    PreviousScreen,
}

impl Action {
    pub const ALL: [Self; 3] = [Self::Refresh, Self::NextScreen, Self::PreviousScreen];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Refresh => "refresh",
            Self::NextScreen => "next_screen",
            Self::PreviousScreen => "previous_screen",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|a| a.name() == s).ok_or_else(|| format!("unknown action: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_interval_bounds_and_steps() {
        assert_eq!(REFRESH_INTERVAL.clamp(0), 5);
        assert_eq!(REFRESH_INTERVAL.clamp(7), 5);
        assert_eq!(REFRESH_INTERVAL.clamp(8), 10);
        assert_eq!(REFRESH_INTERVAL.clamp(299), 300);
        assert_eq!(REFRESH_INTERVAL.clamp(10_000), 300);
    }

    #[test]
    fn test_cycle_interval_zero_disables() {
        assert_eq!(clamp_cycle_interval(0), 0);
        assert_eq!(clamp_cycle_interval(1), 5);
        assert_eq!(clamp_cycle_interval(2), 5);
        assert_eq!(clamp_cycle_interval(31), 30);
        assert_eq!(clamp_cycle_interval(900), 300);
    }

    #[test]
    fn test_brightness_clamps() {
        assert_eq!(clamp_brightness(-20), 0);
        assert_eq!(clamp_brightness(55), 55);
        assert_eq!(clamp_brightness(250), 100);
        assert_eq!(BRIGHTNESS.clamp(101), 100);
    }

    #[test]
    fn test_screen_count_bounds() {
        assert_eq!(SCREEN_COUNT.clamp(0), 1);
        assert_eq!(SCREEN_COUNT.clamp(12), 10);
    }

    #[test]
    fn test_action_names_round_trip() {
        for action in Action::ALL {
            assert_eq!(action.name().parse::<Action>(), Ok(action));
        }
        assert!("reboot".parse::<Action>().is_err());
    }
}
