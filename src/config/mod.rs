//! Application configuration.
//!
//! Loaded from a TOML file through the `config` crate, with environment
//! overrides (`SMALLTV_DEVICE__HOST=10.0.0.7`). Everything except the device
//! host has a default, so a minimal file is:
//!
//! ```toml
//! [device]
//! host = "192.168.1.50"
//! ```
//!
//! Numeric settings are clamped to the [`crate::controls`] bounds when read,
//! never rejected.

mod dashboard;
mod options;

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use dashboard::{DashboardConfig, EMPTY_WIDGET, LayoutSettings, Screen, Slot};
pub use options::{WidgetOptions, parse_color};

use crate::controls::{DEFAULT_REFRESH_SECS, REFRESH_INTERVAL, clamp_brightness, clamp_cycle_interval};
use crate::error::ConfigResult;

// =============================================================================
// Device Profile
// =============================================================================

/// Image format accepted by the device upload endpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadFormat {
    #[default]
    Jpeg,
    Png,
}

impl UploadFormat {
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
        }
    }

    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }
}

/// Target device: address, canvas geometry and upload contract.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceProfile {
    pub host: String,
    pub width: u32,
    pub height: u32,
    pub format: UploadFormat,
    pub jpeg_quality: u8,
    pub upload_path: String,
    pub upload_dir: String,
    /// File name on the device; defaults to `dashboard.<ext>`.
    pub filename: Option<String>,
    pub timeout_secs: u64,
}

impl Default for DeviceProfile {
    fn default() -> Self {
        Self {
            host: String::new(),
            width: 240,
            height: 240,
            format: UploadFormat::Jpeg,
            jpeg_quality: 92,
            upload_path: "/doUpload".to_string(),
            upload_dir: "/image/".to_string(),
            filename: None,
            timeout_secs: 10,
        }
    }
}

impl DeviceProfile {
    pub fn filename(&self) -> String {
        self.filename.clone().unwrap_or_else(|| format!("dashboard.{}", self.format.extension()))
    }

    pub fn timeout(&self) -> Duration { Duration::from_secs(self.timeout_secs.max(1)) }

    pub fn jpeg_quality(&self) -> u8 { self.jpeg_quality.clamp(1, 100) }

    /// Base URL, accepting hosts with or without a scheme.
    pub fn base_url(&self) -> String {
        let host = self.host.trim().trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("http://{host}")
        }
    }
}

// =============================================================================
// Sync and Render Settings
// =============================================================================

/// Timers and device control defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    pub refresh_interval: u32,
    pub cycle_interval: u32,
    pub brightness: Option<i64>,
    pub failure_threshold: u32,
    pub debounce_ms: u64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            refresh_interval: DEFAULT_REFRESH_SECS,
            cycle_interval: 0,
            brightness: None,
            failure_threshold: 3,
            debounce_ms: 2000,
        }
    }
}

impl SyncSettings {
    pub fn refresh_interval(&self) -> Duration { Duration::from_secs(u64::from(REFRESH_INTERVAL.clamp(self.refresh_interval))) }

    /// `None` when cycling is disabled.
    pub fn cycle_interval(&self) -> Option<Duration> {
        match clamp_cycle_interval(self.cycle_interval) {
            0 => None,
            secs => Some(Duration::from_secs(u64::from(secs))),
        }
    }

    pub fn brightness(&self) -> Option<u8> { self.brightness.map(clamp_brightness) }

    pub fn failure_threshold(&self) -> u32 { self.failure_threshold.clamp(1, 20) }

    pub fn debounce(&self) -> Duration { Duration::from_millis(self.debounce_ms.min(60_000)) }
}

/// Rendering knobs that are not part of the device contract.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Base cell unit for widget size variants.
    pub unit_px: u32,
}

impl Default for RenderSettings {
    fn default() -> Self { Self { unit_px: smalltv_common::variant::DEFAULT_UNIT_PX } }
}

// =============================================================================
// Application Config
// =============================================================================

/// Top-level configuration file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub device: DeviceProfile,
    #[serde(default)]
    pub sync: SyncSettings,
    #[serde(default)]
    pub render: RenderSettings,
    #[serde(default)]
    pub screens: Vec<Screen>,
}

impl AppConfig {
    /// Load a configuration file plus `SMALLTV_*` environment overrides.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(config::Environment::with_prefix("SMALLTV").prefix_separator("_").separator("__"))
            .build()?;

        let mut app: Self = settings.try_deserialize()?;
        app.validate()?;
        Ok(app)
    }

    /// Check the dashboard part; pads `fill_empty` screens in place.
    pub fn validate(&mut self) -> ConfigResult<()> {
        let mut dashboard = self.dashboard();
        dashboard.validate()?;
        self.screens = dashboard.screens;
        Ok(())
    }

    pub fn dashboard(&self) -> DashboardConfig { DashboardConfig::new(self.screens.clone()) }
}
