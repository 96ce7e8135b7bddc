//! Error types for the dashboard.
//!
//! Only failures that cross a boundary have a type here. Missing entities,
//! missing attributes and unknown widgets are not errors: the resolver returns
//! an "unavailable" state and renderers draw a placeholder instead.

use std::time::Duration;

use thiserror::Error;

/// Configuration-boundary errors. Fatal for the screen they describe.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Layout tag is not one of the supported layouts.
    #[error("unknown layout type: {0:?}")]
    UnknownLayout(String),

    /// Screen lists a different number of slots than its layout has.
    #[error("screen {screen:?}: layout {layout} needs {expected} slots, got {actual}")]
    SlotCountMismatch {
        screen: String,
        layout: String,
        expected: usize,
        actual: usize,
    },

    /// More screens than the device supports.
    #[error("dashboard has {0} screens, at most 10 are supported")]
    ScreenCount(usize),

    /// Two screens share one id.
    #[error("duplicate screen id: {0:?}")]
    DuplicateScreenId(String),

    /// Configuration file could not be read or deserialized.
    #[error("configuration error: {0}")]
    Load(#[from] config::ConfigError),

    /// State fixture is not valid JSON.
    #[error("invalid state fixture: {0}")]
    Fixture(#[from] serde_json::Error),

    /// I/O error while reading a fixture.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Device transport errors. Recovered by the sync engine.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The device did not answer within the configured timeout.
    #[error("device timed out after {0:?}")]
    Timeout(Duration),

    /// The device answered with a non-2xx status.
    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: String, status: u16 },

    /// Connection refused, reset, DNS failure and similar.
    #[error("connection error: {0}")]
    Connection(String),

    /// The device answered 2xx with a body we could not read.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            let endpoint = err.url().map(|u| u.path().to_string()).unwrap_or_default();
            Self::Status { endpoint, status: status.as_u16() }
        } else if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else {
            Self::Connection(err.to_string())
        }
    }
}

/// Frame encoding errors.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Raster length does not match width x height x 3.
    #[error("raster of {len} bytes does not match {width}x{height}")]
    RasterSize { width: u32, height: u32, len: usize },

    /// The image encoder failed.
    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),
}

/// Control requests sent to a sync engine that is no longer running.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("sync engine has stopped")]
pub struct EngineStopped;

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for device operations.
pub type TransportResult<T> = Result<T, TransportError>;
