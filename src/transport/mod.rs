//! Device transport: the SmallTV HTTP protocol behind a trait.
//!
//! | Operation | Request |
//! |-----------|---------|
//! | upload | `POST /doUpload?dir=/image/`, multipart field `file` |
//! | show | `GET /set?theme=3`, then `GET /set?img=/image/<file>` |
//! | brightness | `GET /set?brt=<0..100>` |
//! | device state | `GET /app.json` |
//! | storage | `GET /space.json` |
//! | clear images | `GET /set?clear=image` |
//!
//! The sync engine only talks to [`DeviceTransport`], so tests drive it with
//! a scripted fake instead of a device.

mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

pub use http::HttpTransport;

use crate::config::UploadFormat;
use crate::error::TransportResult;

/// Device theme that shows an uploaded image.
pub const CUSTOM_IMAGE_THEME: u8 = 3;

/// Free flash below which stored images are cleared before syncing.
pub const MIN_FREE_BYTES: u64 = 128 * 1024;

/// What the device reports from `/app.json`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceState {
    #[serde(default)]
    pub theme: u8,
    #[serde(default, rename = "brt")]
    pub brightness: Option<u8>,
    #[serde(default, rename = "img")]
    pub current_image: Option<String>,
}

/// Device flash usage from `/space.json`, in bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageInfo {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub free: u64,
}

/// One encoded frame ready to send.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Upload {
    pub filename: String,
    pub format: UploadFormat,
    pub bytes: Vec<u8>,
}

#[async_trait]
pub trait DeviceTransport: Send + Sync {
    /// Store an image on the device.
    async fn upload(
        &self,
        upload: Upload,
    ) -> TransportResult<()>;

    /// Switch the display to a previously uploaded image.
    async fn show(
        &self,
        filename: &str,
    ) -> TransportResult<()>;

    /// Set panel brightness, 0-100.
    async fn set_brightness(
        &self,
        value: u8,
    ) -> TransportResult<()>;

    async fn device_state(&self) -> TransportResult<DeviceState>;

    async fn storage(&self) -> TransportResult<StorageInfo>;

    /// Delete every uploaded image.
    async fn clear_images(&self) -> TransportResult<()>;

    /// Whether the device answers at all.
    async fn ping(&self) -> bool { self.device_state().await.is_ok() }

    /// Read flash usage and clear stored images when `force` is set or free
    /// space is under [`MIN_FREE_BYTES`]. Returns the final reading.
    async fn ensure_space(
        &self,
        force: bool,
    ) -> TransportResult<StorageInfo> {
        let storage = self.storage().await?;
        info!(total = storage.total, free = storage.free, "device storage");
        if !force && storage.free >= MIN_FREE_BYTES {
            return Ok(storage);
        }
        info!(free = storage.free, forced = force, "clearing stored images");
        self.clear_images().await?;
        self.storage().await
    }
}
