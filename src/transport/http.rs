//! reqwest implementation of the device protocol.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{CUSTOM_IMAGE_THEME, DeviceState, DeviceTransport, StorageInfo, Upload};
use crate::config::DeviceProfile;
use crate::controls::clamp_brightness;
use crate::error::{TransportError, TransportResult};

/// HTTP client for one device.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    upload_path: String,
    upload_dir: String,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(profile: &DeviceProfile) -> TransportResult<Self> {
        let timeout = profile.timeout();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Connection(e.to_string()))?;
        Ok(Self {
            client,
            base_url: profile.base_url(),
            upload_path: profile.upload_path.clone(),
            upload_dir: profile.upload_dir.clone(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str { &self.base_url }

    fn map_err(
        &self,
        endpoint: &str,
        err: reqwest::Error,
    ) -> TransportError {
        if err.is_timeout() {
            return TransportError::Timeout(self.timeout);
        }
        match err.status() {
            Some(status) => TransportError::Status { endpoint: endpoint.to_string(), status: status.as_u16() },
            None => TransportError::from(err),
        }
    }

    async fn send(
        &self,
        endpoint: &str,
        request: reqwest::RequestBuilder,
    ) -> TransportResult<reqwest::Response> {
        let response = request.send().await.map_err(|e| self.map_err(endpoint, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status { endpoint: endpoint.to_string(), status: status.as_u16() });
        }
        Ok(response)
    }

    /// `GET /set?<query>`, body ignored.
    async fn set(
        &self,
        query: &str,
    ) -> TransportResult<()> {
        let url = format!("{}/set?{query}", self.base_url);
        self.send("/set", self.client.get(url)).await?;
        Ok(())
    }

    async fn get_json<T>(
        &self,
        endpoint: &str,
    ) -> TransportResult<T>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{endpoint}", self.base_url);
        let response = self.send(endpoint, self.client.get(url)).await?;
        let body = response.bytes().await.map_err(|e| self.map_err(endpoint, e))?;
        serde_json::from_slice(&body).map_err(|e| TransportError::InvalidResponse(format!("{endpoint}: {e}")))
    }
}

#[async_trait]
impl DeviceTransport for HttpTransport {
    async fn upload(
        &self,
        upload: Upload,
    ) -> TransportResult<()> {
        let size = upload.bytes.len();
        let part = Part::bytes(upload.bytes)
            .file_name(upload.filename.clone())
            .mime_str(upload.format.content_type())
            .map_err(|e| TransportError::Connection(e.to_string()))?;
        let url = format!("{}{}?dir={}", self.base_url, self.upload_path, self.upload_dir);
        self.send(&self.upload_path, self.client.post(url).multipart(Form::new().part("file", part))).await?;
        debug!(file = %upload.filename, bytes = size, "uploaded");
        Ok(())
    }

    async fn show(
        &self,
        filename: &str,
    ) -> TransportResult<()> {
        self.set(&format!("theme={CUSTOM_IMAGE_THEME}")).await?;
        self.set(&format!("img={}{filename}", self.upload_dir)).await
    }

    async fn set_brightness(
        &self,
        value: u8,
    ) -> TransportResult<()> {
        let value = clamp_brightness(i64::from(value));
        self.set(&format!("brt={value}")).await?;
        debug!(brightness = value, "brightness set");
        Ok(())
    }

    async fn device_state(&self) -> TransportResult<DeviceState> { self.get_json("/app.json").await }

    async fn storage(&self) -> TransportResult<StorageInfo> { self.get_json("/space.json").await }

    async fn clear_images(&self) -> TransportResult<()> { self.set("clear=image").await }
}
