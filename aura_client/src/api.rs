use crate::config::ClientConfig;
use crate::error::ClientError;
use aura_protocol::{DeviceConfig, DeviceStatus, MAX_BRIGHTNESS};

/// Request/response half of the device API: configuration and status reads,
/// plus the settings the firmware exposes as plain form posts.
pub struct DeviceApi {
    http: reqwest::Client,
    config: ClientConfig,
}

impl DeviceApi {
    pub fn new(config: ClientConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .unwrap_or_default();
        Self { http, config }
    }

    pub(crate) fn with_http(http: reqwest::Client, config: ClientConfig) -> Self {
        Self { http, config }
    }

    pub async fn config(&self) -> Result<DeviceConfig, ClientError> {
        let response = self
            .http
            .get(self.config.api_url("/api/config"))
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    pub async fn status(&self) -> Result<DeviceStatus, ClientError> {
        let response = self
            .http
            .get(self.config.api_url("/api/status"))
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    /// Global LED brightness, 0..=100. The firmware takes this as a form
    /// field rather than JSON.
    pub async fn set_brightness(&self, brightness: u8) -> Result<(), ClientError> {
        let brightness = brightness.min(MAX_BRIGHTNESS);
        self.http
            .post(self.config.api_url("/api/config/brightness"))
            .form(&[("brightness", brightness.to_string())])
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
