use std::time::Duration;
use url::Url;

const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection settings for one device.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Device base URL, e.g. `http://192.168.4.1`.
    pub base_url: Url,
    /// Fixed delay between reconnection attempts on the live channel.
    pub reconnect_delay: Duration,
    /// Timeout applied to every fallback/REST request.
    pub request_timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Live-channel endpoint: the base URL with a ws/wss scheme and `/ws` path.
    pub(crate) fn ws_url(&self) -> Url {
        let mut url = self.base_url.clone();
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        // http->ws and https->wss are always permitted scheme changes.
        let _ = url.set_scheme(scheme);
        url.set_path("/ws");
        url
    }

    pub(crate) fn api_url(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        url.set_path(path);
        url
    }
}
