use reqwest::StatusCode;
use thiserror::Error;

/// Everything that can go wrong between the client and the device.
///
/// None of these surface as `Err` from [`crate::RemoteControlClient`] command
/// calls; they drive state transitions and the notice side-channel instead.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("control channel open failed: {0}")]
    TransportOpen(#[source] tokio_tungstenite::tungstenite::Error),
    #[error("control channel closed")]
    TransportClosed,
    #[error("fallback request failed: {0}")]
    Fallback(#[from] reqwest::Error),
    #[error("fallback request rejected: status={status} body={body}")]
    FallbackStatus { status: StatusCode, body: String },
}
