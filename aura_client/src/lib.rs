//! Host-side remote control for BattleAura lighting/audio devices.
//!
//! [`RemoteControlClient`] owns a persistent WebSocket control channel to the
//! device and reconnects it automatically; commands issued while the channel
//! is down go out as one-shot HTTP requests against the device's REST API
//! instead. [`DeviceApi`] covers the request/response half of that API
//! (config, status, brightness).

mod actor;
mod api;
mod client;
mod config;
mod error;
mod fallback;

pub use aura_protocol as protocol;

pub use api::DeviceApi;
pub use client::{Notice, RemoteControlClient};
pub use config::ClientConfig;
pub use error::ClientError;
