use serde::{Deserialize, Serialize};

/// Volume ceiling enforced by the device firmware.
pub const MAX_VOLUME: u8 = 30;
/// Brightness ceiling enforced by the device firmware (percent).
pub const MAX_BRIGHTNESS: u8 = 100;

/// Connection state of the live control channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
        }
    }
}

/// Outbound instruction to the device.
///
/// Serializes to the flat JSON object the device control channel expects,
/// e.g. `{"command":"trigger_effect","pin":4,"effect":2,"duration":500}`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "command")]
pub enum Command {
    TriggerEffect {
        pin: u8,
        effect: u8,
        /// Milliseconds; 0 means the effect's own default duration.
        #[serde(default)]
        duration: u32,
    },
    StopEffect {
        /// Target pin; omitted to stop every running effect.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pin: Option<u8>,
    },
    PlayAudio {
        file: u8,
        #[serde(rename = "loop", default)]
        looped: bool,
    },
    StopAudio,
    SetVolume {
        volume: u8,
    },
}

impl Command {
    /// Volume command clamped to the firmware's 0..=30 range.
    pub fn set_volume(volume: u8) -> Self {
        Command::SetVolume {
            volume: volume.min(MAX_VOLUME),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Command::TriggerEffect { .. } => "trigger_effect",
            Command::StopEffect { .. } => "stop_effect",
            Command::PlayAudio { .. } => "play_audio",
            Command::StopAudio => "stop_audio",
            Command::SetVolume { .. } => "set_volume",
        }
    }
}

/// Asynchronous notification pushed by the device over the live channel.
///
/// Wire shape is `{"type":"...","data":{...}}`. Anything unrecognized or
/// malformed decodes to `Unknown`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", tag = "type", content = "data")]
pub enum InboundEvent {
    Status(DeviceStatus),
    EffectStarted(EffectStarted),
    ConfigUpdated(ConfigUpdated),
    #[serde(other)]
    Unknown,
}

impl InboundEvent {
    /// Total decoder: malformed payloads come back as `Unknown`, never an error.
    pub fn decode(text: &str) -> Self {
        serde_json::from_str(text).unwrap_or(InboundEvent::Unknown)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeviceStatus {
    /// Seconds since boot.
    pub uptime: u64,
    pub free_heap: u64,
    pub wifi_mode: String,
    pub ip_address: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct EffectStarted {
    pub pin: u8,
    pub effect: u8,
    #[serde(default)]
    pub duration: u32,
}

/// Sent when device-side settings change outside this client; fields the
/// firmware chose not to include stay `None` and callers re-fetch the full
/// config.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigUpdated {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brightness: Option<u8>,
}

/// Device configuration as served by `GET /api/config`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeviceConfig {
    pub device_name: String,
    #[serde(default)]
    pub version: Option<String>,
    pub volume: u8,
    pub audio_enabled: bool,
    pub wifi_enabled: bool,
    #[serde(default)]
    pub pins: Vec<PinConfig>,
}

impl DeviceConfig {
    pub fn enabled_pins(&self) -> impl Iterator<Item = &PinConfig> {
        self.pins.iter().filter(|p| p.enabled)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PinConfig {
    pub pin: u8,
    pub pin_mode: u8,
    pub default_effect: u8,
    pub name: String,
    #[serde(default)]
    pub audio_file: u8,
    pub enabled: bool,
    #[serde(default = "default_pin_brightness")]
    pub brightness: u8,
    #[serde(default = "default_pin_color")]
    pub color: u32,
}

fn default_pin_brightness() -> u8 {
    255
}

fn default_pin_color() -> u32 {
    0xFFFFFF
}

pub fn effect_label(effect: u8) -> &'static str {
    match effect {
        0 => "None",
        1 => "Candle Flicker",
        2 => "Engine Pulse",
        3 => "Machine Gun",
        4 => "Flamethrower",
        5 => "Rocket Launcher",
        6 => "Taking Damage",
        7 => "Explosion",
        8 => "Console RGB",
        9 => "Static On",
        10 => "Static Off",
        _ => "Unknown",
    }
}

pub fn pin_mode_label(mode: u8) -> &'static str {
    match mode {
        0 => "Disabled",
        1 => "Standard",
        2 => "PWM",
        3 => "WS2812B",
        4 => "Digital Input",
        5 => "Analog Input",
        _ => "Unknown",
    }
}
