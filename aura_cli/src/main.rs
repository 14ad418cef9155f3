use aura_client::{ClientConfig, DeviceApi, Notice, RemoteControlClient};
use aura_protocol::{effect_label, pin_mode_label, Command, InboundEvent, MAX_BRIGHTNESS};
use clap::{Parser, Subcommand};
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use url::Url;

const DEFAULT_DEVICE: &str = "http://192.168.4.1";
const ONE_SHOT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Parser, Debug)]
#[command(name = "aura", about = "Remote control for BattleAura devices")]
struct Args {
    /// Device base URL. Falls back to AURA_DEVICE, then the firmware's
    /// AP-mode address.
    #[arg(long)]
    device: Option<Url>,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Trigger a lighting effect on one pin.
    Trigger {
        #[arg(long)]
        pin: u8,
        #[arg(long)]
        effect: u8,
        /// Duration in milliseconds; 0 uses the effect's own default.
        #[arg(long, default_value_t = 0)]
        duration: u32,
    },
    /// Stop the effect on one pin, or all effects.
    Stop {
        #[arg(long)]
        pin: Option<u8>,
    },
    /// Play an audio file by track number.
    Play {
        #[arg(long)]
        file: u8,
        #[arg(long = "loop", default_value_t = false)]
        looped: bool,
    },
    /// Stop audio playback.
    StopAudio,
    /// Set playback volume (0-30).
    Volume { volume: u8 },
    /// Set global LED brightness (0-100).
    Brightness { brightness: u8 },
    /// Print the device configuration.
    Config,
    /// Print the device status.
    Status,
    /// Hold the live channel open and print events as they arrive.
    Watch,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let device = resolve_device(args.device)?;
    let config = ClientConfig::new(device);

    match args.command {
        Cmd::Trigger {
            pin,
            effect,
            duration,
        } => {
            send_one_shot(
                config,
                Command::TriggerEffect {
                    pin,
                    effect,
                    duration,
                },
            )
            .await
        }
        Cmd::Stop { pin } => send_one_shot(config, Command::StopEffect { pin }).await,
        Cmd::Play { file, looped } => {
            send_one_shot(config, Command::PlayAudio { file, looped }).await
        }
        Cmd::StopAudio => send_one_shot(config, Command::StopAudio).await,
        Cmd::Volume { volume } => send_one_shot(config, Command::set_volume(volume)).await,
        Cmd::Brightness { brightness } => {
            if brightness > MAX_BRIGHTNESS {
                return Err(anyhow::anyhow!("brightness must be 0-{MAX_BRIGHTNESS}"));
            }
            DeviceApi::new(config).set_brightness(brightness).await?;
            eprintln!("brightness set to {brightness}");
            Ok(())
        }
        Cmd::Config => print_config(config).await,
        Cmd::Status => print_status(config).await,
        Cmd::Watch => watch(config).await,
    }
}

fn resolve_device(flag: Option<Url>) -> anyhow::Result<Url> {
    if let Some(url) = flag {
        return Ok(url);
    }
    if let Ok(env) = std::env::var("AURA_DEVICE") {
        return Url::parse(&env)
            .map_err(|e| anyhow::anyhow!("invalid AURA_DEVICE {env:?}: {e}"));
    }
    Ok(Url::parse(DEFAULT_DEVICE)?)
}

/// One command over the fallback path; the device may not even have its
/// control channel up, so this never tries to connect it.
async fn send_one_shot(config: ClientConfig, command: Command) -> anyhow::Result<()> {
    let client = RemoteControlClient::new(config);

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    client.on_notice(move |notice| {
        let outcome = match notice {
            Notice::CommandDelivered { command } => Ok(command.kind().to_string()),
            Notice::CommandFailed { command, error } => {
                Err(format!("{}: {error}", command.kind()))
            }
        };
        let _ = tx.send(outcome);
    });

    client.send(command);

    match tokio::time::timeout(ONE_SHOT_TIMEOUT, rx.recv()).await {
        Ok(Some(Ok(kind))) => {
            eprintln!("delivered: {kind}");
            Ok(())
        }
        Ok(Some(Err(message))) => Err(anyhow::anyhow!(message)),
        _ => Err(anyhow::anyhow!("no response from device")),
    }
}

async fn print_config(config: ClientConfig) -> anyhow::Result<()> {
    let device = DeviceApi::new(config).config().await?;

    println!(
        "{} v{}",
        device.device_name,
        device.version.as_deref().unwrap_or("?")
    );
    println!(
        "audio: {}  volume: {}",
        if device.audio_enabled { "enabled" } else { "disabled" },
        device.volume
    );
    println!("wifi: {}", if device.wifi_enabled { "station" } else { "AP mode" });

    let pins: Vec<_> = device.enabled_pins().collect();
    if pins.is_empty() {
        println!("no pins configured");
        return Ok(());
    }
    println!("pins:");
    for pin in pins {
        println!(
            "  GPIO {:>2}  {:<16} mode={:<13} effect={:<16} brightness={}",
            pin.pin,
            pin.name,
            pin_mode_label(pin.pin_mode),
            effect_label(pin.default_effect),
            pin.brightness
        );
    }
    Ok(())
}

async fn print_status(config: ClientConfig) -> anyhow::Result<()> {
    let status = DeviceApi::new(config).status().await?;
    println!(
        "uptime: {}s  free heap: {}  wifi: {}  ip: {}",
        status.uptime, status.free_heap, status.wifi_mode, status.ip_address
    );
    Ok(())
}

async fn watch(config: ClientConfig) -> anyhow::Result<()> {
    let client = RemoteControlClient::new(config);

    client.on_state_change(|state| eprintln!("state: {}", state.as_str()));
    client.on_event(|event| match event {
        InboundEvent::Status(status) => println!(
            "status: uptime={}s heap={} wifi={} ip={}",
            status.uptime, status.free_heap, status.wifi_mode, status.ip_address
        ),
        InboundEvent::EffectStarted(effect) => println!(
            "effect started: GPIO {} {} ({} ms)",
            effect.pin,
            effect_label(effect.effect),
            effect.duration
        ),
        InboundEvent::ConfigUpdated(update) => println!(
            "config updated: volume={:?} brightness={:?}",
            update.volume, update.brightness
        ),
        InboundEvent::Unknown => {}
    });

    client.connect();
    tokio::signal::ctrl_c().await?;
    client.disconnect();
    Ok(())
}
