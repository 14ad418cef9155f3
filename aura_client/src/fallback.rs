use crate::client::{Handlers, Notice};
use crate::config::ClientConfig;
use crate::error::ClientError;
use aura_protocol::Command;
use serde_json::{json, Value};
use tracing::{debug, warn};

/// One-shot HTTP equivalent of a live-channel command.
pub(crate) struct FallbackRoute {
    pub path: &'static str,
    pub body: Option<Value>,
}

/// Maps a command onto the device's REST surface.
pub(crate) fn route_for(command: &Command) -> FallbackRoute {
    match command {
        Command::TriggerEffect {
            pin,
            effect,
            duration,
        } => FallbackRoute {
            path: "/api/pin/effect",
            body: Some(json!({ "pin": pin, "effect": effect, "duration": duration })),
        },
        Command::StopEffect { pin } => FallbackRoute {
            path: "/api/effects/stop",
            body: Some(match pin {
                Some(pin) => json!({ "pin": pin }),
                None => json!({}),
            }),
        },
        Command::PlayAudio { file, looped } => FallbackRoute {
            path: "/api/audio/play",
            body: Some(json!({ "file": file, "loop": looped })),
        },
        Command::StopAudio => FallbackRoute {
            path: "/api/audio/stop",
            body: None,
        },
        Command::SetVolume { volume } => FallbackRoute {
            path: "/api/audio/volume",
            body: Some(json!({ "volume": volume })),
        },
    }
}

/// Issues exactly one fallback request for `command`. Failures are logged and
/// reported on the notice channel; nothing is queued or retried.
pub(crate) async fn dispatch(
    http: &reqwest::Client,
    config: &ClientConfig,
    command: Command,
    handlers: &Handlers,
) {
    let route = route_for(&command);
    let url = config.api_url(route.path);

    let mut request = http.post(url);
    if let Some(body) = &route.body {
        request = request.json(body);
    }

    let notice = match request.send().await {
        Ok(response) => {
            let status = response.status();
            if status.is_success() {
                debug!(kind = command.kind(), path = route.path, "fallback delivered");
                Notice::CommandDelivered { command }
            } else {
                let body = response.text().await.unwrap_or_default();
                warn!(
                    kind = command.kind(),
                    path = route.path,
                    %status,
                    "fallback rejected by device"
                );
                Notice::CommandFailed {
                    command,
                    error: ClientError::FallbackStatus { status, body },
                }
            }
        }
        Err(e) => {
            warn!(kind = command.kind(), path = route.path, "fallback failed: {e}");
            Notice::CommandFailed {
                command,
                error: ClientError::Fallback(e),
            }
        }
    };

    handlers.notify_notice(&notice);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_effect_maps_to_pin_effect_route() {
        let route = route_for(&Command::TriggerEffect {
            pin: 4,
            effect: 2,
            duration: 500,
        });
        assert_eq!(route.path, "/api/pin/effect");
        assert_eq!(
            route.body,
            Some(json!({"pin": 4, "effect": 2, "duration": 500}))
        );
    }

    #[test]
    fn stop_effect_body_depends_on_target() {
        let all = route_for(&Command::StopEffect { pin: None });
        assert_eq!(all.path, "/api/effects/stop");
        assert_eq!(all.body, Some(json!({})));

        let one = route_for(&Command::StopEffect { pin: Some(6) });
        assert_eq!(one.body, Some(json!({"pin": 6})));
    }

    #[test]
    fn audio_routes() {
        let play = route_for(&Command::PlayAudio {
            file: 3,
            looped: true,
        });
        assert_eq!(play.path, "/api/audio/play");
        assert_eq!(play.body, Some(json!({"file": 3, "loop": true})));

        let stop = route_for(&Command::StopAudio);
        assert_eq!(stop.path, "/api/audio/stop");
        assert!(stop.body.is_none());

        let volume = route_for(&Command::SetVolume { volume: 12 });
        assert_eq!(volume.path, "/api/audio/volume");
        assert_eq!(volume.body, Some(json!({"volume": 12})));
    }
}
