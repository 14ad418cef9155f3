use crate::client::{ClientRequest, Handlers, Notice};
use crate::config::ClientConfig;
use crate::error::ClientError;
use aura_protocol::{ConnectionState, InboundEvent};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

enum Exit {
    Continue,
    Shutdown,
}

/// Transport actor: sole owner of the live socket and the reconnect schedule.
///
/// Runs until every client handle is dropped. While `desired_connected` is
/// set it keeps exactly one of {open socket, pending reconnect timer} alive,
/// so duplicate close notifications can never stack retries, and a
/// `Disconnect` request cancels whichever one exists.
pub(crate) async fn run(
    mut rx: mpsc::Receiver<ClientRequest>,
    state_tx: watch::Sender<ConnectionState>,
    handlers: Arc<Handlers>,
    config: ClientConfig,
) {
    let mut desired_connected = false;
    let ws_url = config.ws_url();

    loop {
        if !desired_connected {
            set_state(&state_tx, &handlers, ConnectionState::Disconnected);
            match rx.recv().await {
                Some(ClientRequest::Connect) => desired_connected = true,
                Some(ClientRequest::Disconnect) => {}
                Some(ClientRequest::Send(command)) => drop_command(&handlers, command),
                None => return,
            }
            continue;
        }

        set_state(&state_tx, &handlers, ConnectionState::Connecting);
        let mut socket = match tokio_tungstenite::connect_async(ws_url.as_str()).await {
            Ok((socket, _)) => {
                debug!(url = %ws_url, "control channel open");
                set_state(&state_tx, &handlers, ConnectionState::Connected);
                socket
            }
            Err(e) => {
                warn!(url = %ws_url, "{}", ClientError::TransportOpen(e));
                set_state(&state_tx, &handlers, ConnectionState::Disconnected);
                match wait_retry(&mut rx, &handlers, &config, &mut desired_connected).await {
                    Exit::Continue => continue,
                    Exit::Shutdown => return,
                }
            }
        };

        match drive(&mut rx, &mut socket, &handlers, &mut desired_connected).await {
            Exit::Continue => {}
            Exit::Shutdown => {
                let _ = socket.close(None).await;
                return;
            }
        }

        set_state(&state_tx, &handlers, ConnectionState::Disconnected);
        if desired_connected {
            match wait_retry(&mut rx, &handlers, &config, &mut desired_connected).await {
                Exit::Continue => {}
                Exit::Shutdown => return,
            }
        }
    }
}

/// Pumps one live socket until it dies or a disconnect is requested.
async fn drive(
    rx: &mut mpsc::Receiver<ClientRequest>,
    socket: &mut Socket,
    handlers: &Handlers,
    desired_connected: &mut bool,
) -> Exit {
    loop {
        tokio::select! {
            request = rx.recv() => match request {
                Some(ClientRequest::Connect) => {}
                Some(ClientRequest::Disconnect) => {
                    *desired_connected = false;
                    let _ = socket.close(None).await;
                    return Exit::Continue;
                }
                Some(ClientRequest::Send(command)) => {
                    let payload = match serde_json::to_string(&command) {
                        Ok(payload) => payload,
                        Err(e) => {
                            warn!(kind = command.kind(), "command encode failed: {e}");
                            continue;
                        }
                    };
                    if socket.send(Message::text(payload)).await.is_err() {
                        handlers.notify_notice(&Notice::CommandFailed {
                            command,
                            error: ClientError::TransportClosed,
                        });
                        return Exit::Continue;
                    }
                }
                None => return Exit::Shutdown,
            },
            incoming = socket.next() => match incoming {
                Some(Ok(message)) => {
                    let Ok(text) = message.into_text() else { continue };
                    match InboundEvent::decode(&text) {
                        InboundEvent::Unknown => {
                            warn!("dropping undecodable device message: {text}");
                        }
                        event => handlers.notify_event(&event),
                    }
                }
                Some(Err(e)) => {
                    debug!("control channel error: {e}");
                    return Exit::Continue;
                }
                None => {
                    debug!("control channel closed by device");
                    return Exit::Continue;
                }
            },
        }
    }
}

/// One fixed-delay reconnect timer, cancellable by `Disconnect`.
async fn wait_retry(
    rx: &mut mpsc::Receiver<ClientRequest>,
    handlers: &Handlers,
    config: &ClientConfig,
    desired_connected: &mut bool,
) -> Exit {
    debug!(delay = ?config.reconnect_delay, "scheduling reconnect");
    let timer = tokio::time::sleep(config.reconnect_delay);
    tokio::pin!(timer);

    loop {
        tokio::select! {
            _ = &mut timer => return Exit::Continue,
            request = rx.recv() => match request {
                Some(ClientRequest::Connect) => {}
                Some(ClientRequest::Disconnect) => {
                    *desired_connected = false;
                    return Exit::Continue;
                }
                Some(ClientRequest::Send(command)) => drop_command(handlers, command),
                None => return Exit::Shutdown,
            },
        }
    }
}

fn set_state(
    state_tx: &watch::Sender<ConnectionState>,
    handlers: &Handlers,
    state: ConnectionState,
) {
    let previous = state_tx.send_replace(state);
    if previous != state {
        debug!(state = state.as_str(), "connection state changed");
        handlers.notify_state(state);
    }
}

// A send can race a state transition: the handle saw Connected, the socket
// died before the request reached us. At-most-once delivery, so drop it.
fn drop_command(handlers: &Handlers, command: aura_protocol::Command) {
    debug!(kind = command.kind(), "channel lost before send, dropping");
    handlers.notify_notice(&Notice::CommandFailed {
        command,
        error: ClientError::TransportClosed,
    });
}
