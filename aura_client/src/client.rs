use crate::actor;
use crate::api::DeviceApi;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::fallback;
use aura_protocol::{Command, ConnectionState, InboundEvent};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

const REQUEST_CHANNEL_CAP: usize = 32;

/// Per-command delivery feedback, the library's equivalent of the control
/// panel's transient toast. Delivered via [`RemoteControlClient::on_notice`]
/// so `send` itself never fails.
#[derive(Debug)]
pub enum Notice {
    /// A fallback request was accepted by the device.
    CommandDelivered { command: Command },
    /// A command was dropped: the transport died mid-send or the fallback
    /// request failed. Not retried.
    CommandFailed {
        command: Command,
        error: ClientError,
    },
}

pub(crate) enum ClientRequest {
    Connect,
    Disconnect,
    Send(Command),
}

type EventHandler = Box<dyn Fn(&InboundEvent) + Send + 'static>;
type StateHandler = Box<dyn Fn(ConnectionState) + Send + 'static>;
type NoticeHandler = Box<dyn Fn(&Notice) + Send + 'static>;

#[derive(Default)]
pub(crate) struct Handlers {
    events: Mutex<Vec<EventHandler>>,
    states: Mutex<Vec<StateHandler>>,
    notices: Mutex<Vec<NoticeHandler>>,
}

impl Handlers {
    pub(crate) fn notify_event(&self, event: &InboundEvent) {
        if let Ok(handlers) = self.events.lock() {
            for handler in handlers.iter() {
                handler(event);
            }
        }
    }

    pub(crate) fn notify_state(&self, state: ConnectionState) {
        if let Ok(handlers) = self.states.lock() {
            for handler in handlers.iter() {
                handler(state);
            }
        }
    }

    pub(crate) fn notify_notice(&self, notice: &Notice) {
        if let Ok(handlers) = self.notices.lock() {
            for handler in handlers.iter() {
                handler(notice);
            }
        }
    }
}

/// Remote control for one BattleAura device.
///
/// Owns the live WebSocket channel (through a background actor task) and the
/// HTTP fallback path. All command delivery is fire-and-forget: failures show
/// up on the notice channel and as state transitions, never as errors from
/// the command methods.
///
/// Must be created and used inside a tokio runtime.
pub struct RemoteControlClient {
    tx: mpsc::Sender<ClientRequest>,
    state_rx: watch::Receiver<ConnectionState>,
    handlers: Arc<Handlers>,
    http: reqwest::Client,
    config: ClientConfig,
}

impl RemoteControlClient {
    pub fn new(config: ClientConfig) -> Self {
        let (tx, rx) = mpsc::channel(REQUEST_CHANNEL_CAP);
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        let handlers = Arc::new(Handlers::default());

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .unwrap_or_default();

        tokio::spawn(actor::run(
            rx,
            state_tx,
            Arc::clone(&handlers),
            config.clone(),
        ));

        Self {
            tx,
            state_rx,
            handlers,
            http,
            config,
        }
    }

    /// Opens the live channel. Idempotent; progress is observable only
    /// through [`Self::on_state_change`].
    pub fn connect(&self) {
        self.request(ClientRequest::Connect);
    }

    /// Closes the live channel and cancels any pending reconnection. The
    /// client stays usable: commands fall back to HTTP until the next
    /// `connect`.
    pub fn disconnect(&self) {
        self.request(ClientRequest::Disconnect);
    }

    /// Delivers a command over the live channel if connected, otherwise as
    /// exactly one HTTP fallback request. Never fails from the caller's view;
    /// outcomes surface via [`Self::on_notice`].
    pub fn send(&self, command: Command) {
        if self.state().is_connected() {
            self.request(ClientRequest::Send(command));
        } else {
            debug!(kind = command.kind(), "channel down, using http fallback");
            let http = self.http.clone();
            let config = self.config.clone();
            let handlers = Arc::clone(&self.handlers);
            tokio::spawn(async move {
                fallback::dispatch(&http, &config, command, &handlers).await;
            });
        }
    }

    /// Registers a callback invoked once per decoded device event, in
    /// arrival order. Every registered handler sees every event.
    pub fn on_event(&self, handler: impl Fn(&InboundEvent) + Send + 'static) {
        if let Ok(mut handlers) = self.handlers.events.lock() {
            handlers.push(Box::new(handler));
        }
    }

    /// Registers a callback invoked once per connection state transition.
    pub fn on_state_change(&self, handler: impl Fn(ConnectionState) + Send + 'static) {
        if let Ok(mut handlers) = self.handlers.states.lock() {
            handlers.push(Box::new(handler));
        }
    }

    /// Registers a callback for per-command delivery feedback.
    pub fn on_notice(&self, handler: impl Fn(&Notice) + Send + 'static) {
        if let Ok(mut handlers) = self.handlers.notices.lock() {
            handlers.push(Box::new(handler));
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    /// Request/response half of the device API, sharing this client's HTTP
    /// connection pool.
    pub fn device_api(&self) -> DeviceApi {
        DeviceApi::with_http(self.http.clone(), self.config.clone())
    }

    fn request(&self, request: ClientRequest) {
        if self.tx.try_send(request).is_err() {
            warn!("control actor not keeping up, request dropped");
        }
    }
}
