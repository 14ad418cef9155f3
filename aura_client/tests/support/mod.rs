//! In-process stand-in for a BattleAura device: one axum server exposing the
//! control-channel upgrade at `/ws` plus the REST routes the fallback path
//! and `DeviceApi` hit. Everything it receives is recorded for assertions.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Json, OriginalUri, State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use url::Url;

#[derive(Debug, Clone)]
pub struct HttpHit {
    pub path: String,
    pub body: Option<Value>,
}

pub struct DeviceState {
    http_hits: Mutex<Vec<HttpHit>>,
    ws_frames: Mutex<Vec<String>>,
    ws_connections: AtomicUsize,
    fail_http: AtomicBool,
    push_tx: broadcast::Sender<String>,
    close_tx: broadcast::Sender<()>,
}

pub struct MockDevice {
    pub base_url: Url,
    state: Arc<DeviceState>,
}

impl MockDevice {
    pub async fn spawn() -> Self {
        let (push_tx, _) = broadcast::channel(16);
        let (close_tx, _) = broadcast::channel(4);
        let state = Arc::new(DeviceState {
            http_hits: Mutex::new(Vec::new()),
            ws_frames: Mutex::new(Vec::new()),
            ws_connections: AtomicUsize::new(0),
            fail_http: AtomicBool::new(false),
            push_tx,
            close_tx,
        });

        let app = Router::new()
            .route("/ws", get(ws_handler))
            .route("/api/pin/effect", post(record))
            .route("/api/effects/stop", post(record))
            .route("/api/audio/play", post(record))
            .route("/api/audio/stop", post(record))
            .route("/api/audio/volume", post(record))
            .route("/api/config/brightness", post(record))
            .route("/api/config", get(get_config))
            .route("/api/status", get(get_status))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock device");
        let addr = listener.local_addr().expect("mock device addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock device serve");
        });

        MockDevice {
            base_url: Url::parse(&format!("http://{addr}")).expect("mock device url"),
            state,
        }
    }

    /// Pushes a raw frame to every connected control-channel client.
    pub fn push_frame(&self, frame: &str) {
        let _ = self.state.push_tx.send(frame.to_string());
    }

    /// Closes every connected control-channel client from the device side.
    pub fn close_clients(&self) {
        let _ = self.state.close_tx.send(());
    }

    /// Makes every subsequent REST request fail with a 500.
    pub fn fail_http(&self, fail: bool) {
        self.state.fail_http.store(fail, Ordering::SeqCst);
    }

    pub fn ws_connections(&self) -> usize {
        self.state.ws_connections.load(Ordering::SeqCst)
    }

    pub fn ws_frames(&self) -> Vec<String> {
        self.state.ws_frames.lock().unwrap().clone()
    }

    pub fn http_hits(&self) -> Vec<HttpHit> {
        self.state.http_hits.lock().unwrap().clone()
    }
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<DeviceState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: Arc<DeviceState>) {
    // Subscribe before bumping the counter so a test that has observed the
    // connection can push frames without losing them.
    let mut push_rx = state.push_tx.subscribe();
    let mut close_rx = state.close_tx.subscribe();
    state.ws_connections.fetch_add(1, Ordering::SeqCst);

    loop {
        tokio::select! {
            frame = socket.recv() => match frame {
                Some(Ok(Message::Text(text))) => {
                    state.ws_frames.lock().unwrap().push(text);
                }
                Some(Ok(_)) => {}
                _ => break,
            },
            pushed = push_rx.recv() => match pushed {
                Ok(text) => {
                    if socket.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            closed = close_rx.recv() => {
                if closed.is_ok() {
                    let _ = socket.send(Message::Close(None)).await;
                }
                break;
            }
        }
    }
}

async fn record(
    OriginalUri(uri): OriginalUri,
    State(state): State<Arc<DeviceState>>,
    body: Option<Json<Value>>,
) -> StatusCode {
    if state.fail_http.load(Ordering::SeqCst) {
        return StatusCode::INTERNAL_SERVER_ERROR;
    }
    state.http_hits.lock().unwrap().push(HttpHit {
        path: uri.path().to_string(),
        body: body.map(|Json(v)| v),
    });
    StatusCode::OK
}

async fn get_config() -> Json<Value> {
    Json(json!({
        "deviceName": "BattleAura",
        "version": "1.1.0",
        "volume": 15,
        "audioEnabled": true,
        "wifiEnabled": true,
        "pins": [
            {"pin": 4, "pinMode": 2, "defaultEffect": 1, "name": "Brazier",
             "audioFile": 0, "enabled": true, "brightness": 200, "color": 16753920}
        ]
    }))
}

async fn get_status() -> Json<Value> {
    Json(json!({
        "uptime": 321,
        "freeHeap": 150000,
        "wifiMode": "STA",
        "ipAddress": "127.0.0.1"
    }))
}
