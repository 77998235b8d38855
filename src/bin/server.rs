use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use arcade_maze::constants::{TICK_MS, TICK_RATE};
use arcade_maze::engine::GameEngine;
use arcade_maze::logging::{emit_log, LogLevel, LogScope};
use arcade_maze::server_protocol::{parse_client_message, ParsedClientMessage};
use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use futures_util::{SinkExt, StreamExt};
use rand::distr::Alphanumeric;
use rand::Rng;
use serde_json::{json, Value};
use tokio::sync::{mpsc, Mutex};
use tower_http::services::{ServeDir, ServeFile};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

type SharedState = Arc<Mutex<ServerState>>;

#[derive(Clone)]
struct ClientContext {
    tx: mpsc::Sender<OutboundMessage>,
}

#[derive(Clone, Debug)]
enum OutboundMessage {
    Text(String),
    Close { code: u16, reason: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum QueuePolicy {
    DropOnFull,
    DisconnectOnFull,
}

/// One shared session watched and driven by every connected client.
struct ServerState {
    clients: HashMap<String, ClientContext>,
    engine: GameEngine,
}

impl ServerState {
    fn new() -> Self {
        Self {
            clients: HashMap::new(),
            engine: GameEngine::new(),
        }
    }
}

#[tokio::main]
async fn main() {
    let port = std::env::var("PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let state = Arc::new(Mutex::new(ServerState::new()));
    start_tick_loop(state.clone());

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/ws", get(ws_handler))
        .with_state(state);

    let app = if let Some(static_dir) = resolve_static_dir() {
        let index_file = static_dir.join("index.html");
        emit_log(
            LogLevel::Info,
            "static_root",
            LogScope::default(),
            json!({ "path": static_dir.to_string_lossy() }),
        );
        app.fallback_service(
            ServeDir::new(static_dir).not_found_service(ServeFile::new(index_file)),
        )
    } else {
        emit_log(
            LogLevel::Warn,
            "static_root_missing",
            LogScope::default(),
            json!({ "hint": "set STATIC_DIR to a directory containing index.html" }),
        );
        app
    };

    let bind_addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("failed to bind server socket");

    emit_log(
        LogLevel::Info,
        "server_listening",
        LogScope::default(),
        json!({ "port": port, "tickMs": TICK_MS, "tickRate": TICK_RATE }),
    );
    axum::serve(listener, app)
        .await
        .expect("server runtime failed");
}

fn resolve_static_dir() -> Option<PathBuf> {
    if let Ok(raw) = std::env::var("STATIC_DIR") {
        let path = PathBuf::from(raw);
        if path.join("index.html").is_file() {
            return Some(path);
        }
    }
    let fallback = PathBuf::from("dist/client");
    fallback.join("index.html").is_file().then_some(fallback)
}

async fn healthz() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<SharedState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

async fn handle_socket(state: SharedState, socket: WebSocket) {
    let client_id = make_id("client");
    let (tx, mut rx) = mpsc::channel::<OutboundMessage>(256);

    {
        let mut guard = state.lock().await;
        guard
            .clients
            .insert(client_id.clone(), ClientContext { tx: tx.clone() });
        let welcome = welcome_message(&client_id, &guard.engine);
        send_to_client(&mut guard, &client_id, &welcome, QueuePolicy::DisconnectOnFull);
        emit_log(
            LogLevel::Info,
            "client_connected",
            LogScope::default(),
            json!({ "clientId": client_id, "clients": guard.clients.len() }),
        );
    }

    let (mut ws_sender, mut ws_receiver) = socket.split();
    let writer = tokio::spawn(async move {
        while let Some(outbound) = rx.recv().await {
            let should_close = matches!(outbound, OutboundMessage::Close { .. });
            let result = match outbound {
                OutboundMessage::Text(payload) => {
                    ws_sender.send(Message::Text(payload.into())).await
                }
                OutboundMessage::Close { code, reason } => {
                    let frame = CloseFrame {
                        code,
                        reason: reason.into(),
                    };
                    ws_sender.send(Message::Close(Some(frame))).await
                }
            };
            if result.is_err() || should_close {
                break;
            }
        }
    });

    while let Some(received) = ws_receiver.next().await {
        let Ok(message) = received else {
            break;
        };

        match message {
            Message::Text(raw) => {
                let mut guard = state.lock().await;
                handle_client_message(&mut guard, &client_id, raw.as_str());
            }
            Message::Binary(raw) => {
                let mut guard = state.lock().await;
                match std::str::from_utf8(&raw) {
                    Ok(text) => handle_client_message(&mut guard, &client_id, text),
                    Err(_) => send_error(&mut guard, &client_id, "invalid utf8 message"),
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    {
        let mut guard = state.lock().await;
        disconnect_client(&mut guard, &client_id);
    }
    drop(tx);
    let _ = writer.await;
}

fn handle_client_message(state: &mut ServerState, client_id: &str, raw: &str) {
    let Some(message) = parse_client_message(raw) else {
        emit_log(
            LogLevel::Warn,
            "invalid_message",
            LogScope::default(),
            json!({ "clientId": client_id, "bytes": raw.len() }),
        );
        send_error(state, client_id, "invalid message");
        return;
    };

    match message {
        ParsedClientMessage::Start => {
            if !state.engine.start() {
                send_error(state, client_id, "session already running; restart first");
                return;
            }
            emit_log(
                LogLevel::Info,
                "session_started",
                LogScope::default(),
                json!({ "by": client_id }),
            );
            broadcast_mode(state);
        }
        ParsedClientMessage::Restart => {
            if !state.engine.restart() {
                send_error(state, client_id, "nothing to restart");
                return;
            }
            broadcast_mode(state);
        }
        ParsedClientMessage::Input { dir } => {
            state.engine.receive_input(dir);
        }
        ParsedClientMessage::Ping { t } => {
            send_to_client(
                state,
                client_id,
                &json!({
                    "type": "pong",
                    "t": t,
                }),
                QueuePolicy::DisconnectOnFull,
            );
        }
    }
}

fn welcome_message(client_id: &str, engine: &GameEngine) -> Value {
    json!({
        "type": "welcome",
        "clientId": client_id,
        "grid": engine.get_grid_init(),
        "mode": engine.mode(),
    })
}

fn broadcast_mode(state: &mut ServerState) {
    let message = json!({
        "type": "mode",
        "mode": state.engine.mode(),
    });
    broadcast(state, &message, QueuePolicy::DisconnectOnFull);
}

fn start_tick_loop(state: SharedState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(TICK_MS));
        loop {
            interval.tick().await;
            let mut guard = state.lock().await;
            tick_game(&mut guard);
        }
    });
}

/// Advances the shared session one tick. The tick that ends the session also
/// sends its summary, and nothing is stepped afterwards until a new start.
fn tick_game(state: &mut ServerState) {
    if !state.engine.is_playing() {
        return;
    }
    state.engine.step();
    let snapshot = state.engine.build_snapshot(true);
    broadcast(
        state,
        &json!({
            "type": "state",
            "snapshot": snapshot,
        }),
        QueuePolicy::DropOnFull,
    );

    if state.engine.is_playing() {
        return;
    }
    let Some(summary) = state.engine.build_summary() else {
        return;
    };
    emit_log(
        LogLevel::Info,
        "session_ended",
        LogScope {
            tick: Some(summary.ticks),
            ..LogScope::default()
        },
        json!({
            "outcome": summary.outcome,
            "score": summary.score,
            "remainingCollectibles": summary.remaining_collectibles,
        }),
    );
    broadcast(
        state,
        &json!({
            "type": "game_over",
            "summary": summary,
        }),
        QueuePolicy::DisconnectOnFull,
    );
}

fn disconnect_client(state: &mut ServerState, client_id: &str) {
    let Some(context) = state.clients.remove(client_id) else {
        return;
    };
    let _ = context.tx.try_send(OutboundMessage::Close {
        code: 1000,
        reason: "bye".to_string(),
    });
    emit_log(
        LogLevel::Info,
        "client_disconnected",
        LogScope::default(),
        json!({ "clientId": client_id, "clients": state.clients.len() }),
    );
}

fn send_to_client(state: &mut ServerState, client_id: &str, message: &Value, policy: QueuePolicy) {
    let send_failed = if let Some(client) = state.clients.get(client_id) {
        client
            .tx
            .try_send(OutboundMessage::Text(message.to_string()))
            .is_err()
    } else {
        false
    };
    if send_failed && policy == QueuePolicy::DisconnectOnFull {
        disconnect_client(state, client_id);
    }
}

fn send_error(state: &mut ServerState, client_id: &str, message: &str) {
    send_to_client(
        state,
        client_id,
        &json!({
            "type": "error",
            "message": message,
        }),
        QueuePolicy::DisconnectOnFull,
    );
}

fn broadcast(state: &mut ServerState, message: &Value, policy: QueuePolicy) {
    let payload = message.to_string();
    let mut failed_clients = Vec::new();
    for (client_id, client) in &state.clients {
        if client
            .tx
            .try_send(OutboundMessage::Text(payload.clone()))
            .is_err()
            && policy == QueuePolicy::DisconnectOnFull
        {
            failed_clients.push(client_id.clone());
        }
    }
    for client_id in failed_clients {
        disconnect_client(state, &client_id);
    }
}

fn make_id(prefix: &str) -> String {
    let seq = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    let suffix: String = rand::rng()
        .sample_iter(Alphanumeric)
        .take(6)
        .map(char::from)
        .collect();
    format!("{prefix}_{seq}_{suffix}")
}
