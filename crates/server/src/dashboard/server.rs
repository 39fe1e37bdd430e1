//! axum web server for the dashboard.
//!
//! `GET /` returns the current [`MetricsSnapshot`] as JSON; `GET /ws` pushes
//! a fresh snapshot to the browser every 500 ms.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use tokio::net::TcpListener;

use super::{Metrics, MetricsSnapshot};

const PUSH_INTERVAL: Duration = Duration::from_millis(500);

pub fn router(metrics: Arc<Metrics>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/ws", get(ws_upgrade))
        .with_state(metrics)
}

/// Start the dashboard web server. Runs until the process exits.
pub async fn start(metrics: Arc<Metrics>, port: u16) {
    let addr = format!("0.0.0.0:{}", port);
    let listener = match TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("Dashboard failed to bind to {}: {}", addr, e);
            return;
        }
    };
    tracing::info!("Dashboard listening on http://{}", addr);

    if let Err(e) = axum::serve(listener, router(metrics)).await {
        tracing::error!("Dashboard server error: {}", e);
    }
}

async fn index(State(metrics): State<Arc<Metrics>>) -> Json<MetricsSnapshot> {
    Json(metrics.snapshot())
}

async fn ws_upgrade(
    ws: WebSocketUpgrade,
    State(metrics): State<Arc<Metrics>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, metrics))
}

async fn handle_socket(mut socket: WebSocket, metrics: Arc<Metrics>) {
    let mut ticker = tokio::time::interval(PUSH_INTERVAL);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let msg = serde_json::json!({
                    "type": "metrics",
                    "data": metrics.snapshot(),
                });
                if socket.send(Message::Text(msg.to_string().into())).await.is_err() {
                    break;
                }
            }

            // Drain incoming frames so close is noticed.
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                    _ => {}
                }
            }
        }
    }
}
