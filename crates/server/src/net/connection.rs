//! One game socket: a writer task draining the connection's queue and a
//! reader loop feeding frames to the server.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};

use crate::persistence::PersistenceGateway;
use crate::server::Server;

pub async fn handle<G: PersistenceGateway>(socket: WebSocket, server: Arc<Server<G>>) {
    let (mut sink, mut stream) = socket.split();
    let (conn, mut rx) = server.open_connection();
    tracing::info!("Client connected as {}", conn.id());

    let writer = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sink.send(Message::Text(frame.as_ref().into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(msg) = stream.next().await {
        match msg {
            Ok(Message::Text(text)) => server.handle_text(&conn, text.as_str()).await,
            Ok(Message::Binary(bytes)) => match std::str::from_utf8(&bytes) {
                Ok(text) => server.handle_text(&conn, text).await,
                Err(_) => {
                    tracing::warn!("Ignoring non-UTF-8 binary frame from {}", conn.id());
                }
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("Socket error on {}: {}", conn.id(), e);
                break;
            }
        }
    }

    server.handle_close(&conn).await;
    writer.abort();
    tracing::info!("Client {} disconnected", conn.id());
}
