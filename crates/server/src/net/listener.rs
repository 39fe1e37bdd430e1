use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::response::IntoResponse;
use axum::routing::get;
use tokio::net::TcpListener;

use crate::persistence::PersistenceGateway;
use crate::server::Server;

/// Game clients upgrade on the root path.
pub fn router<G: PersistenceGateway>(server: Arc<Server<G>>) -> Router {
    Router::new()
        .route("/", get(ws_upgrade::<G>))
        .with_state(server)
}

/// Accept game clients on `bind_addr` until the listener fails.
pub async fn run<G: PersistenceGateway>(server: Arc<Server<G>>, bind_addr: &str) -> anyhow::Result<()> {
    let listener = TcpListener::bind(bind_addr).await?;
    tracing::info!("Listening on ws://{}", listener.local_addr()?);
    axum::serve(listener, router(server)).await?;
    Ok(())
}

async fn ws_upgrade<G: PersistenceGateway>(
    ws: WebSocketUpgrade,
    State(server): State<Arc<Server<G>>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| super::connection::handle(socket, server))
}
