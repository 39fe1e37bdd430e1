use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use voxsync_server::Server;
use voxsync_server::config::ServerConfig;
use voxsync_server::dashboard;
use voxsync_server::net;
use voxsync_server::persistence::{JsonFileGateway, NoPersistence, PersistenceGateway};

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("voxsync world server");

    if config.in_memory {
        tracing::warn!("Running without persistence, player data is lost on restart");
        serve(config, NoPersistence).await
    } else {
        tracing::info!("Player records in {}", config.players_file.display());
        let gateway = JsonFileGateway::new(config.players_file.clone());
        serve(config, gateway).await
    }
}

async fn serve<G: PersistenceGateway>(config: ServerConfig, gateway: G) -> Result<()> {
    let world = config.world();
    tracing::info!(
        "Chunk addressing {:?}, spawn radius {}",
        world.addressing,
        world.spawn_radius
    );
    let server = Arc::new(Server::start(gateway, world).await);

    if let Some(port) = config.dashboard_port() {
        let metrics = server.metrics();
        tokio::spawn(async move {
            dashboard::server::start(metrics, port).await;
        });
    }

    // ── Periodic autosave ────────────────────────────────────────────────
    if let Some(period) = config.autosave_interval() {
        let autosave = Arc::clone(&server);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await; // first tick is immediate, skip it
            loop {
                interval.tick().await;
                match autosave.flush_all().await {
                    Ok(0) => {}
                    Ok(n) => tracing::info!("Autosave complete: {} players", n),
                    Err(e) => tracing::error!("Autosave failed: {}", e),
                }
            }
        });
    }

    // ── Listener with graceful shutdown ──────────────────────────────────
    tokio::select! {
        result = net::listener::run(Arc::clone(&server), &config.bind) => {
            if let Err(e) = result {
                tracing::error!("Server error: {:#}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Ctrl+C received, shutting down...");
        }
    }

    tracing::info!("Saving online players before exit...");
    match server.flush_all().await {
        Ok(n) => tracing::info!("Shutdown save complete: {} players written", n),
        Err(e) => tracing::error!("Shutdown save failed: {}", e),
    }
    Ok(())
}
