//! Command-line and environment configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use voxsync_engine::{ChunkAddressing, WorldConfig};

#[derive(Debug, Clone, Parser)]
#[command(name = "voxsync-server", version, about = "Voxel world synchronization server")]
pub struct ServerConfig {
    /// Address the game WebSocket listens on.
    #[arg(long, env = "VOXSYNC_BIND", default_value = "0.0.0.0:8080")]
    pub bind: String,

    /// Port of the operator dashboard; 0 disables it.
    #[arg(long, env = "VOXSYNC_DASHBOARD_PORT", default_value_t = 8000)]
    pub dashboard_port: u16,

    /// JSON file holding player records.
    #[arg(long, env = "VOXSYNC_PLAYERS_FILE", value_name = "PATH", default_value = "data/players.json")]
    pub players_file: PathBuf,

    /// Keep player records in memory only. They are lost on restart.
    #[arg(long, env = "VOXSYNC_IN_MEMORY")]
    pub in_memory: bool,

    /// Half-extent of the square area new players spawn in.
    #[arg(long, env = "VOXSYNC_SPAWN_RADIUS", default_value_t = 64)]
    pub spawn_radius: i32,

    /// Key chunks by chunk-grid coordinates instead of the raw request
    /// position. Not understood by legacy clients.
    #[arg(long, env = "VOXSYNC_ALIGN_CHUNKS")]
    pub align_chunks: bool,

    /// Seconds between saves of online players; 0 disables autosave.
    #[arg(long, env = "VOXSYNC_AUTOSAVE_SECS", default_value_t = 300)]
    pub autosave_secs: u64,
}

impl ServerConfig {
    pub fn world(&self) -> WorldConfig {
        WorldConfig {
            addressing: if self.align_chunks {
                ChunkAddressing::Aligned
            } else {
                ChunkAddressing::Raw
            },
            spawn_radius: self.spawn_radius,
        }
    }

    pub fn autosave_interval(&self) -> Option<Duration> {
        (self.autosave_secs > 0).then(|| Duration::from_secs(self.autosave_secs))
    }

    pub fn dashboard_port(&self) -> Option<u16> {
        (self.dashboard_port > 0).then_some(self.dashboard_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = ServerConfig::try_parse_from(["voxsync-server"]).unwrap();
        assert_eq!(cfg.bind, "0.0.0.0:8080");
        assert_eq!(cfg.players_file, PathBuf::from("data/players.json"));
        assert!(!cfg.in_memory);
        assert_eq!(cfg.world().addressing, ChunkAddressing::Raw);
        assert_eq!(cfg.autosave_interval(), Some(Duration::from_secs(300)));
        assert_eq!(cfg.dashboard_port(), Some(8000));
    }

    #[test]
    fn flags_override_defaults() {
        let cfg = ServerConfig::try_parse_from([
            "voxsync-server",
            "--align-chunks",
            "--autosave-secs",
            "0",
            "--dashboard-port",
            "0",
            "--spawn-radius",
            "8",
        ])
        .unwrap();
        assert_eq!(cfg.world().addressing, ChunkAddressing::Aligned);
        assert_eq!(cfg.world().spawn_radius, 8);
        assert_eq!(cfg.autosave_interval(), None);
        assert_eq!(cfg.dashboard_port(), None);
    }
}
