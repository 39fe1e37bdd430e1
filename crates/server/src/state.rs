use voxsync_engine::{ChunkStore, PlayerDirectory, WorldConfig};

use crate::connection_registry::ConnectionRegistry;
use crate::event_bus::BroadcastBus;

/// All authoritative in-memory state of one server process.
///
/// Handlers receive it by `&mut` for the duration of a single envelope, so
/// mutations never interleave.
#[derive(Debug, Default)]
pub struct WorldState {
    pub connections: ConnectionRegistry,
    pub players: PlayerDirectory,
    pub chunks: ChunkStore,
}

impl WorldState {
    pub fn new(config: WorldConfig) -> Self {
        Self {
            connections: ConnectionRegistry::new(),
            players: PlayerDirectory::new(),
            chunks: ChunkStore::new(config),
        }
    }

    pub fn bus(&self) -> BroadcastBus<'_> {
        BroadcastBus::new(&self.connections)
    }
}
