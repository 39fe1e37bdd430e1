pub mod block;
pub mod chunk;
pub mod position;

use std::collections::HashMap;

use block::BlockType;
use chunk::{CHUNK_HEIGHT, Chunk};
use position::{ChunkAddressing, ChunkKey, Position};
use rand::Rng;
use thiserror::Error;

/// Why a single-block edit was not applied.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChunkError {
    /// The chunk was never requested, so there is nothing to edit.
    #[error("chunk {0} has not been generated")]
    Missing(ChunkKey),
    /// The position does not map to a cell inside the chunk.
    #[error("position {0:?} does not address a block inside its chunk")]
    Unaddressable(Position),
    #[error("cell index {0} is outside the chunk")]
    IndexOutOfRange(usize),
}

/// World-level knobs for the chunk store.
#[derive(Debug, Clone, Copy)]
pub struct WorldConfig {
    pub addressing: ChunkAddressing,
    /// Spawn points are drawn from `[-spawn_radius, spawn_radius)` on x and z.
    pub spawn_radius: i32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            addressing: ChunkAddressing::Raw,
            spawn_radius: 64,
        }
    }
}

/// Sparse map of generated chunks.
///
/// Chunks come into existence only through [`ChunkStore::get_or_create`];
/// edits never create one. Every key maps to exactly one full-size chunk.
#[derive(Debug, Default)]
pub struct ChunkStore {
    config: WorldConfig,
    chunks: HashMap<ChunkKey, Chunk>,
}

impl ChunkStore {
    pub fn new(config: WorldConfig) -> Self {
        Self {
            config,
            chunks: HashMap::new(),
        }
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// The key a request for `position` resolves to.
    pub fn key_for(&self, position: &Position) -> ChunkKey {
        self.config.addressing.key(position)
    }

    /// Cell index of `position` inside its chunk, if it has one.
    pub fn index(&self, position: &Position) -> Option<usize> {
        self.config.addressing.index(position)
    }

    /// Return the chunk for `key`, generating (and keeping) it on first access.
    pub fn get_or_create(&mut self, key: ChunkKey) -> &Chunk {
        self.chunks.entry(key).or_insert_with_key(|key| {
            tracing::debug!("Generating chunk {}", key);
            Chunk::generate()
        })
    }

    pub fn get(&self, key: &ChunkKey) -> Option<&Chunk> {
        self.chunks.get(key)
    }

    pub fn contains(&self, key: &ChunkKey) -> bool {
        self.chunks.contains_key(key)
    }

    /// Overwrite one cell of an already generated chunk.
    pub fn set_block(
        &mut self,
        key: &ChunkKey,
        index: usize,
        block: BlockType,
    ) -> Result<(), ChunkError> {
        let chunk = self
            .chunks
            .get_mut(key)
            .ok_or_else(|| ChunkError::Missing(key.clone()))?;
        chunk
            .set(index, block)
            .map(|_| ())
            .ok_or(ChunkError::IndexOutOfRange(index))
    }

    /// Key, index and edit in one step for a client-supplied position.
    pub fn set_block_at(&mut self, position: &Position, block: BlockType) -> Result<(), ChunkError> {
        let key = self.key_for(position);
        if !self.contains(&key) {
            return Err(ChunkError::Missing(key));
        }
        let index = self
            .index(position)
            .ok_or(ChunkError::Unaddressable(*position))?;
        self.set_block(&key, index, block)
    }

    /// A spawn point on top of the (uniformly solid) terrain.
    pub fn random_surface_position<R: Rng + ?Sized>(&self, rng: &mut R) -> Position {
        let r = self.config.spawn_radius.max(1);
        let x = rng.gen_range(-r..r);
        let z = rng.gen_range(-r..r);
        Position::new(x as f64, CHUNK_HEIGHT as f64, z as f64)
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }
}
