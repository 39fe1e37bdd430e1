//! World model for the voxsync server: the chunk store and the player
//! directory. Everything here is synchronous and I/O free; the server crate
//! drives these types from behind a single lock.

pub mod players;
pub mod world;

pub use players::{Attach, PlayerDirectory, PlayerRecord};
pub use world::block::BlockType;
pub use world::chunk::{CHUNK_DEPTH, CHUNK_HEIGHT, CHUNK_VOLUME, CHUNK_WIDTH, Chunk};
pub use world::position::{ChunkAddressing, ChunkKey, Position, Rotation};
pub use world::{ChunkError, ChunkStore, WorldConfig};
