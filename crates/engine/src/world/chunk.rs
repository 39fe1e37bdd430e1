use super::block::BlockType;

/// Blocks along the x axis of a chunk.
pub const CHUNK_WIDTH: usize = 16;
/// Blocks along the y axis of a chunk.
pub const CHUNK_HEIGHT: usize = 256;
/// Blocks along the z axis of a chunk.
pub const CHUNK_DEPTH: usize = 16;
/// Total cell count of one chunk.
pub const CHUNK_VOLUME: usize = CHUNK_WIDTH * CHUNK_HEIGHT * CHUNK_DEPTH;

/// A 16x256x16 cuboid of blocks stored as one flat array.
///
/// The length is fixed at [`CHUNK_VOLUME`]; nothing can grow or shrink it.
#[derive(Clone, PartialEq, Eq)]
pub struct Chunk {
    blocks: Box<[BlockType; CHUNK_VOLUME]>,
}

impl Chunk {
    pub fn new_filled(block: BlockType) -> Self {
        Self {
            blocks: Box::new([block; CHUNK_VOLUME]),
        }
    }

    /// The only generation policy: solid all the way through.
    pub fn generate() -> Self {
        Self::new_filled(BlockType::SOLID)
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<BlockType> {
        self.blocks.get(index).copied()
    }

    /// Overwrite one cell. Returns the previous value, or `None` if `index`
    /// is outside the chunk.
    #[inline]
    pub fn set(&mut self, index: usize, block: BlockType) -> Option<BlockType> {
        self.blocks
            .get_mut(index)
            .map(|cell| std::mem::replace(cell, block))
    }

    pub fn blocks(&self) -> &[BlockType] {
        &self.blocks[..]
    }

    pub fn is_all_air(&self) -> bool {
        self.blocks.iter().all(|b| b.is_air())
    }
}

impl std::fmt::Debug for Chunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let solid = self.blocks.iter().filter(|b| !b.is_air()).count();
        f.debug_struct("Chunk").field("non_air", &solid).finish()
    }
}
