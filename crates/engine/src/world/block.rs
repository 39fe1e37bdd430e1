use serde::{Deserialize, Serialize};

/// Block type tag stored in every chunk cell. The engine only interprets two
/// values: `AIR` (0) is empty space, `SOLID` (1) is the generation fill.
///
/// Serializes as a bare integer so a chunk goes over the wire as a flat
/// array of numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockType(pub u8);

impl BlockType {
    /// The universal "empty" block.
    pub const AIR: BlockType = BlockType(0);
    /// What freshly generated chunks are filled with.
    pub const SOLID: BlockType = BlockType(1);

    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    pub const fn is_air(self) -> bool {
        self.0 == Self::AIR.0
    }
}

impl From<u8> for BlockType {
    fn from(id: u8) -> Self {
        Self(id)
    }
}
