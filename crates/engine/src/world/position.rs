use std::fmt;

use serde::{Deserialize, Serialize};

use super::chunk::{CHUNK_DEPTH, CHUNK_HEIGHT, CHUNK_VOLUME, CHUNK_WIDTH};

/// A point in world space as clients report it. Coordinates are floats
/// because the same triple is used for player positions and block targets.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub const ORIGIN: Position = Position::new(0.0, 0.0, 0.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// The integer block containing this point.
    pub fn block(&self) -> [i64; 3] {
        [
            self.x.floor() as i64,
            self.y.floor() as i64,
            self.z.floor() as i64,
        ]
    }
}

/// Player orientation, stored and echoed back but never interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rotation {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// How a requested position is turned into a chunk key and a cell index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChunkAddressing {
    /// Key by the raw position and index with a sign-preserving remainder.
    /// Two points inside the same physical chunk get different keys, and
    /// negative coordinates can index outside the chunk. Existing clients
    /// depend on this.
    #[default]
    Raw,
    /// Key by floor-divided chunk coordinates and index chunk-locally.
    Aligned,
}

impl ChunkAddressing {
    pub fn key(self, position: &Position) -> ChunkKey {
        match self {
            ChunkAddressing::Raw => ChunkKey(format!(
                "{},{},{}",
                legacy_number(position.x),
                legacy_number(position.y),
                legacy_number(position.z),
            )),
            ChunkAddressing::Aligned => {
                let [x, y, z] = position.block();
                ChunkKey(format!(
                    "{},{},{}",
                    x.div_euclid(CHUNK_WIDTH as i64),
                    y.div_euclid(CHUNK_HEIGHT as i64),
                    z.div_euclid(CHUNK_DEPTH as i64),
                ))
            }
        }
    }

    /// Cell index `x + y*depth + z*width*height` inside the chunk, or `None`
    /// if the formula lands outside the chunk.
    pub fn index(self, position: &Position) -> Option<usize> {
        // Widened so client-supplied extremes cannot overflow.
        let [x, y, z] = position.block().map(i128::from);
        let (w, h, d) = (CHUNK_WIDTH as i128, CHUNK_HEIGHT as i128, CHUNK_DEPTH as i128);
        let raw = match self {
            ChunkAddressing::Raw => x % w + y * d + (z % d) * w * h,
            ChunkAddressing::Aligned => {
                x.rem_euclid(w) + y.rem_euclid(h) * d + z.rem_euclid(d) * w * h
            }
        };
        usize::try_from(raw).ok().filter(|i| *i < CHUNK_VOLUME)
    }
}

/// Key of one chunk in the store: `"x,y,z"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkKey(String);

impl ChunkKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChunkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Formats a coordinate the way legacy clients build their keys: integral
/// values without a fraction and negative zero as `0`.
fn legacy_number(v: f64) -> String {
    if v == 0.0 {
        return "0".to_string();
    }
    v.to_string()
}
