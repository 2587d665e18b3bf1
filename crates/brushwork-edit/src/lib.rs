//! Voxel read/write boundary: extents, an in-memory chunked store, and edit sessions.
#![forbid(unsafe_code)]

mod memory;
mod session;

pub use memory::{MemoryExtent, MemoryExtentStats};
pub use session::EditSession;

use brushwork_blocks::types::Block;
use brushwork_geom::BlockPos;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("edit exceeds the limit of {limit} changed blocks")]
    LimitExceeded { limit: usize },
}

/// Read access to a voxel volume.
pub trait BlockSource {
    fn block(&self, p: BlockPos) -> Block;
    /// Lowest writable y (inclusive).
    fn min_y(&self) -> i32;
    /// Highest writable y (inclusive).
    fn max_y(&self) -> i32;

    #[inline]
    fn is_air(&self, p: BlockPos) -> bool {
        self.block(p).is_air()
    }

    #[inline]
    fn in_height_bounds(&self, y: i32) -> bool {
        y >= self.min_y() && y <= self.max_y()
    }
}

/// A voxel volume that can be written.
pub trait Extent: BlockSource {
    /// Returns whether the stored block changed.
    fn set_block(&mut self, p: BlockPos, b: Block) -> bool;
}

/// Highest non-air block in the column at or below `start_y`, not lower than `min_y`.
pub fn surface_y(src: &dyn BlockSource, x: i32, z: i32, start_y: i32, min_y: i32) -> Option<i32> {
    let top = start_y.min(src.max_y());
    let bottom = min_y.max(src.min_y());
    (bottom..=top)
        .rev()
        .find(|&y| !src.is_air(BlockPos::new(x, y, z)))
}
