use std::collections::HashMap;

use brushwork_blocks::types::Block;
use brushwork_geom::BlockPos;

use crate::{BlockSource, EditError, Extent};

/// Buffered, all-or-nothing edit over an [`Extent`].
///
/// Reads see pending writes. Nothing reaches the underlying extent until
/// [`commit`](EditSession::commit); dropping the session discards every pending write.
pub struct EditSession<'w> {
    world: &'w mut dyn Extent,
    pending: HashMap<BlockPos, Block>,
    // First-write order of pending positions.
    order: Vec<BlockPos>,
    limit: Option<usize>,
}

impl<'w> EditSession<'w> {
    pub fn new(world: &'w mut dyn Extent) -> Self {
        Self {
            world,
            pending: HashMap::new(),
            order: Vec::new(),
            limit: None,
        }
    }

    /// Session that refuses to buffer more than `limit` distinct positions.
    pub fn with_limit(world: &'w mut dyn Extent, limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::new(world)
        }
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Buffer a write. Returns whether the visible block changed.
    pub fn set_block(&mut self, p: BlockPos, b: Block) -> Result<bool, EditError> {
        if !self.in_height_bounds(p.y) || self.block(p) == b {
            return Ok(false);
        }
        if !self.pending.contains_key(&p) {
            if let Some(limit) = self.limit {
                if self.order.len() >= limit {
                    return Err(EditError::LimitExceeded { limit });
                }
            }
            self.order.push(p);
        }
        self.pending.insert(p, b);
        Ok(true)
    }

    /// Block currently stored in the underlying extent, ignoring pending writes.
    pub fn original_block(&self, p: BlockPos) -> Block {
        self.world.block(p)
    }

    /// Positions written so far, in first-write order.
    pub fn write_order(&self) -> &[BlockPos] {
        &self.order
    }

    pub fn pending_len(&self) -> usize {
        self.order.len()
    }

    /// Flush pending writes; returns how many stored blocks actually changed.
    pub fn commit(self) -> usize {
        let EditSession {
            world,
            mut pending,
            order,
            ..
        } = self;
        let mut changed = 0;
        for p in order {
            if let Some(b) = pending.remove(&p) {
                if world.set_block(p, b) {
                    changed += 1;
                }
            }
        }
        changed
    }
}

impl BlockSource for EditSession<'_> {
    fn block(&self, p: BlockPos) -> Block {
        match self.pending.get(&p) {
            Some(b) => *b,
            None => self.world.block(p),
        }
    }

    fn min_y(&self) -> i32 {
        self.world.min_y()
    }

    fn max_y(&self) -> i32 {
        self.world.max_y()
    }
}
