use std::collections::HashMap;

use brushwork_blocks::types::Block;
use brushwork_geom::BlockPos;

use crate::{BlockSource, Extent};

type ChunkKey = (i32, i32, i32);

#[derive(Default, Debug, Clone, Copy)]
pub struct MemoryExtentStats {
    pub chunk_entries: usize,
    pub blocks: usize,
    pub rev_entries: usize,
}

/// Chunk-aware sparse voxel store with simple change tracking.
///
/// Air is never stored. Every write bumps a per-chunk revision so callers can find
/// the chunks a stroke touched.
pub struct MemoryExtent {
    sx: i32,
    sy: i32,
    sz: i32,
    min_y: i32,
    max_y: i32,
    // Map per-chunk: key=(cx,cy,cz) -> map of world coords -> Block
    inner: HashMap<ChunkKey, HashMap<BlockPos, Block>>,
    rev: HashMap<ChunkKey, u64>, // latest write into chunk
    counter: u64,
}

impl MemoryExtent {
    pub fn new(sx: i32, sy: i32, sz: i32, min_y: i32, max_y: i32) -> Self {
        Self {
            sx: sx.max(1),
            sy: sy.max(1),
            sz: sz.max(1),
            min_y,
            max_y,
            inner: HashMap::new(),
            rev: HashMap::new(),
            counter: 0,
        }
    }

    /// 32³ chunks between `min_y` and `max_y`.
    pub fn with_height(min_y: i32, max_y: i32) -> Self {
        Self::new(32, 32, 32, min_y, max_y)
    }

    pub fn stats(&self) -> MemoryExtentStats {
        MemoryExtentStats {
            chunk_entries: self.inner.len(),
            blocks: self.inner.values().map(|m| m.len()).sum(),
            rev_entries: self.rev.len(),
        }
    }

    #[inline]
    fn chunk_key(&self, p: BlockPos) -> ChunkKey {
        (
            p.x.div_euclid(self.sx),
            p.y.div_euclid(self.sy),
            p.z.div_euclid(self.sz),
        )
    }

    /// Mark the chunk holding `p` as changed; returns the new monotonically increasing stamp.
    fn bump(&mut self, p: BlockPos) -> u64 {
        self.counter = self.counter.wrapping_add(1).max(1);
        let stamp = self.counter;
        let key = self.chunk_key(p);
        self.rev.insert(key, stamp);
        stamp
    }

    pub fn rev(&self, chunk: ChunkKey) -> u64 {
        self.rev.get(&chunk).copied().unwrap_or(0)
    }

    /// Current stamp; pass to [`changed_chunks`](Self::changed_chunks) to see later edits.
    pub fn stamp(&self) -> u64 {
        self.counter
    }

    /// Chunks whose revision is newer than `since`, sorted.
    pub fn changed_chunks(&self, since: u64) -> Vec<ChunkKey> {
        let mut out: Vec<ChunkKey> = self
            .rev
            .iter()
            .filter(|(_, r)| **r > since)
            .map(|(k, _)| *k)
            .collect();
        out.sort();
        out
    }
}

impl BlockSource for MemoryExtent {
    fn block(&self, p: BlockPos) -> Block {
        let k = self.chunk_key(p);
        self.inner
            .get(&k)
            .and_then(|m| m.get(&p).copied())
            .unwrap_or(Block::AIR)
    }

    fn min_y(&self) -> i32 {
        self.min_y
    }

    fn max_y(&self) -> i32 {
        self.max_y
    }
}

impl Extent for MemoryExtent {
    fn set_block(&mut self, p: BlockPos, b: Block) -> bool {
        if !self.in_height_bounds(p.y) || self.block(p) == b {
            return false;
        }
        let k = self.chunk_key(p);
        if b.is_air() {
            if let Some(m) = self.inner.get_mut(&k) {
                m.remove(&p);
                if m.is_empty() {
                    self.inner.remove(&k);
                }
            }
        } else {
            self.inner.entry(k).or_default().insert(p, b);
        }
        self.bump(p);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_store() -> MemoryExtent {
        MemoryExtent::new(32, 32, 32, -256, 255)
    }

    #[test]
    fn border_write_changes_only_its_own_chunk() {
        let mut store = make_store();
        let (cx, cy, cz) = (4, 3, -2);
        let base = BlockPos::new(cx * 32, cy * 32, cz * 32);

        let before = store.stamp();
        // corner voxel touches three chunk faces
        assert!(store.set_block(base.offset(31, 31, 0), Block::new(1)));
        assert_eq!(store.changed_chunks(before), vec![(cx, cy, cz)]);
        assert_eq!(store.rev((cx, cy + 1, cz)), 0);
        assert_eq!(store.rev((cx, cy, cz - 1)), 0);

        let mid = store.stamp();
        assert!(store.set_block(base.offset(9, -1, 3), Block::new(1)));
        assert_eq!(store.changed_chunks(mid), vec![(cx, cy - 1, cz)]);
        assert_eq!(store.changed_chunks(before), vec![(cx, cy - 1, cz), (cx, cy, cz)]);
        assert!(store.rev((cx, cy - 1, cz)) > store.rev((cx, cy, cz)));
    }

    #[test]
    fn rejected_writes_leave_revisions_alone() {
        let mut store = MemoryExtent::with_height(0, 15);
        let p = BlockPos::new(3, 3, 3);
        assert!(store.set_block(p, Block::new(1)));
        let stamp = store.stamp();
        assert!(!store.set_block(p, Block::new(1)));
        assert!(!store.set_block(BlockPos::new(0, 16, 0), Block::new(1)));
        assert!(store.changed_chunks(stamp).is_empty());
        assert_eq!(store.stats().rev_entries, 1);
    }

    #[test]
    fn air_is_not_stored() {
        let mut store = make_store();
        let p = BlockPos::new(1, 2, 3);
        assert!(store.set_block(p, Block::new(7)));
        assert!(!store.set_block(p, Block::new(7)));
        assert_eq!(store.stats().blocks, 1);
        assert!(store.set_block(p, Block::AIR));
        assert_eq!(store.stats().blocks, 0);
        assert_eq!(store.stats().chunk_entries, 0);
    }

    #[test]
    fn writes_outside_height_bounds_are_ignored() {
        let mut store = MemoryExtent::with_height(0, 15);
        assert!(!store.set_block(BlockPos::new(0, 16, 0), Block::new(1)));
        assert!(!store.set_block(BlockPos::new(0, -1, 0), Block::new(1)));
        assert!(store.set_block(BlockPos::new(0, 15, 0), Block::new(1)));
    }
}
