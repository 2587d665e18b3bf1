//! Voxel predicates that gate brush writes.

use brushwork_blocks::BlockRegistry;
use brushwork_blocks::types::BlockId;
use brushwork_edit::BlockSource;
use brushwork_geom::{BlockPos, NEIGHBORS_6};

pub trait Mask: Send + Sync {
    fn test(&self, src: &dyn BlockSource, p: BlockPos) -> bool;
}

/// Accepts everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct AnyMask;

impl Mask for AnyMask {
    fn test(&self, _src: &dyn BlockSource, _p: BlockPos) -> bool {
        true
    }
}

/// Accepts positions holding one of the listed block ids.
#[derive(Clone, Debug)]
pub struct BlockMask {
    ids: Vec<BlockId>,
}

impl BlockMask {
    pub fn new(ids: impl IntoIterator<Item = BlockId>) -> Self {
        let mut ids: Vec<BlockId> = ids.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();
        Self { ids }
    }
}

impl Mask for BlockMask {
    fn test(&self, src: &dyn BlockSource, p: BlockPos) -> bool {
        self.ids.binary_search(&src.block(p).id).is_ok()
    }
}

/// Accepts any non-air block.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExistingBlockMask;

impl Mask for ExistingBlockMask {
    fn test(&self, src: &dyn BlockSource, p: BlockPos) -> bool {
        !src.is_air(p)
    }
}

/// Accepts blocks the registry marks solid.
#[derive(Clone, Debug)]
pub struct SolidBlockMask {
    solid: Vec<bool>,
}

impl SolidBlockMask {
    pub fn new(reg: &BlockRegistry) -> Self {
        let solid = reg
            .blocks
            .iter()
            .map(|b| b.as_ref().is_some_and(|t| t.solid))
            .collect();
        Self { solid }
    }
}

impl Mask for SolidBlockMask {
    fn test(&self, src: &dyn BlockSource, p: BlockPos) -> bool {
        let id = src.block(p).id as usize;
        self.solid.get(id).copied().unwrap_or(false)
    }
}

/// Non-air with an air face neighbour.
pub(crate) fn exposed(src: &dyn BlockSource, p: BlockPos) -> bool {
    !src.is_air(p) && NEIGHBORS_6.iter().any(|&d| src.is_air(p + d))
}

/// Non-air blocks with at least one air face neighbour.
#[derive(Clone, Copy, Debug, Default)]
pub struct SurfaceMask;

impl Mask for SurfaceMask {
    fn test(&self, src: &dyn BlockSource, p: BlockPos) -> bool {
        exposed(src, p)
    }
}

pub struct InverseMask(pub Box<dyn Mask>);

impl Mask for InverseMask {
    fn test(&self, src: &dyn BlockSource, p: BlockPos) -> bool {
        !self.0.test(src, p)
    }
}

/// Accepts when every inner mask accepts.
pub struct MaskIntersection(pub Vec<Box<dyn Mask>>);

impl Mask for MaskIntersection {
    fn test(&self, src: &dyn BlockSource, p: BlockPos) -> bool {
        self.0.iter().all(|m| m.test(src, p))
    }
}
