//! Block sources used to fill brush shapes.

use brushwork_blocks::types::Block;
use brushwork_geom::BlockPos;
use rand::Rng;
use rand::distr::weighted::WeightedIndex;

use crate::{BrushError, StrokeRng};

pub trait Pattern: Send + Sync {
    fn apply(&self, p: BlockPos, rng: &mut StrokeRng) -> Block;
}

impl Pattern for Block {
    #[inline]
    fn apply(&self, _p: BlockPos, _rng: &mut StrokeRng) -> Block {
        *self
    }
}

/// Weighted random choice per voxel.
#[derive(Clone, Debug)]
pub struct RandomPattern {
    blocks: Vec<Block>,
    index: WeightedIndex<f64>,
}

impl RandomPattern {
    pub fn new(entries: Vec<(Block, f64)>) -> Result<Self, BrushError> {
        if entries.is_empty() {
            return Err(BrushError::config("random pattern needs at least one block"));
        }
        if entries.iter().any(|(_, w)| !w.is_finite() || *w <= 0.0) {
            return Err(BrushError::config("pattern weights must be positive"));
        }
        let index = WeightedIndex::new(entries.iter().map(|(_, w)| *w))
            .map_err(|e| BrushError::config(format!("pattern weights: {e}")))?;
        let blocks = entries.into_iter().map(|(b, _)| b).collect();
        Ok(Self { blocks, index })
    }
}

impl Pattern for RandomPattern {
    fn apply(&self, _p: BlockPos, rng: &mut StrokeRng) -> Block {
        self.blocks[rng.sample(&self.index)]
    }
}
