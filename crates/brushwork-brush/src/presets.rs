//! Ready-made bindings that are just another brush with a fixed fill and mask.

use brushwork_blocks::BlockRegistry;
use brushwork_blocks::types::Block;

use crate::brush::shape::SphereBrush;
use crate::mask::BlockMask;
use crate::{BrushError, BrushLimits, BrushSettings};

/// Name of the block the extinguisher clears.
pub const FIRE: &str = "fire";

/// A sphere that replaces fire with air.
pub fn extinguish(
    registry: &BlockRegistry,
    size: f64,
    limits: &BrushLimits,
) -> Result<BrushSettings, BrushError> {
    let fire = registry
        .id_by_name(FIRE)
        .ok_or_else(|| BrushError::config(format!("no `{FIRE}` block is registered")))?;
    BrushSettings::builder(SphereBrush::solid())
        .size(size)
        .fill(Block::AIR)
        .mask(BlockMask::new([fire]))
        .permission("worldedit.brush.ex")
        .build(limits)
}
