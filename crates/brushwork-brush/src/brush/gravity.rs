use brushwork_blocks::types::Block;
use brushwork_edit::BlockSource;
use brushwork_geom::shape::{self as geo, extent};
use brushwork_geom::{BlockPos, Region, Vec3};

use super::{Brush, BrushCtx};
use crate::BrushError;

/// Drops blocks down each column of the disc until they rest on something. Blocks the
/// mask rejects stay put and act as a floor for what falls onto them.
#[derive(Clone, Debug, Default)]
pub struct GravityBrush {
    /// Scan from the top of the world instead of `size` above the target.
    pub from_max_y: bool,
}

impl GravityBrush {
    pub fn new(from_max_y: bool) -> Self {
        Self { from_max_y }
    }
}

impl Brush for GravityBrush {
    fn name(&self) -> &'static str {
        "gravity"
    }

    fn permission(&self) -> Option<&'static str> {
        Some("worldedit.brush.gravity")
    }

    fn needs_fill(&self) -> bool {
        false
    }

    // each moved block writes its old and new cell
    fn max_changes(&self, size: f64) -> u64 {
        geo::sphere_volume_bound(size).saturating_mul(2)
    }

    fn apply(
        &mut self,
        cx: &mut BrushCtx<'_, '_>,
        target: BlockPos,
        _facing: Vec3,
    ) -> Result<(), BrushError> {
        let r = cx.size;
        let e = extent(r);
        let bottom = (target.y - e).max(cx.edit.min_y());
        let top = if self.from_max_y {
            cx.edit.max_y()
        } else {
            (target.y + e).min(cx.edit.max_y())
        };
        let disc = Region::new(target.offset(-e, 0, -e), target.offset(e, 0, e));
        for (x, z) in disc.columns() {
            let (dx, dz) = ((x - target.x) as f64, (z - target.z) as f64);
            if dx * dx + dz * dz > r * r {
                continue;
            }
            compact_column(cx, x, z, bottom, top)?;
        }
        Ok(())
    }
}

fn compact_column(
    cx: &mut BrushCtx<'_, '_>,
    x: i32,
    z: i32,
    bottom: i32,
    top: i32,
) -> Result<(), BrushError> {
    let mut free = bottom;
    for y in bottom..=top {
        let p = BlockPos::new(x, y, z);
        let b = cx.block(p);
        if b.is_air() {
            continue;
        }
        if !cx.test(p) {
            free = y + 1;
            continue;
        }
        if y != free {
            cx.set(BlockPos::new(x, free, z), b)?;
            cx.set(p, Block::AIR)?;
        }
        free += 1;
    }
    Ok(())
}
