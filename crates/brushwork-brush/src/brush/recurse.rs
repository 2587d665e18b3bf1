//! Connected-region growth from a seed voxel.

use std::collections::VecDeque;

use brushwork_blocks::types::Block;
use brushwork_edit::BlockSource;
use brushwork_geom::shape::sphere_volume_bound;
use brushwork_geom::{BlockPos, NEIGHBORS_6, Vec3};
use hashbrown::HashSet;

use super::{Brush, BrushCtx};
use crate::BrushError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Traversal {
    #[default]
    BreadthFirst,
    DepthFirst,
}

/// Voxels face-connected to `start` within `radius` of it that `accept` admits, in visit
/// order. `start` itself must pass `accept`. Each coordinate is visited at most once and
/// the walk stops after the voxel count of the radius sphere.
///
/// The traversal order only changes the returned order, never the set.
pub fn grow_region<F>(
    src: &dyn BlockSource,
    start: BlockPos,
    radius: f64,
    order: Traversal,
    mut accept: F,
) -> Vec<BlockPos>
where
    F: FnMut(BlockPos, Block) -> bool,
{
    let r2 = radius * radius;
    let budget = sphere_volume_bound(radius) as usize;
    let mut visited: HashSet<BlockPos> = HashSet::new();
    let mut open = VecDeque::new();
    let mut out = Vec::new();
    if !src.in_height_bounds(start.y) || !accept(start, src.block(start)) {
        return out;
    }
    visited.insert(start);
    open.push_back(start);
    while out.len() < budget {
        let next = match order {
            Traversal::BreadthFirst => open.pop_front(),
            Traversal::DepthFirst => open.pop_back(),
        };
        let Some(p) = next else { break };
        out.push(p);
        for d in NEIGHBORS_6 {
            let q = p + d;
            if visited.contains(&q)
                || (q.distance_sq(start) as f64) > r2
                || !src.in_height_bounds(q.y)
            {
                continue;
            }
            if accept(q, src.block(q)) {
                visited.insert(q);
                open.push_back(q);
            }
        }
    }
    out
}

/// Replaces the connected run of the clicked block type.
#[derive(Clone, Debug, Default)]
pub struct RecurseBrush {
    pub order: Traversal,
}

impl RecurseBrush {
    pub fn new(depth_first: bool) -> Self {
        let order = if depth_first {
            Traversal::DepthFirst
        } else {
            Traversal::BreadthFirst
        };
        Self { order }
    }
}

impl Brush for RecurseBrush {
    fn name(&self) -> &'static str {
        "recursive"
    }

    fn permission(&self) -> Option<&'static str> {
        Some("worldedit.brush.recursive")
    }

    fn apply(
        &mut self,
        cx: &mut BrushCtx<'_, '_>,
        target: BlockPos,
        _facing: Vec3,
    ) -> Result<(), BrushError> {
        let key = cx.block(target).id;
        let mask = cx.mask;
        let src = cx.source();
        let region = grow_region(src, target, cx.size, self.order, |p, b| {
            b.id == key && mask.test(src, p)
        });
        for p in region {
            let b = cx.draw(p);
            cx.set(p, b)?;
        }
        Ok(())
    }
}
