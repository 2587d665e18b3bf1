//! Neighbourhood rules: erosion, blend ball and height-field smoothing.
//!
//! Every pass reads a snapshot taken before the pass and writes a new one, so the result
//! never depends on the order voxels are visited in.

use brushwork_blocks::BlockRegistry;
use brushwork_blocks::types::{Block, BlockId};
use brushwork_edit::BlockSource;
use brushwork_geom::shape::{self as geo, extent, in_sphere, sphere_offsets};
use brushwork_geom::{BlockPos, NEIGHBORS_6, NEIGHBORS_26, Region, Vec3};
use log::debug;

use super::terrain::{HeightGrid, write_column};
use super::{Brush, BrushCtx};
use crate::BrushError;

/// Dense copy of a region; reads outside the region come back as air.
#[derive(Clone)]
struct Snapshot {
    region: Region,
    cells: Vec<Block>,
}

impl Snapshot {
    fn read(src: &dyn BlockSource, region: Region) -> Self {
        let cells = region.iter().map(|p| src.block(p)).collect();
        Self { region, cells }
    }

    #[inline]
    fn idx(&self, p: BlockPos) -> Option<usize> {
        if !self.region.contains(p) {
            return None;
        }
        let s = self.region.size();
        let l = p - self.region.min;
        Some(((l.y * s.z + l.z) * s.x + l.x) as usize)
    }

    #[inline]
    fn get(&self, p: BlockPos) -> Block {
        self.idx(p).map_or(Block::AIR, |i| self.cells[i])
    }

    fn set(&mut self, p: BlockPos, b: Block) {
        if let Some(i) = self.idx(p) {
            self.cells[i] = b;
        }
    }
}

/// Most common non-air block among `blocks`; ties go to the lowest id.
fn majority(blocks: impl Iterator<Item = Block>) -> Option<(Block, usize)> {
    let mut tally: Vec<(Block, usize)> = Vec::new();
    for b in blocks.filter(|b| !b.is_air()) {
        match tally.iter_mut().find(|(t, _)| *t == b) {
            Some((_, n)) => *n += 1,
            None => tally.push((b, 1)),
        }
    }
    tally.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.id.cmp(&b.0.id)));
    tally.first().copied()
}

/// Clears blocks with at least `faces` air neighbours.
fn erosion_pass(snap: &Snapshot, inside: &[BlockPos], faces: usize) -> Snapshot {
    let mut next = snap.clone();
    for &p in inside {
        if snap.get(p).is_air() {
            continue;
        }
        let open = NEIGHBORS_6.iter().filter(|&&d| snap.get(p + d).is_air()).count();
        if open >= faces {
            next.set(p, Block::AIR);
        }
    }
    next
}

/// Fills air cells with at least `faces` solid neighbours using their most common block.
fn fill_pass(snap: &Snapshot, inside: &[BlockPos], faces: usize) -> Snapshot {
    let mut next = snap.clone();
    for &p in inside {
        if !snap.get(p).is_air() {
            continue;
        }
        let around: Vec<Block> = NEIGHBORS_6.iter().map(|&d| snap.get(p + d)).collect();
        if around.iter().filter(|n| !n.is_air()).count() < faces {
            continue;
        }
        if let Some((b, _)) = majority(around.into_iter()) {
            next.set(p, b);
        }
    }
    next
}

/// Writes every masked cell whose snapshot value differs from the world.
fn write_back(
    cx: &mut BrushCtx<'_, '_>,
    inside: &[BlockPos],
    snap: &Snapshot,
) -> Result<(), BrushError> {
    for &p in inside {
        let b = snap.get(p);
        if cx.block(p) != b && cx.test(p) {
            cx.set(p, b)?;
        }
    }
    Ok(())
}

fn sphere_cells(target: BlockPos, r: f64) -> (Region, Vec<BlockPos>) {
    let e = extent(r) + 1;
    let region = Region::cube(target, e);
    let inside = sphere_offsets(r).map(|o| target + o).collect();
    (region, inside)
}

/// Strips exposed edges, then fills pockets.
#[derive(Clone, Debug)]
pub struct ErodeBrush {
    pub erode_faces: usize,
    pub erode_passes: u32,
    pub fill_faces: usize,
    pub fill_passes: u32,
}

impl Default for ErodeBrush {
    fn default() -> Self {
        Self {
            erode_faces: 2,
            erode_passes: 1,
            fill_faces: 5,
            fill_passes: 1,
        }
    }
}

impl Brush for ErodeBrush {
    fn name(&self) -> &'static str {
        "erode"
    }

    fn permission(&self) -> Option<&'static str> {
        Some("worldedit.brush.erode")
    }

    fn needs_fill(&self) -> bool {
        false
    }

    fn apply(
        &mut self,
        cx: &mut BrushCtx<'_, '_>,
        target: BlockPos,
        _facing: Vec3,
    ) -> Result<(), BrushError> {
        let (region, inside) = sphere_cells(target, cx.size);
        let mut snap = Snapshot::read(cx.source(), region);
        for _ in 0..self.erode_passes {
            snap = erosion_pass(&snap, &inside, self.erode_faces);
        }
        for _ in 0..self.fill_passes {
            snap = fill_pass(&snap, &inside, self.fill_faces);
        }
        write_back(cx, &inside, &snap)
    }
}

/// Each block becomes the majority of its 3x3x3 neighbourhood: air when fewer than half
/// of the 27 cells are solid.
#[derive(Clone, Debug, Default)]
pub struct BlendBallBrush;

impl Brush for BlendBallBrush {
    fn name(&self) -> &'static str {
        "blend ball"
    }

    fn permission(&self) -> Option<&'static str> {
        Some("worldedit.brush.blendball")
    }

    fn needs_fill(&self) -> bool {
        false
    }

    fn apply(
        &mut self,
        cx: &mut BrushCtx<'_, '_>,
        target: BlockPos,
        _facing: Vec3,
    ) -> Result<(), BrushError> {
        let (region, inside) = sphere_cells(target, cx.size);
        let snap = Snapshot::read(cx.source(), region);
        let mut next = snap.clone();
        for &p in &inside {
            let cube = std::iter::once(p).chain(NEIGHBORS_26.iter().map(|&d| p + d));
            let solid = cube.clone().filter(|&q| !snap.get(q).is_air()).count();
            let b = if solid > 13 {
                majority(cube.map(|q| snap.get(q))).map_or(Block::AIR, |(b, _)| b)
            } else {
                Block::AIR
            };
            next.set(p, b);
        }
        write_back(cx, &inside, &next)
    }
}

/// Averages surface heights over the disc for a number of passes.
#[derive(Clone, Debug)]
pub struct SmoothBrush {
    iterations: u32,
    /// When set, only these blocks count as terrain.
    natural: Option<Vec<BlockId>>,
}

impl SmoothBrush {
    pub fn new(iterations: u32, natural_only: bool, registry: &BlockRegistry) -> Self {
        let natural = natural_only.then(|| {
            let mut ids = registry.natural_ids();
            ids.sort_unstable();
            ids
        });
        Self {
            iterations,
            natural,
        }
    }

    fn is_terrain(&self, b: Block) -> bool {
        match &self.natural {
            _ if b.is_air() => false,
            Some(ids) => ids.binary_search(&b.id).is_ok(),
            None => true,
        }
    }
}

impl Brush for SmoothBrush {
    fn name(&self) -> &'static str {
        "smooth"
    }

    fn permission(&self) -> Option<&'static str> {
        Some("worldedit.brush.smooth")
    }

    fn needs_fill(&self) -> bool {
        false
    }

    fn max_changes(&self, size: f64) -> u64 {
        geo::column_volume_bound(size, geo::box_side(size) + 1)
    }

    fn apply(
        &mut self,
        cx: &mut BrushCtx<'_, '_>,
        target: BlockPos,
        _facing: Vec3,
    ) -> Result<(), BrushError> {
        let r = cx.size;
        let e = extent(r);
        let passes = self.iterations.min(cx.limits.max_iterations);
        if passes < self.iterations {
            debug!("smooth iterations capped at {passes}");
        }
        let width = (2 * e + 1) as usize;
        let (lo, hi) = (target.y - e, target.y + e);
        let mut cols = Vec::with_capacity(width * width);
        let mut tops = Vec::with_capacity(width * width);
        for dz in -e..=e {
            for dx in -e..=e {
                let (x, z) = (target.x + dx, target.z + dz);
                let top = if in_sphere(BlockPos::new(dx, 0, dz), r) {
                    (lo..=hi)
                        .rev()
                        .find(|&y| self.is_terrain(cx.block(BlockPos::new(x, y, z))))
                        .filter(|&y| cx.test(BlockPos::new(x, y, z)))
                } else {
                    None
                };
                cols.push((x, z));
                tops.push(top);
            }
        }
        let mut grid = HeightGrid::new(width, tops.iter().map(|t| t.map(i64::from)).collect());
        for _ in 0..passes {
            grid = grid.smoothed();
        }
        for (((x, z), old), new) in cols.into_iter().zip(tops).zip(grid.heights().to_vec()) {
            if let (Some(old), Some(new)) = (old, new) {
                write_column(cx, x, z, old, new as i32)?;
            }
        }
        Ok(())
    }
}
