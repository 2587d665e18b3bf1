//! Randomised placement: scatter, overlay, splatter, shatter and clipboard population.

use brushwork_blocks::types::Block;
use brushwork_edit::{BlockSource, surface_y};
use brushwork_geom::shape::{extent, in_sphere, sphere_offsets, sphere_volume_bound};
use brushwork_geom::{BlockPos, Vec3};
use brushwork_structures::{Clipboard, Rotation};
use hashbrown::HashMap;
use log::debug;
use rand::Rng;

use super::recurse::{Traversal, grow_region};
use super::{Brush, BrushCtx};
use crate::mask::{Mask, exposed};
use crate::{BrushError, StrokeRng};

/// Rejection sampler. Draws uniform offsets in the disc of radius `size`, maps each through
/// `candidate` (which may reject it) and keeps those at least `distance` from every point
/// kept so far. Stops after `points` accepted or `attempts` draws, whichever comes first,
/// so an unsatisfiable request returns fewer points instead of looping.
pub fn sample_points<F>(
    rng: &mut StrokeRng,
    size: f64,
    points: usize,
    distance: f64,
    attempts: usize,
    mut candidate: F,
) -> Vec<BlockPos>
where
    F: FnMut(i32, i32) -> Option<BlockPos>,
{
    let e = extent(size);
    let min_d2 = distance * distance;
    let mut out: Vec<BlockPos> = Vec::with_capacity(points);
    for _ in 0..attempts {
        if out.len() >= points {
            break;
        }
        let dx = rng.random_range(-e..=e);
        let dz = rng.random_range(-e..=e);
        if ((dx * dx + dz * dz) as f64) > size * size {
            continue;
        }
        let Some(p) = candidate(dx, dz) else { continue };
        if out.iter().all(|q| (q.distance_sq(p) as f64) >= min_d2) {
            out.push(p);
        }
    }
    out
}

/// Surface block of the column at `target + (dx, dz)` within `e` blocks of the target
/// height, if the mask accepts it.
pub(crate) fn surface_candidate(
    src: &dyn BlockSource,
    mask: &dyn Mask,
    target: BlockPos,
    e: i32,
    (dx, dz): (i32, i32),
) -> Option<BlockPos> {
    let (x, z) = (target.x + dx, target.z + dz);
    let y = surface_y(src, x, z, target.y + e, target.y - e)?;
    let p = BlockPos::new(x, y, z);
    mask.test(src, p).then_some(p)
}

/// Sampled surface points around `target` using the stroke's size, mask and rng.
pub(crate) fn surface_points(
    cx: &mut BrushCtx<'_, '_>,
    target: BlockPos,
    points: usize,
    distance: f64,
) -> Vec<BlockPos> {
    let size = cx.size;
    let e = extent(size);
    let attempts = cx.limits.scatter_attempts(points);
    let src: &dyn BlockSource = &*cx.edit;
    let mask = cx.mask;
    let out = sample_points(&mut *cx.rng, size, points, distance, attempts, |dx, dz| {
        surface_candidate(src, mask, target, e, (dx, dz))
    });
    if out.len() < points {
        debug!("sampler kept {} of {points} points", out.len());
    }
    out
}

fn check_points(points: usize, distance: f64) -> Result<(), BrushError> {
    if points == 0 {
        return Err(BrushError::config("point count must be at least 1"));
    }
    if !distance.is_finite() || distance < 0.0 {
        return Err(BrushError::config("point distance must be non-negative"));
    }
    Ok(())
}

/// Sets the fill on random surface blocks, or on the air just above them when overlaying.
#[derive(Clone, Debug)]
pub struct ScatterBrush {
    points: usize,
    distance: f64,
    overlay: bool,
}

impl ScatterBrush {
    pub fn new(points: usize, distance: f64, overlay: bool) -> Result<Self, BrushError> {
        check_points(points, distance)?;
        Ok(Self {
            points,
            distance,
            overlay,
        })
    }
}

impl Brush for ScatterBrush {
    fn name(&self) -> &'static str {
        if self.overlay { "scatter overlay" } else { "scatter" }
    }

    fn permission(&self) -> Option<&'static str> {
        Some("worldedit.brush.scatter")
    }

    fn max_changes(&self, _size: f64) -> u64 {
        self.points as u64
    }

    fn apply(
        &mut self,
        cx: &mut BrushCtx<'_, '_>,
        target: BlockPos,
        _facing: Vec3,
    ) -> Result<(), BrushError> {
        for p in surface_points(cx, target, self.points, self.distance) {
            if self.overlay {
                let above = p.offset(0, 1, 0);
                if cx.edit.is_air(above) {
                    let b = cx.draw(above);
                    cx.set(above, b)?;
                }
            } else {
                let b = cx.draw(p);
                cx.set(p, b)?;
            }
        }
        Ok(())
    }
}

/// Surface blotches grown from random seeds.
#[derive(Clone, Debug)]
pub struct SplatterBrush {
    points: usize,
    recursion: u32,
    /// One fill draw per blotch instead of per block.
    solid: bool,
}

impl SplatterBrush {
    pub fn new(points: usize, recursion: u32, solid: bool) -> Result<Self, BrushError> {
        check_points(points, 0.0)?;
        Ok(Self {
            points,
            recursion,
            solid,
        })
    }
}

impl Brush for SplatterBrush {
    fn name(&self) -> &'static str {
        "splatter"
    }

    fn permission(&self) -> Option<&'static str> {
        Some("worldedit.brush.splatter")
    }

    fn max_changes(&self, size: f64) -> u64 {
        sphere_volume_bound(size)
    }

    fn apply(
        &mut self,
        cx: &mut BrushCtx<'_, '_>,
        target: BlockPos,
        _facing: Vec3,
    ) -> Result<(), BrushError> {
        let size = cx.size;
        let seeds = surface_points(cx, target, self.points, 1.0);
        let depth = self.recursion as f64;
        for seed in seeds {
            let mask = cx.mask;
            let src = cx.source();
            let blotch = grow_region(src, seed, depth, Traversal::BreadthFirst, |p, _| {
                in_sphere(p - target, size) && exposed(src, p) && mask.test(src, p)
            });
            let shared = self.solid.then(|| cx.draw(seed));
            for p in blotch {
                let b = match shared {
                    Some(b) => b,
                    None => cx.draw(p),
                };
                cx.set(p, b)?;
            }
        }
        Ok(())
    }
}

/// Cuts existing blocks with random vertical planes and fills each fragment with one draw.
/// Blocks on a cut stay as they are.
#[derive(Clone, Debug)]
pub struct ShatterBrush {
    count: u32,
}

impl ShatterBrush {
    pub const MAX_CUTS: u32 = 64;

    pub fn new(count: u32) -> Result<Self, BrushError> {
        if count == 0 || count > Self::MAX_CUTS {
            return Err(BrushError::config(format!(
                "shatter needs 1..={} cuts, got {count}",
                Self::MAX_CUTS
            )));
        }
        Ok(Self { count })
    }
}

struct Cut {
    origin: Vec3,
    normal: Vec3,
}

impl Brush for ShatterBrush {
    fn name(&self) -> &'static str {
        "shatter"
    }

    fn permission(&self) -> Option<&'static str> {
        Some("worldedit.brush.shatter")
    }

    fn apply(
        &mut self,
        cx: &mut BrushCtx<'_, '_>,
        target: BlockPos,
        _facing: Vec3,
    ) -> Result<(), BrushError> {
        let size = cx.size as f32;
        let cuts: Vec<Cut> = (0..self.count)
            .map(|_| {
                let ox = cx.rng.random_range(-size..=size);
                let oz = cx.rng.random_range(-size..=size);
                let angle = cx.rng.random_range(0.0..std::f32::consts::TAU);
                Cut {
                    origin: Vec3::new(ox, 0.0, oz),
                    normal: Vec3::new(angle.cos(), 0.0, angle.sin()),
                }
            })
            .collect();
        let targets: Vec<BlockPos> = sphere_offsets(cx.size)
            .map(|o| target + o)
            .filter(|&p| !cx.edit.is_air(p) && cx.test(p))
            .collect();
        let mut fragments: HashMap<u64, Block> = HashMap::new();
        'voxel: for p in targets {
            let local = Vec3::from(p - target);
            let mut key = 0u64;
            for (i, cut) in cuts.iter().enumerate() {
                let side = (local - cut.origin).dot(cut.normal);
                if side.abs() < 0.5 {
                    continue 'voxel;
                }
                if side > 0.0 {
                    key |= 1u64 << i;
                }
            }
            let b = match fragments.get(&key) {
                Some(b) => *b,
                None => {
                    let b = cx.draw(p);
                    fragments.insert(key, b);
                    b
                }
            };
            cx.set(p, b)?;
        }
        Ok(())
    }
}

/// Pastes random clipboards onto masked surface points.
#[derive(Clone, Debug)]
pub struct PopulateSchemBrush {
    clipboards: Vec<Clipboard>,
    density: usize,
    random_rotate: bool,
}

impl PopulateSchemBrush {
    pub fn new(
        clipboards: Vec<Clipboard>,
        density: usize,
        random_rotate: bool,
    ) -> Result<Self, BrushError> {
        if clipboards.iter().all(Clipboard::is_empty) {
            return Err(BrushError::config("populate needs at least one non-empty clipboard"));
        }
        check_points(density, 0.0)?;
        Ok(Self {
            clipboards,
            density,
            random_rotate,
        })
    }

    /// Horizontal footprint radius of the largest clipboard.
    fn spacing(&self) -> f64 {
        self.clipboards
            .iter()
            .map(|c| {
                let s = c.bounds().size();
                (s.x.max(s.z) as f64) / 2.0
            })
            .fold(1.0, f64::max)
    }
}

impl Brush for PopulateSchemBrush {
    fn name(&self) -> &'static str {
        "populate schematic"
    }

    fn permission(&self) -> Option<&'static str> {
        Some("worldedit.brush.populateschematic")
    }

    fn needs_fill(&self) -> bool {
        false
    }

    fn max_changes(&self, _size: f64) -> u64 {
        let largest = self.clipboards.iter().map(Clipboard::captured_len).max();
        (largest.unwrap_or(0) as u64).saturating_mul(self.density as u64)
    }

    fn apply(
        &mut self,
        cx: &mut BrushCtx<'_, '_>,
        target: BlockPos,
        _facing: Vec3,
    ) -> Result<(), BrushError> {
        let spots = surface_points(cx, target, self.density, self.spacing());
        for p in spots {
            let clip = &self.clipboards[cx.rng.random_range(0..self.clipboards.len())];
            if clip.is_empty() {
                continue;
            }
            let rotation = if self.random_rotate {
                Rotation::quarter_turns(cx.rng.random_range(0..4))
            } else {
                Rotation::NONE
            };
            clip.paste(cx.edit, p.offset(0, 1, 0), rotation, true)?;
        }
        Ok(())
    }
}
