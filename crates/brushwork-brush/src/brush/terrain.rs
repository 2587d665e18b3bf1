//! Height-map driven terrain brushes: raise/lower, flatten, cliff and stencil.

use brushwork_blocks::BlockRegistry;
use brushwork_blocks::types::{Block, BlockId};
use brushwork_edit::{BlockSource, surface_y};
use brushwork_geom::shape::{self as geo, extent};
use brushwork_geom::{BlockPos, Vec3};
use rand::Rng;

use super::{Brush, BrushCtx};
use crate::heightmap::{Falloff, HeightMap, ScalableHeightMap};
use crate::{BrushError, StrokeRng};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeightMode {
    /// Add the sampled height (negative scale lowers).
    #[default]
    Raise,
    /// Pull columns towards the clicked height with a cone weight.
    Flatten,
    /// Flatten with full weight across the disc.
    Cliff,
}

#[derive(Clone, Debug)]
pub struct HeightOptions {
    pub rotation: f64,
    pub yscale: f64,
    pub random_rotate: bool,
    /// Work in eighth-block layers of the registry's layer block.
    pub layers: bool,
    /// One 3x3 averaging pass over the new heights before writing.
    pub smooth: bool,
}

impl Default for HeightOptions {
    fn default() -> Self {
        Self {
            rotation: 0.0,
            yscale: 1.0,
            random_rotate: false,
            layers: false,
            smooth: true,
        }
    }
}

pub struct HeightBrush {
    mode: HeightMode,
    map: ScalableHeightMap,
    yscale: f64,
    layer_block: Option<BlockId>,
    smooth: bool,
}

impl HeightBrush {
    pub fn new(
        mode: HeightMode,
        source: Option<HeightMap>,
        opts: HeightOptions,
        registry: &BlockRegistry,
    ) -> Result<Self, BrushError> {
        if !opts.yscale.is_finite() || !opts.rotation.is_finite() {
            return Err(BrushError::config("yscale and rotation must be finite"));
        }
        let layer_block = if opts.layers {
            Some(registry.layer_block.ok_or_else(|| {
                BrushError::config("layer mode needs a layer block in the registry")
            })?)
        } else {
            None
        };
        let falloff = match mode {
            HeightMode::Cliff => Falloff::Cylinder,
            HeightMode::Raise | HeightMode::Flatten => Falloff::Cone,
        };
        let mut map = ScalableHeightMap::new(source, falloff);
        map.rotation = opts.rotation;
        map.random_rotate = opts.random_rotate;
        Ok(Self {
            mode,
            map,
            yscale: opts.yscale,
            layer_block,
            smooth: opts.smooth,
        })
    }
}

struct Column {
    x: i32,
    z: i32,
    top: i32,
    /// Current height in brush units (blocks, or eighths in layer mode).
    cur: i64,
    new: i64,
}

/// Stochastic rounding: the fractional part is the probability of rounding up.
pub(crate) fn dither(v: f64, rng: &mut StrokeRng) -> i64 {
    let f = v.floor();
    f as i64 + (rng.random::<f64>() < v - f) as i64
}

impl Brush for HeightBrush {
    fn name(&self) -> &'static str {
        match self.mode {
            HeightMode::Raise => "height",
            HeightMode::Flatten => "flatten",
            HeightMode::Cliff => "cliff",
        }
    }

    fn permission(&self) -> Option<&'static str> {
        Some("worldedit.brush.height")
    }

    fn needs_fill(&self) -> bool {
        false
    }

    fn max_changes(&self, size: f64) -> u64 {
        let rise = ((size * self.yscale.abs()).ceil() as u64).saturating_add(geo::box_side(size));
        geo::column_volume_bound(size, rise.saturating_add(1))
    }

    fn apply(
        &mut self,
        cx: &mut BrushCtx<'_, '_>,
        target: BlockPos,
        _facing: Vec3,
    ) -> Result<(), BrushError> {
        let size = cx.size;
        let e = extent(size);
        let rotation = self.map.roll_rotation(cx.rng);
        cx.report.rotation = Some(rotation);
        let scale: i64 = if self.layer_block.is_some() { 8 } else { 1 };
        let target_h = target.y as i64 * scale + scale - 1;
        let width = (2 * e + 1) as usize;

        let mut grid: Vec<Option<Column>> = Vec::with_capacity(width * width);
        for dz in -e..=e {
            for dx in -e..=e {
                let raise = self.map.sample(dx, dz, size, rotation);
                let (x, z) = (target.x + dx, target.z + dz);
                let col = if raise > 0.0 {
                    self.column(cx, x, z, target, e).map(|(top, cur)| {
                        (top, cur, self.delta(raise, size, cur, target_h, scale))
                    })
                } else {
                    None
                };
                let col = col.map(|(top, cur, delta)| Column {
                    x,
                    z,
                    top,
                    cur,
                    new: cur + dither(delta, cx.rng),
                });
                grid.push(col);
            }
        }
        if self.smooth {
            smooth_grid(&mut grid, width);
        }
        for col in grid.into_iter().flatten() {
            if col.new == col.cur {
                continue;
            }
            match self.layer_block {
                Some(layer) => write_layered(cx, &col, layer)?,
                None => write_column(cx, col.x, col.z, col.top, col.new as i32)?,
            }
        }
        Ok(())
    }
}

impl HeightBrush {
    /// Surface of a column inside the search window, if the mask accepts it.
    fn column(
        &self,
        cx: &BrushCtx<'_, '_>,
        x: i32,
        z: i32,
        target: BlockPos,
        e: i32,
    ) -> Option<(i32, i64)> {
        let top = surface_y(cx.source(), x, z, target.y + e, target.y - e)?;
        if !cx.test(BlockPos::new(x, top, z)) {
            return None;
        }
        Some((top, self.height_units(cx.source(), x, z, top)))
    }

    fn delta(&self, raise: f64, size: f64, cur: i64, target_h: i64, scale: i64) -> f64 {
        match self.mode {
            HeightMode::Raise => raise * self.yscale * scale as f64,
            HeightMode::Flatten | HeightMode::Cliff => {
                let w = if size > 0.0 { raise / size } else { 1.0 };
                (target_h - cur) as f64 * (w * self.yscale).clamp(0.0, 1.0)
            }
        }
    }

    fn height_units(&self, src: &dyn BlockSource, x: i32, z: i32, top: i32) -> i64 {
        match self.layer_block {
            None => top as i64,
            Some(layer) => {
                let b = src.block(BlockPos::new(x, top, z));
                let units = if b.id == layer { b.state.min(7) as i64 } else { 7 };
                top as i64 * 8 + units
            }
        }
    }
}

/// Square grid of column heights; `None` marks columns outside the brush.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeightGrid {
    width: usize,
    heights: Vec<Option<i64>>,
}

impl HeightGrid {
    pub fn new(width: usize, heights: Vec<Option<i64>>) -> Self {
        debug_assert_eq!(heights.len(), width * width);
        Self { width, heights }
    }

    pub fn heights(&self) -> &[Option<i64>] {
        &self.heights
    }

    /// Rounded mean of the present cells in the 3x3 window around cell `i`.
    pub fn smoothed_at(&self, i: usize) -> Option<i64> {
        self.heights[i]?;
        let w = self.width as i64;
        let (cx, cz) = (i as i64 % w, i as i64 / w);
        let (mut sum, mut n) = (0i64, 0i64);
        for z in (cz - 1).max(0)..=(cz + 1).min(w - 1) {
            for x in (cx - 1).max(0)..=(cx + 1).min(w - 1) {
                if let Some(h) = self.heights[(z * w + x) as usize] {
                    sum += h;
                    n += 1;
                }
            }
        }
        Some((sum as f64 / n as f64).round() as i64)
    }

    /// One pass; every cell reads the grid as it was before the pass.
    pub fn smoothed(&self) -> HeightGrid {
        let heights = (0..self.heights.len()).map(|i| self.smoothed_at(i)).collect();
        HeightGrid::new(self.width, heights)
    }
}

fn smooth_grid(grid: &mut [Option<Column>], width: usize) {
    let heights = grid.iter().map(|c| c.as_ref().map(|c| c.new)).collect();
    let smoothed = HeightGrid::new(width, heights).smoothed();
    for (col, h) in grid.iter_mut().zip(smoothed.heights) {
        if let (Some(col), Some(h)) = (col, h) {
            col.new = h;
        }
    }
}

/// Move the top of a column from `old_top` to `new_top`. Raising repeats the block under
/// the surface and keeps the surface block on top; lowering clears to air.
pub(crate) fn write_column(
    cx: &mut BrushCtx<'_, '_>,
    x: i32,
    z: i32,
    old_top: i32,
    new_top: i32,
) -> Result<(), BrushError> {
    let new_top = new_top.clamp(cx.edit.min_y(), cx.edit.max_y());
    if new_top == old_top {
        return Ok(());
    }
    let at = |y: i32| BlockPos::new(x, y, z);
    let top = cx.block(at(old_top));
    if new_top > old_top {
        let below = cx.block(at(old_top - 1));
        let filler = if below.is_air() { top } else { below };
        for y in old_top..new_top {
            cx.set(at(y), filler)?;
        }
    } else {
        for y in (new_top + 1)..=old_top {
            cx.set(at(y), Block::AIR)?;
        }
    }
    cx.set(at(new_top), top)?;
    Ok(())
}

/// Rewrite the layer blocks above the solid base of a column so it holds `col.new` eighths.
fn write_layered(cx: &mut BrushCtx<'_, '_>, col: &Column, layer: BlockId) -> Result<(), BrushError> {
    let at = |y: i32| BlockPos::new(col.x, y, col.z);
    let mut base = col.top;
    while base > cx.edit.min_y() && cx.block(at(base)).id == layer {
        base -= 1;
    }
    let floor = base as i64 * 8 + 7;
    let ceiling = cx.edit.max_y() as i64 * 8 + 7;
    let new = col.new.clamp(floor, ceiling);
    let highest = col.top.max((new / 8) as i32);
    for y in (base + 1)..=highest {
        let units = new - y as i64 * 8;
        let b = match units {
            u if u >= 7 => Block::with_state(layer, 7),
            u if u >= 0 => Block::with_state(layer, u as u16),
            _ => Block::AIR,
        };
        cx.set(at(y), b)?;
    }
    Ok(())
}

/// Paints the fill onto the surface where the height map is bright; brighter means deeper.
pub struct StencilBrush {
    map: ScalableHeightMap,
    /// Paint depth in blocks at full brightness.
    depth: f64,
    only_white: bool,
}

impl StencilBrush {
    pub fn new(
        source: Option<HeightMap>,
        depth: f64,
        rotation: f64,
        random_rotate: bool,
        only_white: bool,
    ) -> Result<Self, BrushError> {
        if !depth.is_finite() || depth < 0.0 {
            return Err(BrushError::config("stencil depth must be non-negative"));
        }
        let mut map = ScalableHeightMap::new(source, Falloff::Cylinder);
        map.rotation = rotation;
        map.random_rotate = random_rotate;
        Ok(Self {
            map,
            depth,
            only_white,
        })
    }
}

impl Brush for StencilBrush {
    fn name(&self) -> &'static str {
        "stencil"
    }

    fn permission(&self) -> Option<&'static str> {
        Some("worldedit.brush.stencil")
    }

    fn max_changes(&self, size: f64) -> u64 {
        geo::column_volume_bound(size, (self.depth.ceil() as u64).saturating_add(1))
    }

    fn apply(
        &mut self,
        cx: &mut BrushCtx<'_, '_>,
        target: BlockPos,
        _facing: Vec3,
    ) -> Result<(), BrushError> {
        let size = cx.size;
        let e = extent(size);
        let rotation = self.map.roll_rotation(cx.rng);
        cx.report.rotation = Some(rotation);
        for dz in -e..=e {
            for dx in -e..=e {
                let v = self.map.value(dx, dz, size, rotation);
                if v <= 0.0 || (self.only_white && v < 0.999) {
                    continue;
                }
                let (x, z) = (target.x + dx, target.z + dz);
                let Some(top) = surface_y(cx.source(), x, z, target.y + e, target.y - e) else {
                    continue;
                };
                let depth = (v * self.depth).ceil() as i32;
                for y in (top - depth + 1)..=top {
                    cx.place(BlockPos::new(x, y, z))?;
                }
            }
        }
        Ok(())
    }
}

/// Unit step along the dominant axis of `v`; `None` for the zero vector.
pub fn dominant_step(v: Vec3) -> Option<BlockPos> {
    let (ax, ay, az) = (v.x.abs(), v.y.abs(), v.z.abs());
    if ax.max(ay).max(az) == 0.0 {
        return None;
    }
    let sign = |c: f32| if c < 0.0 { -1 } else { 1 };
    Some(if ax >= ay && ax >= az {
        BlockPos::new(sign(v.x), 0, 0)
    } else if ay >= az {
        BlockPos::new(0, sign(v.y), 0)
    } else {
        BlockPos::new(0, 0, sign(v.z))
    })
}

/// Pulls the terrain in the sphere one block towards the player: every block the mask
/// accepts whose neighbour on the player's side is air is copied into that neighbour.
#[derive(Clone, Debug, Default)]
pub struct PullBrush;

impl Brush for PullBrush {
    fn name(&self) -> &'static str {
        "pull"
    }

    fn permission(&self) -> Option<&'static str> {
        Some("worldedit.brush.pull")
    }

    fn needs_fill(&self) -> bool {
        false
    }

    fn apply(
        &mut self,
        cx: &mut BrushCtx<'_, '_>,
        target: BlockPos,
        facing: Vec3,
    ) -> Result<(), BrushError> {
        let Some(step) = dominant_step(facing).map(|d| BlockPos::ZERO - d) else {
            return Ok(());
        };
        let src = cx.source();
        // read everything first so a pulled block is never pulled again
        let moves: Vec<(BlockPos, Block)> = geo::sphere_offsets(cx.size)
            .map(|o| target + o)
            .filter(|&p| !src.is_air(p) && src.is_air(p + step) && cx.test(p))
            .map(|p| (p + step, src.block(p)))
            .collect();
        for (p, b) in moves {
            cx.set(p, b)?;
        }
        Ok(())
    }
}
