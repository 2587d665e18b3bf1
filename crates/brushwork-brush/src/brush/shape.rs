//! Brushes that fill a geometric volume around the target.

use std::collections::VecDeque;

use brushwork_blocks::types::Block;
use brushwork_geom::shape::{self as geo, bounds, extent};
use brushwork_edit::BlockSource;
use brushwork_geom::{BlockPos, NEIGHBORS_6, Region, Vec3};
use fastnoise_lite::{FastNoiseLite, NoiseType};
use hashbrown::HashMap;
use rand::Rng;

use super::{Brush, BrushCtx};
use crate::BrushError;
use crate::mask::exposed;

/// Solid or hollow sphere centred on the target.
#[derive(Clone, Debug, Default)]
pub struct SphereBrush {
    pub hollow: bool,
}

impl SphereBrush {
    pub fn solid() -> Self {
        Self { hollow: false }
    }

    pub fn hollow() -> Self {
        Self { hollow: true }
    }
}

impl Brush for SphereBrush {
    fn name(&self) -> &'static str {
        if self.hollow { "hollow sphere" } else { "sphere" }
    }

    fn permission(&self) -> Option<&'static str> {
        Some("worldedit.brush.sphere")
    }

    fn apply(
        &mut self,
        cx: &mut BrushCtx<'_, '_>,
        target: BlockPos,
        _facing: Vec3,
    ) -> Result<(), BrushError> {
        let r = cx.size;
        for o in bounds(r).iter() {
            let inside = if self.hollow {
                geo::in_hollow_sphere(o, r)
            } else {
                geo::in_sphere(o, r)
            };
            if inside {
                cx.place(target + o)?;
            }
        }
        Ok(())
    }
}

/// Upright cylinder standing on the target.
#[derive(Clone, Debug)]
pub struct CylinderBrush {
    pub height: i32,
    pub hollow: bool,
}

impl CylinderBrush {
    pub fn new(height: i32, hollow: bool) -> Result<Self, BrushError> {
        if height < 1 {
            return Err(BrushError::config("cylinder height must be at least 1"));
        }
        Ok(Self { height, hollow })
    }
}

impl Brush for CylinderBrush {
    fn name(&self) -> &'static str {
        if self.hollow { "hollow cylinder" } else { "cylinder" }
    }

    fn permission(&self) -> Option<&'static str> {
        Some("worldedit.brush.cylinder")
    }

    fn max_changes(&self, size: f64) -> u64 {
        geo::column_volume_bound(size, self.height as u64)
    }

    fn apply(
        &mut self,
        cx: &mut BrushCtx<'_, '_>,
        target: BlockPos,
        _facing: Vec3,
    ) -> Result<(), BrushError> {
        let r = cx.size;
        let e = extent(r);
        let region = Region::new(BlockPos::new(-e, 0, -e), BlockPos::new(e, self.height - 1, e));
        for o in region.iter() {
            let inside = if self.hollow {
                geo::in_hollow_cylinder(o, r, self.height)
            } else {
                geo::in_cylinder(o, r, self.height)
            };
            if inside {
                cx.place(target + o)?;
            }
        }
        Ok(())
    }
}

/// Flat disc perpendicular to the viewing direction.
#[derive(Clone, Debug, Default)]
pub struct CircleBrush;

impl Brush for CircleBrush {
    fn name(&self) -> &'static str {
        "circle"
    }

    fn permission(&self) -> Option<&'static str> {
        Some("worldedit.brush.sphere")
    }

    fn apply(
        &mut self,
        cx: &mut BrushCtx<'_, '_>,
        target: BlockPos,
        facing: Vec3,
    ) -> Result<(), BrushError> {
        let r = cx.size;
        for o in bounds(r).iter() {
            if geo::in_disc(o, r, facing) {
                cx.place(target + o)?;
            }
        }
        Ok(())
    }
}

/// Noise-perturbed ellipsoid.
#[derive(Clone, Debug)]
pub struct BlobBrush {
    /// Per-axis radius factors, normalised so the largest is 1.
    radius: Vec3,
    frequency: f32,
    amplitude: f32,
}

impl BlobBrush {
    pub fn new(radius: Vec3, frequency: f64, amplitude: f64) -> Result<Self, BrushError> {
        let max = radius.max_element();
        if !(max.is_finite() && radius.x > 0.0 && radius.y > 0.0 && radius.z > 0.0) {
            return Err(BrushError::config("blob radius factors must be positive"));
        }
        if !(0.0..=1.0).contains(&amplitude) || frequency < 0.0 {
            return Err(BrushError::config(
                "blob amplitude must be within 0..=1 and frequency non-negative",
            ));
        }
        Ok(Self {
            radius: radius / max,
            frequency: frequency as f32,
            amplitude: amplitude as f32,
        })
    }
}

impl Brush for BlobBrush {
    fn name(&self) -> &'static str {
        "blob"
    }

    fn permission(&self) -> Option<&'static str> {
        Some("worldedit.brush.blob")
    }

    fn max_changes(&self, size: f64) -> u64 {
        geo::sphere_volume_bound(size * (1.0 + self.amplitude as f64))
    }

    fn apply(
        &mut self,
        cx: &mut BrushCtx<'_, '_>,
        target: BlockPos,
        _facing: Vec3,
    ) -> Result<(), BrushError> {
        let size = (cx.size as f32).max(0.5);
        let r = self.radius * size;
        let mut noise = FastNoiseLite::with_seed(cx.rng.random::<i32>());
        noise.set_noise_type(Some(NoiseType::OpenSimplex2));
        noise.set_frequency(Some(self.frequency));
        let reach = (size * (1.0 + self.amplitude)).ceil() as i32;
        for o in Region::cube(BlockPos::ZERO, reach).iter() {
            let n = Vec3::new(o.x as f32 / r.x, o.y as f32 / r.y, o.z as f32 / r.z);
            let d = n.length();
            let sample = noise.get_noise_3d(n.x * size, n.y * size, n.z * size);
            if d <= 1.0 + self.amplitude * sample {
                cx.place(target + o)?;
            }
        }
        Ok(())
    }
}

/// Sphere limited to blocks exposed to air.
#[derive(Clone, Debug, Default)]
pub struct SurfaceSphereBrush;

impl Brush for SurfaceSphereBrush {
    fn name(&self) -> &'static str {
        "surface sphere"
    }

    fn permission(&self) -> Option<&'static str> {
        Some("worldedit.brush.surface")
    }

    fn apply(
        &mut self,
        cx: &mut BrushCtx<'_, '_>,
        target: BlockPos,
        _facing: Vec3,
    ) -> Result<(), BrushError> {
        let r = cx.size;
        let hits: Vec<BlockPos> = geo::sphere_offsets(r)
            .map(|o| target + o)
            .filter(|&p| exposed(cx.source(), p))
            .collect();
        for p in hits {
            cx.place(p)?;
        }
        Ok(())
    }
}

/// Coats the terrain inside the sphere with bands: the first block on exposed faces, the
/// next one a step deeper, and so on.
#[derive(Clone, Debug)]
pub struct LayerBrush {
    layers: Vec<Block>,
}

impl LayerBrush {
    pub fn new(layers: Vec<Block>) -> Result<Self, BrushError> {
        if layers.is_empty() {
            return Err(BrushError::config("layer brush needs at least one layer"));
        }
        Ok(Self { layers })
    }
}

impl Brush for LayerBrush {
    fn name(&self) -> &'static str {
        "layer"
    }

    fn permission(&self) -> Option<&'static str> {
        Some("worldedit.brush.layer")
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
        let r = cx.size;
        let inside = |p: BlockPos| geo::in_sphere(p - target, r);
        // multi-source BFS from exposed blocks, depth = distance from the surface
        let mut depth: HashMap<BlockPos, usize> = HashMap::new();
        let mut queue = VecDeque::new();
        for o in geo::sphere_offsets(r) {
            let p = target + o;
            if exposed(cx.source(), p) {
                depth.insert(p, 0);
                queue.push_back(p);
            }
        }
        while let Some(p) = queue.pop_front() {
            let d = depth[&p];
            if d + 1 >= self.layers.len() {
                continue;
            }
            for n in NEIGHBORS_6 {
                let q = p + n;
                if inside(q) && !depth.contains_key(&q) && !cx.edit.is_air(q) {
                    depth.insert(q, d + 1);
                    queue.push_back(q);
                }
            }
        }
        let mut order: Vec<(BlockPos, usize)> = depth.into_iter().collect();
        order.sort_unstable();
        for (p, d) in order {
            cx.place_block(p, self.layers[d])?;
        }
        Ok(())
    }
}
