//! Captured regions (clipboards), transforms, and pasting.
#![forbid(unsafe_code)]

use brushwork_blocks::types::Block;
use brushwork_edit::{BlockSource, EditError, EditSession};
use brushwork_geom::{BlockPos, Region, Vec3};

/// Quarter turns about the Y axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rotation(u8);

impl Rotation {
    pub const NONE: Rotation = Rotation(0);

    #[inline]
    pub fn quarter_turns(turns: i32) -> Self {
        Rotation(turns.rem_euclid(4) as u8)
    }

    /// Nearest quarter turn to an angle in degrees.
    #[inline]
    pub fn from_degrees(deg: f64) -> Self {
        Self::quarter_turns((deg / 90.0).round() as i32)
    }

    /// Turn that maps +Z onto the horizontal direction the viewer faces.
    pub fn from_facing(facing: Vec3) -> Self {
        if facing.x.abs() > facing.z.abs() {
            if facing.x < 0.0 {
                Rotation(1)
            } else {
                Rotation(3)
            }
        } else if facing.z < 0.0 {
            Rotation(2)
        } else {
            Rotation(0)
        }
    }

    #[inline]
    pub fn turns(self) -> u8 {
        self.0
    }

    #[inline]
    pub fn degrees(self) -> f64 {
        self.0 as f64 * 90.0
    }

    /// Rotate an offset about the origin; one turn maps (x, z) to (-z, x).
    #[inline]
    pub fn apply(self, o: BlockPos) -> BlockPos {
        match self.0 {
            1 => BlockPos::new(-o.z, o.y, o.x),
            2 => BlockPos::new(-o.x, o.y, -o.z),
            3 => BlockPos::new(o.z, o.y, -o.x),
            _ => o,
        }
    }

    #[inline]
    pub fn inverse(self) -> Rotation {
        Rotation((4 - self.0) % 4)
    }
}

/// A captured block region. Positions are stored relative to the anchor; cells that were
/// not captured stay `None` and are skipped on paste.
#[derive(Clone, Debug)]
pub struct Clipboard {
    // Region in anchor-relative coordinates
    bounds: Region,
    cells: Vec<Option<Block>>,
}

/// Top surface of a clipboard, heights normalised to 0..=1 by the clipboard height.
#[derive(Clone, Debug, PartialEq)]
pub struct SurfaceProfile {
    pub width: usize,
    pub length: usize,
    pub heights: Vec<f32>,
}

impl Clipboard {
    /// Copy the blocks of `region` accepted by `keep`. `anchor` becomes the clipboard origin.
    pub fn capture<F>(src: &dyn BlockSource, region: Region, anchor: BlockPos, mut keep: F) -> Self
    where
        F: FnMut(BlockPos, Block) -> bool,
    {
        let bounds = Region::new(region.min - anchor, region.max - anchor);
        let mut cells = Vec::with_capacity(region.volume() as usize);
        for p in region.iter() {
            let b = src.block(p);
            cells.push(keep(p, b).then_some(b));
        }
        Self { bounds, cells }
    }

    /// Build from explicit anchor-relative entries.
    pub fn from_blocks(entries: &[(BlockPos, Block)]) -> Option<Self> {
        let first = entries.first()?.0;
        let bounds = entries
            .iter()
            .fold(Region::new(first, first), |r, (p, _)| r.union(&Region::new(*p, *p)));
        let mut clip = Self {
            bounds,
            cells: vec![None; bounds.volume() as usize],
        };
        for (p, b) in entries {
            let idx = clip.idx(*p);
            clip.cells[idx] = Some(*b);
        }
        Some(clip)
    }

    #[inline]
    fn idx(&self, rel: BlockPos) -> usize {
        let s = self.bounds.size();
        let l = rel - self.bounds.min;
        ((l.y * s.z + l.z) * s.x + l.x) as usize
    }

    /// Anchor-relative bounds.
    pub fn bounds(&self) -> Region {
        self.bounds
    }

    pub fn get(&self, rel: BlockPos) -> Option<Block> {
        if !self.bounds.contains(rel) {
            return None;
        }
        self.cells[self.idx(rel)]
    }

    /// Captured (relative position, block) pairs in region order.
    pub fn iter(&self) -> impl Iterator<Item = (BlockPos, Block)> + '_ {
        self.bounds
            .iter()
            .zip(self.cells.iter())
            .filter_map(|(p, c)| c.map(|b| (p, b)))
    }

    pub fn captured_len(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.captured_len() == 0
    }

    /// Paste so the clipboard origin lands on `at`. Returns the number of changed blocks.
    pub fn paste(
        &self,
        dest: &mut EditSession<'_>,
        at: BlockPos,
        rotation: Rotation,
        ignore_air: bool,
    ) -> Result<usize, EditError> {
        let mut changed = 0;
        for (rel, b) in self.iter() {
            if ignore_air && b.is_air() {
                continue;
            }
            if dest.set_block(at + rotation.apply(rel), b)? {
                changed += 1;
            }
        }
        Ok(changed)
    }

    /// World region covered when pasted at `at` with `rotation`.
    pub fn pasted_region(&self, at: BlockPos, rotation: Rotation) -> Region {
        let a = rotation.apply(self.bounds.min);
        let b = rotation.apply(self.bounds.max);
        Region::new(at + a, at + b)
    }

    /// Height of the highest captured non-air block per (x, z) column.
    pub fn top_surface(&self) -> SurfaceProfile {
        let s = self.bounds.size();
        let (width, length) = (s.x as usize, s.z as usize);
        let mut heights = vec![0.0f32; width * length];
        for (rel, b) in self.iter() {
            if b.is_air() {
                continue;
            }
            let l = rel - self.bounds.min;
            let h = (l.y + 1) as f32 / s.y as f32;
            let i = l.z as usize * width + l.x as usize;
            if h > heights[i] {
                heights[i] = h;
            }
        }
        SurfaceProfile {
            width,
            length,
            heights,
        }
    }
}

/// Utility: rotate a vector by yaw degrees (Y axis), preserving Y
#[inline]
pub fn rotate_yaw(v: Vec3, yaw_deg: f32) -> Vec3 {
    let r = yaw_deg.to_radians();
    let (s, c) = r.sin_cos();
    Vec3 {
        x: v.x * c - v.z * s,
        y: v.y,
        z: v.x * s + v.z * c,
    }
}

#[inline]
pub fn rotate_yaw_inv(v: Vec3, yaw_deg: f32) -> Vec3 {
    rotate_yaw(v, -yaw_deg)
}
