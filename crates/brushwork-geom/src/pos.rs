use core::ops::{Add, AddAssign, Neg, Sub};

/// Integer voxel coordinate in world space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

/// Face neighbours: +Y, -Y, +X, -X, +Z, -Z.
pub const NEIGHBORS_6: [BlockPos; 6] = [
    BlockPos::new(0, 1, 0),
    BlockPos::new(0, -1, 0),
    BlockPos::new(1, 0, 0),
    BlockPos::new(-1, 0, 0),
    BlockPos::new(0, 0, 1),
    BlockPos::new(0, 0, -1),
];

/// Full 3x3x3 neighbourhood without the centre.
pub const NEIGHBORS_26: [BlockPos; 26] = {
    let mut out = [BlockPos::ZERO; 26];
    let mut i = 0;
    let mut dy = -1;
    while dy <= 1 {
        let mut dz = -1;
        while dz <= 1 {
            let mut dx = -1;
            while dx <= 1 {
                if !(dx == 0 && dy == 0 && dz == 0) {
                    out[i] = BlockPos::new(dx, dy, dz);
                    i += 1;
                }
                dx += 1;
            }
            dz += 1;
        }
        dy += 1;
    }
    out
};

impl BlockPos {
    pub const ZERO: BlockPos = BlockPos::new(0, 0, 0);

    #[inline]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    #[inline]
    pub const fn with_y(self, y: i32) -> Self {
        Self::new(self.x, y, self.z)
    }

    #[inline]
    pub fn length_sq(self) -> i64 {
        let (x, y, z) = (self.x as i64, self.y as i64, self.z as i64);
        x * x + y * y + z * z
    }

    #[inline]
    pub fn distance_sq(self, rhs: BlockPos) -> i64 {
        (self - rhs).length_sq()
    }

    #[inline]
    pub fn min(self, rhs: BlockPos) -> BlockPos {
        BlockPos::new(self.x.min(rhs.x), self.y.min(rhs.y), self.z.min(rhs.z))
    }

    #[inline]
    pub fn max(self, rhs: BlockPos) -> BlockPos {
        BlockPos::new(self.x.max(rhs.x), self.y.max(rhs.y), self.z.max(rhs.z))
    }
}

impl Add for BlockPos {
    type Output = BlockPos;
    #[inline]
    fn add(self, rhs: BlockPos) -> BlockPos {
        BlockPos::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for BlockPos {
    #[inline]
    fn add_assign(&mut self, rhs: BlockPos) {
        *self = *self + rhs;
    }
}

impl Sub for BlockPos {
    type Output = BlockPos;
    #[inline]
    fn sub(self, rhs: BlockPos) -> BlockPos {
        BlockPos::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Neg for BlockPos {
    type Output = BlockPos;
    #[inline]
    fn neg(self) -> BlockPos {
        BlockPos::new(-self.x, -self.y, -self.z)
    }
}

/// Inclusive integer box.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Region {
    pub min: BlockPos,
    pub max: BlockPos,
}

impl Region {
    /// Corners may be given in any order.
    #[inline]
    pub fn new(a: BlockPos, b: BlockPos) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Cube of half-extent `r` around `center`.
    #[inline]
    pub fn cube(center: BlockPos, r: i32) -> Self {
        Self::new(center.offset(-r, -r, -r), center.offset(r, r, r))
    }

    #[inline]
    pub fn size(&self) -> BlockPos {
        self.max - self.min + BlockPos::new(1, 1, 1)
    }

    #[inline]
    pub fn volume(&self) -> u64 {
        let s = self.size();
        s.x as u64 * s.y as u64 * s.z as u64
    }

    #[inline]
    pub fn contains(&self, p: BlockPos) -> bool {
        p.x >= self.min.x
            && p.y >= self.min.y
            && p.z >= self.min.z
            && p.x <= self.max.x
            && p.y <= self.max.y
            && p.z <= self.max.z
    }

    #[inline]
    pub fn expand(&self, r: i32) -> Region {
        Region::new(self.min.offset(-r, -r, -r), self.max.offset(r, r, r))
    }

    /// Smallest region containing both.
    #[inline]
    pub fn union(&self, other: &Region) -> Region {
        Region::new(self.min.min(other.min), self.max.max(other.max))
    }

    #[inline]
    pub fn center(&self) -> BlockPos {
        BlockPos::new(
            (self.min.x + self.max.x).div_euclid(2),
            (self.min.y + self.max.y).div_euclid(2),
            (self.min.z + self.max.z).div_euclid(2),
        )
    }

    /// Positions in y-major, then z, then x order.
    pub fn iter(&self) -> impl Iterator<Item = BlockPos> + use<> {
        let (min, max) = (self.min, self.max);
        (min.y..=max.y).flat_map(move |y| {
            (min.z..=max.z).flat_map(move |z| (min.x..=max.x).map(move |x| BlockPos::new(x, y, z)))
        })
    }

    /// `(x, z)` columns of the region.
    pub fn columns(&self) -> impl Iterator<Item = (i32, i32)> + use<> {
        let (min, max) = (self.min, self.max);
        (min.z..=max.z).flat_map(move |z| (min.x..=max.x).map(move |x| (x, z)))
    }
}
