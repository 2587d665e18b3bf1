//! Shape predicates: "is this voxel offset inside a shape of size S".
//!
//! Offsets are relative to the shape anchor (sphere centre, cylinder base centre).
//! All predicates are pure and cheap; brushes iterate a bounding box and filter.

use crate::{BlockPos, NEIGHBORS_6, Region, Vec3};

#[inline]
pub fn in_sphere(o: BlockPos, radius: f64) -> bool {
    (o.length_sq() as f64) <= radius * radius
}

/// Shell of thickness one: inside the sphere with at least one face neighbour outside.
#[inline]
pub fn in_hollow_sphere(o: BlockPos, radius: f64) -> bool {
    in_sphere(o, radius) && NEIGHBORS_6.iter().any(|&d| !in_sphere(o + d, radius))
}

#[inline]
fn in_disc_xz(dx: i32, dz: i32, radius: f64) -> bool {
    let d2 = (dx as i64 * dx as i64 + dz as i64 * dz as i64) as f64;
    d2 <= radius * radius
}

/// Upright cylinder whose base sits at `o.y == 0`.
#[inline]
pub fn in_cylinder(o: BlockPos, radius: f64, height: i32) -> bool {
    o.y >= 0 && o.y < height && in_disc_xz(o.x, o.z, radius)
}

/// Cylinder wall: inside, with a horizontal neighbour outside the disc.
#[inline]
pub fn in_hollow_cylinder(o: BlockPos, radius: f64, height: i32) -> bool {
    in_cylinder(o, radius, height)
        && [(1, 0), (-1, 0), (0, 1), (0, -1)]
            .iter()
            .any(|&(dx, dz)| !in_disc_xz(o.x + dx, o.z + dz, radius))
}

/// Thin disc through the origin, perpendicular to `normal`.
#[inline]
pub fn in_disc(o: BlockPos, radius: f64, normal: Vec3) -> bool {
    let n = normal.normalized();
    if n.length_sq() == 0.0 {
        return in_cylinder(o, radius, 1);
    }
    let v = Vec3::from(o);
    let along = v.dot(n);
    if along.abs() >= 0.5 {
        return false;
    }
    let planar = v - n * along;
    (planar.length_sq() as f64) <= radius * radius
}

/// Largest half-extent a shape may have; keeps box corners and counts in range.
pub const MAX_EXTENT: i32 = 1 << 24;

/// Integer half-extent of a shape of the given radius, clamped to [`MAX_EXTENT`].
#[inline]
pub fn extent(radius: f64) -> i32 {
    radius.max(0.0).ceil().min(MAX_EXTENT as f64) as i32
}

/// Edge length of the bounding box of a shape of `radius`.
#[inline]
pub fn box_side(radius: f64) -> u64 {
    extent(radius) as u64 * 2 + 1
}

/// Voxels in `depth` layers of the bounding box footprint, saturating at `u64::MAX`.
#[inline]
pub fn column_volume_bound(radius: f64, depth: u64) -> u64 {
    let side = box_side(radius);
    side.saturating_mul(side).saturating_mul(depth)
}

/// Bounding box of a sphere of `radius` around the origin.
#[inline]
pub fn bounds(radius: f64) -> Region {
    Region::cube(BlockPos::ZERO, extent(radius))
}

/// Offsets inside a sphere, in region order.
pub fn sphere_offsets(radius: f64) -> impl Iterator<Item = BlockPos> {
    bounds(radius).iter().filter(move |&o| in_sphere(o, radius))
}

/// Offsets on the shell of a sphere.
pub fn hollow_sphere_offsets(radius: f64) -> impl Iterator<Item = BlockPos> {
    bounds(radius)
        .iter()
        .filter(move |&o| in_hollow_sphere(o, radius))
}

/// Upper bound on the voxel count of a sphere of `radius`.
#[inline]
pub fn sphere_volume_bound(radius: f64) -> u64 {
    column_volume_bound(radius, box_side(radius))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sphere_radius_two_has_33_voxels() {
        assert_eq!(sphere_offsets(2.0).count(), 33);
    }

    #[test]
    fn unit_sphere_is_a_plus() {
        let mut v: Vec<_> = sphere_offsets(1.0).collect();
        v.sort();
        let mut expected = vec![BlockPos::ZERO];
        expected.extend(NEIGHBORS_6);
        expected.sort();
        assert_eq!(v, expected);
    }

    #[test]
    fn volume_bounds_saturate_for_huge_radii() {
        assert_eq!(extent(1.0e12), MAX_EXTENT);
        assert_eq!(extent(-3.0), 0);
        assert_eq!(sphere_volume_bound(3.0e9), u64::MAX);
        assert_eq!(column_volume_bound(3.0e9, 0), 0);
        assert_eq!(sphere_volume_bound(2.0), 125);
    }

    #[test]
    fn cylinder_height_is_half_open() {
        assert!(in_cylinder(BlockPos::new(0, 0, 0), 2.0, 2));
        assert!(in_cylinder(BlockPos::new(0, 1, 0), 2.0, 2));
        assert!(!in_cylinder(BlockPos::new(0, 2, 0), 2.0, 2));
        assert!(!in_cylinder(BlockPos::new(0, -1, 0), 2.0, 2));
    }

    #[test]
    fn hollow_cylinder_excludes_core() {
        assert!(!in_hollow_cylinder(BlockPos::ZERO, 3.0, 1));
        assert!(in_hollow_cylinder(BlockPos::new(3, 0, 0), 3.0, 1));
    }

    #[test]
    fn disc_follows_normal() {
        let up = Vec3::UP;
        assert!(in_disc(BlockPos::new(2, 0, 0), 2.0, up));
        assert!(!in_disc(BlockPos::new(0, 1, 0), 2.0, up));
        let east = Vec3::new(1.0, 0.0, 0.0);
        assert!(in_disc(BlockPos::new(0, 2, 0), 2.0, east));
        assert!(!in_disc(BlockPos::new(1, 0, 0), 2.0, east));
    }
}
