//! Curve brushes: splines through clicked points, hanging chains and straight lines.
//!
//! Each brush keeps its clicked points between strokes. Clicking the last point again
//! ends collection and draws; two-point brushes draw on the second click.

use brushwork_edit::{BlockSource, surface_y};
use brushwork_geom::shape::{self as geo, bounds};
use brushwork_geom::{BlockPos, NEIGHBORS_6, Region, Vec3};
use hashbrown::HashSet;
use log::debug;

use super::{Brush, BrushCtx};
use crate::BrushError;

/// Kochanek–Bartels spline parametrised by node index.
#[derive(Clone, Debug)]
pub struct KochanekBartels {
    points: Vec<Vec3>,
    tension: f32,
    bias: f32,
    continuity: f32,
}

impl KochanekBartels {
    /// `None` with fewer than two points.
    pub fn new(points: Vec<Vec3>, tension: f64, bias: f64, continuity: f64) -> Option<Self> {
        if points.len() < 2 {
            return None;
        }
        Some(Self {
            points,
            tension: tension as f32,
            bias: bias as f32,
            continuity: continuity as f32,
        })
    }

    pub fn segments(&self) -> usize {
        self.points.len() - 1
    }

    #[inline]
    fn node(&self, i: isize) -> Vec3 {
        let last = self.points.len() as isize - 1;
        self.points[i.clamp(0, last) as usize]
    }

    /// (incoming, outgoing) tangents at node `i`.
    fn tangents(&self, i: isize) -> (Vec3, Vec3) {
        let (t, b, c) = (self.tension, self.bias, self.continuity);
        let back = self.node(i) - self.node(i - 1);
        let fwd = self.node(i + 1) - self.node(i);
        let k = (1.0 - t) * 0.5;
        let incoming = back * (k * (1.0 + b) * (1.0 - c)) + fwd * (k * (1.0 - b) * (1.0 + c));
        let outgoing = back * (k * (1.0 + b) * (1.0 + c)) + fwd * (k * (1.0 - b) * (1.0 - c));
        (incoming, outgoing)
    }

    /// Position at parameter `t` in `0..=segments()`.
    pub fn position(&self, t: f32) -> Vec3 {
        let seg = (t.max(0.0).floor() as usize).min(self.segments() - 1);
        let u = (t - seg as f32).clamp(0.0, 1.0);
        let i = seg as isize;
        let (p0, p1) = (self.node(i), self.node(i + 1));
        let (_, d0) = self.tangents(i);
        let (d1, _) = self.tangents(i + 1);
        let (u2, u3) = (u * u, u * u * u);
        p0 * (2.0 * u3 - 3.0 * u2 + 1.0)
            + d0 * (u3 - 2.0 * u2 + u)
            + p1 * (-2.0 * u3 + 3.0 * u2)
            + d1 * (u3 - u2)
    }

    /// Samples along the curve; each segment gets `chord × quality / spacing` of them.
    pub fn sample(&self, quality: f64, spacing: f64) -> Vec<Vec3> {
        let spacing = spacing.max(1.0) as f32;
        let quality = quality.max(1.0) as f32;
        let mut out = Vec::new();
        for seg in 0..self.segments() {
            let chord = self.points[seg].distance(self.points[seg + 1]);
            let n = ((chord * quality / spacing).ceil() as usize).max(1);
            for k in 0..n {
                out.push(self.position(seg as f32 + k as f32 / n as f32));
            }
        }
        out.push(self.position(self.segments() as f32));
        out
    }
}

/// Points of a hanging chain from `a` to `b` whose length is `length_factor` times the
/// straight distance. `length_factor` must be above 1.
pub fn catenary_points(a: Vec3, b: Vec3, length_factor: f64) -> Vec<Vec3> {
    let (ax, az) = (a.x as f64, a.z as f64);
    let (hx, hz) = (b.x as f64 - ax, b.z as f64 - az);
    let d = (hx * hx + hz * hz).sqrt();
    let h = b.y as f64 - a.y as f64;
    let length = (d * d + h * h).sqrt() * length_factor;
    if d < 1e-6 || length_factor <= 1.0 {
        return vec![a, b];
    }
    // 2a sinh(d / 2a) = sqrt(L² - h²); solve sinh(x)/x = k for x = d / 2a
    let k = (length * length - h * h).sqrt() / d;
    let f = |x: f64| x.sinh() / x - k;
    let (mut lo, mut hi) = (1e-9, 1.0);
    while f(hi) < 0.0 && hi < 700.0 {
        hi *= 2.0;
    }
    for _ in 0..100 {
        let mid = 0.5 * (lo + hi);
        if f(mid) < 0.0 {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    let x = 0.5 * (lo + hi);
    let param = d / (2.0 * x);
    let vertex = d / 2.0 - param * (h / length).atanh();
    let offset = a.y as f64 - param * (vertex / param).cosh();
    let n = ((length * 2.0).ceil() as usize).max(2);
    (0..=n)
        .map(|i| {
            let t = d * i as f64 / n as f64;
            let y = param * ((t - vertex) / param).cosh() + offset;
            Vec3::new(
                (ax + hx * t / d) as f32,
                y as f32,
                (az + hz * t / d) as f32,
            )
        })
        .collect()
}

/// Voxels on the straight segment from `a` to `b`, both ends included.
pub fn line_voxels(a: BlockPos, b: BlockPos) -> Vec<BlockPos> {
    let delta = b - a;
    let steps = delta.x.abs().max(delta.y.abs()).max(delta.z.abs());
    if steps == 0 {
        return vec![a];
    }
    (0..=steps)
        .map(|i| {
            let t = i as f32 / steps as f32;
            (Vec3::from(a) + Vec3::from(delta) * t).round_pos()
        })
        .collect()
}

/// Connected voxel path through sample points.
pub fn polyline(points: &[Vec3]) -> Vec<BlockPos> {
    let mut path: Vec<BlockPos> = Vec::new();
    let mut prev: Option<BlockPos> = None;
    for p in points.iter().map(|p| p.round_pos()) {
        match prev {
            None => path.push(p),
            Some(q) if q == p => continue,
            Some(q) => path.extend(line_voxels(q, p).into_iter().skip(1)),
        }
        prev = Some(p);
    }
    path
}

/// Union of `stamp` placed at every path voxel, optionally reduced to its outer skin.
pub fn stamp_path(path: &[BlockPos], stamp: &[BlockPos], shell: bool) -> Vec<BlockPos> {
    let mut set: HashSet<BlockPos> = HashSet::new();
    for &p in path {
        for &o in stamp {
            set.insert(p + o);
        }
    }
    let mut out: Vec<BlockPos> = if shell && stamp.len() > 1 {
        set.iter()
            .copied()
            .filter(|&p| NEIGHBORS_6.iter().any(|&d| !set.contains(&(p + d))))
            .collect()
    } else {
        set.into_iter().collect()
    };
    out.sort_unstable();
    out
}

/// Stamp offsets for a curve of radius `r`: a ball, or a horizontal disc when flat.
fn stamp_offsets(r: f64, flat: bool) -> Vec<BlockPos> {
    if flat {
        bounds(r)
            .iter()
            .filter(|&o| geo::in_cylinder(o, r, 1))
            .collect()
    } else {
        geo::sphere_offsets(r).collect()
    }
}

fn bounding(voxels: &[BlockPos]) -> Option<Region> {
    let first = *voxels.first()?;
    Some(voxels.iter().fold(Region::new(first, first), |r, &p| {
        Region::new(r.min.min(p), r.max.max(p))
    }))
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DrawOptions {
    pub shell: bool,
    pub select: bool,
    pub flat: bool,
}

fn draw(cx: &mut BrushCtx<'_, '_>, path: &[BlockPos], opts: DrawOptions) -> Result<(), BrushError> {
    let stamp = stamp_offsets(cx.size, opts.flat);
    let voxels = stamp_path(path, &stamp, opts.shell);
    if opts.select {
        if let Some(region) = bounding(&voxels) {
            cx.host.select(region);
        }
    }
    for p in voxels {
        cx.place(p)?;
    }
    Ok(())
}

/// Ordered click collection ending on a repeated click.
#[derive(Clone, Debug, Default)]
enum Collect {
    #[default]
    Idle,
    Collecting(Vec<BlockPos>),
}

impl Collect {
    fn click(&mut self, p: BlockPos) -> Option<Vec<BlockPos>> {
        match self {
            Collect::Idle => {
                *self = Collect::Collecting(vec![p]);
                None
            }
            Collect::Collecting(points) if points.last() == Some(&p) => {
                let points = std::mem::take(points);
                *self = Collect::Idle;
                Some(points)
            }
            Collect::Collecting(points) => {
                points.push(p);
                None
            }
        }
    }
}

/// Two clicks; clicking the same point twice cancels.
#[derive(Clone, Debug, Default)]
struct TwoPoint(Option<BlockPos>);

impl TwoPoint {
    fn click(&mut self, p: BlockPos) -> Option<(BlockPos, BlockPos)> {
        match self.0.take() {
            None => {
                self.0 = Some(p);
                None
            }
            Some(a) if a == p => None,
            Some(a) => Some((a, p)),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct SplineParams {
    pub tension: f64,
    pub bias: f64,
    pub continuity: f64,
    pub quality: f64,
}

impl Default for SplineParams {
    fn default() -> Self {
        Self {
            tension: 0.0,
            bias: 0.0,
            continuity: 0.0,
            quality: 10.0,
        }
    }
}

impl SplineParams {
    fn validate(&self) -> Result<(), BrushError> {
        let in_unit = |v: f64| (-1.0..=1.0).contains(&v);
        if !(in_unit(self.tension) && in_unit(self.bias) && in_unit(self.continuity)) {
            return Err(BrushError::config(
                "tension, bias and continuity must be within -1..=1",
            ));
        }
        if !(self.quality.is_finite() && self.quality > 0.0) {
            return Err(BrushError::config("spline quality must be positive"));
        }
        Ok(())
    }
}

fn fit(points: &[BlockPos], params: &SplineParams, spacing: f64) -> Option<Vec<Vec3>> {
    let nodes = points.iter().map(|&p| Vec3::from(p)).collect();
    let curve = KochanekBartels::new(nodes, params.tension, params.bias, params.continuity)?;
    Some(curve.sample(params.quality, spacing))
}

/// Smooth curve through every clicked point.
#[derive(Clone, Debug)]
pub struct SplineBrush {
    params: SplineParams,
    draw: DrawOptions,
    state: Collect,
}

impl SplineBrush {
    pub fn new(params: SplineParams, draw: DrawOptions) -> Result<Self, BrushError> {
        params.validate()?;
        Ok(Self {
            params,
            draw,
            state: Collect::Idle,
        })
    }

    /// Points clicked so far in the current collection.
    pub fn pending(&self) -> &[BlockPos] {
        match &self.state {
            Collect::Idle => &[],
            Collect::Collecting(points) => points,
        }
    }
}

impl Brush for SplineBrush {
    fn name(&self) -> &'static str {
        "spline"
    }

    fn permission(&self) -> Option<&'static str> {
        Some("worldedit.brush.spline")
    }

    fn apply(
        &mut self,
        cx: &mut BrushCtx<'_, '_>,
        target: BlockPos,
        _facing: Vec3,
    ) -> Result<(), BrushError> {
        let Some(points) = self.state.click(target) else {
            return Ok(());
        };
        let Some(samples) = fit(&points, &self.params, cx.size) else {
            debug!("spline needs at least two points, got {}", points.len());
            return Ok(());
        };
        draw(cx, &polyline(&samples), self.draw)
    }
}

/// Spline fitted over the clicked columns and laid on the terrain surface.
#[derive(Clone, Debug)]
pub struct SurfaceSplineBrush {
    params: SplineParams,
    state: Collect,
}

impl SurfaceSplineBrush {
    pub fn new(params: SplineParams) -> Result<Self, BrushError> {
        params.validate()?;
        Ok(Self {
            params,
            state: Collect::Idle,
        })
    }
}

impl Brush for SurfaceSplineBrush {
    fn name(&self) -> &'static str {
        "surface spline"
    }

    fn permission(&self) -> Option<&'static str> {
        Some("worldedit.brush.surfacespline")
    }

    fn apply(
        &mut self,
        cx: &mut BrushCtx<'_, '_>,
        target: BlockPos,
        _facing: Vec3,
    ) -> Result<(), BrushError> {
        let Some(points) = self.state.click(target) else {
            return Ok(());
        };
        let flat: Vec<BlockPos> = points.iter().map(|p| p.with_y(0)).collect();
        let Some(samples) = fit(&flat, &self.params, cx.size) else {
            debug!("surface spline needs at least two points");
            return Ok(());
        };
        let disc = stamp_offsets(cx.size, true);
        let columns = stamp_path(&polyline(&samples), &disc, false);
        let (top, bottom) = (cx.edit.max_y(), cx.edit.min_y());
        for col in columns {
            if let Some(y) = surface_y(cx.source(), col.x, col.z, top, bottom) {
                cx.place(col.with_y(y))?;
            }
        }
        Ok(())
    }
}

/// Sagging chain between two clicks.
#[derive(Clone, Debug)]
pub struct CatenaryBrush {
    length_factor: f64,
    draw: DrawOptions,
    state: TwoPoint,
}

impl CatenaryBrush {
    pub fn new(length_factor: f64, shell: bool, select: bool) -> Result<Self, BrushError> {
        if !(length_factor.is_finite() && length_factor > 1.0) {
            return Err(BrushError::config(format!(
                "catenary length factor must be greater than 1, got {length_factor}"
            )));
        }
        Ok(Self {
            length_factor,
            draw: DrawOptions {
                shell,
                select,
                flat: false,
            },
            state: TwoPoint::default(),
        })
    }
}

impl Brush for CatenaryBrush {
    fn name(&self) -> &'static str {
        "catenary"
    }

    fn permission(&self) -> Option<&'static str> {
        Some("worldedit.brush.spline")
    }

    fn apply(
        &mut self,
        cx: &mut BrushCtx<'_, '_>,
        target: BlockPos,
        _facing: Vec3,
    ) -> Result<(), BrushError> {
        let Some((a, b)) = self.state.click(target) else {
            return Ok(());
        };
        let samples = catenary_points(Vec3::from(a), Vec3::from(b), self.length_factor);
        draw(cx, &polyline(&samples), self.draw)
    }
}

/// Straight line between two clicks.
#[derive(Clone, Debug, Default)]
pub struct LineBrush {
    draw: DrawOptions,
    state: TwoPoint,
}

impl LineBrush {
    pub fn new(draw: DrawOptions) -> Self {
        Self {
            draw,
            state: TwoPoint::default(),
        }
    }
}

impl Brush for LineBrush {
    fn name(&self) -> &'static str {
        "line"
    }

    fn permission(&self) -> Option<&'static str> {
        Some("worldedit.brush.line")
    }

    fn apply(
        &mut self,
        cx: &mut BrushCtx<'_, '_>,
        target: BlockPos,
        _facing: Vec3,
    ) -> Result<(), BrushError> {
        let Some((a, b)) = self.state.click(target) else {
            return Ok(());
        };
        draw(cx, &line_voxels(a, b), self.draw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spline_passes_through_nodes() {
        let nodes = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(10.0, 4.0, 0.0),
            Vec3::new(20.0, 0.0, 6.0),
        ];
        let k = KochanekBartels::new(nodes.clone(), 0.0, 0.0, 0.0).unwrap();
        for (i, n) in nodes.iter().enumerate() {
            assert!(k.position(i as f32).distance(*n) < 1e-4);
        }
        assert!(KochanekBartels::new(vec![Vec3::ZERO], 0.0, 0.0, 0.0).is_none());
    }

    #[test]
    fn catenary_sags_below_chord() {
        let a = Vec3::new(0.0, 20.0, 0.0);
        let b = Vec3::new(20.0, 20.0, 0.0);
        let pts = catenary_points(a, b, 1.2);
        let first = pts[0];
        let last = pts[pts.len() - 1];
        assert!(first.distance(a) < 1e-3);
        assert!(last.distance(b) < 1e-3);
        let lowest = pts.iter().map(|p| p.y).fold(f32::MAX, f32::min);
        assert!(lowest < 15.0, "{lowest}");
    }

    #[test]
    fn polyline_is_connected() {
        let path = polyline(&[Vec3::new(0.0, 0.0, 0.0), Vec3::new(7.0, 3.0, -2.0)]);
        for w in path.windows(2) {
            let d = w[1] - w[0];
            assert!(d.x.abs() <= 1 && d.y.abs() <= 1 && d.z.abs() <= 1);
        }
        assert_eq!(path.last(), Some(&BlockPos::new(7, 3, -2)));
    }

    #[test]
    fn collect_ends_on_repeat_click() {
        let mut c = Collect::default();
        let (a, b) = (BlockPos::new(0, 0, 0), BlockPos::new(5, 0, 0));
        assert!(c.click(a).is_none());
        assert!(c.click(b).is_none());
        assert_eq!(c.click(b), Some(vec![a, b]));
        assert!(matches!(c, Collect::Idle));
    }
}
