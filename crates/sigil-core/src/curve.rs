//! Centripetal Catmull-Rom interpolation through a branch's sample points.
//!
//! Two parameterisations are exposed: the raw spline parameter `t` (uniform
//! per control segment) and the arclength fraction `u`, resolved through a
//! cumulative length table built once at construction.

use glam::Vec3;

const ARC_LENGTH_DIVISIONS: usize = 200;
const TANGENT_DELTA: f32 = 1e-4;

#[derive(Clone, Debug)]
pub struct CatmullRomCurve {
    points: Vec<Vec3>,
    arc_lengths: Vec<f32>,
}

/// Cubic coefficients for one component of a non-uniform Catmull-Rom segment.
#[derive(Clone, Copy, Default)]
struct CubicPoly {
    c0: f32,
    c1: f32,
    c2: f32,
    c3: f32,
}

impl CubicPoly {
    fn hermite(x0: f32, x1: f32, t0: f32, t1: f32) -> Self {
        Self {
            c0: x0,
            c1: t0,
            c2: -3.0 * x0 + 3.0 * x1 - 2.0 * t0 - t1,
            c3: 2.0 * x0 - 2.0 * x1 + t0 + t1,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn nonuniform(x0: f32, x1: f32, x2: f32, x3: f32, dt0: f32, dt1: f32, dt2: f32) -> Self {
        let t1 = (x1 - x0) / dt0 - (x2 - x0) / (dt0 + dt1) + (x2 - x1) / dt1;
        let t2 = (x2 - x1) / dt1 - (x3 - x1) / (dt1 + dt2) + (x3 - x2) / dt2;
        Self::hermite(x1, x2, t1 * dt1, t2 * dt1)
    }

    #[inline]
    fn eval(&self, t: f32) -> f32 {
        let t2 = t * t;
        self.c0 + self.c1 * t + self.c2 * t2 + self.c3 * t2 * t
    }
}

impl CatmullRomCurve {
    /// Build a curve through `points`. Fewer than two points yield a
    /// degenerate curve that evaluates to its only point (or the origin).
    pub fn new(points: Vec<Vec3>) -> Self {
        let mut curve = Self {
            points,
            arc_lengths: Vec::new(),
        };
        curve.arc_lengths = curve.compute_arc_lengths(ARC_LENGTH_DIVISIONS);
        curve
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    /// Total arclength.
    pub fn length(&self) -> f32 {
        self.arc_lengths.last().copied().unwrap_or(0.0)
    }

    /// Point at spline parameter `t` in `[0, 1]`.
    pub fn point(&self, t: f32) -> Vec3 {
        let n = self.points.len();
        match n {
            0 => return Vec3::ZERO,
            1 => return self.points[0],
            _ => {}
        }
        let t = t.clamp(0.0, 1.0);
        let p = (n - 1) as f32 * t;
        let mut int_point = p.floor() as usize;
        let mut weight = p - int_point as f32;
        if int_point >= n - 1 {
            int_point = n - 2;
            weight = 1.0;
        }

        let p1 = self.points[int_point];
        let p2 = self.points[int_point + 1];
        let p0 = if int_point > 0 {
            self.points[int_point - 1]
        } else {
            // reflect the first segment to extrapolate a leading control point
            p1 + (p1 - p2)
        };
        let p3 = if int_point + 2 < n {
            self.points[int_point + 2]
        } else {
            p2 + (p2 - p1)
        };

        // centripetal parameterisation: knot spacing is sqrt of chord length
        let mut dt0 = p0.distance_squared(p1).powf(0.25);
        let mut dt1 = p1.distance_squared(p2).powf(0.25);
        let mut dt2 = p2.distance_squared(p3).powf(0.25);
        if dt1 < 1e-4 {
            dt1 = 1.0;
        }
        if dt0 < 1e-4 {
            dt0 = dt1;
        }
        if dt2 < 1e-4 {
            dt2 = dt1;
        }

        let px = CubicPoly::nonuniform(p0.x, p1.x, p2.x, p3.x, dt0, dt1, dt2);
        let py = CubicPoly::nonuniform(p0.y, p1.y, p2.y, p3.y, dt0, dt1, dt2);
        let pz = CubicPoly::nonuniform(p0.z, p1.z, p2.z, p3.z, dt0, dt1, dt2);
        Vec3::new(px.eval(weight), py.eval(weight), pz.eval(weight))
    }

    /// Unit tangent at spline parameter `t`, by central difference.
    pub fn tangent(&self, t: f32) -> Vec3 {
        let t1 = (t - TANGENT_DELTA).max(0.0);
        let t2 = (t + TANGENT_DELTA).min(1.0);
        (self.point(t2) - self.point(t1)).normalize_or_zero()
    }

    /// Point at arclength fraction `u` in `[0, 1]`.
    pub fn point_at(&self, u: f32) -> Vec3 {
        self.point(self.u_to_t(u))
    }

    /// Unit tangent at arclength fraction `u` in `[0, 1]`.
    pub fn tangent_at(&self, u: f32) -> Vec3 {
        self.tangent(self.u_to_t(u))
    }

    /// Map an arclength fraction to the spline parameter covering it.
    pub fn u_to_t(&self, u: f32) -> f32 {
        let lengths = &self.arc_lengths;
        let il = lengths.len();
        let total = self.length();
        if il < 2 || total <= 0.0 {
            return u.clamp(0.0, 1.0);
        }
        let target = u.clamp(0.0, 1.0) * total;

        // last index whose cumulative length is still below the target
        let i = lengths.partition_point(|&l| l < target).saturating_sub(1);
        let i = i.min(il - 2);
        let before = lengths[i];
        if (before - target).abs() < f32::EPSILON {
            return i as f32 / (il - 1) as f32;
        }
        let segment = lengths[i + 1] - before;
        let fraction = if segment > 0.0 {
            (target - before) / segment
        } else {
            0.0
        };
        ((i as f32 + fraction) / (il - 1) as f32).clamp(0.0, 1.0)
    }

    fn compute_arc_lengths(&self, divisions: usize) -> Vec<f32> {
        let mut lengths = Vec::with_capacity(divisions + 1);
        let mut last = self.point(0.0);
        let mut sum = 0.0;
        lengths.push(0.0);
        for p in 1..=divisions {
            let current = self.point(p as f32 / divisions as f32);
            sum += current.distance(last);
            lengths.push(sum);
            last = current;
        }
        lengths
    }
}
