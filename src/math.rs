use std::fmt;
use std::ops::{Add, AddAssign, Div, Index, Mul, Sub};

/// Tolerance used by the intersection test and the emission threshold.
///
/// This is the smallest positive normal `f64`, not a scale-aware tolerance: it only rejects
/// exactly parallel segments and exactly zero energy.
pub const EPSILON: f64 = f64::MIN_POSITIVE;

/// A 3-component vector used for positions, normals, and RGB energy in the baker.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

pub type Point3 = Vec3;
pub type Color = Vec3;

/// Texture coordinate of a plate corner.
pub type TexCoord = [f64; 2];

impl Vec3 {
    #[inline(always)]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    #[inline(always)]
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    #[inline(always)]
    pub const fn ones() -> Self {
        Self::new(1.0, 1.0, 1.0)
    }

    #[inline(always)]
    pub const fn splat(v: f64) -> Self {
        Self::new(v, v, v)
    }

    #[inline(always)]
    pub fn length_squared(self) -> f64 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    #[inline(always)]
    pub fn length(self) -> f64 {
        self.length_squared().sqrt()
    }

    /// Euclidean distance between two points.
    #[inline(always)]
    pub fn distance(self, other: Self) -> f64 {
        (other - self).length()
    }

    /// Returns the unit vector.
    ///
    /// The caller guarantees a non-zero length; a zero vector yields non-finite components.
    #[inline(always)]
    pub fn normalized(self) -> Self {
        self / self.length()
    }

    /// Like [`Vec3::normalized`], but returns `None` for a vector of zero (or non-finite) length.
    #[inline]
    pub fn try_normalized(self) -> Option<Self> {
        let len = self.length();
        (len > 0.0 && len.is_finite()).then(|| self / len)
    }

    #[inline(always)]
    pub fn dot(self, rhs: Self) -> f64 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    #[inline(always)]
    pub fn cross(self, rhs: Self) -> Self {
        Self::new(
            self.y * rhs.z - self.z * rhs.y,
            self.z * rhs.x - self.x * rhs.z,
            self.x * rhs.y - self.y * rhs.x,
        )
    }

    /// Component-wise (Hadamard) product, used to filter energy through a tint.
    #[inline(always)]
    pub fn hadamard(self, rhs: Self) -> Self {
        Self::new(self.x * rhs.x, self.y * rhs.y, self.z * rhs.z)
    }

    /// True when `self` points against `other` (or is perpendicular to it).
    #[inline(always)]
    pub fn facing(self, other: Self) -> bool {
        self.dot(other) <= 0.0
    }

    /// Clamps each component to [0, 1].
    #[inline(always)]
    pub fn saturate(self) -> Self {
        Self::new(
            self.x.clamp(0.0, 1.0),
            self.y.clamp(0.0, 1.0),
            self.z.clamp(0.0, 1.0),
        )
    }

    /// True when every component is strictly greater than `threshold`.
    #[inline(always)]
    pub fn all_greater_than(self, threshold: f64) -> bool {
        self.x > threshold && self.y > threshold && self.z > threshold
    }

    pub fn min_components(self, rhs: Self) -> Self {
        Self::new(self.x.min(rhs.x), self.y.min(rhs.y), self.z.min(rhs.z))
    }

    pub fn max_components(self, rhs: Self) -> Self {
        Self::new(self.x.max(rhs.x), self.y.max(rhs.y), self.z.max(rhs.z))
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3}, {:.3})", self.x, self.y, self.z)
    }
}

impl Add for Vec3 {
    type Output = Self;
    #[inline(always)]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec3 {
    #[inline(always)]
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
    }
}

impl Sub for Vec3 {
    type Output = Self;
    #[inline(always)]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;
    #[inline(always)]
    fn mul(self, t: f64) -> Self {
        Self::new(self.x * t, self.y * t, self.z * t)
    }
}

impl Div<f64> for Vec3 {
    type Output = Self;
    #[inline(always)]
    fn div(self, t: f64) -> Self {
        let inv = 1.0 / t;
        Self::new(self.x * inv, self.y * inv, self.z * inv)
    }
}

impl Index<usize> for Vec3 {
    type Output = f64;
    fn index(&self, i: usize) -> &f64 {
        match i {
            0 => &self.x,
            1 => &self.y,
            2 => &self.z,
            _ => panic!("Vec3 index out of bounds: {i}"),
        }
    }
}

// ─── Segment / Triangle ─────────────────────────────────────────────────────

/// Möller–Trumbore test restricted to the segment `p0 → p1`.
///
/// Reports a hit only when the crossing lies strictly past `p0` and no further than `p1`
/// (`t ∈ (ε, 1 + ε)`), i.e. when something sits between a receiver and a photon.
/// Segments parallel to the triangle plane never hit.
pub fn segment_intersects_triangle(p0: Point3, p1: Point3, a: Point3, b: Point3, c: Point3) -> bool {
    let dir = p1 - p0;
    let edge1 = b - a;
    let edge2 = c - a;
    let h = dir.cross(edge2);
    let det = edge1.dot(h);
    if det < EPSILON && det > -EPSILON {
        return false;
    }

    let f = 1.0 / det;
    let s = p0 - a;
    let u = f * s.dot(h);
    if !(0.0..=1.0).contains(&u) {
        return false;
    }

    let q = s.cross(edge1);
    let v = f * dir.dot(q);
    if v < 0.0 || u + v > 1.0 {
        return false;
    }

    let t = f * edge2.dot(q);
    t > EPSILON && t < 1.0 + EPSILON
}

/// Tests the segment against a quad split along its `0–2` diagonal.
#[inline]
pub fn segment_intersects_quad(p0: Point3, p1: Point3, quad: &[Point3; 4]) -> bool {
    segment_intersects_triangle(p0, p1, quad[0], quad[1], quad[2])
        || segment_intersects_triangle(p0, p1, quad[2], quad[3], quad[0])
}

// ─── Ray ────────────────────────────────────────────────────────────────────

/// A parametric ray R(t) = origin + t · direction. A segment from `a` to `b` is the ray
/// `Ray::through(a, b)` over `t ∈ [0, 1]`.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Point3,
    pub direction: Vec3,
}

impl Ray {
    #[inline(always)]
    pub const fn new(origin: Point3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    #[inline(always)]
    pub fn through(from: Point3, to: Point3) -> Self {
        Self::new(from, to - from)
    }
}

// ─── Axis-Aligned Bounding Box ──────────────────────────────────────────────

/// An axis-aligned bounding box used to cull occlusion candidates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Point3,
    pub max: Point3,
}

impl Aabb {
    pub const fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    /// Smallest box containing every point, grown by `pad` on each side.
    ///
    /// Plates are flat, so the padding keeps their boxes from having zero thickness.
    pub fn enclosing(points: &[Point3], pad: f64) -> Self {
        let mut min = Point3::splat(f64::INFINITY);
        let mut max = Point3::splat(f64::NEG_INFINITY);
        for &p in points {
            min = min.min_components(p);
            max = max.max_components(p);
        }
        Self::new(min - Vec3::splat(pad), max + Vec3::splat(pad))
    }

    /// Slab-method ray-AABB intersection test over `[t_min, t_max]`.
    ///
    /// NaN slab bounds (origin exactly on a slab of an axis the ray does not move along) are
    /// ignored by `f64::max`/`f64::min`, so the test errs towards reporting overlap.
    pub fn hit(&self, ray: &Ray, mut t_min: f64, mut t_max: f64) -> bool {
        for axis in 0..3 {
            let inv_d = 1.0 / ray.direction[axis];
            let mut t0 = (self.min[axis] - ray.origin[axis]) * inv_d;
            let mut t1 = (self.max[axis] - ray.origin[axis]) * inv_d;
            if inv_d < 0.0 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t0.max(t_min);
            t_max = t1.min(t_max);
            if t_max < t_min {
                return false;
            }
        }
        true
    }
}
