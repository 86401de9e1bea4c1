//! 2D vector / line-segment / rectangle primitives ("GeomKit").
//!
//! All types use `f64` ("Real" in the propagation formulas) since the
//! classifier and raytracer are numerically sensitive — `f32` would lose
//! precision across the squared-distance terms in §4.3's closed forms.

use std::ops::{Add, Mul, Sub};

/// Small epsilon used to avoid division-by-zero on degenerate geometry
/// (coincident points, zero-length segments) without ever propagating NaN.
pub const EPSILON: f64 = 1e-9;

// ── Vector2D ──────────────────────────────────────────────────────────────────

/// A 2D vector (also used as a point).
#[derive(Copy, Clone, Debug, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Vector2D {
    pub x: f64,
    pub y: f64,
}

impl Vector2D {
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub const ZERO: Vector2D = Vector2D { x: 0.0, y: 0.0 };

    #[inline]
    pub fn dot(self, other: Vector2D) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// 2D "cross product" (z-component of the 3D cross product).
    #[inline]
    pub fn cross(self, other: Vector2D) -> f64 {
        self.x * other.y - self.y * other.x
    }

    #[inline]
    pub fn magnitude_sq(self) -> f64 {
        self.dot(self)
    }

    #[inline]
    pub fn magnitude(self) -> f64 {
        self.magnitude_sq().sqrt()
    }

    /// Unit vector in the same direction. Returns `ZERO` for a degenerate
    /// (zero-length) vector rather than dividing by zero — a
    /// `GeometricDegeneracy` handled locally with a safe default, per the
    /// error-handling design.
    pub fn unitise(self) -> Vector2D {
        let m = self.magnitude();
        if m < EPSILON {
            Vector2D::ZERO
        } else {
            self * (1.0 / m)
        }
    }

    /// Angle in `[0, π]` between `self` and `other`.
    pub fn angle_between(self, other: Vector2D) -> f64 {
        let denom = self.magnitude() * other.magnitude();
        if denom < EPSILON {
            return 0.0;
        }
        (self.dot(other) / denom).clamp(-1.0, 1.0).acos()
    }

    /// Reflect `self` across the infinite line whose direction is `axis`
    /// (need not be unit length).
    pub fn reflect_across(self, axis: Vector2D) -> Vector2D {
        let u = axis.unitise();
        if u == Vector2D::ZERO {
            return self;
        }
        u * (2.0 * self.dot(u)) - self
    }
}

impl Add for Vector2D {
    type Output = Vector2D;
    #[inline]
    fn add(self, rhs: Vector2D) -> Vector2D {
        Vector2D::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vector2D {
    type Output = Vector2D;
    #[inline]
    fn sub(self, rhs: Vector2D) -> Vector2D {
        Vector2D::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vector2D {
    type Output = Vector2D;
    #[inline]
    fn mul(self, rhs: f64) -> Vector2D {
        Vector2D::new(self.x * rhs, self.y * rhs)
    }
}

impl std::fmt::Display for Vector2D {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.3}, {:.3})", self.x, self.y)
    }
}

// ── LineSegment ───────────────────────────────────────────────────────────────

/// A closed 2D line segment from `start` to `end`.
#[derive(Copy, Clone, Debug, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct LineSegment {
    pub start: Vector2D,
    pub end: Vector2D,
}

impl LineSegment {
    #[inline]
    pub fn new(start: Vector2D, end: Vector2D) -> Self {
        Self { start, end }
    }

    /// The directed vector from `start` to `end`.
    #[inline]
    pub fn vector(self) -> Vector2D {
        self.end - self.start
    }

    #[inline]
    pub fn length(self) -> f64 {
        self.vector().magnitude()
    }

    /// Unit vector perpendicular to the segment ("outward" is a convention
    /// of winding order — buildings are loaded with a consistent ring order
    /// so this is stable per polygon).
    pub fn normal(self) -> Vector2D {
        let v = self.vector();
        Vector2D::new(-v.y, v.x).unitise()
    }

    /// Reflect vector `v` across the infinite line containing this segment.
    #[inline]
    pub fn reflect(self, v: Vector2D) -> Vector2D {
        v.reflect_across(self.vector())
    }

    /// Perpendicular distance from `p` to the infinite line through this
    /// segment (§4.1).
    pub fn distance_from_line(self, p: Vector2D) -> f64 {
        let len = self.length();
        if len < EPSILON {
            return (p - self.start).magnitude();
        }
        (self.vector().cross(p - self.start)).abs() / len
    }

    /// Signed projection of `p - start` onto the segment's direction; may be
    /// negative or exceed `length()` (§4.1).
    pub fn distance_along_line(self, p: Vector2D) -> f64 {
        let len = self.length();
        if len < EPSILON {
            return 0.0;
        }
        self.vector().dot(p - self.start) / len
    }

    /// Unique intersection point of two *closed* segments, or `None` if they
    /// are parallel, collinear, or disjoint (§4.1).
    pub fn intersect(self, other: LineSegment) -> Option<Vector2D> {
        let p = self.start;
        let r = self.vector();
        let q = other.start;
        let s = other.vector();

        let denom = r.cross(s);
        if denom.abs() < EPSILON {
            return None; // parallel or collinear
        }

        let qp = q - p;
        let t = qp.cross(s) / denom;
        let u = qp.cross(r) / denom;

        if (-EPSILON..=1.0 + EPSILON).contains(&t) && (-EPSILON..=1.0 + EPSILON).contains(&u) {
            Some(p + r * t)
        } else {
            None
        }
    }

    /// `true` if the minimum distance from any point of the segment to `c`
    /// is strictly less than `r` (§4.1).
    pub fn intersects_circle(self, c: Vector2D, r: f64) -> bool {
        let len_sq = self.vector().magnitude_sq();
        if len_sq < EPSILON {
            return (self.start - c).magnitude() < r;
        }
        let t = ((c - self.start).dot(self.vector()) / len_sq).clamp(0.0, 1.0);
        let closest = self.start + self.vector() * t;
        (closest - c).magnitude() < r
    }
}

// ── Rect ──────────────────────────────────────────────────────────────────────

/// An axis-aligned rectangle: `location` is the lower-left corner, `size` is
/// (width, height).
#[derive(Copy, Clone, Debug, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    #[inline]
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Smallest rect containing both endpoints of `s`, used as a cheap
    /// axis-aligned bounding box for `contains_segment`'s pre-filter.
    pub fn bounding(s: LineSegment) -> Rect {
        Rect::new(
            s.start.x.min(s.end.x),
            s.start.y.min(s.end.y),
            (s.start.x - s.end.x).abs(),
            (s.start.y - s.end.y).abs(),
        )
    }

    #[inline]
    pub fn contains_point(self, p: Vector2D) -> bool {
        p.x >= self.x && p.x <= self.x + self.w && p.y >= self.y && p.y <= self.y + self.h
    }

    /// Fast, possibly-over-inclusive pre-filter (§4.1): true if `s`'s own
    /// bounding box overlaps `self`. False positives are acceptable; false
    /// negatives are not, since callers use this to skip exact intersection
    /// tests.
    pub fn contains_segment(self, s: LineSegment) -> bool {
        let b = Rect::bounding(s);
        self.x <= b.x + b.w && self.x + self.w >= b.x && self.y <= b.y + b.h && self.y + self.h >= b.y
    }

    /// Exact test: `true` if `s` actually passes through this rectangle —
    /// either endpoint lies inside it, or `s` crosses one of its four edges.
    /// Unlike [`contains_segment`](Self::contains_segment), this has no
    /// false positives from a segment whose bounding box merely overlaps the
    /// rectangle without the segment itself ever entering it.
    pub fn intersects_segment(self, s: LineSegment) -> bool {
        if self.contains_point(s.start) || self.contains_point(s.end) {
            return true;
        }
        let corners = [
            Vector2D::new(self.x, self.y),
            Vector2D::new(self.x + self.w, self.y),
            Vector2D::new(self.x + self.w, self.y + self.h),
            Vector2D::new(self.x, self.y + self.h),
        ];
        (0..4).any(|i| {
            let side = LineSegment::new(corners[i], corners[(i + 1) % 4]);
            side.intersect(s).is_some()
        })
    }
}
