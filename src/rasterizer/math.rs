//! Screen-space math for the 2D rasterizer
//!
//! Points, edge functions and the 6-parameter affine transform used to
//! blit a source image into a destination triangle.

use std::ops::{Add, Sub, Mul};
use serde::{Serialize, Deserialize};

/// Determinants below this are treated as zero-area triangles
pub const DEGENERATE_EPSILON: f32 = 1e-6;

/// 2D point / vector (screen pixels or texture pixels)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn dot(self, other: Vec2) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// Z component of the 3D cross product
    pub fn cross(self, other: Vec2) -> f32 {
        self.x * other.y - self.y * other.x
    }

    pub fn len(self) -> f32 {
        self.dot(self).sqrt()
    }

    pub fn normalize(self) -> Vec2 {
        let l = self.len();
        if l == 0.0 {
            return Vec2::ZERO;
        }
        Vec2 {
            x: self.x / l,
            y: self.y / l,
        }
    }

    pub fn scale(self, s: f32) -> Vec2 {
        Vec2 {
            x: self.x * s,
            y: self.y * s,
        }
    }

    pub fn lerp(self, other: Vec2, t: f32) -> Vec2 {
        Vec2 {
            x: lerp(self.x, other.x, t),
            y: lerp(self.y, other.y, t),
        }
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, other: Vec2) -> Vec2 {
        Vec2 {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, other: Vec2) -> Vec2 {
        Vec2 {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;
    fn mul(self, s: f32) -> Vec2 {
        self.scale(s)
    }
}

#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Signed edge function: positive when `p` is left of `a -> b` (y down)
#[inline]
pub fn edge(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b - a).cross(p - a)
}

/// Twice the signed area of a triangle
pub fn triangle_area2(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    edge(a, b, c)
}

/// Twice the signed area of a polygon (shoelace)
pub fn polygon_area2(points: &[Vec2]) -> f32 {
    let n = points.len();
    let mut sum = 0.0;
    for i in 0..n {
        sum += points[i].cross(points[(i + 1) % n]);
    }
    sum
}

/// Inclusive point-in-convex-polygon test, independent of winding
pub fn convex_contains(points: &[Vec2], p: Vec2) -> bool {
    const ERR: f32 = -0.0001;
    let n = points.len();
    if n < 3 {
        return false;
    }
    let sign = if polygon_area2(points) >= 0.0 { 1.0 } else { -1.0 };
    for i in 0..n {
        if edge(points[i], points[(i + 1) % n], p) * sign < ERR {
            return false;
        }
    }
    true
}

/// Centroid of a triangle
pub fn centroid(tri: &[Vec2; 3]) -> Vec2 {
    Vec2::new(
        (tri[0].x + tri[1].x + tri[2].x) / 3.0,
        (tri[0].y + tri[1].y + tri[2].y) / 3.0,
    )
}

/// Push every vertex `amount` pixels away from the centroid
pub fn expand_triangle(tri: &[Vec2; 3], amount: f32) -> [Vec2; 3] {
    let c = centroid(tri);
    tri.map(|v| v + (v - c).normalize() * amount)
}

/// 2D affine transform, canvas `setTransform(a, b, c, d, e, f)` layout:
/// `x' = a*x + c*y + e`, `y' = b*x + d*y + f`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine2 {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Affine2 {
    pub const IDENTITY: Affine2 = Affine2 { a: 1.0, b: 0.0, c: 0.0, d: 1.0, e: 0.0, f: 0.0 };

    /// Solve the transform taking `src[i]` to `dst[i]` (Cramer's rule).
    /// Returns `None` when the source triangle has no area.
    pub fn from_triangles(src: &[Vec2; 3], dst: &[Vec2; 3]) -> Option<Affine2> {
        let [s0, s1, s2] = *src;
        let det = s0.x * (s1.y - s2.y) + s1.x * (s2.y - s0.y) + s2.x * (s0.y - s1.y);
        if det.abs() < DEGENERATE_EPSILON {
            return None;
        }

        let solve = |t0: f32, t1: f32, t2: f32| -> (f32, f32, f32) {
            let m = (t0 * (s1.y - s2.y) + t1 * (s2.y - s0.y) + t2 * (s0.y - s1.y)) / det;
            let n = (t0 * (s2.x - s1.x) + t1 * (s0.x - s2.x) + t2 * (s1.x - s0.x)) / det;
            let o = (t0 * (s1.x * s2.y - s2.x * s1.y)
                + t1 * (s2.x * s0.y - s0.x * s2.y)
                + t2 * (s0.x * s1.y - s1.x * s0.y))
                / det;
            (m, n, o)
        };

        let (a, c, e) = solve(dst[0].x, dst[1].x, dst[2].x);
        let (b, d, f) = solve(dst[0].y, dst[1].y, dst[2].y);
        Some(Affine2 { a, b, c, d, e, f })
    }

    pub fn apply(&self, p: Vec2) -> Vec2 {
        Vec2::new(
            self.a * p.x + self.c * p.y + self.e,
            self.b * p.x + self.d * p.y + self.f,
        )
    }

    pub fn determinant(&self) -> f32 {
        self.a * self.d - self.b * self.c
    }

    pub fn inverse(&self) -> Option<Affine2> {
        let det = self.determinant();
        if det.abs() < DEGENERATE_EPSILON {
            return None;
        }
        let a = self.d / det;
        let b = -self.b / det;
        let c = -self.c / det;
        let d = self.a / det;
        Some(Affine2 {
            a,
            b,
            c,
            d,
            e: -(a * self.e + c * self.f),
            f: -(b * self.e + d * self.f),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec2, b: Vec2) -> bool {
        (a.x - b.x).abs() < 0.001 && (a.y - b.y).abs() < 0.001
    }

    #[test]
    fn test_affine_maps_all_three_points() {
        let src = [Vec2::new(0.0, 0.0), Vec2::new(64.0, 0.0), Vec2::new(0.0, 64.0)];
        let dst = [Vec2::new(10.0, 20.0), Vec2::new(90.0, 30.0), Vec2::new(5.0, 120.0)];
        let t = Affine2::from_triangles(&src, &dst).unwrap();
        for i in 0..3 {
            assert!(close(t.apply(src[i]), dst[i]));
        }
    }

    #[test]
    fn test_affine_inverse_round_trips() {
        let src = [Vec2::new(0.0, 0.0), Vec2::new(32.0, 0.0), Vec2::new(0.0, 16.0)];
        let dst = [Vec2::new(3.0, 4.0), Vec2::new(40.0, 9.0), Vec2::new(1.0, 50.0)];
        let t = Affine2::from_triangles(&src, &dst).unwrap();
        let inv = t.inverse().unwrap();
        let p = Vec2::new(12.0, 7.0);
        assert!(close(inv.apply(t.apply(p)), p));
    }

    #[test]
    fn test_affine_rejects_collinear_source() {
        let src = [Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0), Vec2::new(2.0, 2.0)];
        let dst = [Vec2::new(0.0, 0.0), Vec2::new(5.0, 0.0), Vec2::new(0.0, 5.0)];
        assert!(Affine2::from_triangles(&src, &dst).is_none());
    }

    #[test]
    fn test_convex_contains_either_winding() {
        let cw = [Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0), Vec2::new(10.0, 10.0), Vec2::new(0.0, 10.0)];
        let mut ccw = cw;
        ccw.reverse();
        let p = Vec2::new(5.0, 5.0);
        assert!(convex_contains(&cw, p));
        assert!(convex_contains(&ccw, p));
        assert!(!convex_contains(&cw, Vec2::new(11.0, 5.0)));
    }

    #[test]
    fn test_expand_triangle_grows_area() {
        let tri = [Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0), Vec2::new(0.0, 10.0)];
        let grown = expand_triangle(&tri, 0.75);
        assert!(triangle_area2(grown[0], grown[1], grown[2]).abs() > triangle_area2(tri[0], tri[1], tri[2]).abs());
    }
}
