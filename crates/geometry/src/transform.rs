use serde::{Deserialize, Serialize};

use crate::point::Point3d;
use crate::vector::Vec3;

/// An affine transformation in 3D: a linear part (row-major 3x3 matrix)
/// plus a translation. Identification transformations are rigid
/// (rotation + translation), but the linear part is kept general so the
/// inverse-transpose normal action is well defined.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Row-major 3x3 linear part.
    pub m: [f64; 9],
    /// Translation applied after the linear part.
    pub t: Vec3,
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            m: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
            t: Vec3::ZERO,
        }
    }

    pub fn translation(dx: f64, dy: f64, dz: f64) -> Self {
        Self {
            t: Vec3::new(dx, dy, dz),
            ..Self::identity()
        }
    }

    pub fn from_translation_vec(v: Vec3) -> Self {
        Self::translation(v.x, v.y, v.z)
    }

    /// Rotation around the X axis by `angle` radians.
    pub fn rotation_x(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self {
            m: [1.0, 0.0, 0.0, 0.0, c, -s, 0.0, s, c],
            t: Vec3::ZERO,
        }
    }

    /// Rotation around the Y axis by `angle` radians.
    pub fn rotation_y(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self {
            m: [c, 0.0, s, 0.0, 1.0, 0.0, -s, 0.0, c],
            t: Vec3::ZERO,
        }
    }

    /// Rotation around the Z axis by `angle` radians.
    pub fn rotation_z(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self {
            m: [c, -s, 0.0, s, c, 0.0, 0.0, 0.0, 1.0],
            t: Vec3::ZERO,
        }
    }

    /// Rotation around an axis through `origin` by `angle` radians.
    pub fn rotation_about(origin: Point3d, axis: Vec3, angle: f64) -> Self {
        let axis = axis.normalize();
        let (s, c) = angle.sin_cos();
        let t = 1.0 - c;
        let (x, y, z) = (axis.x, axis.y, axis.z);
        let m = [
            t * x * x + c,
            t * x * y - s * z,
            t * x * z + s * y,
            t * x * y + s * z,
            t * y * y + c,
            t * y * z - s * x,
            t * x * z - s * y,
            t * y * z + s * x,
            t * z * z + c,
        ];
        let rot = Self { m, t: Vec3::ZERO };
        // origin stays fixed: t = origin - R*origin
        let moved = rot.transform_point(&origin);
        Self { m, t: origin - moved }
    }

    fn at(&self, row: usize, col: usize) -> f64 {
        self.m[row * 3 + col]
    }

    /// Transform a point (applies translation).
    pub fn transform_point(&self, p: &Point3d) -> Point3d {
        Point3d::new(
            self.at(0, 0) * p.x + self.at(0, 1) * p.y + self.at(0, 2) * p.z + self.t.x,
            self.at(1, 0) * p.x + self.at(1, 1) * p.y + self.at(1, 2) * p.z + self.t.y,
            self.at(2, 0) * p.x + self.at(2, 1) * p.y + self.at(2, 2) * p.z + self.t.z,
        )
    }

    /// Transform a direction (no translation).
    pub fn transform_vector(&self, v: &Vec3) -> Vec3 {
        Vec3::new(
            self.at(0, 0) * v.x + self.at(0, 1) * v.y + self.at(0, 2) * v.z,
            self.at(1, 0) * v.x + self.at(1, 1) * v.y + self.at(1, 2) * v.z,
            self.at(2, 0) * v.x + self.at(2, 1) * v.y + self.at(2, 2) * v.z,
        )
    }

    /// Transform a surface normal: the inverse-transpose action of the
    /// linear part. Returns `None` for a singular linear part.
    pub fn transform_normal(&self, n: &Vec3) -> Option<Vec3> {
        let inv = self.inverse()?;
        // transpose(inv.m) * n
        Some(Vec3::new(
            inv.at(0, 0) * n.x + inv.at(1, 0) * n.y + inv.at(2, 0) * n.z,
            inv.at(0, 1) * n.x + inv.at(1, 1) * n.y + inv.at(2, 1) * n.z,
            inv.at(0, 2) * n.x + inv.at(1, 2) * n.y + inv.at(2, 2) * n.z,
        ))
    }

    /// Compose with `inner`: the result applies `inner` first, then `self`.
    pub fn compose(&self, inner: &Transform) -> Transform {
        let mut m = [0.0f64; 9];
        for row in 0..3 {
            for col in 0..3 {
                let mut sum = 0.0;
                for k in 0..3 {
                    sum += self.at(row, k) * inner.at(k, col);
                }
                m[row * 3 + col] = sum;
            }
        }
        Transform {
            m,
            t: self.transform_vector(&inner.t) + self.t,
        }
    }

    /// Compute the inverse transform. Returns `None` if the linear part is
    /// singular.
    pub fn inverse(&self) -> Option<Self> {
        let m = &self.m;
        let cof00 = m[4] * m[8] - m[5] * m[7];
        let cof01 = m[5] * m[6] - m[3] * m[8];
        let cof02 = m[3] * m[7] - m[4] * m[6];
        let det = m[0] * cof00 + m[1] * cof01 + m[2] * cof02;
        if det.abs() < 1e-15 {
            return None;
        }
        let inv_det = 1.0 / det;
        let inv_m = [
            cof00 * inv_det,
            (m[2] * m[7] - m[1] * m[8]) * inv_det,
            (m[1] * m[5] - m[2] * m[4]) * inv_det,
            cof01 * inv_det,
            (m[0] * m[8] - m[2] * m[6]) * inv_det,
            (m[2] * m[3] - m[0] * m[5]) * inv_det,
            cof02 * inv_det,
            (m[1] * m[6] - m[0] * m[7]) * inv_det,
            (m[0] * m[4] - m[1] * m[3]) * inv_det,
        ];
        let inv = Self {
            m: inv_m,
            t: Vec3::ZERO,
        };
        let t = inv.transform_vector(&self.t);
        Some(Self { m: inv_m, t: -t })
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point3d,
    pub max: Point3d,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::empty()
    }
}

impl BoundingBox {
    pub fn new(min: Point3d, max: Point3d) -> Self {
        Self { min, max }
    }

    pub fn empty() -> Self {
        Self {
            min: Point3d::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3d::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3d>) -> Self {
        let mut bb = Self::empty();
        for p in points {
            bb.expand_to_include(p);
        }
        bb
    }

    pub fn expand_to_include(&mut self, p: &Point3d) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    pub fn union(&self, other: &Self) -> Self {
        let mut bb = *self;
        bb.expand_to_include(&other.min);
        bb.expand_to_include(&other.max);
        bb
    }

    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    pub fn contains_point(&self, p: &Point3d) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    pub fn center(&self) -> Point3d {
        self.min.midpoint(&self.max)
    }

    pub fn diam(&self) -> f64 {
        self.min.distance_to(&self.max)
    }

    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
    }

    pub fn expanded(&self, margin: f64) -> Self {
        Self {
            min: Point3d::new(self.min.x - margin, self.min.y - margin, self.min.z - margin),
            max: Point3d::new(self.max.x + margin, self.max.y + margin, self.max.z + margin),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_translation() {
        let t = Transform::translation(10.0, 20.0, 30.0);
        let p = Point3d::new(1.0, 2.0, 3.0);
        let result = t.transform_point(&p);
        assert!((result.x - 11.0).abs() < 1e-12);
        assert!((result.y - 22.0).abs() < 1e-12);
        assert!((result.z - 33.0).abs() < 1e-12);
    }

    #[test]
    fn test_rotation_z_90() {
        let t = Transform::rotation_z(FRAC_PI_2);
        let p = Point3d::new(1.0, 0.0, 0.0);
        let result = t.transform_point(&p);
        assert!(result.x.abs() < 1e-12);
        assert!((result.y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_compose_applies_inner_first() {
        // rotate 90 deg about z, then translate +x
        let rot = Transform::rotation_z(FRAC_PI_2);
        let trans = Transform::translation(1.0, 0.0, 0.0);
        let combined = trans.compose(&rot);
        let p = Point3d::new(1.0, 0.0, 0.0);
        let result = combined.transform_point(&p);
        assert!((result.x - 1.0).abs() < 1e-12);
        assert!((result.y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_inverse_roundtrip() {
        let t = Transform::rotation_y(0.7).compose(&Transform::translation(5.0, -3.0, 7.0));
        let inv = t.inverse().unwrap();
        let p = Point3d::new(1.0, 2.0, 3.0);
        let round_trip = inv.transform_point(&t.transform_point(&p));
        assert!((round_trip.x - p.x).abs() < 1e-12);
        assert!((round_trip.y - p.y).abs() < 1e-12);
        assert!((round_trip.z - p.z).abs() < 1e-12);
    }

    #[test]
    fn test_rotation_about_keeps_origin_fixed() {
        let origin = Point3d::new(2.0, 1.0, 0.0);
        let t = Transform::rotation_about(origin, Vec3::Z, 1.2);
        let moved = t.transform_point(&origin);
        assert!(moved.distance_to(&origin) < 1e-12);
    }

    #[test]
    fn test_normal_transform_rigid_matches_vector() {
        let t = Transform::rotation_x(0.4);
        let n = Vec3::new(0.0, 0.0, 1.0);
        let by_normal = t.transform_normal(&n).unwrap();
        let by_vector = t.transform_vector(&n);
        assert!((by_normal - by_vector).length() < 1e-12);
    }

    #[test]
    fn test_bounding_box() {
        let bb = BoundingBox::from_points(&[
            Point3d::new(0.0, 0.0, 0.0),
            Point3d::new(1.0, 2.0, 3.0),
            Point3d::new(-1.0, 0.5, 1.0),
        ]);
        assert!((bb.min.x - (-1.0)).abs() < 1e-12);
        assert!((bb.max.y - 2.0).abs() < 1e-12);
        assert!(bb.contains_point(&Point3d::new(0.0, 1.0, 1.0)));
        assert!(!bb.contains_point(&Point3d::new(5.0, 1.0, 1.0)));
    }
}
