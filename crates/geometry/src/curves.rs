use serde::{Deserialize, Serialize};

use crate::point::Point3d;
use crate::vector::Vec3;

/// Evaluation contract every edge curve provides. Parameters run over
/// [0, 1] from the start vertex to the end vertex.
pub trait CurveEval {
    fn point(&self, t: f64) -> Point3d;

    /// Derivative dp/dt (not normalized).
    fn tangent(&self, t: f64) -> Vec3;

    fn length(&self) -> f64;

    fn center(&self) -> Point3d {
        self.point(0.5)
    }

    /// Parameter step from `t` such that the chord to the next sample
    /// deviates from the curve by roughly `relerr` times the local radius
    /// of curvature. Straight curves return the whole remaining interval.
    fn calc_step(&self, t: f64, relerr: f64) -> f64;

    /// Closest point on the curve and its parameter.
    fn project(&self, p: &Point3d) -> (Point3d, f64);

    fn is_degenerate(&self, tol: f64) -> bool {
        self.length() < tol
    }
}

/// Analytic curve representations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Curve {
    Line(Line3d),
    Arc(Arc3d),
}

impl CurveEval for Curve {
    fn point(&self, t: f64) -> Point3d {
        match self {
            Curve::Line(c) => c.point(t),
            Curve::Arc(c) => c.point(t),
        }
    }

    fn tangent(&self, t: f64) -> Vec3 {
        match self {
            Curve::Line(c) => c.tangent(t),
            Curve::Arc(c) => c.tangent(t),
        }
    }

    fn length(&self) -> f64 {
        match self {
            Curve::Line(c) => c.length(),
            Curve::Arc(c) => c.length(),
        }
    }

    fn calc_step(&self, t: f64, relerr: f64) -> f64 {
        match self {
            Curve::Line(c) => c.calc_step(t, relerr),
            Curve::Arc(c) => c.calc_step(t, relerr),
        }
    }

    fn project(&self, p: &Point3d) -> (Point3d, f64) {
        match self {
            Curve::Line(c) => c.project(p),
            Curve::Arc(c) => c.project(p),
        }
    }
}

/// A straight segment between two points.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Line3d {
    pub p0: Point3d,
    pub p1: Point3d,
}

impl Line3d {
    pub fn new(p0: Point3d, p1: Point3d) -> Self {
        Self { p0, p1 }
    }
}

impl CurveEval for Line3d {
    fn point(&self, t: f64) -> Point3d {
        self.p0.lerp(&self.p1, t)
    }

    fn tangent(&self, _t: f64) -> Vec3 {
        self.p1 - self.p0
    }

    fn length(&self) -> f64 {
        self.p0.distance_to(&self.p1)
    }

    fn calc_step(&self, _t: f64, _relerr: f64) -> f64 {
        1.0
    }

    fn project(&self, p: &Point3d) -> (Point3d, f64) {
        let d = self.p1 - self.p0;
        let len2 = d.length_squared();
        let t = if len2 < 1e-30 {
            0.0
        } else {
            ((*p - self.p0).dot(&d) / len2).clamp(0.0, 1.0)
        };
        (self.point(t), t)
    }
}

/// A circular arc. The parametrization starts on `x_axis` at angle 0 and
/// sweeps `angle_span` radians around `normal`. A full circle has
/// `angle_span = 2*PI` and coincident start and end.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Arc3d {
    pub center: Point3d,
    pub normal: Vec3,
    pub x_axis: Vec3,
    pub radius: f64,
    pub angle_span: f64,
}

impl Arc3d {
    pub fn new(center: Point3d, normal: Vec3, x_axis: Vec3, radius: f64, angle_span: f64) -> Self {
        Self {
            center,
            normal: normal.normalize(),
            x_axis: x_axis.normalize(),
            radius,
            angle_span,
        }
    }

    pub fn full_circle(center: Point3d, normal: Vec3, x_axis: Vec3, radius: f64) -> Self {
        Self::new(center, normal, x_axis, radius, std::f64::consts::TAU)
    }

    fn y_axis(&self) -> Vec3 {
        self.normal.cross(&self.x_axis)
    }
}

impl CurveEval for Arc3d {
    fn point(&self, t: f64) -> Point3d {
        let ang = t * self.angle_span;
        self.center + self.x_axis * (self.radius * ang.cos()) + self.y_axis() * (self.radius * ang.sin())
    }

    fn tangent(&self, t: f64) -> Vec3 {
        let ang = t * self.angle_span;
        (self.y_axis() * ang.cos() - self.x_axis * ang.sin()) * (self.radius * self.angle_span)
    }

    fn length(&self) -> f64 {
        self.radius * self.angle_span
    }

    fn calc_step(&self, _t: f64, relerr: f64) -> f64 {
        relerr / self.angle_span
    }

    fn project(&self, p: &Point3d) -> (Point3d, f64) {
        let v = *p - self.center;
        let ang = v.dot(&self.y_axis()).atan2(v.dot(&self.x_axis));
        let ang = if ang < 0.0 { ang + std::f64::consts::TAU } else { ang };
        let t = (ang / self.angle_span).clamp(0.0, 1.0);
        (self.point(t), t)
    }
}
