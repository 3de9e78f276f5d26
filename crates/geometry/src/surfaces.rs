use serde::{Deserialize, Serialize};

use crate::point::{Point3d, Uv};
use crate::transform::BoundingBox;
use crate::vector::Vec3;

/// Evaluation contract every face surface provides.
pub trait SurfaceEval {
    fn point(&self, uv: Uv) -> Point3d;

    /// Outward surface normal near `p`.
    fn normal(&self, p: &Point3d) -> Vec3;

    /// Magnitude of the largest principal curvature at `uv`.
    fn curvature(&self, uv: Uv) -> f64;

    /// Parameters of the closest surface point.
    fn project(&self, p: &Point3d) -> Uv;

    /// Closest point on the surface.
    fn project_to_surface(&self, p: &Point3d) -> Point3d {
        self.point(self.project(p))
    }

    /// Parameter domain corners (min, max).
    fn uv_bounds(&self) -> (Uv, Uv);

    fn bounding_box(&self) -> BoundingBox;
}

/// Analytic surface representations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Surface {
    Plane(Plane3d),
    Cylinder(Cylinder3d),
}

impl SurfaceEval for Surface {
    fn point(&self, uv: Uv) -> Point3d {
        match self {
            Surface::Plane(s) => s.point(uv),
            Surface::Cylinder(s) => s.point(uv),
        }
    }

    fn normal(&self, p: &Point3d) -> Vec3 {
        match self {
            Surface::Plane(s) => s.normal(p),
            Surface::Cylinder(s) => s.normal(p),
        }
    }

    fn curvature(&self, uv: Uv) -> f64 {
        match self {
            Surface::Plane(s) => s.curvature(uv),
            Surface::Cylinder(s) => s.curvature(uv),
        }
    }

    fn project(&self, p: &Point3d) -> Uv {
        match self {
            Surface::Plane(s) => s.project(p),
            Surface::Cylinder(s) => s.project(p),
        }
    }

    fn uv_bounds(&self) -> (Uv, Uv) {
        match self {
            Surface::Plane(s) => s.uv_bounds(),
            Surface::Cylinder(s) => s.uv_bounds(),
        }
    }

    fn bounding_box(&self) -> BoundingBox {
        match self {
            Surface::Plane(s) => s.bounding_box(),
            Surface::Cylinder(s) => s.bounding_box(),
        }
    }
}

/// A bounded planar patch. `u_axis` and `v_axis` are unit vectors spanning
/// the plane; the parameter domain is `u_range` x `v_range`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Plane3d {
    pub origin: Point3d,
    pub u_axis: Vec3,
    pub v_axis: Vec3,
    pub u_range: (f64, f64),
    pub v_range: (f64, f64),
}

impl Plane3d {
    pub fn new(origin: Point3d, u_axis: Vec3, v_axis: Vec3, u_range: (f64, f64), v_range: (f64, f64)) -> Self {
        Self {
            origin,
            u_axis: u_axis.normalize(),
            v_axis: v_axis.normalize(),
            u_range,
            v_range,
        }
    }
}

impl SurfaceEval for Plane3d {
    fn point(&self, uv: Uv) -> Point3d {
        self.origin + self.u_axis * uv.u + self.v_axis * uv.v
    }

    fn normal(&self, _p: &Point3d) -> Vec3 {
        self.u_axis.cross(&self.v_axis).normalize()
    }

    fn curvature(&self, _uv: Uv) -> f64 {
        0.0
    }

    fn project(&self, p: &Point3d) -> Uv {
        let d = *p - self.origin;
        Uv::new(d.dot(&self.u_axis), d.dot(&self.v_axis))
    }

    fn uv_bounds(&self) -> (Uv, Uv) {
        (
            Uv::new(self.u_range.0, self.v_range.0),
            Uv::new(self.u_range.1, self.v_range.1),
        )
    }

    fn bounding_box(&self) -> BoundingBox {
        let (lo, hi) = self.uv_bounds();
        BoundingBox::from_points(&[
            self.point(lo),
            self.point(Uv::new(hi.u, lo.v)),
            self.point(Uv::new(lo.u, hi.v)),
            self.point(hi),
        ])
    }
}

/// A cylindrical patch around `axis` through `base`. `u` is the angle from
/// `x_axis` in [0, angle_span]; `v` is the height in [0, height].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Cylinder3d {
    pub base: Point3d,
    pub axis: Vec3,
    pub x_axis: Vec3,
    pub radius: f64,
    pub angle_span: f64,
    pub height: f64,
}

impl Cylinder3d {
    pub fn new(base: Point3d, axis: Vec3, x_axis: Vec3, radius: f64, angle_span: f64, height: f64) -> Self {
        Self {
            base,
            axis: axis.normalize(),
            x_axis: x_axis.normalize(),
            radius,
            angle_span,
            height,
        }
    }

    fn y_axis(&self) -> Vec3 {
        self.axis.cross(&self.x_axis)
    }
}

impl SurfaceEval for Cylinder3d {
    fn point(&self, uv: Uv) -> Point3d {
        self.base
            + self.axis * uv.v
            + self.x_axis * (self.radius * uv.u.cos())
            + self.y_axis() * (self.radius * uv.u.sin())
    }

    fn normal(&self, p: &Point3d) -> Vec3 {
        let d = *p - self.base;
        let radial = d - self.axis * d.dot(&self.axis);
        radial.normalized().unwrap_or(self.x_axis)
    }

    fn curvature(&self, _uv: Uv) -> f64 {
        1.0 / self.radius
    }

    fn project(&self, p: &Point3d) -> Uv {
        let d = *p - self.base;
        let v = d.dot(&self.axis).clamp(0.0, self.height);
        let ang = d.dot(&self.y_axis()).atan2(d.dot(&self.x_axis));
        let ang = if ang < 0.0 { ang + std::f64::consts::TAU } else { ang };
        Uv::new(ang.min(self.angle_span), v)
    }

    fn uv_bounds(&self) -> (Uv, Uv) {
        (Uv::new(0.0, 0.0), Uv::new(self.angle_span, self.height))
    }

    fn bounding_box(&self) -> BoundingBox {
        let top = self.base + self.axis * self.height;
        BoundingBox::from_points(&[self.base, top]).expanded(self.radius)
    }
}
