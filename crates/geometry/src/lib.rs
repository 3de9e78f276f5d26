pub mod archive;
pub mod closure;
pub mod curves;
pub mod model;
pub mod point;
pub mod predicates;
pub mod shapes;
pub mod surfaces;
pub mod transform;
pub mod vector;

// Re-export key types at crate root for convenience.
pub use archive::{ArchiveError, GeometryFormat, GeometryRegistry};
pub use curves::{Arc3d, Curve, CurveEval, Line3d};
pub use model::GeometryModel;
pub use point::{Point3d, Uv};
pub use predicates::{is_mapped_shape, PredicateError};
pub use shapes::{
    EdgeShape, FaceShape, Identification, IdentificationKind, ShapeKind, ShapeProperties,
    ShapeRef, SolidShape, VertexShape,
};
pub use surfaces::{Cylinder3d, Plane3d, Surface, SurfaceEval};
pub use transform::{BoundingBox, Transform};
pub use vector::Vec3;

/// Geometric coincidence tolerance for a model of the given diameter.
pub fn geometric_tolerance(diam: f64) -> f64 {
    1e-8 * diam
}
