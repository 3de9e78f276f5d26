use brep_geometry::{BoundingBox, Point3d, Uv};
use brep_mesh::{Mesh, PointIndex};

use crate::params::MeshingParameters;

/// Outcome of an external meshing call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MesherStatus {
    Ok,
    Failed,
}

/// The external 2D constrained mesher. The dispatcher opens a session per
/// face, feeds it the boundary, and asks it to fill the interior.
/// Generated elements are appended to the mesh; the dispatcher assigns
/// their face index afterwards.
pub trait SurfaceMesher {
    /// Start a fresh per-face session over the face's enlarged bounding
    /// box.
    fn begin(&mut self, bbox: &BoundingBox);

    /// Register a boundary or interior point. `local` is the 1-based
    /// session-local number, `global` the mesh point index. Interior
    /// vertices carry their projected surface parameters.
    fn add_point(&mut self, p: Point3d, local: usize, global: PointIndex, gi: Option<Uv>);

    /// Register a boundary edge between two session-local point numbers.
    fn add_boundary_element(&mut self, local0: usize, local1: usize, gi0: Uv, gi1: Uv);

    /// Mesh the interior, appending surface elements to `mesh`.
    fn generate_mesh(
        &mut self,
        mesh: &mut Mesh,
        mp: &MeshingParameters,
        maxh: f64,
        face_index: usize,
        layer: i32,
    ) -> MesherStatus;
}

/// The external volume mesher, quality analyser and optimizer, each
/// invoked at most once per run.
pub trait VolumeMesher {
    fn mesh_volume(&mut self, mp: &MeshingParameters, mesh: &mut Mesh) -> MesherStatus;

    fn analyze_quality(&mut self, mesh: &Mesh);

    fn optimize_volume(&mut self, mp: &MeshingParameters, mesh: &mut Mesh);
}

/// The external 2D optimization primitives, driven by the `optimize2d`
/// step codes for `optsteps2d` rounds per face.
pub trait SurfaceOptimizer {
    fn set_face(&mut self, face_index: usize);

    fn set_metric_weight(&mut self, weight: f64);

    fn edge_swapping(&mut self, mesh: &mut Mesh, use_metric: bool);

    fn improve_mesh(&mut self, mesh: &mut Mesh, mp: &MeshingParameters);

    fn combine_improve(&mut self, mesh: &mut Mesh);
}
