//! Deterministic test doubles for the external meshing engines.

use std::collections::HashMap;

use brep_geometry::{BoundingBox, Point3d, Uv};
use brep_mesh::{Element2d, Mesh, PointIndex, PointType};
use brep_pipeline::{MesherStatus, MeshingParameters, SurfaceMesher, SurfaceOptimizer, VolumeMesher};

#[derive(Debug, Clone)]
struct SessionPoint {
    global: PointIndex,
    gi: Option<Uv>,
}

/// A 2D mesher that adds one Steiner point at the boundary centroid and
/// fans triangles around it. Good enough for convex planar test faces;
/// fails when the boundary does not chain into a single closed loop.
#[derive(Debug, Default)]
pub struct MockSurfaceMesher {
    points: HashMap<usize, SessionPoint>,
    boundary: Vec<(usize, usize, Uv, Uv)>,
    /// Faces (1-based) the mock should pretend to fail on.
    pub fail_faces: Vec<usize>,
    /// Every face index `generate_mesh` was invoked for.
    pub generate_calls: Vec<usize>,
}

impl MockSurfaceMesher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(faces: Vec<usize>) -> Self {
        Self {
            fail_faces: faces,
            ..Self::default()
        }
    }
}

impl SurfaceMesher for MockSurfaceMesher {
    fn begin(&mut self, _bbox: &BoundingBox) {
        self.points.clear();
        self.boundary.clear();
    }

    fn add_point(&mut self, _p: Point3d, local: usize, global: PointIndex, gi: Option<Uv>) {
        self.points.insert(local, SessionPoint { global, gi });
    }

    fn add_boundary_element(&mut self, local0: usize, local1: usize, gi0: Uv, gi1: Uv) {
        self.boundary.push((local0, local1, gi0, gi1));
    }

    fn generate_mesh(
        &mut self,
        mesh: &mut Mesh,
        _mp: &MeshingParameters,
        _maxh: f64,
        face_index: usize,
        layer: i32,
    ) -> MesherStatus {
        self.generate_calls.push(face_index);
        if self.fail_faces.contains(&face_index) {
            return MesherStatus::Failed;
        }
        if self.boundary.is_empty() {
            return MesherStatus::Failed;
        }

        // chain the boundary elements into one loop
        let mut next: HashMap<usize, (usize, Uv, Uv)> = HashMap::new();
        for &(l0, l1, gi0, gi1) in &self.boundary {
            next.insert(l0, (l1, gi0, gi1));
        }
        let start = self.boundary[0].0;
        let mut loop_locals: Vec<(usize, Uv)> = Vec::new();
        let mut current = start;
        loop {
            let Some(&(succ, gi0, _gi1)) = next.get(&current) else {
                return MesherStatus::Failed;
            };
            loop_locals.push((current, gi0));
            current = succ;
            if current == start {
                break;
            }
            if loop_locals.len() > self.boundary.len() {
                return MesherStatus::Failed;
            }
        }
        if loop_locals.len() < 3 {
            return MesherStatus::Failed;
        }

        let mut corners: Vec<(PointIndex, Uv)> = Vec::with_capacity(loop_locals.len());
        for &(local, gi) in &loop_locals {
            let Some(sp) = self.points.get(&local) else {
                return MesherStatus::Failed;
            };
            corners.push((sp.global, sp.gi.unwrap_or(gi)));
        }

        // one Steiner point at the centroid, triangles fanned around it
        let n = corners.len() as f64;
        let mut cx = 0.0;
        let mut cy = 0.0;
        let mut cz = 0.0;
        let mut cu = 0.0;
        let mut cv = 0.0;
        for &(pi, uv) in &corners {
            let p = mesh.point(pi).p;
            cx += p.x;
            cy += p.y;
            cz += p.z;
            cu += uv.u;
            cv += uv.v;
        }
        let center_p = Point3d::new(cx / n, cy / n, cz / n);
        let center_uv = Uv::new(cu / n, cv / n);
        let center = mesh.add_point(center_p, layer, PointType::Surface);

        for w in 0..corners.len() {
            let b = corners[w];
            let c = corners[(w + 1) % corners.len()];
            mesh.add_surface_element(Element2d::triangle(
                [center, b.0, c.0],
                [center_uv, b.1, c.1],
                face_index,
            ));
        }
        MesherStatus::Ok
    }
}

/// A volume mesher that only records its invocations.
#[derive(Debug, Default)]
pub struct MockVolumeMesher {
    pub fail: bool,
    pub mesh_calls: usize,
    pub quality_calls: usize,
    pub optimize_calls: usize,
}

impl MockVolumeMesher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VolumeMesher for MockVolumeMesher {
    fn mesh_volume(&mut self, _mp: &MeshingParameters, _mesh: &mut Mesh) -> MesherStatus {
        self.mesh_calls += 1;
        if self.fail {
            MesherStatus::Failed
        } else {
            MesherStatus::Ok
        }
    }

    fn analyze_quality(&mut self, _mesh: &Mesh) {
        self.quality_calls += 1;
    }

    fn optimize_volume(&mut self, _mp: &MeshingParameters, _mesh: &mut Mesh) {
        self.optimize_calls += 1;
    }
}

/// A surface optimizer that records the operation sequence it was asked
/// to run.
#[derive(Debug, Default)]
pub struct MockOptimizer {
    pub current_face: usize,
    pub metric_weight: f64,
    pub ops: Vec<char>,
}

impl MockOptimizer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SurfaceOptimizer for MockOptimizer {
    fn set_face(&mut self, face_index: usize) {
        self.current_face = face_index;
    }

    fn set_metric_weight(&mut self, weight: f64) {
        self.metric_weight = weight;
    }

    fn edge_swapping(&mut self, _mesh: &mut Mesh, use_metric: bool) {
        self.ops.push(if use_metric { 'S' } else { 's' });
    }

    fn improve_mesh(&mut self, _mesh: &mut Mesh, _mp: &MeshingParameters) {
        self.ops.push('m');
    }

    fn combine_improve(&mut self, _mesh: &mut Mesh) {
        self.ops.push('c');
    }
}
