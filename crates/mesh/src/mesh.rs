use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use brep_geometry::{BoundingBox, Point3d};

use crate::identifications::MeshIdentifications;
use crate::localh::LocalH;
use crate::types::{
    Element2d, FaceDescriptor, MeshPoint, PointElement, PointIndex, PointType, Segment,
};

#[derive(Debug, Error)]
pub enum MeshSizeFileError {
    #[error("mesh-size file i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("mesh-size file parse error: {0}")]
    Parse(String),
}

/// The mesh under construction. Grows monotonically: points and elements
/// are appended, never removed, while the pipeline runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Mesh {
    points: Vec<MeshPoint>,
    segments: Vec<Segment>,
    surface_elements: Vec<Element2d>,
    face_descriptors: Vec<FaceDescriptor>,
    pub point_elements: Vec<PointElement>,
    pub identifications: MeshIdentifications,

    localh: Option<LocalH>,
    hglob: f64,
    hmin: f64,

    bc_names: Vec<Option<String>>,
    cd2_names: Vec<Option<String>>,
    cd3_names: Vec<Option<String>>,
    materials: Vec<Option<String>>,
    pub dimension: u8,
}

impl Mesh {
    pub fn new() -> Self {
        Self {
            hglob: 1e10,
            dimension: 3,
            ..Default::default()
        }
    }

    // ── points ──────────────────────────────────────────────────────────

    pub fn add_point(&mut self, p: Point3d, layer: i32, point_type: PointType) -> PointIndex {
        self.points.push(MeshPoint {
            p,
            layer,
            point_type,
            singularity: 0.0,
        });
        self.points.len() - 1
    }

    pub fn point(&self, pi: PointIndex) -> &MeshPoint {
        &self.points[pi]
    }

    pub fn points(&self) -> &[MeshPoint] {
        &self.points
    }

    pub fn set_singularity(&mut self, pi: PointIndex, hpref: f64) {
        self.points[pi].singularity = hpref;
    }

    /// Re-type a point. Only weakening is allowed; an attempt to promote
    /// (e.g. EDGEPOINT to FIXEDPOINT) is ignored.
    pub fn set_point_type(&mut self, pi: PointIndex, point_type: PointType) {
        if point_type >= self.points[pi].point_type {
            self.points[pi].point_type = point_type;
        }
    }

    // ── elements ────────────────────────────────────────────────────────

    pub fn add_segment(&mut self, seg: Segment) {
        self.segments.push(seg);
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn add_surface_element(&mut self, el: Element2d) -> usize {
        self.surface_elements.push(el);
        self.surface_elements.len() - 1
    }

    pub fn surface_elements(&self) -> &[Element2d] {
        &self.surface_elements
    }

    pub fn surface_element_mut(&mut self, i: usize) -> &mut Element2d {
        &mut self.surface_elements[i]
    }

    /// Indices of all surface elements on the 1-based face number.
    pub fn surface_elements_of_face(&self, face_index: usize) -> Vec<usize> {
        self.surface_elements
            .iter()
            .enumerate()
            .filter(|(_, el)| el.face_index == face_index)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn clear_face_descriptors(&mut self) {
        self.face_descriptors.clear();
    }

    pub fn add_face_descriptor(&mut self, fd: FaceDescriptor) {
        self.face_descriptors.push(fd);
    }

    pub fn face_descriptors(&self) -> &[FaceDescriptor] {
        &self.face_descriptors
    }

    // ── names ───────────────────────────────────────────────────────────

    pub fn set_bc_name(&mut self, face_nr: usize, name: String) {
        if self.bc_names.len() <= face_nr {
            self.bc_names.resize(face_nr + 1, None);
        }
        self.bc_names[face_nr] = Some(name);
    }

    pub fn bc_name(&self, face_nr: usize) -> Option<&str> {
        self.bc_names.get(face_nr).and_then(|n| n.as_deref())
    }

    /// Codim-2 (edge) name, 1-based number.
    pub fn set_cd2_name(&mut self, nr: usize, name: String) {
        if self.cd2_names.len() < nr {
            self.cd2_names.resize(nr, None);
        }
        self.cd2_names[nr - 1] = Some(name);
    }

    /// Codim-3 (vertex) name, 1-based number.
    pub fn set_cd3_name(&mut self, nr: usize, name: String) {
        if self.cd3_names.len() < nr {
            self.cd3_names.resize(nr, None);
        }
        self.cd3_names[nr - 1] = Some(name);
    }

    pub fn set_material(&mut self, domain: usize, name: String) {
        if self.materials.len() <= domain {
            self.materials.resize(domain + 1, None);
        }
        self.materials[domain] = Some(name);
    }

    pub fn material(&self, domain: usize) -> Option<&str> {
        self.materials.get(domain).and_then(|n| n.as_deref())
    }

    // ── sizing field ────────────────────────────────────────────────────

    pub fn set_global_h(&mut self, h: f64) {
        self.hglob = h;
    }

    pub fn set_minimal_h(&mut self, h: f64) {
        self.hmin = h;
    }

    pub fn set_local_h(&mut self, bbox: &BoundingBox, grading: f64) {
        self.localh = Some(LocalH::new(bbox, grading));
    }

    pub fn has_local_h(&self) -> bool {
        self.localh.is_some()
    }

    pub fn restrict_local_h(&mut self, p: Point3d, h: f64, layer: i32) {
        let h = if self.hmin > 0.0 { h.max(self.hmin) } else { h };
        if let Some(lh) = &mut self.localh {
            lh.restrict(p, h, layer);
        }
    }

    /// Restrict along a line by sampling at intervals of `h`.
    pub fn restrict_local_h_line(&mut self, p1: Point3d, p2: Point3d, h: f64, layer: i32) {
        let len = p1.distance_to(&p2);
        let n = if h > 0.0 {
            (len / h).ceil().max(1.0) as usize
        } else {
            1
        };
        for i in 0..=n {
            let t = i as f64 / n as f64;
            self.restrict_local_h(p1.lerp(&p2, t), h, layer);
        }
    }

    pub fn get_h(&self, p: &Point3d, layer: i32) -> f64 {
        let mut h = self.hglob;
        if let Some(lh) = &self.localh {
            h = lh.get_h(p, layer, self.hglob);
        }
        h.max(self.hmin)
    }

    /// Read additional sizing data: a point count, `x y z h` lines, then
    /// a line count and `x1 y1 z1 x2 y2 z2 h` lines.
    pub fn load_mesh_size_file(&mut self, path: &Path) -> Result<(), MeshSizeFileError> {
        let content = std::fs::read_to_string(path)?;
        let values = content
            .split_whitespace()
            .map(|t| {
                t.parse::<f64>()
                    .map_err(|e| MeshSizeFileError::Parse(format!("bad number '{t}': {e}")))
            })
            .collect::<Result<Vec<f64>, _>>()?;

        fn take<'a>(
            values: &'a [f64],
            pos: &mut usize,
            count: usize,
        ) -> Result<&'a [f64], MeshSizeFileError> {
            if *pos + count > values.len() {
                return Err(MeshSizeFileError::Parse("truncated mesh-size file".into()));
            }
            let slice = &values[*pos..*pos + count];
            *pos += count;
            Ok(slice)
        }

        let mut pos = 0usize;
        let n = take(&values, &mut pos, 1)?[0] as usize;
        for _ in 0..n {
            let row = take(&values, &mut pos, 4)?;
            let (p, h) = (Point3d::new(row[0], row[1], row[2]), row[3]);
            self.restrict_local_h(p, h, 1);
        }

        let nline = take(&values, &mut pos, 1)?[0] as usize;
        for _ in 0..nline {
            let row = take(&values, &mut pos, 7)?;
            let p1 = Point3d::new(row[0], row[1], row[2]);
            let p2 = Point3d::new(row[3], row[4], row[5]);
            let h = row[6];
            self.restrict_local_h_line(p1, p2, h, 1);
        }

        info!(points = n, lines = nline, "mesh-size file applied");
        Ok(())
    }

    pub fn compress(&mut self) {
        // points are stable; nothing to renumber in this container
        debug!(
            points = self.points.len(),
            segments = self.segments.len(),
            surface_elements = self.surface_elements.len(),
            "mesh compressed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brep_geometry::Uv;

    #[test]
    fn test_add_point_returns_dense_indices() {
        let mut mesh = Mesh::new();
        let a = mesh.add_point(Point3d::ORIGIN, 1, PointType::Fixed);
        let b = mesh.add_point(Point3d::new(1.0, 0.0, 0.0), 1, PointType::Edge);
        assert_eq!(a, 0);
        assert_eq!(b, 1);
    }

    #[test]
    fn test_point_promotion_is_refused() {
        let mut mesh = Mesh::new();
        let pi = mesh.add_point(Point3d::ORIGIN, 1, PointType::Edge);
        mesh.set_point_type(pi, PointType::Fixed);
        assert_eq!(mesh.point(pi).point_type, PointType::Edge);
        mesh.set_point_type(pi, PointType::Surface);
        assert_eq!(mesh.point(pi).point_type, PointType::Surface);
    }

    #[test]
    fn test_get_h_without_localh_is_global() {
        let mut mesh = Mesh::new();
        mesh.set_global_h(0.5);
        assert!((mesh.get_h(&Point3d::ORIGIN, 1) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_restrict_respects_minimal_h() {
        let mut mesh = Mesh::new();
        mesh.set_global_h(1.0);
        mesh.set_minimal_h(0.2);
        let bbox = BoundingBox::new(Point3d::ORIGIN, Point3d::new(1.0, 1.0, 1.0));
        mesh.set_local_h(&bbox, 0.3);
        mesh.restrict_local_h(Point3d::new(0.5, 0.5, 0.5), 0.01, 1);
        let h = mesh.get_h(&Point3d::new(0.5, 0.5, 0.5), 1);
        assert!((h - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_surface_elements_of_face() {
        let mut mesh = Mesh::new();
        mesh.add_surface_element(Element2d::triangle([0, 1, 2], [Uv::default(); 3], 1));
        mesh.add_surface_element(Element2d::triangle([0, 1, 3], [Uv::default(); 3], 2));
        mesh.add_surface_element(Element2d::triangle([1, 2, 3], [Uv::default(); 3], 1));
        assert_eq!(mesh.surface_elements_of_face(1), vec![0, 2]);
        assert_eq!(mesh.surface_elements_of_face(2), vec![1]);
    }
}
