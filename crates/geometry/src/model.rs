use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::curves::CurveEval;
use crate::point::Point3d;
use crate::shapes::{EdgeShape, FaceShape, IdentificationKind, SolidShape, VertexShape};
use crate::transform::BoundingBox;

/// The geometric model: four shape lists linked by incidence indices,
/// plus the model bounding box. Shapes are created by the CAD-kernel
/// collaborator (or the builders in the test harness), mutated only by
/// the identification closure, and read-only during meshing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeometryModel {
    pub vertices: Vec<VertexShape>,
    pub edges: Vec<EdgeShape>,
    pub faces: Vec<FaceShape>,
    pub solids: Vec<SolidShape>,
    pub bounding_box: BoundingBox,
    /// 1 = wire models, 2 = surface models, 3 = solids.
    pub dimension: u8,
    /// Mesh-size pin points attached to the geometry itself.
    pub restricted_h: Vec<(Point3d, f64)>,
}

impl GeometryModel {
    pub fn new() -> Self {
        Self {
            dimension: 3,
            ..Default::default()
        }
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.edges.clear();
        self.faces.clear();
        self.solids.clear();
    }

    /// Recompute the bounding box from vertices and edge interiors.
    pub fn update_bounding_box(&mut self) {
        let mut bb = BoundingBox::empty();
        for v in &self.vertices {
            bb.expand_to_include(&v.point);
        }
        for e in &self.edges {
            for t in [0.25, 0.5, 0.75] {
                bb.expand_to_include(&e.curve.point(t));
            }
        }
        self.bounding_box = bb;
    }

    pub fn tolerance(&self) -> f64 {
        crate::geometric_tolerance(self.bounding_box.diam())
    }

    /// Center of a face, taken as the mean of its edge-curve centers.
    pub fn face_center(&self, face: &FaceShape) -> Point3d {
        let mut acc = Point3d::ORIGIN;
        let n = face.edges.len().max(1);
        for &e in &face.edges {
            let c = self.edges[e].curve.center();
            acc.x += c.x;
            acc.y += c.y;
            acc.z += c.z;
        }
        Point3d::new(acc.x / n as f64, acc.y / n as f64, acc.z / n as f64)
    }

    /// True if every boundary vertex of the face pairs with another
    /// boundary vertex of the same face under a CLOSESURFACES
    /// identification. Such a face bridges two close surfaces and is
    /// meshed as a ribbon of quads.
    pub fn is_connecting_close_surfaces(&self, face_nr: usize) -> bool {
        let face = &self.faces[face_nr];
        let mut verts: BTreeMap<usize, bool> = BTreeMap::new();
        for &e in &face.edges {
            verts.insert(self.edges[e].start, false);
            verts.insert(self.edges[e].end, false);
        }
        let keys: Vec<usize> = verts.keys().copied().collect();
        for v in keys {
            if verts[&v] {
                continue;
            }
            for ident in &self.vertices[v].identifications {
                let other = if ident.to.nr == v {
                    ident.from.nr
                } else {
                    ident.to.nr
                };
                if ident.kind == IdentificationKind::CloseSurfaces && verts.contains_key(&other) {
                    verts.insert(v, true);
                    verts.insert(other, true);
                }
            }
        }
        verts.values().all(|&mapped| mapped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curves::{Curve, Line3d};
    use crate::shapes::{Identification, ShapeRef};
    use crate::transform::Transform;

    fn two_vertex_edge_model() -> GeometryModel {
        let mut model = GeometryModel::new();
        let a = Point3d::ORIGIN;
        let b = Point3d::new(1.0, 0.0, 0.0);
        model.vertices.push(VertexShape::new(a));
        model.vertices.push(VertexShape::new(b));
        model
            .edges
            .push(EdgeShape::new(Curve::Line(Line3d::new(a, b)), 0, 1));
        model.update_bounding_box();
        model
    }

    #[test]
    fn test_bounding_box_spans_vertices() {
        let model = two_vertex_edge_model();
        assert!((model.bounding_box.diam() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_connecting_close_surfaces_requires_all_vertices_paired() {
        let mut model = GeometryModel::new();
        for p in [
            Point3d::ORIGIN,
            Point3d::new(1.0, 0.0, 0.0),
            Point3d::new(0.0, 0.0, 1.0),
            Point3d::new(1.0, 0.0, 1.0),
        ] {
            model.vertices.push(VertexShape::new(p));
        }
        let bottom = Curve::Line(Line3d::new(model.vertices[0].point, model.vertices[1].point));
        let top = Curve::Line(Line3d::new(model.vertices[2].point, model.vertices[3].point));
        let left = Curve::Line(Line3d::new(model.vertices[0].point, model.vertices[2].point));
        let right = Curve::Line(Line3d::new(model.vertices[1].point, model.vertices[3].point));
        model.edges.push(EdgeShape::new(bottom, 0, 1));
        model.edges.push(EdgeShape::new(top, 2, 3));
        model.edges.push(EdgeShape::new(left, 0, 2));
        model.edges.push(EdgeShape::new(right, 1, 3));
        let plane = crate::surfaces::Surface::Plane(crate::surfaces::Plane3d::new(
            Point3d::ORIGIN,
            crate::vector::Vec3::X,
            crate::vector::Vec3::Z,
            (0.0, 1.0),
            (0.0, 1.0),
        ));
        model
            .faces
            .push(FaceShape::new(plane, vec![0, 1, 2, 3]));
        model.update_bounding_box();

        assert!(!model.is_connecting_close_surfaces(0));

        let trafo = Transform::translation(0.0, 0.0, 1.0);
        for (a, b) in [(0usize, 2usize), (1, 3)] {
            model.vertices[a].identifications.push(Identification {
                from: ShapeRef::vertex(a),
                to: ShapeRef::vertex(b),
                trafo: Some(trafo),
                kind: IdentificationKind::CloseSurfaces,
                name: "plates".into(),
            });
            let mirrored = model.vertices[a].identifications.last().unwrap().clone();
            model.vertices[b].identifications.push(mirrored);
        }
        assert!(model.is_connecting_close_surfaces(0));
    }
}
