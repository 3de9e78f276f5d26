use thiserror::Error;

use crate::curves::CurveEval;
use crate::model::GeometryModel;
use crate::shapes::{ShapeKind, ShapeRef};
use crate::transform::Transform;

#[derive(Debug, Clone, Error)]
pub enum PredicateError {
    #[error("mapped-shape comparison not implemented for {kind:?}")]
    NotImplemented { kind: ShapeKind },
}

/// Decide whether shape `a` maps onto shape `b` under `trafo` within
/// `tol`. Shapes of different kinds never map; solids have no mapping
/// routine.
pub fn is_mapped_shape(
    model: &GeometryModel,
    a: ShapeRef,
    b: ShapeRef,
    trafo: &Transform,
    tol: f64,
) -> Result<bool, PredicateError> {
    if a.kind != b.kind {
        return Ok(false);
    }
    match a.kind {
        ShapeKind::Vertex => Ok(is_mapped_vertex(model, a.nr, b.nr, trafo, tol)),
        ShapeKind::Edge => Ok(is_mapped_edge(model, a.nr, b.nr, trafo, tol)),
        ShapeKind::Face => Ok(is_mapped_face(model, a.nr, b.nr, trafo, tol)),
        ShapeKind::Solid => Err(PredicateError::NotImplemented {
            kind: ShapeKind::Solid,
        }),
    }
}

pub fn is_mapped_vertex(
    model: &GeometryModel,
    a: usize,
    b: usize,
    trafo: &Transform,
    tol: f64,
) -> bool {
    let pa = trafo.transform_point(&model.vertices[a].point);
    pa.distance_to(&model.vertices[b].point) < tol
}

pub fn is_mapped_edge(
    model: &GeometryModel,
    a: usize,
    b: usize,
    trafo: &Transform,
    tol: f64,
) -> bool {
    let ea = &model.edges[a];
    let eb = &model.edges[b];
    if ea.curve.is_degenerate(tol) || eb.curve.is_degenerate(tol) {
        return false;
    }
    if trafo.transform_point(&ea.curve.center()).distance_to(&eb.curve.center()) >= tol {
        return false;
    }

    let v0 = trafo.transform_point(&model.vertices[ea.start].point);
    let mut v1 = trafo.transform_point(&model.vertices[ea.end].point);
    let w0 = model.vertices[eb.start].point;
    let mut w1 = model.vertices[eb.end].point;

    // two closed edges, use midpoints to compare
    if v0.distance_to(&v1) < tol && w0.distance_to(&w1) < tol {
        v1 = trafo.transform_point(&ea.curve.point(0.5));
        w1 = eb.curve.point(0.5);
    }

    (v0.distance_to(&w0) < tol && v1.distance_to(&w1) < tol)
        || (v0.distance_to(&w1) < tol && v1.distance_to(&w0) < tol)
}

pub fn is_mapped_face(
    model: &GeometryModel,
    a: usize,
    b: usize,
    trafo: &Transform,
    tol: f64,
) -> bool {
    let fa = &model.faces[a];
    let fb = &model.faces[b];

    if model.face_center(fa).distance_to(&model.face_center(fb)) >= tol {
        return false;
    }
    if fa.edges.len() != fb.edges.len() {
        return false;
    }

    // every edge of `a` must find exactly one mapped partner in `b`
    for &e in &fa.edges {
        let found = fb
            .edges
            .iter()
            .filter(|&&e_other| is_mapped_edge(model, e, e_other, trafo, tol))
            .count();
        if found != 1 {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curves::{Curve, Line3d};
    use crate::point::Point3d;
    use crate::shapes::{EdgeShape, VertexShape};

    fn model_with_translated_edges() -> GeometryModel {
        let mut model = GeometryModel::new();
        let pts = [
            Point3d::ORIGIN,
            Point3d::new(1.0, 0.0, 0.0),
            Point3d::new(0.0, 0.0, 1.0),
            Point3d::new(1.0, 0.0, 1.0),
        ];
        for p in pts {
            model.vertices.push(VertexShape::new(p));
        }
        model
            .edges
            .push(EdgeShape::new(Curve::Line(Line3d::new(pts[0], pts[1])), 0, 1));
        model
            .edges
            .push(EdgeShape::new(Curve::Line(Line3d::new(pts[2], pts[3])), 2, 3));
        // reversed copy of edge 1
        model
            .edges
            .push(EdgeShape::new(Curve::Line(Line3d::new(pts[3], pts[2])), 3, 2));
        model.update_bounding_box();
        model
    }

    #[test]
    fn test_vertex_mapping() {
        let model = model_with_translated_edges();
        let t = Transform::translation(0.0, 0.0, 1.0);
        let tol = model.tolerance();
        assert!(is_mapped_vertex(&model, 0, 2, &t, tol));
        assert!(!is_mapped_vertex(&model, 0, 3, &t, tol));
    }

    #[test]
    fn test_edge_mapping_either_orientation() {
        let model = model_with_translated_edges();
        let t = Transform::translation(0.0, 0.0, 1.0);
        let tol = model.tolerance();
        assert!(is_mapped_edge(&model, 0, 1, &t, tol));
        assert!(is_mapped_edge(&model, 0, 2, &t, tol));
    }

    #[test]
    fn test_edge_mapping_rejects_wrong_translation() {
        let model = model_with_translated_edges();
        let t = Transform::translation(0.0, 0.0, 0.5);
        let tol = model.tolerance();
        assert!(!is_mapped_edge(&model, 0, 1, &t, tol));
    }

    #[test]
    fn test_solid_mapping_not_implemented() {
        let model = model_with_translated_edges();
        let t = Transform::identity();
        let r = is_mapped_shape(
            &model,
            ShapeRef {
                kind: ShapeKind::Solid,
                nr: 0,
            },
            ShapeRef {
                kind: ShapeKind::Solid,
                nr: 0,
            },
            &t,
            1e-8,
        );
        assert!(r.is_err());
    }

    #[test]
    fn test_kind_mismatch_is_false() {
        let model = model_with_translated_edges();
        let t = Transform::identity();
        let r = is_mapped_shape(&model, ShapeRef::vertex(0), ShapeRef::edge(0), &t, 1e-8);
        assert!(matches!(r, Ok(false)));
    }
}
