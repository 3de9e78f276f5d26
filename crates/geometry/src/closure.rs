use tracing::debug;

use crate::model::GeometryModel;
use crate::predicates::is_mapped_edge;
use crate::shapes::{Identification, ShapeRef, ShapeTopology};

/// Close the identification graph of a model: assign dense indices,
/// lift face identifications onto edges and edges onto vertices, mirror
/// every record onto its `to` shape, and pick a primary representative
/// (smallest index) with an accumulated `primary_to_me` transformation
/// per equivalence class.
pub fn process_identifications(model: &mut GeometryModel) {
    for (i, v) in model.vertices.iter_mut().enumerate() {
        v.set_nr(i);
    }
    for (i, e) in model.edges.iter_mut().enumerate() {
        e.set_nr(i);
    }
    for (i, f) in model.faces.iter_mut().enumerate() {
        f.set_nr(i);
    }
    for (i, s) in model.solids.iter_mut().enumerate() {
        s.nr = i;
        s.primary = i;
    }

    let tol = model.tolerance();

    // lift face identifications onto mapped edge pairs
    let mut edge_idents: Vec<(usize, Identification)> = Vec::new();
    for face in &model.faces {
        for ident in &face.identifications {
            let Some(trafo) = ident.trafo else { continue };
            let from_edges = &model.faces[ident.from.nr].edges;
            let to_edges = &model.faces[ident.to.nr].edges;
            for &e in from_edges {
                for &e_other in to_edges {
                    if is_mapped_edge(model, e, e_other, &trafo, tol) {
                        edge_idents.push((
                            e,
                            Identification {
                                from: ShapeRef::edge(e),
                                to: ShapeRef::edge(e_other),
                                trafo: Some(trafo),
                                kind: ident.kind,
                                name: ident.name.clone(),
                            },
                        ));
                    }
                }
            }
        }
    }
    debug!(lifted = edge_idents.len(), "face identifications lifted to edges");
    for (e, ident) in edge_idents {
        model.edges[e].identifications.push(ident);
    }

    // lift edge identifications onto endpoint vertex pairs
    let mut vertex_idents: Vec<(usize, Identification)> = Vec::new();
    for edge in &model.edges {
        for ident in &edge.identifications {
            let Some(trafo) = ident.trafo else { continue };
            let from = &model.edges[ident.from.nr];
            let to = &model.edges[ident.to.nr];

            let pfrom = [from.start, from.end];
            let mut pto = [to.start, to.end];

            // swap points of the other edge if the crossed pairing is closer
            let p_from0 = trafo.transform_point(&model.vertices[from.start].point);
            let p_from1 = trafo.transform_point(&model.vertices[from.end].point);
            let p_to0 = model.vertices[to.start].point;
            if p_from1.distance_to(&p_to0) < p_from0.distance_to(&p_to0) {
                pto.swap(0, 1);
            }

            for i in 0..2 {
                vertex_idents.push((
                    pfrom[i],
                    Identification {
                        from: ShapeRef::vertex(pfrom[i]),
                        to: ShapeRef::vertex(pto[i]),
                        trafo: Some(trafo),
                        kind: ident.kind,
                        name: ident.name.clone(),
                    },
                ));
            }
        }
    }
    for (v, ident) in vertex_idents {
        model.vertices[v].identifications.push(ident);
    }

    mirror_identifications(&mut model.vertices);
    mirror_identifications(&mut model.edges);
    mirror_identifications(&mut model.faces);

    find_primary(&mut model.vertices);
    find_primary(&mut model.edges);
    find_primary(&mut model.faces);
}

/// Append every record stored on its `from` shape to the `to` shape, so
/// the graph is closed under reversal.
fn mirror_identifications<S: ShapeTopology>(shapes: &mut [S]) {
    for i in 0..shapes.len() {
        let records: Vec<Identification> = shapes[i]
            .identifications()
            .iter()
            .filter(|ident| ident.from.nr == i && ident.to.nr != i)
            .cloned()
            .collect();
        for ident in records {
            let to = ident.to.nr;
            shapes[to].identifications_mut().push(ident);
        }
    }
}

/// Fixed-point relaxation: each shape adopts the smallest-index primary
/// reachable through its identifications and accumulates the
/// transformation chain from that primary into its own frame.
fn find_primary<S: ShapeTopology>(shapes: &mut [S]) {
    for i in 0..shapes.len() {
        shapes[i].set_primary(i);
        shapes[i].set_primary_to_me(None);
    }

    let mut changed = true;
    while changed {
        changed = false;
        for i in 0..shapes.len() {
            for k in 0..shapes[i].identifications().len() {
                let ident = shapes[i].identifications()[k].clone();
                let need_inverse = ident.from.nr == i;
                let other = if need_inverse { ident.to.nr } else { ident.from.nr };
                let other_primary = shapes[other].primary();
                if other_primary >= shapes[i].primary() {
                    continue;
                }
                let other_to_me = shapes[other].primary_to_me();
                shapes[i].set_primary(other_primary);
                if let Some(t) = ident.trafo {
                    let step = if need_inverse { t.inverse() } else { Some(t) };
                    if let Some(step) = step {
                        // apply the other shape's primary_to_me first, then the step
                        let base = other_to_me.unwrap_or_default();
                        shapes[i].set_primary_to_me(Some(step.compose(&base)));
                    }
                }
                changed = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curves::{Curve, CurveEval, Line3d};
    use crate::point::Point3d;
    use crate::shapes::{EdgeShape, IdentificationKind, VertexShape};
    use crate::transform::Transform;

    /// Three stacked copies of a unit edge, chained by identifications
    /// 0 -> 1 and 1 -> 2 with unit z translations.
    fn chained_edges() -> GeometryModel {
        let mut model = GeometryModel::new();
        for level in 0..3 {
            let z = level as f64;
            let a = Point3d::new(0.0, 0.0, z);
            let b = Point3d::new(1.0, 0.0, z);
            model.vertices.push(VertexShape::new(a));
            model.vertices.push(VertexShape::new(b));
            model.edges.push(EdgeShape::new(
                Curve::Line(Line3d::new(a, b)),
                2 * level,
                2 * level + 1,
            ));
        }
        let t = Transform::translation(0.0, 0.0, 1.0);
        for from in 0..2usize {
            model.edges[from].identifications.push(Identification {
                from: ShapeRef::edge(from),
                to: ShapeRef::edge(from + 1),
                trafo: Some(t),
                kind: IdentificationKind::Periodic,
                name: "stack".into(),
            });
        }
        model.update_bounding_box();
        model
    }

    #[test]
    fn test_indexing_is_dense() {
        let mut model = chained_edges();
        process_identifications(&mut model);
        for (i, v) in model.vertices.iter().enumerate() {
            assert_eq!(v.nr, i);
        }
        for (i, e) in model.edges.iter().enumerate() {
            assert_eq!(e.nr, i);
        }
    }

    #[test]
    fn test_primary_is_smallest_in_class() {
        let mut model = chained_edges();
        process_identifications(&mut model);
        for e in &model.edges {
            assert_eq!(e.primary, 0);
            assert!(model.edges[e.primary].primary == e.primary, "idempotent");
        }
    }

    #[test]
    fn test_primary_to_me_chains_transformations() {
        let mut model = chained_edges();
        process_identifications(&mut model);
        let tol = model.tolerance();
        for e in &model.edges {
            if e.nr == e.primary {
                continue;
            }
            let trafo = e.primary_to_me.expect("chained trafo");
            let mapped = trafo.transform_point(&model.edges[e.primary].curve.center());
            assert!(
                mapped.distance_to(&e.curve.center()) < tol,
                "primary_to_me must carry the primary center onto edge {}",
                e.nr
            );
        }
    }

    #[test]
    fn test_identifications_are_mirrored() {
        let mut model = chained_edges();
        process_identifications(&mut model);
        // edge 1 must now also carry the record 0 -> 1
        assert!(model.edges[1]
            .identifications
            .iter()
            .any(|id| id.from.nr == 0 && id.to.nr == 1));
    }

    #[test]
    fn test_vertex_lift_pairs_endpoints() {
        let mut model = chained_edges();
        process_identifications(&mut model);
        // vertex 0 (0,0,0) should be identified with vertex 2 (0,0,1)
        assert!(model.vertices[0]
            .identifications
            .iter()
            .any(|id| id.to.nr == 2));
        assert_eq!(model.vertices[2].primary, 0);
        assert_eq!(model.vertices[4].primary, 0);
    }
}
