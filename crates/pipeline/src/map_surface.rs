use std::collections::HashMap;

use tracing::{debug, instrument};

use brep_geometry::{CurveEval, GeometryModel, Point3d, SurfaceEval, Uv};
use brep_mesh::{Mesh, PointIndex, PointType};

use crate::errors::MeshingError;
use crate::point_tree::PointTree;
use crate::surface::face_boundary;

/// Copy the mesh of a face's primary onto the face itself.
///
/// Boundary points already exist in the mesh (the edge stage created
/// them); they are matched through a point tree keyed by the transformed
/// (or projected) source location. Interior points are cloned and
/// transformed, or projected when no transformation is known. `mapto`
/// receives the src-to-dst point relation in both directions.
#[instrument(skip_all)]
pub fn map_surface_mesh(
    model: &GeometryModel,
    mesh: &mut Mesh,
    dst_nr: usize,
    mapto: &mut HashMap<(PointIndex, usize), PointIndex>,
) -> Result<(), MeshingError> {
    let dst = &model.faces[dst_nr];
    let src_nr = dst.primary;
    let trafo = dst.primary_to_me;
    debug!(src = src_nr + 1, dst = dst_nr + 1, "map surface mesh");

    let np = mesh.points().len();
    let mut pmap: Vec<Option<PointIndex>> = vec![None; np];

    // map the src boundary points to where they must appear on dst
    let mut tree = PointTree::new(model.bounding_box);
    let mut in_tree = vec![false; np];
    for seg in face_boundary(model, mesh, src_nr) {
        for &pi in &seg.points {
            if in_tree[pi] {
                continue;
            }
            let mut p = mesh.point(pi).p;
            match &trafo {
                Some(t) => p = t.transform_point(&p),
                None => {
                    for &edge_idx in &dst.edges {
                        let edge = &model.edges[edge_idx];
                        if edge.primary != seg.edgenr - 1 {
                            continue;
                        }
                        if mesh.point(pi).point_type == PointType::Fixed {
                            // vertices must land exactly on a dst vertex
                            let ps = model.vertices[edge.start].point;
                            let pe = model.vertices[edge.end].point;
                            p = if ps.distance_squared_to(&p) > pe.distance_squared_to(&p) {
                                pe
                            } else {
                                ps
                            };
                        } else {
                            p = edge.curve.project(&p).0;
                        }
                    }
                }
            }
            tree.insert(p, pi, -1);
            in_tree[pi] = true;
        }
    }

    // match dst boundary points against the tree; a point reached through
    // several edges keeps every uv pair it was seen with
    let mut uv_values: Vec<Vec<Uv>> = vec![Vec::new(); np];
    for seg in face_boundary(model, mesh, dst_nr) {
        for i in 0..2 {
            let pi = seg.points[i];
            let src_pi = tree.find(mesh.point(pi).p, -1)?;
            if pmap[src_pi].is_none() {
                pmap[src_pi] = Some(pi);
            }
            let uv = Uv::new(seg.epgeominfo[i].u, seg.epgeominfo[i].v);
            let vals = &mut uv_values[pi];
            if !vals.iter().any(|v| v.distance_squared_to(&uv) < 1e-7) {
                vals.push(uv);
            }
        }
    }

    // orientation is decided once, from the first cloned element; without
    // a transformation it stays unresolved and elements keep their winding
    let mut do_invert: Option<bool> = None;

    for si in mesh.surface_elements_of_face(src_nr + 1) {
        let sel = mesh.surface_elements()[si].clone();
        let mut sel_new = sel.clone();
        sel_new.face_index = dst_nr + 1;

        for i in 0..sel.pnums.len() {
            let pi = sel.pnums[i];
            let mapped = match pmap[pi] {
                Some(m) => m,
                None => {
                    let p = mesh.point(pi).p;
                    let p = match &trafo {
                        Some(t) => t.transform_point(&p),
                        None => dst.surface.project_to_surface(&p),
                    };
                    let m = mesh.add_point(p, 1, PointType::Surface);
                    pmap[pi] = Some(m);
                    m
                }
            };
            sel_new.pnums[i] = mapped;
            mapto.insert((pi, dst_nr), mapped);
            mapto.insert((mapped, src_nr), pi);
        }

        if do_invert.is_none() {
            if let Some(t) = &trafo {
                let n_src = model.faces[src_nr].surface.normal(&mesh.point(sel.pnums[0]).p);
                let n_dst = dst.surface.normal(&mesh.point(sel_new.pnums[0]).p);
                if let Some(n_mapped) = t.transform_normal(&n_src) {
                    do_invert = Some(n_mapped.dot(&n_dst) < 0.0);
                }
            }
        }
        if do_invert == Some(true) {
            sel_new.invert();
        }

        for i in 0..sel_new.pnums.len() {
            let pi = sel_new.pnums[i];
            if pi >= np {
                // freshly added inner surface point
                sel_new.geom_info[i] = dst.surface.project(&mesh.point(pi).p);
                continue;
            }
            let uvs = &uv_values[pi];
            match uvs.len() {
                1 => sel_new.geom_info[i] = uvs[0],
                0 => {
                    return Err(MeshingError::MappingFailed(format!(
                        "no surface parameters recorded for point {pi} on face {}",
                        dst_nr + 1
                    )));
                }
                _ => {
                    // several uv pairs (edge-junction point): probe a spot
                    // displaced toward the element interior and take the
                    // closest stored pair
                    let eps = 1e-3;
                    let a = mesh.point(sel_new.pnum_mod(i + 1)).p.to_vec3();
                    let b = mesh.point(sel_new.pnum_mod(i + 2)).p.to_vec3();
                    let c = mesh.point(sel_new.pnum_mod(i + 3)).p.to_vec3();
                    let probe = a * (1.0 - eps) + b * (eps / 2.0) + c * (eps / 2.0);
                    let probe = Point3d::new(probe.x, probe.y, probe.z);
                    let gi_ref = dst.surface.project(&probe);

                    let mut best = uvs[0];
                    let mut best_d = f64::MAX;
                    for uv in uvs {
                        let d = uv.distance_squared_to(&gi_ref);
                        if d < best_d {
                            best_d = d;
                            best = *uv;
                        }
                    }
                    sel_new.geom_info[i] = best;
                }
            }
        }

        mesh.add_surface_element(sel_new);
    }

    Ok(())
}
