use tracing::{debug, instrument, warn};

use brep_geometry::{CurveEval, EdgeShape, GeometryModel, IdentificationKind, Point3d};
use brep_mesh::{EdgePointGeomInfo, Mesh, PointElement, PointIndex, PointType, Segment};

use crate::errors::MeshingError;
use crate::params::MeshingParameters;
use crate::point_tree::PointTree;
use crate::progress::{Progress, TaskGuard};

const DIVIDE_ITERATION_CAP: usize = 20_000;

/// Discretize one primary edge against the sizing field. Returns the
/// interior points and the full parameter list (with both endpoints).
pub fn divide_edge(edge: &EdgeShape, mp: &MeshingParameters, mesh: &Mesh) -> (Vec<Point3d>, Vec<f64>) {
    if let Some(partition) = &edge.properties.partition {
        let mut points = Vec::with_capacity(partition.len());
        let mut params = Vec::with_capacity(partition.len() + 2);
        params.push(0.0);
        for &t in partition {
            params.push(t);
            points.push(edge.curve.point(t));
        }
        params.push(1.0);
        return (points, params);
    }

    let layer = edge.properties.layer;
    let safety = 0.5 * (1.0 - mp.grading);

    // march along the edge, accumulating the density integral H(t)
    let mut lam = 0.0;
    let mut old_p = edge.curve.point(0.0);
    let mut hvalue = vec![0.0f64];
    let mut fine_params: Vec<f64> = Vec::new();

    while lam < 1.0 && hvalue.len() < DIVIDE_ITERATION_CAP {
        fine_params.push(lam);
        let h = mesh.get_h(&old_p, layer);
        let tangent_len = edge.curve.tangent(lam).length();
        let step = safety * h / tangent_len;
        if !step.is_finite() || step <= 0.0 {
            break;
        }
        lam = (lam + step).min(1.0);
        let p = edge.curve.point(lam);
        let prev = *hvalue.last().unwrap_or(&0.0);
        hvalue.push(prev + p.distance_to(&old_p) / h);
        old_p = p;
    }
    fine_params.push(1.0);

    if hvalue.len() == DIVIDE_ITERATION_CAP && lam < 1.0 {
        warn!(edge = edge.nr, "could not divide edge within the iteration cap");
    }

    let total = *hvalue.last().unwrap_or(&0.0);
    let nsubedges = ((total + 0.5).floor() as usize).max(1);
    let mut points: Vec<Point3d> = Vec::with_capacity(nsubedges.saturating_sub(1));
    let mut params = vec![0.0f64; nsubedges + 1];

    let mut i1 = 0usize;
    for i in 1..nsubedges {
        let h_target = i as f64 * total / nsubedges as f64;
        while i1 < hvalue.len() && hvalue[i1] < h_target {
            i1 += 1;
        }
        if i1 == hvalue.len() {
            warn!(edge = edge.nr, "divide edge: local h too small");
            params.truncate(i + 1);
            break;
        }
        // interpolate the parameter between recorded samples
        let lam0 = fine_params[i1 - 1];
        let lam1 = fine_params[i1];
        let h0 = hvalue[i1 - 1];
        let h1 = hvalue[i1];
        let fac = (h_target - h0) / (h1 - h0);
        let lam_i = lam0 + fac * (lam1 - lam0);
        params[i] = lam_i;
        points.push(edge.curve.point(lam_i));
    }

    params[0] = 0.0;
    if let Some(last) = params.last_mut() {
        *last = 1.0;
    }

    let n = params.len();
    if n >= 2 && params[n - 1] <= params[n - 2] {
        warn!(edge = edge.nr, "divide edge: corrected degenerate last segment");
        points.pop();
        params.pop();
        if let Some(last) = params.last_mut() {
            *last = 1.0;
        }
    }

    (points, params)
}

/// Mesh all geometry edges: vertex points first, then one polyline of
/// segments per edge, inheriting the discretization from primary edges
/// and transferring identifications onto the mesh point pairs.
#[instrument(skip_all)]
pub fn mesh_edges(
    model: &GeometryModel,
    mesh: &mut Mesh,
    mp: &MeshingParameters,
    progress: &dyn Progress,
) -> Result<(), MeshingError> {
    let _guard = TaskGuard::new(progress, "Mesh edges");

    let mut tree = PointTree::new(model.bounding_box);
    let tol = model.tolerance();

    let mut vert2meshpt: Vec<PointIndex> = Vec::with_capacity(model.vertices.len());
    for vert in &model.vertices {
        let pi = mesh.add_point(vert.point, vert.properties.layer, PointType::Fixed);
        mesh.set_singularity(pi, vert.properties.hpref);
        let name = vert.properties.get_name();
        mesh.set_cd3_name(pi + 1, name.clone());
        mesh.point_elements.push(PointElement {
            pnum: pi,
            index: pi + 1,
            name,
        });
        vert2meshpt.push(pi);
    }

    for vert in &model.vertices {
        for ident in &vert.identifications {
            mesh.identifications.add(
                vert2meshpt[ident.from.nr],
                vert2meshpt[ident.to.nr],
                &ident.name,
                ident.kind,
            );
        }
    }

    let nedges = model.edges.len();
    let mut all_pnums: Vec<Vec<PointIndex>> = vec![Vec::new(); nedges];

    for edgenr in 0..nedges {
        if progress.is_cancelled() {
            return Ok(());
        }
        progress.set_percent(100.0 * edgenr as f64 / nedges.max(1) as f64);

        let edge = &model.edges[edgenr];
        let startp = vert2meshpt[edge.start];
        let endp = vert2meshpt[edge.end];

        // ignore collapsed edges
        if edge.curve.is_degenerate(tol) {
            continue;
        }

        let mut edge_points: Vec<Point3d> = Vec::new();
        let mut params: Vec<f64>;

        if edge.primary == edgenr {
            // a closed pair of CLOSESURFACES vertices gets a single
            // segment; the ribbon pass refines across the gap later
            let mut is_identified_edge = false;
            for ident in &model.vertices[edge.start].identifications {
                let other = if ident.from.nr == edge.start {
                    ident.to.nr
                } else {
                    ident.from.nr
                };
                if other == edge.end && ident.kind == IdentificationKind::CloseSurfaces {
                    is_identified_edge = true;
                    break;
                }
            }

            if is_identified_edge {
                params = vec![0.0, 1.0];
            } else {
                let (pts, ps) = divide_edge(edge, mp, mesh);
                edge_points = pts;
                params = ps;
            }
        } else {
            // inherit the discretization of the primary edge
            let pnums_primary = &all_pnums[edge.primary];
            let np = pnums_primary.len();
            if np < 2 {
                debug!(edge = edgenr, primary = edge.primary, "primary edge empty, skipping");
                continue;
            }
            let trafo = edge.primary_to_me;

            let mut edge_params: Vec<f64> = Vec::with_capacity(np - 2);
            for i in 0..np - 2 {
                let mut p = mesh.point(pnums_primary[i + 1]).p;
                if let Some(t) = &trafo {
                    p = t.transform_point(&p);
                }
                let (proj, t_param) = edge.curve.project(&p);
                edge_points.push(proj);
                edge_params.push(t_param);
            }

            params = vec![0.0; edge_params.len() + 2];
            for (i, t) in edge_params.iter().enumerate() {
                params[i + 1] = *t;
            }

            if edge_params.len() > 1 {
                // interior parameters are monotone; their direction gives
                // the edge orientation (projection alone cannot, for
                // closed edges)
                let reversed = edge_params[1] < edge_params[0];
                let last = params.len() - 1;
                if reversed {
                    params[0] = 1.0;
                    params[last] = 0.0;
                } else {
                    params[0] = 0.0;
                    params[last] = 1.0;
                }
            } else {
                let last = params.len() - 1;
                for (slot, idx) in [(0usize, 0usize), (last, np - 1)] {
                    let mut p = mesh.point(pnums_primary[idx]).p;
                    if let Some(t) = &trafo {
                        p = t.transform_point(&p);
                    }
                    let (_, t_param) = edge.curve.project(&p);
                    params[slot] = t_param;
                }
            }
        }

        let is_reversed = params[params.len() - 1] < params[0];
        let mut pnums: Vec<PointIndex> = Vec::with_capacity(edge_points.len() + 2);
        pnums.push(if is_reversed { endp } else { startp });
        for p in &edge_points {
            let pi = mesh.add_point(*p, edge.properties.layer, PointType::Edge);
            if !edge.identifications.is_empty() {
                tree.insert(*p, pi, edge.nr as i64);
            }
            pnums.push(pi);
        }
        pnums.push(if is_reversed { startp } else { endp });

        for i in 0..pnums.len() - 1 {
            mesh.add_segment(Segment {
                points: [pnums[i], pnums[i + 1]],
                edgenr: edgenr + 1,
                si: edgenr + 1,
                epgeominfo: [
                    EdgePointGeomInfo {
                        u: 0.0,
                        v: 0.0,
                        dist: params[i],
                        edgenr,
                    },
                    EdgePointGeomInfo {
                        u: 0.0,
                        v: 0.0,
                        dist: params[i + 1],
                        edgenr,
                    },
                ],
                singedge_left: edge.properties.hpref,
                singedge_right: edge.properties.hpref,
                domin: edge.domin.map(|d| d + 1).unwrap_or(0),
                domout: edge.domout.map(|d| d + 1).unwrap_or(0),
            });
        }
        mesh.set_cd2_name(edgenr + 1, edge.properties.get_name());

        all_pnums[edgenr] = pnums;
    }

    // transfer edge-interior identifications onto mesh point pairs
    for edge in &model.edges {
        for ident in &edge.identifications {
            if ident.from.nr != edge.nr {
                continue;
            }
            let pnums = &all_pnums[edge.nr];
            if pnums.len() < 2 {
                continue;
            }
            for &pi in &pnums[1..pnums.len() - 1] {
                let mut p_other = mesh.point(pi).p;
                match &ident.trafo {
                    Some(t) => p_other = t.transform_point(&p_other),
                    None => {
                        p_other = model.edges[ident.to.nr].curve.project(&p_other).0;
                    }
                }
                let pi_other = tree.find(p_other, ident.to.nr as i64)?;
                mesh.identifications.add(pi, pi_other, &ident.name, ident.kind);
            }
        }
    }

    Ok(())
}
