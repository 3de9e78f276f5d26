use std::collections::{HashMap, HashSet};

use tracing::{debug, instrument, warn};

use brep_geometry::{
    CurveEval, GeometryModel, IdentificationKind, SurfaceEval, Transform, Uv,
};
use brep_mesh::{Element2d, FaceDescriptor, Mesh, PointIndex, PointType, Segment};

use crate::collaborators::{MesherStatus, SurfaceMesher, SurfaceOptimizer};
use crate::errors::MeshingError;
use crate::map_surface::map_surface_mesh;
use crate::params::{MeshingParameters, MeshingStep};
use crate::point_tree::PointTree;
use crate::progress::{Progress, TaskGuard};

/// Mesh segments bounding a face, oriented so the face lies on the left,
/// with surface parameters of this face filled into the endpoint
/// geom-info.
pub fn face_boundary(model: &GeometryModel, mesh: &Mesh, face_nr: usize) -> Vec<Segment> {
    let face = &model.faces[face_nr];
    let mut out = Vec::new();
    for seg in mesh.segments() {
        if seg.edgenr == 0 || !face.edges.contains(&(seg.edgenr - 1)) {
            continue;
        }
        let mut seg = seg.clone();
        if seg.domout == face_nr + 1 {
            seg.swap_direction();
        }
        for i in 0..2 {
            let uv = face.surface.project(&mesh.point(seg.points[i]).p);
            seg.epgeominfo[i].u = uv.u;
            seg.epgeominfo[i].v = uv.v;
        }
        out.push(seg);
    }
    out
}

/// Hand one generic face to the external 2D mesher: all boundary segment
/// endpoints and extra face vertices become session points, the boundary
/// segments become 2D boundary elements. Returns true on failure.
fn mesh_face(
    model: &GeometryModel,
    mesh: &mut Mesh,
    mp: &MeshingParameters,
    k: usize,
    mesher: &mut dyn SurfaceMesher,
    progress: &dyn Progress,
) -> bool {
    progress.set_percent(100.0 * k as f64 / model.faces.len().max(1) as f64);
    let face = &model.faces[k];

    let bb = face.surface.bounding_box();
    let bb = bb.expanded(bb.diam() / 10.0);
    mesher.begin(&bb);

    let mut glob2loc: Vec<usize> = vec![0; mesh.points().len()];
    let mut cntp = 0usize;

    let segments = face_boundary(model, mesh, k);
    for seg in &segments {
        for &pi in &seg.points {
            if glob2loc[pi] == 0 {
                cntp += 1;
                glob2loc[pi] = cntp;
                mesher.add_point(mesh.point(pi).p, cntp, pi, None);
            }
        }
    }
    for &vnr in &face.extra_vertices {
        // vertex mesh points were inserted first, index == vertex nr
        let pi = vnr;
        if glob2loc[pi] == 0 {
            let gi = face.surface.project(&mesh.point(pi).p);
            cntp += 1;
            glob2loc[pi] = cntp;
            mesher.add_point(mesh.point(pi).p, cntp, pi, Some(gi));
        }
    }
    for seg in &segments {
        let gi0 = Uv::new(seg.epgeominfo[0].u, seg.epgeominfo[0].v);
        let gi1 = Uv::new(seg.epgeominfo[1].u, seg.epgeominfo[1].v);
        mesher.add_boundary_element(glob2loc[seg.points[0]], glob2loc[seg.points[1]], gi0, gi1);
    }

    let noldsurfels = mesh.surface_elements().len();
    let res = mesher.generate_mesh(mesh, mp, mp.maxh, k + 1, face.properties.layer);
    for i in noldsurfels..mesh.surface_elements().len() {
        mesh.surface_element_mut(i).face_index = k + 1;
    }
    res != MesherStatus::Ok
}

/// Emit the ribbon of connecting quads for a face whose boundary pairs
/// up under CLOSESURFACES identifications: each segment on a mapped edge
/// spans a quad to its image on the partner edge.
fn build_connecting_quads(
    model: &GeometryModel,
    mesh: &mut Mesh,
    k: usize,
) -> Result<(), MeshingError> {
    const UNINITIALIZED: i64 = -2;
    const NOT_MAPPED: i64 = -1;

    let face = &model.faces[k];
    let segments = face_boundary(model, mesh, k);
    let relevant_edges: HashSet<usize> = segments.iter().map(|s| s.edgenr - 1).collect();

    let mut tree = PointTree::new(model.bounding_box);
    let mut in_tree: HashSet<PointIndex> = HashSet::new();
    for s in &segments {
        for &pi in &s.points {
            if in_tree.insert(pi) {
                tree.insert(mesh.point(pi).p, pi, -1);
            }
        }
    }

    let mut p2seg: HashMap<PointIndex, Vec<usize>> = HashMap::new();
    for (si, s) in segments.iter().enumerate() {
        p2seg.entry(s.points[0]).or_default().push(si);
        p2seg.entry(s.points[1]).or_default().push(si);
    }

    let mut mapped_edges: Vec<i64> = vec![UNINITIALIZED; model.edges.len()];
    let mut trafo: Option<Transform> = None;

    let mut quads = 0usize;
    for s in &segments {
        let edgenr = s.edgenr - 1;
        let edge = &model.edges[edgenr];

        // first time we see this edge: search for a CLOSESURFACES partner
        // within this face's boundary
        if mapped_edges[edgenr] == UNINITIALIZED {
            mapped_edges[edgenr] = NOT_MAPPED;
            for edge_ident in &edge.identifications {
                if edge_ident.kind == IdentificationKind::CloseSurfaces
                    && edge_ident.from.nr == edgenr
                    && relevant_edges.contains(&edge_ident.to.nr)
                {
                    trafo = edge_ident.trafo;
                    mapped_edges[edgenr] = edge_ident.to.nr as i64;
                    break;
                }
            }
        }
        if mapped_edges[edgenr] == NOT_MAPPED {
            continue;
        }

        let mut pnums = [s.points[0], s.points[1], 0, 0];
        let mut gis = [
            Uv::new(s.epgeominfo[0].u, s.epgeominfo[0].v),
            Uv::new(s.epgeominfo[1].u, s.epgeominfo[1].v),
            Uv::default(),
            Uv::default(),
        ];

        let mut p2 = mesh.point(s.points[1]).p;
        let mut p3 = mesh.point(s.points[0]).p;
        match &trafo {
            Some(t) => {
                p2 = t.transform_point(&p2);
                p3 = t.transform_point(&p3);
            }
            None => {
                let target = &model.edges[mapped_edges[edgenr] as usize];
                p2 = target.curve.project(&p2).0;
                p3 = target.curve.project(&p3).0;
            }
        }
        pnums[2] = tree.find(p2, -1)?;
        pnums[3] = tree.find(p3, -1)?;

        // locate the partner segment to copy its surface parameters
        let candidates = p2seg.get(&pnums[2]).ok_or_else(|| {
            MeshingError::MappingFailed(format!("no boundary segment at mapped point {}", pnums[2]))
        })?;
        let mut chosen = candidates[0];
        for &si_other in candidates {
            chosen = si_other;
            let cand = &segments[si_other];
            if (cand.points[0] == pnums[2] && cand.points[1] == pnums[3])
                || (cand.points[0] == pnums[3] && cand.points[1] == pnums[2])
            {
                break;
            }
        }
        let s_other = &segments[chosen];
        for i in 0..2 {
            let i_other = if pnums[i + 2] == s_other.points[i] { i } else { 1 - i };
            gis[i + 2] = Uv::new(s_other.epgeominfo[i_other].u, s_other.epgeominfo[i_other].v);
        }

        mesh.add_surface_element(Element2d::quad(pnums, gis, face.nr + 1));
        quads += 1;
    }
    debug!(face = k + 1, quads, "connecting ribbon built");
    Ok(())
}

fn optimize_surface(
    mesh: &mut Mesh,
    mp: &MeshingParameters,
    optimizer: &mut dyn SurfaceOptimizer,
    progress: &dyn Progress,
) {
    let _guard = TaskGuard::new(progress, "Optimizing surface");
    for i in 0..mp.optsteps2d {
        for k in 0..mesh.face_descriptors().len() {
            debug!(step = i, face = k + 1, "optimization step");
            optimizer.set_face(k + 1);
            optimizer.set_metric_weight(mp.elsizeweight);
            for (innerstep, code) in mp.optimize2d.chars().enumerate() {
                progress.set_percent(
                    100.0 * (innerstep as f64 / mp.optimize2d.len().max(1) as f64 + i as f64)
                        / mp.optsteps2d.max(1) as f64,
                );
                match code {
                    's' => optimizer.edge_swapping(mesh, false),
                    'S' => optimizer.edge_swapping(mesh, true),
                    'm' => optimizer.improve_mesh(mesh, mp),
                    'c' => optimizer.combine_improve(mesh),
                    _ => {}
                }
            }
        }
    }
    mesh.compress();
}

/// Mesh all faces: descriptors and names first, then one of three
/// strategies per primary face (ribbon, external 2D mesher), then the
/// mapped copies, and finally the mesh-level identification promotion.
/// Returns the number of faces the 2D mesher failed on.
#[instrument(skip_all)]
pub fn mesh_surface(
    model: &GeometryModel,
    mesh: &mut Mesh,
    mp: &MeshingParameters,
    mesher: &mut dyn SurfaceMesher,
    mut optimizer: Option<&mut dyn SurfaceOptimizer>,
    progress: &dyn Progress,
) -> Result<usize, MeshingError> {
    let _guard = TaskGuard::new(progress, "Mesh surface");
    mesh.clear_face_descriptors();

    let mut n_failed = 0usize;
    for k in 0..model.faces.len() {
        if progress.is_cancelled() {
            return Ok(n_failed);
        }
        let face = &model.faces[k];
        mesh.add_face_descriptor(FaceDescriptor {
            surfnr: k + 1,
            domin: face.domin.map(|d| d + 1).unwrap_or(0),
            domout: face.domout.map(|d| d + 1).unwrap_or(0),
            color: face.properties.color,
        });
        mesh.set_bc_name(k, face.properties.get_name());

        if face.primary != k {
            continue; // copied from its primary in the second pass
        }

        if model.is_connecting_close_surfaces(k) {
            build_connecting_quads(model, mesh, k)?;
        } else if mesh_face(model, mesh, mp, k, mesher, progress) {
            n_failed += 1;
        }
    }

    if n_failed > 0 {
        warn!(n_failed, "not all faces have been meshed");
        return Ok(n_failed);
    }

    if mp.perfstepsend >= MeshingStep::OptSurface {
        if let Some(opt) = optimizer.take() {
            optimize_surface(mesh, mp, opt, progress);
        }
    }

    // copy mapped faces from their primaries
    let mut mapto: HashMap<(PointIndex, usize), PointIndex> = HashMap::new();
    let mut have_identifications = false;
    for k in 0..model.faces.len() {
        if model.faces[k].primary != k {
            have_identifications = true;
            map_surface_mesh(model, mesh, k, &mut mapto)?;
        }
    }

    if have_identifications {
        promote_face_identifications(model, mesh, &mapto);
    }

    Ok(0)
}

/// Register mesh-level point identifications for every surface point of
/// every identified face, composing the `mapto` relation over the
/// primary.
fn promote_face_identifications(
    model: &GeometryModel,
    mesh: &mut Mesh,
    mapto: &HashMap<(PointIndex, usize), PointIndex>,
) {
    let mut is_identified_face = vec![false; model.faces.len()];
    for face in &model.faces {
        for ident in &face.identifications {
            is_identified_face[ident.from.nr] = true;
            is_identified_face[ident.to.nr] = true;
        }
    }

    let mut pi_to_face: Vec<i64> = vec![-1; mesh.points().len()];
    let mut pi_of_face: Vec<Vec<PointIndex>> = vec![Vec::new(); model.faces.len()];
    for face in &model.faces {
        if !is_identified_face[face.nr] {
            continue;
        }
        for si in mesh.surface_elements_of_face(face.nr + 1) {
            for &pi in &mesh.surface_elements()[si].pnums {
                if mesh.point(pi).point_type == PointType::Surface && pi_to_face[pi] == -1 {
                    pi_to_face[pi] = face.nr as i64;
                    pi_of_face[face.nr].push(pi);
                }
            }
        }
    }

    for face in &model.faces {
        for ident in &face.identifications {
            if ident.from.nr != face.nr {
                continue;
            }
            let primary_nr = model.faces[ident.to.nr].primary;
            for &pi in &pi_of_face[face.nr] {
                let pi_primary = if model.faces[ident.from.nr].primary == ident.from.nr {
                    pi
                } else {
                    match mapto.get(&(pi, primary_nr)) {
                        Some(&p) => p,
                        None => continue,
                    }
                };
                let pi_other = if primary_nr == ident.to.nr {
                    pi_primary
                } else {
                    match mapto.get(&(pi_primary, ident.to.nr)) {
                        Some(&p) => p,
                        None => continue,
                    }
                };
                mesh.identifications.add(pi, pi_other, &ident.name, ident.kind);
            }
        }
    }
}
