use tracing::{debug, instrument, warn};

use brep_geometry::{BoundingBox, CurveEval, FaceShape, GeometryModel, Point3d, SurfaceEval, Uv};
use brep_mesh::Mesh;

use crate::errors::MeshingError;
use crate::params::MeshingParameters;
use crate::point_tree::BoxTree;
use crate::progress::{Progress, TaskGuard};

/// Build the local mesh-size field: seed the sizing octree over the model
/// bounding box, then restrict it from edge lengths, edge and surface
/// curvature, close-edge distances and user pin points.
#[instrument(skip_all)]
pub fn analyse(
    model: &GeometryModel,
    mesh: &mut Mesh,
    mp: &MeshingParameters,
    progress: &dyn Progress,
) -> Result<(), MeshingError> {
    mesh.set_global_h(mp.maxh);
    mesh.set_minimal_h(mp.minh);
    mesh.set_local_h(&model.bounding_box, mp.grading);

    let diam = model.bounding_box.diam();
    // only set meshsize for edges longer than this
    let mincurvelength = 1e-3 * diam;

    if mp.uselocalh {
        let eps = 1e-10 * diam;
        let guard = TaskGuard::new(progress, "Analyse edges");

        for (i, edge) in model.edges.iter().enumerate() {
            if progress.is_cancelled() {
                return Ok(());
            }
            progress.set_percent(100.0 * i as f64 / model.edges.len().max(1) as f64);

            let length = edge.curve.length();
            if length < mincurvelength {
                continue;
            }

            // restrict mesh size based on edge length
            const NPTS: usize = 20;
            for k in 0..=NPTS {
                let p = edge.curve.point(k as f64 / NPTS as f64);
                mesh.restrict_local_h(p, length / mp.segmentsperedge, edge.properties.layer);
            }

            // restrict mesh size based on edge curvature
            let mut t = 0.0;
            let mut p_old = edge.curve.point(t);
            while t < 1.0 - eps {
                let step = edge.curve.calc_step(t, 1.0 / mp.curvaturesafety);
                if step <= 0.0 {
                    break;
                }
                t += step;
                if t < 1.0 {
                    let p = edge.curve.point(t);
                    mesh.restrict_local_h(p, p.distance_to(&p_old), edge.properties.layer);
                    p_old = p;
                }
            }
        }

        progress.set_task("Analyse faces");
        for (i, face) in model.faces.iter().enumerate() {
            if progress.is_cancelled() {
                return Ok(());
            }
            progress.set_percent(100.0 * i as f64 / model.faces.len().max(1) as f64);
            restrict_h_face(face, mesh, mp);
        }

        if let Some(closeedgefac) = mp.closeedgefac {
            progress.set_task("Analyse close edges");
            restrict_close_edges(model, mesh, closeedgefac, eps, progress);
        }

        drop(guard);
    }

    for mspnt in &mp.meshsize_points {
        mesh.restrict_local_h(mspnt.point, mspnt.h, mspnt.layer);
    }

    if let Some(filename) = &mp.meshsizefilename {
        mesh.load_mesh_size_file(filename)?;
    }

    Ok(())
}

/// Refine the sizing field over a face by recursive triangle subdivision
/// of its parameter domain.
fn restrict_h_face(face: &FaceShape, mesh: &mut Mesh, mp: &MeshingParameters) {
    let (lo, hi) = face.surface.uv_bounds();
    let c00 = lo;
    let c10 = Uv::new(hi.u, lo.v);
    let c01 = Uv::new(lo.u, hi.v);
    let c11 = hi;
    restrict_h_trig(face, mesh, c00, c10, c11, mp, 0, mp.maxh);
    restrict_h_trig(face, mesh, c00, c11, c01, mp, 0, mp.maxh);
}

fn restrict_h_trig(
    face: &FaceShape,
    mesh: &mut Mesh,
    gi0: Uv,
    gi1: Uv,
    gi2: Uv,
    mp: &MeshingParameters,
    depth: usize,
    h: f64,
) {
    let p0 = face.surface.point(gi0);
    let p1 = face.surface.point(gi1);
    let p2 = face.surface.point(gi2);

    // cut-edge is opposite the corner with the same number
    let mut longest = p0.distance_to(&p1);
    let mut cutedge = 2;
    if p0.distance_to(&p2) > longest {
        longest = p0.distance_to(&p2);
        cutedge = 1;
    }
    if p1.distance_to(&p2) > longest {
        longest = p1.distance_to(&p2);
        cutedge = 0;
    }

    let gi_mid = Uv::new((gi0.u + gi1.u + gi2.u) / 3.0, (gi0.v + gi1.v + gi2.v) / 3.0);

    let mut h = h;
    if depth % 3 == 0 {
        let curvature = face
            .surface
            .curvature(gi_mid)
            .max(face.surface.curvature(gi0))
            .max(face.surface.curvature(gi1))
            .max(face.surface.curvature(gi2));
        if curvature < 1e-3 {
            return;
        }
        let kappa = curvature * mp.curvaturesafety;
        h = if mp.maxh * kappa < 1.0 { mp.maxh } else { 1.0 / kappa };
        if h < 1e-4 * longest {
            // features too small to resolve under the cap
            return;
        }
    }

    if h < longest && depth < 10 {
        let mid = |a: Uv, b: Uv| Uv::new(0.5 * (a.u + b.u), 0.5 * (a.v + b.v));
        match cutedge {
            0 => {
                let gi_m = mid(gi1, gi2);
                restrict_h_trig(face, mesh, gi_m, gi2, gi0, mp, depth + 1, h);
                restrict_h_trig(face, mesh, gi_m, gi0, gi1, mp, depth + 1, h);
            }
            1 => {
                let gi_m = mid(gi0, gi2);
                restrict_h_trig(face, mesh, gi_m, gi1, gi2, mp, depth + 1, h);
                restrict_h_trig(face, mesh, gi_m, gi0, gi1, mp, depth + 1, h);
            }
            _ => {
                let gi_m = mid(gi0, gi1);
                restrict_h_trig(face, mesh, gi_m, gi1, gi2, mp, depth + 1, h);
                restrict_h_trig(face, mesh, gi_m, gi2, gi0, mp, depth + 1, h);
            }
        }
    } else {
        let pmid = face.surface.point(gi_mid);
        let layer = face.properties.layer;
        for p in [p0, p1, p2, pmid] {
            mesh.restrict_local_h(p, h, layer);
        }
    }
}

/// A piecewise-linear section of an edge for close-feature detection.
#[derive(Debug, Clone, Copy)]
struct CloseLine {
    p0: Point3d,
    p1: Point3d,
}

impl CloseLine {
    fn length(&self) -> f64 {
        self.p0.distance_to(&self.p1)
    }

    /// Distance from this section's midpoint to the other section,
    /// measured along this section's direction.
    fn dist(&self, other: &CloseLine) -> f64 {
        let n = self.p1 - self.p0;
        let q = other.p1 - other.p0;
        let nq = n.dot(&q);
        let p = self.p0 + 0.5 * n;
        let lambda = (p - other.p0).dot(&n) / (nq + 1e-10);
        if (0.0..=1.0).contains(&lambda) {
            ((p - other.p0) - lambda * q).length()
        } else {
            1e99
        }
    }
}

/// Detect close but non-adjacent edges and restrict the size field to a
/// fraction of their distance.
fn restrict_close_edges(
    model: &GeometryModel,
    mesh: &mut Mesh,
    closeedgefac: f64,
    eps: f64,
    progress: &dyn Progress,
) {
    const SECTIONS: usize = 100;
    let diam = model.bounding_box.diam();
    let cos_cut = (10.0f64).to_radians().cos();

    let mut lines: Vec<CloseLine> = Vec::new();
    let mut searchtree = BoxTree::new(&model.bounding_box);

    for edge in &model.edges {
        if edge.curve.length() < eps {
            continue;
        }
        let mut p_old = edge.curve.point(0.0);
        let mut t_old = match edge.curve.tangent(0.0).normalized() {
            Some(t) => t,
            None => continue,
        };
        for i in 1..=SECTIONS {
            let t = i as f64 / SECTIONS as f64;
            let p_new = edge.curve.point(t);
            let t_new = match edge.curve.tangent(t).normalized() {
                Some(t) => t,
                None => continue,
            };
            // cut a section whenever the direction has turned far enough
            let cosalpha = t_old.dot(&t_new).abs();
            if i == SECTIONS || cosalpha < cos_cut {
                let index = lines.len();
                searchtree.insert(BoundingBox::from_points(&[p_old, p_new]), index);
                lines.push(CloseLine { p0: p_old, p1: p_new });
                p_old = p_new;
                t_old = t_new;
            }
        }
    }

    for i in 0..lines.len() {
        let line = lines[i];
        if line.length() < eps {
            continue;
        }
        if progress.is_cancelled() {
            return;
        }
        progress.set_percent(100.0 * i as f64 / lines.len() as f64);

        let probe = BoundingBox::from_points(&[line.p0, line.p1]).expanded(line.length());
        let mut mindist: f64 = 1e99;
        for num in searchtree.get_intersecting(&probe) {
            if num == i {
                continue;
            }
            let other = lines[num];
            // skip neighbours sharing an endpoint
            if line.p0.distance_squared_to(&other.p0) < eps
                || line.p0.distance_squared_to(&other.p1) < eps
                || line.p1.distance_squared_to(&other.p0) < eps
                || line.p1.distance_squared_to(&other.p1) < eps
            {
                continue;
            }
            mindist = mindist.min(line.dist(&other));
        }
        if mindist == 1e99 {
            continue;
        }
        let mut mindist = mindist / (closeedgefac + 1e-10);
        if mindist < 1e-3 * diam {
            warn!(
                mindist,
                clipped_to = 1e-3 * diam,
                near = ?line.p0,
                "extremely small local h from close edges"
            );
            mindist = 1e-3 * diam;
        }
        mesh.restrict_local_h_line(line.p0, line.p1, mindist, 1);
    }
    debug!(sections = lines.len(), "close-edge pass finished");
}
