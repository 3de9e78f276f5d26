//! Assertion helpers shared by the scenario suites.

use brep_geometry::{Point3d, Transform};
use brep_mesh::Mesh;

/// Assert two points coincide within `tol`.
pub fn assert_points_close(a: &Point3d, b: &Point3d, tol: f64, context: &str) {
    let d = a.distance_to(b);
    assert!(d < tol, "{context}: points differ by {d} (tol {tol}): {a:?} vs {b:?}");
}

/// Count triangles and quads on a 1-based face number.
pub fn count_elements_of_face(mesh: &Mesh, face_index: usize) -> (usize, usize) {
    let mut triangles = 0;
    let mut quads = 0;
    for el in mesh.surface_elements() {
        if el.face_index != face_index {
            continue;
        }
        if el.is_quad() {
            quads += 1;
        } else {
            triangles += 1;
        }
    }
    (triangles, quads)
}

/// Every identified point pair must map onto each other under `trafo`
/// (in one of the two directions) within `tol`.
pub fn assert_identified_pairs_match(mesh: &Mesh, trafo: &Transform, tol: f64) {
    assert!(
        !mesh.identifications.is_empty(),
        "expected identified point pairs in the mesh"
    );
    for pair in mesh.identifications.pairs() {
        let p1 = mesh.point(pair.pi1).p;
        let p2 = mesh.point(pair.pi2).p;
        let forward = trafo.transform_point(&p1).distance_to(&p2);
        let backward = trafo.transform_point(&p2).distance_to(&p1);
        assert!(
            forward < tol || backward < tol,
            "identified pair ({}, {}) does not match under the transformation: \
             forward gap {forward}, backward gap {backward}",
            pair.pi1,
            pair.pi2
        );
    }
}
