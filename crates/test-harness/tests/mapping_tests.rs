//! Copying a meshed face onto its identified partner.

use brep_geometry::{SurfaceEval, Vec3};
use brep_mesh::{Mesh, PointType};
use brep_pipeline::{generate_mesh, Collaborators, MeshingParameters, NullProgress};
use test_harness::*;

fn triangle_normal(mesh: &Mesh, el: &brep_mesh::Element2d) -> Vec3 {
    let a = mesh.point(el.pnums[0]).p;
    let b = mesh.point(el.pnums[1]).p;
    let c = mesh.point(el.pnums[2]).p;
    (b - a).cross(&(c - a)).normalize()
}

#[test]
fn mapped_face_replicates_the_primary_mesh() {
    let model = rotated_square_pair();
    let mp = MeshingParameters {
        maxh: 2.0,
        ..Default::default()
    };
    let mut mesh = Mesh::new();
    let mut mesher = MockSurfaceMesher::new();
    {
        let mut collab = Collaborators {
            surface: &mut mesher,
            volume: None,
            optimizer: None,
        };
        generate_mesh(&model, &mut mesh, &mp, &mut collab, &NullProgress).unwrap();
    }

    // only the primary face went through the 2D mesher
    assert_eq!(mesher.generate_calls, vec![1]);

    let (tri_src, quads_src) = count_elements_of_face(&mesh, 1);
    let (tri_dst, quads_dst) = count_elements_of_face(&mesh, 2);
    assert_eq!(quads_src + quads_dst, 0);
    assert!(tri_src > 0);
    assert_eq!(tri_dst, tri_src, "copy must preserve the element count");

    // the rotation preserves orientation, so windings agree
    for &si in &mesh.surface_elements_of_face(2) {
        let n = triangle_normal(&mesh, &mesh.surface_elements()[si]);
        assert!(
            n.dot(&Vec3::Z) > 0.9,
            "mapped triangle should keep its winding, normal {n:?}"
        );
    }

    // every mapped corner lies on the destination plane z = 1
    for &si in &mesh.surface_elements_of_face(2) {
        for &pi in &mesh.surface_elements()[si].pnums {
            assert!((mesh.point(pi).p.z - 1.0).abs() < 1e-9);
        }
    }
}

#[test]
fn mapped_points_match_under_the_transformation() {
    let model = rotated_square_pair();
    let trafo = model.faces[1].primary_to_me.expect("closure sets the chain");
    let mp = MeshingParameters {
        maxh: 2.0,
        ..Default::default()
    };
    let mut mesh = Mesh::new();
    let mut mesher = MockSurfaceMesher::new();
    {
        let mut collab = Collaborators {
            surface: &mut mesher,
            volume: None,
            optimizer: None,
        };
        generate_mesh(&model, &mut mesh, &mp, &mut collab, &NullProgress).unwrap();
    }

    assert_identified_pairs_match(&mesh, &trafo, model.tolerance());

    // the interior Steiner point of the primary face has an identified
    // partner on the copy
    let surface_pairs: Vec<_> = mesh
        .identifications
        .pairs()
        .iter()
        .filter(|pair| {
            mesh.point(pair.pi1).point_type == PointType::Surface
                && mesh.point(pair.pi2).point_type == PointType::Surface
        })
        .collect();
    assert_eq!(surface_pairs.len(), 1, "one interior point pair expected");
    let pair = surface_pairs[0];
    let p1 = mesh.point(pair.pi1).p;
    let p2 = mesh.point(pair.pi2).p;
    let (from, to) = if (p1.z - 0.0).abs() < 1e-9 { (p1, p2) } else { (p2, p1) };
    assert_points_close(
        &trafo.transform_point(&from),
        &to,
        model.tolerance(),
        "interior pair",
    );
}

#[test]
fn mapped_corners_carry_surface_parameters() {
    let model = rotated_square_pair();
    let mp = MeshingParameters {
        maxh: 2.0,
        ..Default::default()
    };
    let mut mesh = Mesh::new();
    let mut mesher = MockSurfaceMesher::new();
    {
        let mut collab = Collaborators {
            surface: &mut mesher,
            volume: None,
            optimizer: None,
        };
        generate_mesh(&model, &mut mesh, &mp, &mut collab, &NullProgress).unwrap();
    }

    let dst_surface = &model.faces[1].surface;
    for &si in &mesh.surface_elements_of_face(2) {
        let el = &mesh.surface_elements()[si];
        for (i, &pi) in el.pnums.iter().enumerate() {
            let from_uv = dst_surface.point(el.geom_info[i]);
            assert_points_close(
                &from_uv,
                &mesh.point(pi).p,
                1e-6,
                "corner uv must evaluate back to the corner",
            );
        }
    }
}
