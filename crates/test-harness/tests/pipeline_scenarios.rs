//! End-to-end runs of the pipeline driver against the scenario models.

use brep_geometry::{Point3d, Transform};
use brep_mesh::{Mesh, PointType};
use brep_pipeline::{
    generate_mesh, Collaborators, MeshingParameters, MeshingStep, NullProgress, Progress,
    RecordingProgress,
};
use test_harness::*;

fn run(
    model: &brep_geometry::GeometryModel,
    mp: &MeshingParameters,
) -> (Mesh, MockSurfaceMesher, MockVolumeMesher) {
    let mut mesh = Mesh::new();
    let mut mesher = MockSurfaceMesher::new();
    let mut volume = MockVolumeMesher::new();
    {
        let mut collab = Collaborators {
            surface: &mut mesher,
            volume: Some(&mut volume),
            optimizer: None,
        };
        generate_mesh(model, &mut mesh, mp, &mut collab, &NullProgress).unwrap();
    }
    (mesh, mesher, volume)
}

#[test]
fn straight_edge_divides_into_four_segments() {
    let model = segment_model(Point3d::ORIGIN, Point3d::new(1.0, 0.0, 0.0));
    let mp = MeshingParameters {
        maxh: 0.25,
        grading: 0.3,
        segmentsperedge: 1.0,
        ..Default::default()
    };
    let (mesh, _, _) = run(&model, &mp);

    assert_eq!(mesh.segments().len(), 4);
    let mut xs: Vec<f64> = mesh
        .points()
        .iter()
        .filter(|p| p.point_type == PointType::Edge)
        .map(|p| p.p.x)
        .collect();
    xs.sort_by(|a, b| a.partial_cmp(b).unwrap());
    assert_eq!(xs.len(), 3);
    for (x, expected) in xs.iter().zip([0.25, 0.5, 0.75]) {
        assert!((x - expected).abs() < 1e-6, "expected {expected}, got {x}");
    }
    assert!(mesh
        .points()
        .iter()
        .all(|p| p.p.y.abs() < 1e-12 && p.p.z.abs() < 1e-12));
    assert_eq!(mesh.dimension, 1);
}

#[test]
fn partitioned_edge_uses_given_parameters() {
    let mut model = segment_model(Point3d::ORIGIN, Point3d::new(1.0, 0.0, 0.0));
    model.edges[0].properties.partition = Some(vec![0.2, 0.5, 0.9]);
    let (mesh, _, _) = run(&model, &MeshingParameters::default());

    assert_eq!(mesh.segments().len(), 4);
    let dists: Vec<f64> = mesh
        .segments()
        .iter()
        .map(|s| s.epgeominfo[0].dist)
        .chain(std::iter::once(
            mesh.segments().last().unwrap().epgeominfo[1].dist,
        ))
        .collect();
    assert_eq!(dists, vec![0.0, 0.2, 0.5, 0.9, 1.0]);
}

#[test]
fn connecting_ribbon_produces_exactly_four_quads() {
    let model = parallel_plates();
    let mp = MeshingParameters {
        maxh: 1.0,
        ..Default::default()
    };
    let (mesh, mesher, _) = run(&model, &mp);

    let mut quads = 0;
    let mut triangles = 0;
    for el in mesh.surface_elements() {
        if el.is_quad() {
            quads += 1;
        } else {
            triangles += 1;
        }
    }
    assert_eq!(quads, 4, "one connecting quad per side face");
    assert_eq!(triangles, 0, "ribbon faces must not be triangulated");
    assert!(
        mesher.generate_calls.is_empty(),
        "the 2D mesher must not run on connecting faces"
    );

    // identified points across the gap match under the translation
    let trafo = Transform::translation(0.0, 0.0, 1.0);
    assert_identified_pairs_match(&mesh, &trafo, model.tolerance());
}

#[test]
fn closed_circular_edge_gets_single_segment() {
    let model = closed_circle(1.0);
    let mp = MeshingParameters {
        maxh: 0.3,
        ..Default::default()
    };
    let (mesh, _, _) = run(&model, &mp);

    assert_eq!(mesh.segments().len(), 1);
    let seg = &mesh.segments()[0];
    assert_eq!(seg.points[0], seg.points[1]);
    assert_eq!(seg.epgeominfo[0].dist, 0.0);
    assert_eq!(seg.epgeominfo[1].dist, 1.0);
}

#[test]
fn close_edges_cap_the_local_size() {
    let model = close_parallel_edges(10.0, 0.05);
    let mp = MeshingParameters {
        maxh: 5.0,
        closeedgefac: Some(2.0),
        ..Default::default()
    };
    let (mesh, _, _) = run(&model, &mp);

    let expected = 0.05 / (2.0 + 1e-10);
    for p in [Point3d::ORIGIN, Point3d::new(5.0, 0.0, 0.0), Point3d::new(10.0, 0.05, 0.0)] {
        let h = mesh.get_h(&p, 1);
        assert!(h <= expected + 1e-9, "close-edge cap missing at {p:?}: {h}");
        assert!(h >= 1e-3 * model.bounding_box.diam() - 1e-12, "clipped below the floor");
    }
}

#[test]
fn generic_face_is_meshed_by_the_collaborator() {
    let model = square_face_model();
    let mp = MeshingParameters {
        maxh: 2.0,
        ..Default::default()
    };
    let (mesh, mesher, _) = run(&model, &mp);

    assert_eq!(mesher.generate_calls, vec![1]);
    let (triangles, quads) = count_elements_of_face(&mesh, 1);
    assert_eq!(quads, 0);
    assert_eq!(triangles, 4, "centroid fan over four boundary points");
    // the Steiner point is a surface point
    assert_eq!(
        mesh.points()
            .iter()
            .filter(|p| p.point_type == PointType::Surface)
            .count(),
        1
    );
}

#[test]
fn mesher_failure_skips_volume_steps() {
    let mut model = square_face_model();
    model.dimension = 3;
    let mut mesh = Mesh::new();
    let mut mesher = MockSurfaceMesher::failing_on(vec![1]);
    let mut volume = MockVolumeMesher::new();
    {
        let mut collab = Collaborators {
            surface: &mut mesher,
            volume: Some(&mut volume),
            optimizer: None,
        };
        generate_mesh(
            &model,
            &mut mesh,
            &MeshingParameters::default(),
            &mut collab,
            &NullProgress,
        )
        .unwrap();
    }
    assert_eq!(mesher.generate_calls, vec![1]);
    assert_eq!(volume.mesh_calls, 0, "volume steps must be skipped");
}

#[test]
fn volume_collaborator_runs_for_solid_models() {
    let mut model = square_face_model();
    model.dimension = 3;
    let (_, _, volume) = run(&model, &MeshingParameters::default());
    assert_eq!(volume.mesh_calls, 1);
    assert_eq!(volume.quality_calls, 1);
    assert_eq!(volume.optimize_calls, 1);
}

#[test]
fn step_gates_carve_an_inclusive_range() {
    let model = segment_model(Point3d::ORIGIN, Point3d::new(1.0, 0.0, 0.0));
    let mp = MeshingParameters {
        maxh: 0.25,
        perfstepsend: MeshingStep::Analyse,
        ..Default::default()
    };
    let (mesh, _, _) = run(&model, &mp);
    assert!(mesh.segments().is_empty(), "edges stage must be gated off");
    assert!(mesh.points().is_empty());
}

#[test]
fn cancellation_is_a_silent_early_return() {
    let model = segment_model(Point3d::ORIGIN, Point3d::new(1.0, 0.0, 0.0));
    let progress = RecordingProgress::new();
    progress.cancel();

    let mut mesh = Mesh::new();
    let mut mesher = MockSurfaceMesher::new();
    let mut collab = Collaborators {
        surface: &mut mesher,
        volume: None,
        optimizer: None,
    };
    let result = generate_mesh(
        &model,
        &mut mesh,
        &MeshingParameters::default(),
        &mut collab,
        &progress,
    );
    assert!(result.is_ok());
    assert!(mesh.segments().is_empty());
}

#[test]
fn task_label_is_restored_after_the_run() {
    let model = segment_model(Point3d::ORIGIN, Point3d::new(1.0, 0.0, 0.0));
    let progress = RecordingProgress::new();
    progress.set_task("caller task");

    let mut mesh = Mesh::new();
    let mut mesher = MockSurfaceMesher::new();
    let mut collab = Collaborators {
        surface: &mut mesher,
        volume: None,
        optimizer: None,
    };
    generate_mesh(
        &model,
        &mut mesh,
        &MeshingParameters::default(),
        &mut collab,
        &progress,
    )
    .unwrap();
    assert_eq!(progress.task(), "caller task");
}

#[test]
fn optimizer_receives_the_configured_step_codes() {
    let model = square_face_model();
    let mp = MeshingParameters {
        maxh: 2.0,
        optsteps2d: 1,
        optimize2d: "smc".to_string(),
        elsizeweight: 0.5,
        ..Default::default()
    };

    let mut mesh = Mesh::new();
    let mut mesher = MockSurfaceMesher::new();
    let mut optimizer = MockOptimizer::new();
    {
        let mut collab = Collaborators {
            surface: &mut mesher,
            volume: None,
            optimizer: Some(&mut optimizer),
        };
        generate_mesh(&model, &mut mesh, &mp, &mut collab, &NullProgress).unwrap();
    }
    assert_eq!(optimizer.ops, vec!['s', 'm', 'c']);
    assert_eq!(optimizer.current_face, 1);
    assert!((optimizer.metric_weight - 0.5).abs() < 1e-12);
}
