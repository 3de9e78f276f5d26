//! Persisted-geometry roundtrip through the pipeline.

use std::io::Cursor;

use brep_geometry::archive::{save_text_archive, GeometryRegistry};
use brep_mesh::Mesh;
use brep_pipeline::{generate_mesh, Collaborators, MeshingParameters, NullProgress};
use test_harness::*;

#[test]
fn archived_geometry_meshes_identically() {
    let model = parallel_plates();

    let mut buffer = Vec::new();
    save_text_archive(&model, &mut buffer).unwrap();

    let registry = GeometryRegistry::new();
    let loaded = registry
        .load_from_mesh_file(&mut Cursor::new(buffer))
        .unwrap()
        .expect("text archive token must be recognized");

    let mp = MeshingParameters {
        maxh: 1.0,
        ..Default::default()
    };

    let mut reference_mesh = Mesh::new();
    let mut loaded_mesh = Mesh::new();
    for (geo, mesh) in [(&model, &mut reference_mesh), (&loaded, &mut loaded_mesh)] {
        let mut mesher = MockSurfaceMesher::new();
        let mut collab = Collaborators {
            surface: &mut mesher,
            volume: None,
            optimizer: None,
        };
        generate_mesh(geo, mesh, &mp, &mut collab, &NullProgress).unwrap();
    }

    assert_eq!(
        reference_mesh.segments().len(),
        loaded_mesh.segments().len()
    );
    assert_eq!(
        reference_mesh.surface_elements().len(),
        loaded_mesh.surface_elements().len()
    );
    assert_eq!(
        reference_mesh.identifications.len(),
        loaded_mesh.identifications.len()
    );
}
