//! Geometry builders for the test scenarios. Every builder returns a
//! model with its identifications already processed, ready for the
//! pipeline.

use brep_geometry::closure::process_identifications;
use brep_geometry::{
    Arc3d, Curve, EdgeShape, FaceShape, GeometryModel, Identification, IdentificationKind,
    Line3d, Plane3d, Point3d, ShapeRef, Surface, Transform, Vec3, VertexShape,
};

/// A single straight edge between two points. Dimension 1.
pub fn segment_model(a: Point3d, b: Point3d) -> GeometryModel {
    let mut model = GeometryModel::new();
    model.dimension = 1;
    model.vertices.push(VertexShape::new(a));
    model.vertices.push(VertexShape::new(b));
    model
        .edges
        .push(EdgeShape::new(Curve::Line(Line3d::new(a, b)), 0, 1));
    model.update_bounding_box();
    process_identifications(&mut model);
    model
}

/// The four side faces spanning between two parallel unit squares at
/// z = 0 and z = 1. Each bottom edge is CLOSESURFACES-identified with the
/// top edge above it, so every side face is a connecting ribbon.
///
/// Layout: vertices 0-3 bottom, 4-7 top; edges 0-3 bottom, 4-7 top,
/// 8-11 vertical; faces 0-3 are the sides.
pub fn parallel_plates() -> GeometryModel {
    let mut model = GeometryModel::new();
    model.dimension = 2;

    let corners = [
        Point3d::new(0.0, 0.0, 0.0),
        Point3d::new(1.0, 0.0, 0.0),
        Point3d::new(1.0, 1.0, 0.0),
        Point3d::new(0.0, 1.0, 0.0),
    ];
    for p in corners {
        model.vertices.push(VertexShape::new(p));
    }
    for p in corners {
        model
            .vertices
            .push(VertexShape::new(Point3d::new(p.x, p.y, 1.0)));
    }

    // bottom ring 0-3, top ring 4-7
    for ring in 0..2 {
        let base = 4 * ring;
        for i in 0..4 {
            let v0 = base + i;
            let v1 = base + (i + 1) % 4;
            model.edges.push(EdgeShape::new(
                Curve::Line(Line3d::new(
                    model.vertices[v0].point,
                    model.vertices[v1].point,
                )),
                v0,
                v1,
            ));
        }
    }
    // verticals 8-11
    for i in 0..4 {
        model.edges.push(EdgeShape::new(
            Curve::Line(Line3d::new(
                model.vertices[i].point,
                model.vertices[i + 4].point,
            )),
            i,
            i + 4,
        ));
    }

    // side faces, one per bottom edge
    for i in 0..4 {
        let next = (i + 1) % 4;
        let p0 = model.vertices[i].point;
        let p1 = model.vertices[next].point;
        let u_axis = p1 - p0;
        let plane = Plane3d::new(p0, u_axis, Vec3::Z, (0.0, u_axis.length()), (0.0, 1.0));
        model.faces.push(FaceShape::new(
            Surface::Plane(plane),
            vec![i, i + 4, 8 + i, 8 + next],
        ));
    }
    for i in 0..4 {
        model.edges[i].domin = Some(i);
        model.edges[i + 4].domin = Some(i);
        model.edges[8 + i].domin = Some(i);
        model.edges[8 + i].domout = Some((i + 3) % 4);
    }

    let trafo = Transform::translation(0.0, 0.0, 1.0);
    for i in 0..4 {
        model.edges[i].identifications.push(Identification {
            from: ShapeRef::edge(i),
            to: ShapeRef::edge(i + 4),
            trafo: Some(trafo),
            kind: IdentificationKind::CloseSurfaces,
            name: "plates".into(),
        });
    }

    model.update_bounding_box();
    process_identifications(&mut model);
    model
}

/// A closed circular edge whose single vertex carries a CLOSESURFACES
/// identification with itself (the degenerate record a closed seam
/// produces).
pub fn closed_circle(radius: f64) -> GeometryModel {
    let mut model = GeometryModel::new();
    model.dimension = 1;
    let start = Point3d::new(radius, 0.0, 0.0);
    model.vertices.push(VertexShape::new(start));
    model.vertices[0].identifications.push(Identification {
        from: ShapeRef::vertex(0),
        to: ShapeRef::vertex(0),
        trafo: None,
        kind: IdentificationKind::CloseSurfaces,
        name: "seam".into(),
    });
    model.edges.push(EdgeShape::new(
        Curve::Arc(Arc3d::full_circle(Point3d::ORIGIN, Vec3::Z, Vec3::X, radius)),
        0,
        0,
    ));
    model.update_bounding_box();
    process_identifications(&mut model);
    model
}

/// Two unit-square faces at z = 0 and z = 1, the upper one identified to
/// the lower under a rotation by 90 degrees about the square center plus
/// the unit z translation. The upper face and its edges become
/// non-primary and are meshed by copying.
///
/// Layout: vertices 0-3 bottom, 4-7 top; edges 0-3 bottom ring, 4-7 top
/// ring; face 0 bottom, face 1 top.
pub fn rotated_square_pair() -> GeometryModel {
    let mut model = GeometryModel::new();
    model.dimension = 2;

    let corners = [
        Point3d::new(0.0, 0.0, 0.0),
        Point3d::new(1.0, 0.0, 0.0),
        Point3d::new(1.0, 1.0, 0.0),
        Point3d::new(0.0, 1.0, 0.0),
    ];
    for p in corners {
        model.vertices.push(VertexShape::new(p));
    }
    for p in corners {
        model
            .vertices
            .push(VertexShape::new(Point3d::new(p.x, p.y, 1.0)));
    }
    for ring in 0..2 {
        let base = 4 * ring;
        for i in 0..4 {
            let v0 = base + i;
            let v1 = base + (i + 1) % 4;
            model.edges.push(EdgeShape::new(
                Curve::Line(Line3d::new(
                    model.vertices[v0].point,
                    model.vertices[v1].point,
                )),
                v0,
                v1,
            ));
        }
    }

    for ring in 0..2 {
        let z = ring as f64;
        let plane = Plane3d::new(
            Point3d::new(0.0, 0.0, z),
            Vec3::X,
            Vec3::Y,
            (0.0, 1.0),
            (0.0, 1.0),
        );
        let base = 4 * ring;
        let mut face = FaceShape::new(
            Surface::Plane(plane),
            vec![base, base + 1, base + 2, base + 3],
        );
        face.domin = Some(0);
        model.faces.push(face);
        for i in 0..4 {
            model.edges[base + i].domin = Some(ring);
        }
    }

    let trafo = Transform::translation(0.0, 0.0, 1.0).compose(&Transform::rotation_about(
        Point3d::new(0.5, 0.5, 0.0),
        Vec3::Z,
        std::f64::consts::FRAC_PI_2,
    ));
    model.faces[0].identifications.push(Identification {
        from: ShapeRef::face(0),
        to: ShapeRef::face(1),
        trafo: Some(trafo),
        kind: IdentificationKind::Periodic,
        name: "rotated".into(),
    });

    model.update_bounding_box();
    process_identifications(&mut model);
    model
}

/// A single unit-square face with its four boundary edges. Dimension 2.
pub fn square_face_model() -> GeometryModel {
    let mut model = GeometryModel::new();
    model.dimension = 2;
    let corners = [
        Point3d::new(0.0, 0.0, 0.0),
        Point3d::new(1.0, 0.0, 0.0),
        Point3d::new(1.0, 1.0, 0.0),
        Point3d::new(0.0, 1.0, 0.0),
    ];
    for p in corners {
        model.vertices.push(VertexShape::new(p));
    }
    for i in 0..4 {
        let v1 = (i + 1) % 4;
        let mut edge = EdgeShape::new(
            Curve::Line(Line3d::new(corners[i], corners[v1])),
            i,
            v1,
        );
        edge.domin = Some(0);
        model.edges.push(edge);
    }
    let plane = Plane3d::new(Point3d::ORIGIN, Vec3::X, Vec3::Y, (0.0, 1.0), (0.0, 1.0));
    model
        .faces
        .push(FaceShape::new(Surface::Plane(plane), vec![0, 1, 2, 3]));
    model.update_bounding_box();
    process_identifications(&mut model);
    model
}

/// Two long parallel straight edges a small distance apart, inside a
/// much larger bounding box, for the close-edge sizing pass.
pub fn close_parallel_edges(length: f64, distance: f64) -> GeometryModel {
    let mut model = GeometryModel::new();
    model.dimension = 1;
    let pts = [
        Point3d::ORIGIN,
        Point3d::new(length, 0.0, 0.0),
        Point3d::new(0.0, distance, 0.0),
        Point3d::new(length, distance, 0.0),
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
    model.update_bounding_box();
    process_identifications(&mut model);
    model
}
