use serde::{Deserialize, Serialize};

use crate::curves::Curve;
use crate::point::Point3d;
use crate::surfaces::Surface;
use crate::transform::Transform;

/// The kind of B-Rep entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    Vertex,
    Edge,
    Face,
    Solid,
}

/// Address of a shape: its kind plus its index in the owning list.
/// After closure the index equals the shape's `nr`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShapeRef {
    pub kind: ShapeKind,
    pub nr: usize,
}

impl ShapeRef {
    pub fn vertex(nr: usize) -> Self {
        Self {
            kind: ShapeKind::Vertex,
            nr,
        }
    }

    pub fn edge(nr: usize) -> Self {
        Self {
            kind: ShapeKind::Edge,
            nr,
        }
    }

    pub fn face(nr: usize) -> Self {
        Self {
            kind: ShapeKind::Face,
            nr,
        }
    }
}

/// What an identification means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdentificationKind {
    Periodic,
    CloseSurfaces,
    Other,
}

/// A declared pairing of two shapes. Directional: `from` maps onto `to`
/// via `trafo`. A missing transformation means downstream code projects
/// instead of transforming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identification {
    pub from: ShapeRef,
    pub to: ShapeRef,
    pub trafo: Option<Transform>,
    pub kind: IdentificationKind,
    pub name: String,
}

/// User-facing shape attributes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShapeProperties {
    pub name: Option<String>,
    pub layer: i32,
    pub color: Option<[f32; 4]>,
    /// High-order refinement factor, forwarded to segment singularities.
    pub hpref: f64,
    /// Pre-chosen interior partition parameters for an edge.
    pub partition: Option<Vec<f64>>,
}

impl ShapeProperties {
    pub fn new() -> Self {
        Self {
            layer: 1,
            ..Default::default()
        }
    }

    pub fn get_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| "default".to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VertexShape {
    pub point: Point3d,
    pub nr: usize,
    pub properties: ShapeProperties,
    pub identifications: Vec<Identification>,
    pub primary: usize,
    pub primary_to_me: Option<Transform>,
}

impl VertexShape {
    pub fn new(point: Point3d) -> Self {
        Self {
            point,
            nr: 0,
            properties: ShapeProperties::new(),
            identifications: Vec::new(),
            primary: 0,
            primary_to_me: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeShape {
    pub curve: Curve,
    /// Start/end vertex indices.
    pub start: usize,
    pub end: usize,
    /// Adjacent face to the left/right of the edge, if any.
    pub domin: Option<usize>,
    pub domout: Option<usize>,
    pub nr: usize,
    pub properties: ShapeProperties,
    pub identifications: Vec<Identification>,
    pub primary: usize,
    pub primary_to_me: Option<Transform>,
}

impl EdgeShape {
    pub fn new(curve: Curve, start: usize, end: usize) -> Self {
        Self {
            curve,
            start,
            end,
            domin: None,
            domout: None,
            nr: 0,
            properties: ShapeProperties::new(),
            identifications: Vec::new(),
            primary: 0,
            primary_to_me: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceShape {
    pub surface: Surface,
    /// Boundary edge indices, in loop order.
    pub edges: Vec<usize>,
    /// Interior vertices to seed into the 2D mesher.
    pub extra_vertices: Vec<usize>,
    /// Solid domain to the left/right of the face, if any.
    pub domin: Option<usize>,
    pub domout: Option<usize>,
    pub nr: usize,
    pub properties: ShapeProperties,
    pub identifications: Vec<Identification>,
    pub primary: usize,
    pub primary_to_me: Option<Transform>,
}

impl FaceShape {
    pub fn new(surface: Surface, edges: Vec<usize>) -> Self {
        Self {
            surface,
            edges,
            extra_vertices: Vec::new(),
            domin: None,
            domout: None,
            nr: 0,
            properties: ShapeProperties::new(),
            identifications: Vec::new(),
            primary: 0,
            primary_to_me: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolidShape {
    pub faces: Vec<usize>,
    pub nr: usize,
    pub properties: ShapeProperties,
    pub identifications: Vec<Identification>,
    pub primary: usize,
    pub primary_to_me: Option<Transform>,
}

impl SolidShape {
    pub fn new(faces: Vec<usize>) -> Self {
        Self {
            faces,
            nr: 0,
            properties: ShapeProperties::new(),
            identifications: Vec::new(),
            primary: 0,
            primary_to_me: None,
        }
    }
}

/// Uniform access to the identification-related fields of a shape list.
pub(crate) trait ShapeTopology {
    fn nr(&self) -> usize;
    fn set_nr(&mut self, nr: usize);
    fn identifications(&self) -> &[Identification];
    fn identifications_mut(&mut self) -> &mut Vec<Identification>;
    fn primary(&self) -> usize;
    fn set_primary(&mut self, nr: usize);
    fn primary_to_me(&self) -> Option<Transform>;
    fn set_primary_to_me(&mut self, t: Option<Transform>);
}

macro_rules! impl_shape_topology {
    ($ty:ty) => {
        impl ShapeTopology for $ty {
            fn nr(&self) -> usize {
                self.nr
            }
            fn set_nr(&mut self, nr: usize) {
                self.nr = nr;
            }
            fn identifications(&self) -> &[Identification] {
                &self.identifications
            }
            fn identifications_mut(&mut self) -> &mut Vec<Identification> {
                &mut self.identifications
            }
            fn primary(&self) -> usize {
                self.primary
            }
            fn set_primary(&mut self, nr: usize) {
                self.primary = nr;
            }
            fn primary_to_me(&self) -> Option<Transform> {
                self.primary_to_me
            }
            fn set_primary_to_me(&mut self, t: Option<Transform>) {
                self.primary_to_me = t;
            }
        }
    };
}

impl_shape_topology!(VertexShape);
impl_shape_topology!(EdgeShape);
impl_shape_topology!(FaceShape);
