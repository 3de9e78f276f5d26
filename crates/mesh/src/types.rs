use serde::{Deserialize, Serialize};

use brep_geometry::{Point3d, Uv};

/// Index of a mesh point. 0-based and stable: points are never removed.
pub type PointIndex = usize;

/// Which manifold a mesh point originated on. Ordered from most to least
/// constrained; a point may only be weakened, never promoted (an
/// EDGEPOINT can never become a FIXEDPOINT).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PointType {
    Fixed,
    Edge,
    Surface,
    Inner,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshPoint {
    pub p: Point3d,
    pub layer: i32,
    pub point_type: PointType,
    /// High-order refinement factor at singular points.
    pub singularity: f64,
}

/// Geometric info of a segment endpoint: surface parameters of the
/// bounding face, the edge parameter, and the owning edge index.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct EdgePointGeomInfo {
    pub u: f64,
    pub v: f64,
    /// Parameter along the edge in [0, 1].
    pub dist: f64,
    /// 0-based geometry edge index.
    pub edgenr: usize,
}

/// A 1D boundary mesh element.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    pub points: [PointIndex; 2],
    /// 1-based geometry edge number (0 = unset).
    pub edgenr: usize,
    /// Surface/boundary index, equal to `edgenr` for geometry edges.
    pub si: usize,
    pub epgeominfo: [EdgePointGeomInfo; 2],
    pub singedge_left: f64,
    pub singedge_right: f64,
    /// 1-based adjacent face numbers (0 = none).
    pub domin: usize,
    pub domout: usize,
}

impl Segment {
    pub fn swap_direction(&mut self) {
        self.points.swap(0, 1);
        self.epgeominfo.swap(0, 1);
    }
}

/// A 2D surface element: a triangle or a quad, with per-corner surface
/// parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Element2d {
    pub pnums: Vec<PointIndex>,
    pub geom_info: Vec<Uv>,
    /// 1-based face number the element lies on.
    pub face_index: usize,
}

impl Element2d {
    pub fn triangle(pnums: [PointIndex; 3], geom_info: [Uv; 3], face_index: usize) -> Self {
        Self {
            pnums: pnums.to_vec(),
            geom_info: geom_info.to_vec(),
            face_index,
        }
    }

    pub fn quad(pnums: [PointIndex; 4], geom_info: [Uv; 4], face_index: usize) -> Self {
        Self {
            pnums: pnums.to_vec(),
            geom_info: geom_info.to_vec(),
            face_index,
        }
    }

    pub fn is_quad(&self) -> bool {
        self.pnums.len() == 4
    }

    /// Corner point with cyclic 1-based access, as used when probing a
    /// point slightly inside the element.
    pub fn pnum_mod(&self, i: usize) -> PointIndex {
        self.pnums[(i - 1) % self.pnums.len()]
    }

    /// Reverse the winding order.
    pub fn invert(&mut self) {
        self.pnums.reverse();
        self.geom_info.reverse();
    }
}

/// Descriptor of a meshed face: its surface number, adjacent domains and
/// presentation attributes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceDescriptor {
    /// 1-based face number.
    pub surfnr: usize,
    pub domin: usize,
    pub domout: usize,
    pub color: Option<[f32; 4]>,
}

/// A 0d element pinning a geometry vertex into the mesh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointElement {
    pub pnum: PointIndex,
    /// 1-based element index.
    pub index: usize,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_type_ordering() {
        assert!(PointType::Fixed < PointType::Edge);
        assert!(PointType::Edge < PointType::Surface);
        assert!(PointType::Surface < PointType::Inner);
    }

    #[test]
    fn test_element_invert_reverses_winding() {
        let mut el = Element2d::triangle(
            [0, 1, 2],
            [Uv::new(0.0, 0.0), Uv::new(1.0, 0.0), Uv::new(0.0, 1.0)],
            1,
        );
        el.invert();
        assert_eq!(el.pnums, vec![2, 1, 0]);
        assert!((el.geom_info[0].v - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pnum_mod_wraps() {
        let el = Element2d::triangle([5, 6, 7], [Uv::default(); 3], 1);
        assert_eq!(el.pnum_mod(1), 5);
        assert_eq!(el.pnum_mod(4), 5);
        assert_eq!(el.pnum_mod(5), 6);
    }
}
