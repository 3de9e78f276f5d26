use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use brep_geometry::Point3d;

/// The pipeline stages, in execution order. `perfstepsstart` and
/// `perfstepsend` carve an inclusive range out of this sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MeshingStep {
    Analyse,
    MeshEdges,
    MeshSurface,
    OptSurface,
    MeshVolume,
    OptVolume,
}

/// A user-pinned mesh size at a point.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MeshSizePoint {
    pub point: Point3d,
    pub h: f64,
    pub layer: i32,
}

impl MeshSizePoint {
    pub fn new(point: Point3d, h: f64) -> Self {
        Self { point, h, layer: 1 }
    }
}

/// All recognized meshing options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshingParameters {
    /// Global upper bound on the local mesh size.
    pub maxh: f64,
    /// Global lower bound on the local mesh size.
    pub minh: f64,
    /// Octree smoothing factor and edge-division safety.
    pub grading: f64,
    /// Edge length divided by this gives the per-edge size bound.
    pub segmentsperedge: f64,
    /// Curvature-to-step multiplier.
    pub curvaturesafety: f64,
    /// Divisor for close-edge distances; `None` disables the pass.
    pub closeedgefac: Option<f64>,
    /// Enables the sizing pass.
    pub uselocalh: bool,
    pub meshsize_points: Vec<MeshSizePoint>,
    pub meshsizefilename: Option<PathBuf>,

    pub perfstepsstart: MeshingStep,
    pub perfstepsend: MeshingStep,

    pub optsteps2d: usize,
    /// Optimization step codes: `s` (topological edge swap), `S` (metric
    /// edge swap), `m` (smooth), `c` (combine).
    pub optimize2d: String,
    pub elsizeweight: f64,
}

impl Default for MeshingParameters {
    fn default() -> Self {
        Self {
            maxh: 1e10,
            minh: 0.0,
            grading: 0.3,
            segmentsperedge: 1.0,
            curvaturesafety: 2.0,
            closeedgefac: None,
            uselocalh: true,
            meshsize_points: Vec::new(),
            meshsizefilename: None,
            perfstepsstart: MeshingStep::Analyse,
            perfstepsend: MeshingStep::OptVolume,
            optsteps2d: 3,
            optimize2d: "smcmSmcmSmcm".to_string(),
            elsizeweight: 0.2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_ordering() {
        assert!(MeshingStep::Analyse < MeshingStep::MeshEdges);
        assert!(MeshingStep::MeshSurface < MeshingStep::OptSurface);
        assert!(MeshingStep::MeshVolume < MeshingStep::OptVolume);
    }

    #[test]
    fn test_default_range_covers_all_steps() {
        let mp = MeshingParameters::default();
        assert_eq!(mp.perfstepsstart, MeshingStep::Analyse);
        assert_eq!(mp.perfstepsend, MeshingStep::OptVolume);
    }
}
