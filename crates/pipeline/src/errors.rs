use thiserror::Error;

use brep_geometry::{Point3d, PredicateError};
use brep_mesh::MeshSizeFileError;

/// Errors of the meshing pipeline. Cancellation is not an error (stages
/// return early with success); divider stalls and 2D-mesher failures are
/// reported through warnings and counters instead of this type.
#[derive(Debug, Error)]
pub enum MeshingError {
    #[error("cannot find mapped point {point:?} (tag {tag})")]
    NotFound { point: Point3d, tag: i64 },

    #[error(transparent)]
    NotImplemented(#[from] PredicateError),

    #[error("surface mapping failed: {0}")]
    MappingFailed(String),

    #[error("volume meshing failed")]
    VolumeFailed,

    #[error(transparent)]
    MeshSizeFile(#[from] MeshSizeFileError),
}
