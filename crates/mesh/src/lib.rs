pub mod identifications;
pub mod localh;
pub mod mesh;
pub mod types;

pub use identifications::MeshIdentifications;
pub use localh::LocalH;
pub use mesh::{Mesh, MeshSizeFileError};
pub use types::{
    EdgePointGeomInfo, Element2d, FaceDescriptor, MeshPoint, PointElement, PointIndex, PointType,
    Segment,
};
