pub mod collaborators;
pub mod driver;
pub mod edges;
pub mod errors;
pub mod map_surface;
pub mod params;
pub mod point_tree;
pub mod progress;
pub mod sizing;
pub mod surface;

pub use collaborators::{MesherStatus, SurfaceMesher, SurfaceOptimizer, VolumeMesher};
pub use driver::{generate_mesh, Collaborators};
pub use edges::{divide_edge, mesh_edges};
pub use errors::MeshingError;
pub use map_surface::map_surface_mesh;
pub use params::{MeshSizePoint, MeshingParameters, MeshingStep};
pub use point_tree::{BoxTree, PointTree};
pub use progress::{NullProgress, Progress, RecordingProgress, TaskGuard};
pub use sizing::analyse;
pub use surface::{face_boundary, mesh_surface};
