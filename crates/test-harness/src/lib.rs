pub mod assertions;
pub mod builders;
pub mod mock;

pub use assertions::*;
pub use builders::*;
pub use mock::{MockOptimizer, MockSurfaceMesher, MockVolumeMesher};
