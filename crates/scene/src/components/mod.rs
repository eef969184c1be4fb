pub mod bounds;
pub mod drawable3d;
pub mod light;

pub use bounds::*;
pub use drawable3d::*;
pub use light::*;
