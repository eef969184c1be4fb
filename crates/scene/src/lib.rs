pub mod camera;
pub mod components;
pub mod error;
pub mod graph;
pub mod node;
pub mod picking;
pub mod prefabs;

pub use camera::*;
pub use error::*;
pub use graph::*;
pub use node::*;
