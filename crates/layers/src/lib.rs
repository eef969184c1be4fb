pub mod animation;
pub mod layer;
pub mod pillar;
pub mod placement;

pub use layer::*;
pub use placement::*;
