pub mod world_anchor;

pub use world_anchor::*;
