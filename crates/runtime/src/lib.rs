pub mod event_bus;
pub mod frame;
pub mod map;
pub mod viewport;

pub use event_bus::*;
pub use frame::*;
pub use map::*;
pub use viewport::*;
