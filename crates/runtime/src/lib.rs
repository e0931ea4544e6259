pub mod event_bus;
pub mod generation;
pub mod scheduler;

pub use event_bus::*;
pub use generation::*;
pub use scheduler::*;
