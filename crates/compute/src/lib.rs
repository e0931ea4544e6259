pub mod analysis;
pub mod counter;

pub use analysis::*;
pub use counter::*;
