//! Map drawing: palette, the two-pass renderer and its painter backends.

pub mod painter;
pub mod renderer;
pub mod svg;
pub mod symbology;

pub use painter::*;
pub use renderer::*;
pub use svg::*;
pub use symbology::*;
