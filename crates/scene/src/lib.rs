pub mod animation;
pub mod picking;
pub mod region;
pub mod value;
pub mod view;

pub use animation::*;
pub use picking::*;
pub use region::*;
pub use value::*;
pub use view::*;
