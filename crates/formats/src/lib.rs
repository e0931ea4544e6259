pub mod boundary;
pub mod shelter_feed;
pub mod source;

pub use boundary::*;
pub use shelter_feed::*;
pub use source::*;
