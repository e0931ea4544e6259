//! The dashboard's map component and the page data around it.

pub mod component;
pub mod config;
pub mod data;

pub use component::*;
pub use config::*;
pub use data::*;
pub use formats::LoadError;
