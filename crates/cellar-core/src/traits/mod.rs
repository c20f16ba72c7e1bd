//! Core traits for cellar collaborators.

mod driver;
mod sink;

pub use driver::*;
pub use sink::*;
