//! Core types for cellar.

mod backup;
mod container;
mod outcome;

pub use backup::*;
pub use container::*;
pub use outcome::*;
