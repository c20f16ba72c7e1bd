//! Versioned store module.

mod clock;
mod hooks;
mod main;
mod options;
mod snapshot;
mod transfer;

#[cfg(test)]
mod test_support;

pub use hooks::HookKind;
pub use main::VersionedStore;
pub use options::{ContentHash, ProvideKey, StoreOptions, TypePredicate};
