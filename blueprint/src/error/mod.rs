//! Error types produced by the blueprint loader.

mod conversions;
mod kind;
mod types;

pub use kind::{ErrorKind, Stage};
pub use types::BlueprintError;
