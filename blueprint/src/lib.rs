//! Hierarchical blueprint loading for Catalyst Forge.
//!
//! A blueprint is a `blueprint.cue` file written in a small, typed,
//! unification-based constraint language. Blueprints found between a start
//! directory and its repository root are merged, bound to environment
//! variables and validated against an embedded schema.
//!
//! The entry point is [`loader::DefaultBlueprintLoader`]:
//!
//! ```no_run
//! use camino::Utf8Path;
//! use forge_blueprint::loader::{BlueprintLoader, DefaultBlueprintLoader};
//!
//! let blueprint = DefaultBlueprintLoader::default().load(Utf8Path::new("."))?;
//! let json = blueprint.marshal_json()?;
//! # let _ = json;
//! # Ok::<(), std::sync::Arc<forge_blueprint::BlueprintError>>(())
//! ```

use std::sync::Arc;

pub mod constraint;
pub mod discovery;
mod error;
pub mod file;
pub mod injector;
pub mod loader;
pub mod merge;
mod result_ext;
pub mod schema;
pub mod version;
pub mod walker;

pub use error::{BlueprintError, ErrorKind, Stage};
pub use loader::{BlueprintLoader, DefaultBlueprintLoader, LoaderBuilder, RawBlueprint};
pub use result_ext::BlueprintResultExt;
pub use version::{SemVer, VersionError};

/// Result type used throughout the crate.
///
/// Errors are shared so that callers can clone and aggregate them.
pub type BlueprintResult<T> = Result<T, Arc<BlueprintError>>;
