//! Extensions for mapping errors to `BlueprintResult` concisely.
//!
//! These helpers replace `.map_err(|e| Arc::new(BlueprintError::from(e)))`
//! when converting error types that implement `Into<BlueprintError>`.
//!
//! # Examples
//!
//! ```
//! use forge_blueprint::{BlueprintResult, BlueprintResultExt, constraint::Path};
//!
//! fn parse(text: &str) -> BlueprintResult<Path> {
//!     Path::parse(text).into_blueprint()
//! }
//!
//! assert!(parse("project.name").is_ok());
//! assert!(parse("project.").is_err());
//! ```

use std::sync::Arc;

use crate::{BlueprintError, BlueprintResult};

/// Maps any `Result<T, E>` with `E: Into<BlueprintError>` into a
/// [`BlueprintResult<T>`].
pub trait BlueprintResultExt<T, E> {
    /// Convert `Result<T, E>` into `BlueprintResult<T>` using `Into<BlueprintError>`.
    ///
    /// # Errors
    ///
    /// Propagates the original error after conversion into `Arc<BlueprintError>`.
    fn into_blueprint(self) -> BlueprintResult<T>;
}

impl<T, E> BlueprintResultExt<T, E> for Result<T, E>
where
    E: Into<BlueprintError>,
{
    fn into_blueprint(self) -> BlueprintResult<T> {
        self.map_err(|e| Arc::new(e.into()))
    }
}
