//! Non-fatal conditions reported while loading.

use std::fmt;
use std::sync::{Mutex, PoisonError};

use crate::SemVer;

/// A condition worth reporting that does not stop the load.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LoadWarning {
    /// The blueprint's minor version is newer than the schema's.
    MinorVersionAhead {
        /// Version chosen for the merged blueprint.
        version: SemVer,
        /// Version of the schema.
        supported: SemVer,
    },
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MinorVersionAhead { version, supported } => write!(
                f,
                "the minor version of the blueprint ({version}) is greater than the supported version ({supported})"
            ),
        }
    }
}

/// Receives warnings from a loader.
pub trait WarningSink: Send + Sync {
    /// Report `warning`.
    fn warn(&self, warning: &LoadWarning);
}

/// Forwards warnings to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl WarningSink for TracingSink {
    fn warn(&self, warning: &LoadWarning) {
        tracing::warn!(%warning, "blueprint warning");
    }
}

/// Keeps every warning it receives.
#[derive(Debug, Default)]
pub struct CollectingSink {
    warnings: Mutex<Vec<LoadWarning>>,
}

impl CollectingSink {
    /// Create an empty sink.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            warnings: Mutex::new(Vec::new()),
        }
    }

    /// Warnings received so far, oldest first.
    #[must_use]
    pub fn warnings(&self) -> Vec<LoadWarning> {
        self.warnings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl WarningSink for CollectingSink {
    fn warn(&self, warning: &LoadWarning) {
        self.warnings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(warning.clone());
    }
}
