//! Bottom-up directory traversal.
//!
//! A [`ReverseWalker`] visits a start directory, then each of its ancestors
//! up to and including an end directory. Within each level the callback
//! sees every regular file and subdirectory; sibling subtrees are never
//! entered. Returning [`WalkError::Stop`] from the callback ends the walk
//! successfully.

mod entry;
mod fs;
mod paths;

pub use entry::{EntryKind, ReadSeek, WalkEntry};
pub use fs::FsReverseWalker;
pub use paths::{absolutize, normalize};

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

/// Errors raised by a reverse walk or returned from its callback.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WalkError {
    /// Halt the walk and report success.
    #[error("walk stopped")]
    Stop,

    /// The start directory does not lie inside the end directory.
    #[error("'{start}' is not inside '{end}'")]
    OutsideRoot {
        /// Normalised start directory.
        start: Utf8PathBuf,
        /// Normalised end directory.
        end: Utf8PathBuf,
    },

    /// Reading a directory or opening a file failed.
    #[error("I/O error at '{path}': {source}")]
    Io {
        /// Path being accessed.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The callback failed with its own error.
    #[error(transparent)]
    Callback(Box<dyn std::error::Error + Send + Sync>),
}

impl WalkError {
    /// Wrap an I/O error with the path it occurred at.
    pub fn io(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Callback invoked for each entry visited by a [`ReverseWalker`].
pub type WalkCallback<'c> = dyn FnMut(&WalkEntry<'_>) -> Result<(), WalkError> + 'c;

/// Walks from a directory towards one of its ancestors.
pub trait ReverseWalker: Send + Sync {
    /// Visit `start` and every ancestor up to and including `end`.
    ///
    /// # Errors
    ///
    /// Returns [`WalkError::OutsideRoot`] when `start` is not inside `end`,
    /// [`WalkError::Io`] when a directory cannot be read, and any error the
    /// callback returns other than [`WalkError::Stop`].
    fn walk(
        &self,
        start: &Utf8Path,
        end: &Utf8Path,
        callback: &mut WalkCallback<'_>,
    ) -> Result<(), WalkError>;
}

impl<W: ReverseWalker + ?Sized> ReverseWalker for &W {
    fn walk(
        &self,
        start: &Utf8Path,
        end: &Utf8Path,
        callback: &mut WalkCallback<'_>,
    ) -> Result<(), WalkError> {
        (**self).walk(start, end, callback)
    }
}

impl<W: ReverseWalker + ?Sized> ReverseWalker for std::sync::Arc<W> {
    fn walk(
        &self,
        start: &Utf8Path,
        end: &Utf8Path,
        callback: &mut WalkCallback<'_>,
    ) -> Result<(), WalkError> {
        (**self).walk(start, end, callback)
    }
}
