//! Locate the repository root and the blueprint files beneath it.
//!
//! Discovery never descends into sibling directories: files are collected
//! from the start directory and each of its ancestors up to the root.

use camino::{Utf8Path, Utf8PathBuf};

use crate::walker::{EntryKind, ReverseWalker, WalkError, absolutize};
use crate::{BlueprintError, BlueprintResult, BlueprintResultExt};

/// File name of a blueprint.
pub const BLUEPRINT_FILE_NAME: &str = "blueprint.cue";

/// Entry name marking a version-control root.
pub const VCS_ROOT_MARKER: &str = ".git";

/// A blueprint file found on disk, with its raw contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    path: Utf8PathBuf,
    contents: Vec<u8>,
}

impl DiscoveredFile {
    /// Create a discovered file.
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>, contents: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            contents,
        }
    }

    /// Location of the file.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Raw file contents.
    #[must_use]
    pub fn contents(&self) -> &[u8] {
        &self.contents
    }
}

/// Finds repository roots and blueprint files with a [`ReverseWalker`].
#[derive(Debug, Clone)]
pub struct Discovery<W> {
    walker: W,
    file_name: String,
    root_marker: String,
}

impl<W: ReverseWalker> Discovery<W> {
    /// Discover `blueprint.cue` files bounded by `.git`.
    #[must_use]
    pub fn new(walker: W) -> Self {
        Self {
            walker,
            file_name: BLUEPRINT_FILE_NAME.to_owned(),
            root_marker: VCS_ROOT_MARKER.to_owned(),
        }
    }

    /// Use a different blueprint file name.
    #[must_use]
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    /// Use a different root marker.
    #[must_use]
    pub fn with_root_marker(mut self, marker: impl Into<String>) -> Self {
        self.root_marker = marker.into();
        self
    }

    /// Nearest ancestor of `start` (inclusive) containing the root marker.
    ///
    /// The marker may be a file or a directory.
    ///
    /// # Errors
    ///
    /// Returns [`BlueprintError::RootNotFound`] when no ancestor has the
    /// marker, or a walk error when a directory cannot be read.
    pub fn find_root(&self, start: &Utf8Path) -> BlueprintResult<Utf8PathBuf> {
        let start_abs = absolutize(start).into_blueprint()?;
        let mut root = None;
        self.walker
            .walk(&start_abs, filesystem_root(&start_abs), &mut |entry| {
                if entry.name() == self.root_marker {
                    root = entry.path().parent().map(Utf8Path::to_path_buf);
                    return Err(WalkError::Stop);
                }
                Ok(())
            })
            .into_blueprint()?;
        root.ok_or_else(|| {
            std::sync::Arc::new(BlueprintError::RootNotFound {
                start: start.to_path_buf(),
                marker: self.root_marker.clone(),
            })
        })
    }

    /// Every blueprint file from `start` up to `end`, nearest first.
    ///
    /// # Errors
    ///
    /// Returns a walk error when `start` is not inside `end` or when a
    /// directory or file cannot be read.
    pub fn find_files(
        &self,
        start: &Utf8Path,
        end: &Utf8Path,
    ) -> BlueprintResult<Vec<DiscoveredFile>> {
        let mut files = Vec::new();
        self.walker
            .walk(start, end, &mut |entry| {
                if entry.kind() == EntryKind::File && entry.name() == self.file_name {
                    tracing::debug!(path = %entry.path(), "found blueprint file");
                    files.push(DiscoveredFile::new(entry.path(), entry.read()?));
                }
                Ok(())
            })
            .into_blueprint()?;
        Ok(files)
    }

    /// Files from `start` up to its repository root.
    ///
    /// Without a root, only `start` itself is searched.
    ///
    /// # Errors
    ///
    /// Propagates walk errors; a missing root is not an error.
    pub fn discover(&self, start: &Utf8Path) -> BlueprintResult<Vec<DiscoveredFile>> {
        match self.find_root(start) {
            Ok(root) => {
                tracing::debug!(%root, "found repository root");
                self.find_files(start, &root)
            }
            Err(err) if matches!(err.as_ref(), BlueprintError::RootNotFound { .. }) => {
                tracing::debug!(%start, "no repository root; searching start directory only");
                self.find_files(start, start)
            }
            Err(err) => Err(err),
        }
    }
}

fn filesystem_root(path: &Utf8Path) -> &Utf8Path {
    path.ancestors().last().unwrap_or(path)
}
