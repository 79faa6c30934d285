//! Temporary repository trees for discovery and loader tests.
//!
//! # Examples
//!
//! ```
//! use forge_blueprint_test_helpers::repo::RepoTree;
//!
//! let tree = RepoTree::new()?;
//! tree.git_root("")?;
//! tree.write("svc/blueprint.cue", "version: \"1.0\"\n")?;
//! assert!(tree.path("svc/blueprint.cue").is_file());
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::{Context, Result, anyhow};
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use tempfile::TempDir;

/// A scratch directory removed when dropped.
#[derive(Debug)]
pub struct RepoTree {
    _temp: TempDir,
    root: Utf8PathBuf,
    dir: Dir,
}

impl RepoTree {
    /// Create an empty tree.
    ///
    /// # Errors
    ///
    /// Fails when the temporary directory cannot be created or is not UTF-8.
    pub fn new() -> Result<Self> {
        let temp = TempDir::new().context("create temporary directory")?;
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf())
            .map_err(|path| anyhow!("temporary path is not UTF-8: {}", path.display()))?;
        let dir = Dir::open_ambient_dir(&root, ambient_authority())
            .with_context(|| format!("open {root}"))?;
        Ok(Self {
            _temp: temp,
            root,
            dir,
        })
    }

    /// Absolute path of the tree root.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Absolute path of `rel` inside the tree.
    #[must_use]
    pub fn path(&self, rel: &str) -> Utf8PathBuf {
        self.root.join(rel)
    }

    /// Write `contents` to `rel`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Fails on any filesystem error.
    pub fn write(&self, rel: &str, contents: &str) -> Result<Utf8PathBuf> {
        if let Some(parent) = Utf8Path::new(rel).parent().filter(|p| !p.as_str().is_empty()) {
            self.dir
                .create_dir_all(parent)
                .with_context(|| format!("create {parent}"))?;
        }
        self.dir
            .write(rel, contents)
            .with_context(|| format!("write {rel}"))?;
        Ok(self.path(rel))
    }

    /// Create the directory `rel` and any missing parents.
    ///
    /// # Errors
    ///
    /// Fails on any filesystem error.
    pub fn mkdir(&self, rel: &str) -> Result<Utf8PathBuf> {
        if !rel.is_empty() {
            self.dir
                .create_dir_all(rel)
                .with_context(|| format!("create {rel}"))?;
        }
        Ok(self.path(rel))
    }

    /// Mark `rel` as a repository root by creating `rel/.git`.
    ///
    /// # Errors
    ///
    /// Fails on any filesystem error.
    pub fn git_root(&self, rel: &str) -> Result<Utf8PathBuf> {
        let marker = Utf8Path::new(rel).join(".git");
        self.dir
            .create_dir_all(&marker)
            .with_context(|| format!("create {marker}"))?;
        Ok(self.path(rel))
    }
}
