//! Reverse walker over the real filesystem.

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8::Dir};

use super::{EntryKind, ReverseWalker, WalkCallback, WalkEntry, WalkError, absolutize};

/// Walks the host filesystem through `cap-std`.
///
/// Each level is opened as its own capability directory; entries are
/// visited in name order. Symlinks and special files are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsReverseWalker;

impl FsReverseWalker {
    /// Create a filesystem walker.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn visit_level(dir_path: &Utf8Path, callback: &mut WalkCallback<'_>) -> Result<(), WalkError> {
        let dir = Dir::open_ambient_dir(dir_path, ambient_authority())
            .map_err(|err| WalkError::io(dir_path, err))?;
        let mut entries = Vec::new();
        for item in dir.entries().map_err(|err| WalkError::io(dir_path, err))? {
            let entry = item.map_err(|err| WalkError::io(dir_path, err))?;
            let name = entry
                .file_name()
                .map_err(|err| WalkError::io(dir_path, err))?;
            let file_type = entry
                .file_type()
                .map_err(|err| WalkError::io(dir_path.join(&name), err))?;
            let kind = if file_type.is_file() {
                EntryKind::File
            } else if file_type.is_dir() {
                EntryKind::Dir
            } else {
                continue;
            };
            entries.push((name, kind));
        }
        entries.sort_by(|left, right| left.0.cmp(&right.0));

        for (name, kind) in &entries {
            let walk_entry = WalkEntry::in_dir(&dir, dir_path, name, *kind);
            callback(&walk_entry)?;
        }
        Ok(())
    }
}

impl ReverseWalker for FsReverseWalker {
    fn walk(
        &self,
        start: &Utf8Path,
        end: &Utf8Path,
        callback: &mut WalkCallback<'_>,
    ) -> Result<(), WalkError> {
        let start_abs = absolutize(start)?;
        let end_abs = absolutize(end)?;
        if !start_abs.starts_with(&end_abs) {
            return Err(WalkError::OutsideRoot {
                start: start_abs,
                end: end_abs,
            });
        }

        let mut current: Utf8PathBuf = start_abs;
        loop {
            tracing::debug!(dir = %current, "reverse walking directory");
            match Self::visit_level(&current, callback) {
                Ok(()) => {}
                Err(WalkError::Stop) => {
                    tracing::debug!(dir = %current, "reverse walk stopped by callback");
                    return Ok(());
                }
                Err(err) => return Err(err),
            }
            if current == end_abs {
                return Ok(());
            }
            match current.parent() {
                Some(parent) => current = parent.to_owned(),
                None => return Ok(()),
            }
        }
    }
}
