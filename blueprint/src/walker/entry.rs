//! Entries handed to walk callbacks.

use std::io::{Cursor, Read, Seek};

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::fs_utf8::Dir;

use super::WalkError;

/// Readable, seekable file handle.
pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek + ?Sized> ReadSeek for T {}

/// Kind of a visited entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Regular file.
    File,
    /// Directory.
    Dir,
}

#[derive(Debug)]
enum Source<'a> {
    Dir { dir: &'a Dir, name: &'a str },
    Bytes(&'a [u8]),
}

/// A file or directory visited during a reverse walk.
#[derive(Debug)]
pub struct WalkEntry<'a> {
    path: Utf8PathBuf,
    kind: EntryKind,
    source: Source<'a>,
}

impl<'a> WalkEntry<'a> {
    pub(super) fn in_dir(dir: &'a Dir, parent: &Utf8Path, name: &'a str, kind: EntryKind) -> Self {
        Self {
            path: parent.join(name),
            kind,
            source: Source::Dir { dir, name },
        }
    }

    /// Build an entry backed by in-memory contents.
    ///
    /// Custom [`ReverseWalker`](super::ReverseWalker) implementations use this
    /// to hand callbacks a file that does not live on disk.
    #[must_use]
    pub fn in_memory(path: impl Into<Utf8PathBuf>, kind: EntryKind, contents: &'a [u8]) -> Self {
        Self {
            path: path.into(),
            kind,
            source: Source::Bytes(contents),
        }
    }

    /// Full path of the entry.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Final component of the entry's path.
    #[must_use]
    pub fn name(&self) -> &str {
        self.path.file_name().unwrap_or_default()
    }

    /// Whether the entry is a file or a directory.
    #[must_use]
    pub const fn kind(&self) -> EntryKind {
        self.kind
    }

    /// Open the entry for reading.
    ///
    /// The handle is owned by the caller and closed when dropped.
    ///
    /// # Errors
    ///
    /// Returns [`WalkError::Io`] when the entry is a directory or the file
    /// cannot be opened.
    pub fn open(&self) -> Result<Box<dyn ReadSeek + 'a>, WalkError> {
        if self.kind == EntryKind::Dir {
            return Err(WalkError::io(
                self.path.clone(),
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a regular file"),
            ));
        }
        match self.source {
            Source::Dir { dir, name } => dir
                .open(name)
                .map(|file| Box::new(file) as Box<dyn ReadSeek + 'a>)
                .map_err(|err| WalkError::io(self.path.clone(), err)),
            Source::Bytes(bytes) => Ok(Box::new(Cursor::new(bytes))),
        }
    }

    /// Read the whole file.
    ///
    /// # Errors
    ///
    /// Returns [`WalkError::Io`] when the file cannot be opened or read.
    pub fn read(&self) -> Result<Vec<u8>, WalkError> {
        let mut handle = self.open()?;
        let mut contents = Vec::new();
        handle
            .read_to_end(&mut contents)
            .map_err(|err| WalkError::io(self.path.clone(), err))?;
        Ok(contents)
    }
}
