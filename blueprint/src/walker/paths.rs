//! Lexical path helpers for walk bounds.

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};

use super::WalkError;

/// Join a relative path onto the current directory and normalise it.
///
/// # Errors
///
/// Returns [`WalkError::Io`] when the current directory cannot be read or is
/// not valid UTF-8.
pub fn absolutize(path: &Utf8Path) -> Result<Utf8PathBuf, WalkError> {
    if path.is_absolute() {
        return Ok(normalize(path));
    }
    let raw_cwd = std::env::current_dir().map_err(|err| WalkError::io(path, err))?;
    let cwd = Utf8PathBuf::try_from(raw_cwd).map_err(|err| {
        WalkError::io(
            path,
            std::io::Error::other(format!("current directory is not valid UTF-8: {err}")),
        )
    })?;
    Ok(normalize(&cwd.join(path)))
}

/// Remove `.` components and fold `..` into the preceding component.
///
/// The filesystem is not consulted, so symlinks are left as written.
#[must_use]
pub fn normalize(path: &Utf8Path) -> Utf8PathBuf {
    let mut out = Utf8PathBuf::new();
    for component in path.components() {
        match component {
            Utf8Component::CurDir => {}
            Utf8Component::ParentDir => {
                if out.file_name().is_some() {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            Utf8Component::Prefix(_) | Utf8Component::RootDir | Utf8Component::Normal(_) => {
                out.push(component.as_str());
            }
        }
    }
    if out.as_str().is_empty() {
        out.push(".");
    }
    out
}
