//! Loading a single blueprint file.

use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};

use crate::constraint::{Path, Value, compile};
use crate::injector::Injector;
use crate::version::{self, VERSION_FIELD, VersionError};
use crate::{BlueprintError, BlueprintResult, SemVer};

/// A compiled blueprint file with its version split off.
#[derive(Debug, Clone, PartialEq)]
pub struct BlueprintFile {
    path: Utf8PathBuf,
    value: Value,
    version: SemVer,
}

impl BlueprintFile {
    /// Compile `contents`, extract the version and bind environment values.
    ///
    /// The returned value never contains the `version` field, so files with
    /// different versions still merge.
    ///
    /// # Errors
    ///
    /// Fails when the source does not compile, lacks a valid version, or is
    /// not concrete after environment injection.
    pub fn load(
        file_path: impl Into<Utf8PathBuf>,
        contents: &[u8],
        injector: &Injector,
    ) -> BlueprintResult<Self> {
        let path = file_path.into();
        tracing::info!(%path, "loading blueprint file");

        let compiled = compile(contents).map_err(|source| {
            Arc::new(BlueprintError::Compile {
                path: path.clone(),
                source,
            })
        })?;

        let version = version::extract(&compiled).map_err(|err| {
            Arc::new(match err {
                VersionError::Missing => BlueprintError::VersionMissing { path: path.clone() },
                other => BlueprintError::VersionInvalid {
                    path: path.clone(),
                    source: other,
                },
            })
        })?;

        let stripped = compiled
            .delete(&Path::root().child(VERSION_FIELD))
            .map_err(|source| Arc::new(BlueprintError::Path { source }))?;
        let value = injector.inject(&stripped);
        value.validate_concrete().map_err(|violations| {
            tracing::error!(%path, "blueprint file is not concrete");
            Arc::new(BlueprintError::InvalidFile {
                path: path.clone(),
                violations,
            })
        })?;

        tracing::debug!(%path, %version, "loaded blueprint file");
        Ok(Self {
            path,
            value,
            version,
        })
    }

    /// Location of the file.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// The file's value without its `version` field.
    #[must_use]
    pub const fn value(&self) -> &Value {
        &self.value
    }

    /// Version declared by the file.
    #[must_use]
    pub const fn version(&self) -> SemVer {
        self.version
    }
}

#[cfg(test)]
mod tests;
