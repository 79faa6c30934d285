//! Primary error enum for blueprint loading flows.

use camino::Utf8PathBuf;
use thiserror::Error;

use super::{ErrorKind, Stage};
use crate::SemVer;
use crate::constraint::{CompileError, PathError, ViolationKind, Violations};
use crate::version::VersionError;

/// Errors that can occur while loading a blueprint.
///
/// Each message starts with the [`Stage`] that failed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BlueprintError {
    /// A blueprint file failed to compile.
    #[error("{stage}: failed to compile '{path}': {source}", stage = Stage::FileLoading)]
    Compile {
        /// File that failed.
        path: Utf8PathBuf,
        /// Underlying compiler error.
        #[source]
        source: CompileError,
    },

    /// A blueprint file has no concrete version.
    #[error(
        "{stage}: '{path}' does not declare a concrete version",
        stage = Stage::FileLoading
    )]
    VersionMissing {
        /// File that failed.
        path: Utf8PathBuf,
    },

    /// A blueprint file declares an unparseable version.
    #[error("{stage}: '{path}' declares an invalid version: {source}", stage = Stage::FileLoading)]
    VersionInvalid {
        /// File that failed.
        path: Utf8PathBuf,
        /// Why the version was rejected.
        #[source]
        source: VersionError,
    },

    /// A single blueprint file is not concrete after environment injection.
    #[error("{stage}: '{path}' is invalid:\n{violations}", stage = Stage::FileLoading)]
    InvalidFile {
        /// File that failed.
        path: Utf8PathBuf,
        /// Every location that failed.
        violations: Violations,
    },

    /// Blueprint files disagree on the major version.
    #[error(
        "{stage}: '{path}' declares version {version} but '{first_path}' declares {first_version}: major versions must match",
        stage = Stage::Merging
    )]
    MajorVersionDivergence {
        /// First file loaded.
        first_path: Utf8PathBuf,
        /// Version of the first file.
        first_version: SemVer,
        /// File whose major version differs.
        path: Utf8PathBuf,
        /// Version of that file.
        version: SemVer,
    },

    /// Blueprint files do not unify.
    #[error("{stage}: blueprint files conflict:\n{violations}", stage = Stage::Merging)]
    Unification {
        /// Every conflicting location.
        violations: Violations,
    },

    /// The final blueprint is not concrete or violates the schema.
    #[error("{stage}: blueprint does not satisfy the schema:\n{violations}", stage = Stage::Validation)]
    SchemaViolation {
        /// Every failing location.
        violations: Violations,
    },

    /// The blueprint's major version differs from the schema's.
    #[error(
        "{stage}: the major version of the blueprint ({version}) is different than the supported version ({supported}): cannot continue",
        stage = Stage::VersionPolicy
    )]
    MajorVersionMismatch {
        /// Version chosen for the merged blueprint.
        version: SemVer,
        /// Version of the schema.
        supported: SemVer,
    },

    /// No repository root marker was found above the start directory.
    #[error(
        "{stage}: no '{marker}' found in '{start}' or any parent directory",
        stage = Stage::Discovery
    )]
    RootNotFound {
        /// Directory the search started from.
        start: Utf8PathBuf,
        /// Entry name that marks a repository root.
        marker: String,
    },

    /// A reverse walk was requested with a start outside its end.
    #[error(
        "{stage}: cannot walk from '{start}' to '{end}': start is not inside end",
        stage = Stage::Discovery
    )]
    InvalidWalk {
        /// Requested start directory.
        start: Utf8PathBuf,
        /// Requested end directory.
        end: Utf8PathBuf,
    },

    /// Filesystem access failed.
    #[error("{stage}: I/O error at '{path}': {source}", stage = Stage::Discovery)]
    Io {
        /// Path being accessed.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A walk callback failed with an error of its own.
    #[error("{stage}: directory walk aborted: {source}", stage = Stage::Discovery)]
    Walk {
        /// Error returned by the callback.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The schema source could not be compiled or is malformed.
    #[error("{stage}: {message}", stage = Stage::Schema)]
    Schema {
        /// What is wrong with the schema.
        message: String,
    },

    /// A path argument was malformed or named nothing.
    #[error("{stage}: {source}", stage = Stage::Decoding)]
    Path {
        /// Underlying path error.
        #[from]
        source: PathError,
    },

    /// A loaded value did not deserialize into the requested type.
    #[error("{stage}: cannot decode '{path}': {source}", stage = Stage::Decoding)]
    Decode {
        /// Path of the decoded value; empty for the root.
        path: String,
        /// Underlying deserialization error.
        #[source]
        source: serde_json::Error,
    },
}

impl BlueprintError {
    /// Stage at which the error occurred.
    #[must_use]
    pub const fn stage(&self) -> Stage {
        match self {
            Self::Compile { .. }
            | Self::VersionMissing { .. }
            | Self::VersionInvalid { .. }
            | Self::InvalidFile { .. } => Stage::FileLoading,
            Self::MajorVersionDivergence { .. } | Self::Unification { .. } => Stage::Merging,
            Self::SchemaViolation { .. } => Stage::Validation,
            Self::MajorVersionMismatch { .. } => Stage::VersionPolicy,
            Self::RootNotFound { .. }
            | Self::InvalidWalk { .. }
            | Self::Io { .. }
            | Self::Walk { .. } => Stage::Discovery,
            Self::Schema { .. } => Stage::Schema,
            Self::Path { .. } | Self::Decode { .. } => Stage::Decoding,
        }
    }

    /// Category of the error.
    ///
    /// Validation failures are classified by their violations: environment
    /// problems take precedence over other kinds.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Compile { .. } => ErrorKind::Compile,
            Self::VersionMissing { .. } => ErrorKind::VersionMissing,
            Self::VersionInvalid { .. } => ErrorKind::VersionInvalid,
            Self::InvalidFile { violations, .. } | Self::SchemaViolation { violations } => {
                classify(violations, matches!(self, Self::InvalidFile { .. }))
            }
            Self::MajorVersionDivergence { .. } => ErrorKind::MajorVersionDivergence,
            Self::Unification { .. } => ErrorKind::Unification,
            Self::MajorVersionMismatch { .. } => ErrorKind::MajorVersionMismatch,
            Self::RootNotFound { .. } => ErrorKind::RootNotFound,
            Self::InvalidWalk { .. } => ErrorKind::InvalidWalk,
            Self::Io { .. } | Self::Walk { .. } => ErrorKind::Io,
            Self::Schema { .. } => ErrorKind::Schema,
            Self::Path { .. } => ErrorKind::InvalidPath,
            Self::Decode { .. } => ErrorKind::Decode,
        }
    }

    /// Validation details carried by the error, if any.
    #[must_use]
    pub const fn violations(&self) -> Option<&Violations> {
        match self {
            Self::InvalidFile { violations, .. }
            | Self::Unification { violations }
            | Self::SchemaViolation { violations } => Some(violations),
            _ => None,
        }
    }
}

fn classify(violations: &Violations, per_file: bool) -> ErrorKind {
    if violations.contains_kind(ViolationKind::EnvParse) {
        ErrorKind::EnvParse
    } else if violations.contains_kind(ViolationKind::EnvType)
        || violations.contains_kind(ViolationKind::EnvAttribute)
    {
        ErrorKind::EnvTypeInvalid
    } else if per_file
        && (violations.contains_kind(ViolationKind::Conflict)
            || violations.contains_kind(ViolationKind::NotAllowed))
    {
        ErrorKind::Unification
    } else {
        ErrorKind::SchemaViolation
    }
}
