//! Classification of [`BlueprintError`](super::BlueprintError) values.

use std::fmt;

/// Pipeline stage at which a load failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Stage {
    /// Compiling the embedded schema.
    Schema,
    /// Locating the repository root and blueprint files.
    Discovery,
    /// Compiling, versioning and injecting a single file.
    FileLoading,
    /// Checking version agreement and unifying files.
    Merging,
    /// Unifying the merged blueprint with the schema and checking that the
    /// result is concrete.
    Validation,
    /// Comparing the blueprint version with the schema version.
    VersionPolicy,
    /// Converting a loaded blueprint into typed values.
    Decoding,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Schema => "schema",
            Self::Discovery => "discovery",
            Self::FileLoading => "file loading",
            Self::Merging => "merging",
            Self::Validation => "validation",
            Self::VersionPolicy => "version policy",
            Self::Decoding => "decoding",
        })
    }
}

/// Category of a load failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A file does not parse or evaluate.
    Compile,
    /// A file has no concrete `version` field.
    VersionMissing,
    /// A file's `version` is not `X.Y` or `X.Y.Z`.
    VersionInvalid,
    /// Two files declare different major versions.
    MajorVersionDivergence,
    /// Values could not be unified.
    Unification,
    /// The final tree is not concrete or violates the schema.
    SchemaViolation,
    /// An environment value could not be parsed as its declared type.
    EnvParse,
    /// An `@env` attribute is malformed or names an unsupported type.
    EnvTypeInvalid,
    /// The blueprint's major version differs from the schema's.
    MajorVersionMismatch,
    /// No repository root marker was found.
    RootNotFound,
    /// A reverse walk was requested with a start outside its end.
    InvalidWalk,
    /// Filesystem access failed.
    Io,
    /// The embedded schema could not be prepared.
    Schema,
    /// A path argument was malformed or missing.
    InvalidPath,
    /// A loaded value did not deserialize into the requested type.
    Decode,
}
