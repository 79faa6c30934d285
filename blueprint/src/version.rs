//! Blueprint version parsing and compatibility policy.
//!
//! Every blueprint file declares a `version` string of the form `X.Y` or
//! `X.Y.Z`. Files being merged must agree on the major version, and the
//! merged blueprint must share its major version with the schema. A minor
//! version ahead of the schema is tolerated with a warning.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::constraint::{Path, Value};

/// Label of the version field in blueprint files and the schema.
pub const VERSION_FIELD: &str = "version";

/// A `major.minor.patch` version; two-part versions imply patch `0`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SemVer {
    major: u64,
    minor: u64,
    patch: u64,
}

impl SemVer {
    /// Creates a version from its components.
    #[must_use]
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parses `X.Y` or `X.Y.Z`.
    ///
    /// # Errors
    ///
    /// Returns [`VersionError::Invalid`] for any other shape.
    ///
    /// # Examples
    ///
    /// ```
    /// use forge_blueprint::SemVer;
    ///
    /// assert_eq!(SemVer::parse("1.0")?, SemVer::new(1, 0, 0));
    /// assert_eq!(SemVer::parse("2.3.4")?.to_string(), "2.3.4");
    /// assert!(SemVer::parse("foobar").is_err());
    /// # Ok::<(), forge_blueprint::VersionError>(())
    /// ```
    pub fn parse(text: &str) -> Result<Self, VersionError> {
        text.parse()
    }

    /// Major component.
    #[must_use]
    pub const fn major(&self) -> u64 {
        self.major
    }

    /// Minor component.
    #[must_use]
    pub const fn minor(&self) -> u64 {
        self.minor
    }

    /// Patch component.
    #[must_use]
    pub const fn patch(&self) -> u64 {
        self.patch
    }
}

impl FromStr for SemVer {
    type Err = VersionError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let invalid = || VersionError::Invalid {
            value: text.to_owned(),
        };
        let mut parts = text.split('.').map(|part| {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            part.parse::<u64>().map_err(|_| invalid())
        });
        let major = parts.next().ok_or_else(invalid)??;
        let minor = parts.next().ok_or_else(invalid)??;
        let patch = parts.next().transpose()?.unwrap_or(0);
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(Self::new(major, minor, patch))
    }
}

impl fmt::Display for SemVer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl Serialize for SemVer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SemVer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Failure to obtain a version from a value.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum VersionError {
    /// No concrete `version` field exists.
    #[error("version field is missing or not concrete")]
    Missing,
    /// The field exists but is not a valid version.
    #[error("invalid version '{value}': expected \"X.Y\" or \"X.Y.Z\"")]
    Invalid {
        /// The rejected text.
        value: String,
    },
}

/// Outcome of comparing a blueprint version with the schema version.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum VersionMismatch {
    /// Major versions differ; the blueprint cannot be used.
    #[error(
        "the major version of the blueprint ({version}) is different than the supported version ({supported}): cannot continue"
    )]
    Major {
        /// Version declared by the blueprint.
        version: SemVer,
        /// Version of the schema.
        supported: SemVer,
    },
    /// The blueprint's minor version is ahead of the schema.
    #[error(
        "the minor version of the blueprint ({version}) is greater than the supported version ({supported}): some features may not work"
    )]
    Minor {
        /// Version declared by the blueprint.
        version: SemVer,
        /// Version of the schema.
        supported: SemVer,
    },
}

/// Reads the `version` field of a value.
///
/// # Errors
///
/// Returns [`VersionError::Missing`] if the field is absent or not concrete
/// and [`VersionError::Invalid`] if it is concrete but not a version string.
pub fn extract(value: &Value) -> Result<SemVer, VersionError> {
    let field = value
        .lookup(&Path::root().child(VERSION_FIELD))
        .map(Value::resolved)
        .ok_or(VersionError::Missing)?;
    match field {
        Value::Scalar(scalar) => match field.as_str() {
            Some(text) => text.parse(),
            None => Err(VersionError::Invalid {
                value: scalar.to_string(),
            }),
        },
        _ => Err(VersionError::Missing),
    }
}

/// Compares a blueprint version against the schema version.
///
/// # Errors
///
/// Returns [`VersionMismatch::Major`] when the major versions differ and
/// [`VersionMismatch::Minor`] when the blueprint's minor version is greater.
/// Patch versions never matter.
pub const fn validate(version: SemVer, supported: SemVer) -> Result<(), VersionMismatch> {
    if version.major != supported.major {
        Err(VersionMismatch::Major { version, supported })
    } else if version.minor > supported.minor {
        Err(VersionMismatch::Minor { version, supported })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::compile;
    use anyhow::{Result, ensure};
    use rstest::rstest;

    #[rstest]
    #[case("1.0", SemVer::new(1, 0, 0))]
    #[case("1.2.3", SemVer::new(1, 2, 3))]
    #[case("10.20", SemVer::new(10, 20, 0))]
    fn parses_versions(#[case] text: &str, #[case] expected: SemVer) -> Result<()> {
        ensure!(SemVer::parse(text)? == expected);
        Ok(())
    }

    #[rstest]
    #[case("")]
    #[case("1")]
    #[case("foobar")]
    #[case("1.0.0.0")]
    #[case("v1.0")]
    #[case("1..0")]
    #[case("1.0-beta")]
    fn rejects_malformed_versions(#[case] text: &str) {
        assert!(matches!(SemVer::parse(text), Err(VersionError::Invalid { .. })));
    }

    #[rstest]
    fn orders_by_components() -> Result<()> {
        ensure!(SemVer::parse("1.10")? > SemVer::parse("1.9.9")?);
        ensure!(SemVer::parse("2.0")? > SemVer::parse("1.99")?);
        Ok(())
    }

    #[rstest]
    #[case::two_part("version: \"1.0\"", Ok(SemVer::new(1, 0, 0)))]
    #[case::defaulted("version: string | *\"1.1\"", Ok(SemVer::new(1, 1, 0)))]
    #[case::missing("project: {}", Err(VersionError::Missing))]
    #[case::not_concrete("version: string", Err(VersionError::Missing))]
    #[case::garbage("version: \"foobar\"", Err(VersionError::Invalid { value: "foobar".to_owned() }))]
    #[case::not_string("version: 1", Err(VersionError::Invalid { value: "1".to_owned() }))]
    fn extracts_version_field(
        #[case] source: &str,
        #[case] expected: Result<SemVer, VersionError>,
    ) -> Result<()> {
        let value = compile(source.as_bytes())?;
        ensure!(extract(&value) == expected, "unexpected result for {source:?}");
        Ok(())
    }

    #[rstest]
    #[case::same(SemVer::new(1, 0, 0), Ok(()))]
    #[case::older_minor(SemVer::new(1, 0, 9), Ok(()))]
    #[case::newer_patch(SemVer::new(1, 1, 7), Ok(()))]
    #[case::newer_minor(
        SemVer::new(1, 2, 0),
        Err(VersionMismatch::Minor { version: SemVer::new(1, 2, 0), supported: SemVer::new(1, 1, 0) })
    )]
    #[case::major(
        SemVer::new(2, 0, 0),
        Err(VersionMismatch::Major { version: SemVer::new(2, 0, 0), supported: SemVer::new(1, 1, 0) })
    )]
    fn applies_version_policy(
        #[case] version: SemVer,
        #[case] expected: Result<(), VersionMismatch>,
    ) {
        assert_eq!(validate(version, SemVer::new(1, 1, 0)), expected);
    }
}
