//! Merging blueprint files into one value.

use std::sync::Arc;

use crate::constraint::Value;
use crate::file::BlueprintFile;
use crate::{BlueprintError, BlueprintResult, SemVer};

/// Blueprint files collected from one discovery scope.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlueprintSet {
    files: Vec<BlueprintFile>,
}

impl BlueprintSet {
    /// Create a set from loaded files.
    #[must_use]
    pub const fn new(files: Vec<BlueprintFile>) -> Self {
        Self { files }
    }

    /// Files in load order.
    #[must_use]
    pub fn files(&self) -> &[BlueprintFile] {
        &self.files
    }

    /// Whether the set has no files.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Add a file.
    pub fn push(&mut self, file: BlueprintFile) {
        self.files.push(file);
    }

    /// Check that every file shares one major version.
    ///
    /// # Errors
    ///
    /// Returns [`BlueprintError::MajorVersionDivergence`] naming the first
    /// file and the first file that disagrees with it.
    pub fn validate_majors(&self) -> BlueprintResult<()> {
        let Some(first) = self.files.first() else {
            return Ok(());
        };
        match self
            .files
            .iter()
            .find(|file| file.version().major() != first.version().major())
        {
            Some(file) => Err(Arc::new(BlueprintError::MajorVersionDivergence {
                first_path: first.path().to_path_buf(),
                first_version: first.version(),
                path: file.path().to_path_buf(),
                version: file.version(),
            })),
            None => Ok(()),
        }
    }

    /// Greatest version in the set.
    #[must_use]
    pub fn highest_version(&self) -> Option<SemVer> {
        self.files.iter().map(BlueprintFile::version).max()
    }

    /// Unify every file, starting from an empty struct.
    ///
    /// # Errors
    ///
    /// Returns [`BlueprintError::Unification`] listing each conflict when
    /// the files cannot all hold at once.
    pub fn unify(&self) -> BlueprintResult<Value> {
        let merged = self
            .files
            .iter()
            .fold(Value::empty_struct(), |acc, file| acc.unify(file.value()));
        merged.validate_concrete().map_err(|violations| {
            tracing::error!(files = self.files.len(), "blueprint files do not unify");
            Arc::new(BlueprintError::Unification { violations })
        })?;
        Ok(merged)
    }
}

impl FromIterator<BlueprintFile> for BlueprintSet {
    fn from_iter<I: IntoIterator<Item = BlueprintFile>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use anyhow::{Result, anyhow, ensure};
    use rstest::{fixture, rstest};

    use super::*;
    use crate::ErrorKind;
    use crate::injector::Injector;

    #[fixture]
    fn injector() -> Injector {
        Injector::new(BTreeMap::new())
    }

    fn set(files: &[(&str, &str)], injector: &Injector) -> Result<BlueprintSet> {
        files
            .iter()
            .map(|(path, source)| {
                BlueprintFile::load(*path, source.as_bytes(), injector).map_err(anyhow::Error::from)
            })
            .collect()
    }

    #[rstest]
    fn empty_set_has_no_version(injector: Injector) -> Result<()> {
        let empty = set(&[], &injector)?;
        ensure!(empty.highest_version().is_none());
        ensure!(empty.validate_majors().is_ok());
        ensure!(empty.unify()? == Value::empty_struct());
        Ok(())
    }

    #[rstest]
    fn picks_highest_version(injector: Injector) -> Result<()> {
        let files = set(
            &[
                ("/r/a/blueprint.cue", "version: \"1.2\""),
                ("/r/blueprint.cue", "version: \"1.10.1\""),
                ("/r/b/blueprint.cue", "version: \"1.9.9\""),
            ],
            &injector,
        )?;
        ensure!(files.validate_majors().is_ok());
        ensure!(files.highest_version() == Some(SemVer::new(1, 10, 1)));
        Ok(())
    }

    #[rstest]
    fn rejects_diverging_majors(injector: Injector) -> Result<()> {
        let files = set(
            &[
                ("/r/blueprint.cue", "version: \"1.0\""),
                ("/r/sub/blueprint.cue", "version: \"2.0\""),
            ],
            &injector,
        )?;
        let err = files
            .validate_majors()
            .err()
            .ok_or_else(|| anyhow!("expected divergence"))?;
        ensure!(err.kind() == ErrorKind::MajorVersionDivergence);
        ensure!(err.to_string().contains("/r/sub/blueprint.cue"), "{err}");
        Ok(())
    }

    #[rstest]
    fn narrows_constraints_across_files(injector: Injector) -> Result<()> {
        let files = set(
            &[
                ("/r/a/blueprint.cue", "version: \"1.0\"\nx: int & >2 | *3"),
                ("/r/blueprint.cue", "version: \"1.0\"\nx: int | *3\ny: \"a\""),
            ],
            &injector,
        )?;
        let merged = files.unify()?;
        ensure!(merged.to_json()? == serde_json::json!({"x": 3, "y": "a"}));
        Ok(())
    }

    #[rstest]
    fn unification_is_commutative(injector: Injector) -> Result<()> {
        let a = ("/r/a/blueprint.cue", "version: \"1.0\"\np: ci: t: privileged: true");
        let b = ("/r/blueprint.cue", "version: \"1.1\"\np: ci: t: retries: 3\nq: *1 | int");
        let c = ("/r/c/blueprint.cue", "version: \"1.0\"\nq: 1");
        let forward = set(&[a, b, c], &injector)?.unify()?;
        let backward = set(&[c, b, a], &injector)?.unify()?;
        ensure!(forward.equivalent(&backward), "{forward} != {backward}");
        Ok(())
    }

    #[rstest]
    fn reports_conflicts(injector: Injector) -> Result<()> {
        let files = set(
            &[
                ("/r/a/blueprint.cue", "version: \"1.0\"\nname: \"a\""),
                ("/r/blueprint.cue", "version: \"1.0\"\nname: \"b\""),
            ],
            &injector,
        )?;
        let err = files
            .unify()
            .err()
            .ok_or_else(|| anyhow!("expected conflict"))?;
        ensure!(err.kind() == ErrorKind::Unification);
        let violations = err
            .violations()
            .ok_or_else(|| anyhow!("conflict carries no violations"))?;
        ensure!(violations.iter().any(|v| v.path().to_string() == "name"));
        Ok(())
    }
}
