//! Loading a blueprint for a directory.
//!
//! The loader discovers `blueprint.cue` files from a start directory up to
//! the repository root, loads each one, merges them, unifies the result
//! with the schema and applies the version policy.
//!
//! # Examples
//!
//! ```no_run
//! use camino::Utf8Path;
//! use forge_blueprint::loader::{BlueprintLoader, LoaderBuilder};
//!
//! let loader = LoaderBuilder::new().env_override("CI", "true").build();
//! let blueprint = loader.load(Utf8Path::new("services/api"))?;
//! let name = blueprint.get("project.name").and_then(|value| value.as_str());
//! # let _ = name;
//! # Ok::<(), std::sync::Arc<forge_blueprint::BlueprintError>>(())
//! ```

mod raw;
mod warning;

pub use raw::RawBlueprint;
pub use warning::{CollectingSink, LoadWarning, TracingSink, WarningSink};

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use camino::Utf8Path;

use crate::constraint::{Path, Value};
use crate::discovery::{BLUEPRINT_FILE_NAME, DiscoveredFile, Discovery, VCS_ROOT_MARKER};
use crate::file::BlueprintFile;
use crate::injector::{EnvSource, Injector, OsEnv, OverlayEnv};
use crate::merge::BlueprintSet;
use crate::schema::Schema;
use crate::version::{self, VERSION_FIELD, VersionMismatch};
use crate::walker::{FsReverseWalker, ReverseWalker};
use crate::{BlueprintError, BlueprintResult, SemVer};

/// Loads blueprints.
///
/// Implemented by [`DefaultBlueprintLoader`]; callers may substitute their
/// own implementation in tests.
pub trait BlueprintLoader {
    /// Load the blueprint for `start`.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error met by any stage.
    fn load(&self, start: &Utf8Path) -> BlueprintResult<RawBlueprint>;
}

/// Progress of a single load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// Nothing has happened yet.
    Fresh,
    /// Searching for blueprint files.
    Discovering,
    /// No files were found; the schema defaults are used.
    Skipped,
    /// Loading discovered files.
    Loading,
    /// Merging loaded files.
    Merging,
    /// Unifying the merged files with the schema.
    SchemaUnifying,
    /// Validating the final blueprint.
    Validating,
    /// The blueprint is ready.
    Ready,
    /// A stage failed.
    Failed,
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Fresh => "fresh",
            Self::Discovering => "discovering",
            Self::Skipped => "skipped",
            Self::Loading => "loading",
            Self::Merging => "merging",
            Self::SchemaUnifying => "schema unifying",
            Self::Validating => "validating",
            Self::Ready => "ready",
            Self::Failed => "failed",
        })
    }
}

impl LoadState {
    /// Whether a load may move from `self` to `next`.
    #[must_use]
    pub const fn can_advance_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Fresh, Self::Discovering)
                | (Self::Discovering, Self::Loading | Self::Skipped)
                | (Self::Loading, Self::Merging)
                | (Self::Merging, Self::SchemaUnifying)
                | (Self::SchemaUnifying | Self::Skipped, Self::Validating)
                | (Self::Validating, Self::Ready)
        ) || (matches!(next, Self::Failed) && !matches!(self, Self::Ready | Self::Failed))
    }
}

/// Tracks the state of one load and logs each transition.
struct Run<'a> {
    start: &'a Utf8Path,
    state: LoadState,
}

impl<'a> Run<'a> {
    const fn new(start: &'a Utf8Path) -> Self {
        Self {
            start,
            state: LoadState::Fresh,
        }
    }

    fn advance(&mut self, next: LoadState) {
        if !self.state.can_advance_to(next) {
            tracing::warn!(from = %self.state, to = %next, "unexpected load transition");
        }
        tracing::debug!(start = %self.start, from = %self.state, to = %next, "load state");
        self.state = next;
    }

    fn fail(&mut self, err: Arc<BlueprintError>) -> Arc<BlueprintError> {
        tracing::error!(start = %self.start, state = %self.state, error = %err, "blueprint load failed");
        self.state = LoadState::Failed;
        err
    }
}

/// The standard loader.
pub struct DefaultBlueprintLoader {
    schema: Option<Arc<Schema>>,
    injector: Injector,
    discovery: Discovery<Arc<dyn ReverseWalker>>,
    sink: Arc<dyn WarningSink>,
}

impl fmt::Debug for DefaultBlueprintLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultBlueprintLoader")
            .field("schema", &self.schema.as_ref().map(|schema| schema.version()))
            .field("injector", &self.injector)
            .finish_non_exhaustive()
    }
}

impl Default for DefaultBlueprintLoader {
    fn default() -> Self {
        LoaderBuilder::new().build()
    }
}

impl DefaultBlueprintLoader {
    /// Start configuring a loader.
    #[must_use]
    pub fn builder() -> LoaderBuilder {
        LoaderBuilder::new()
    }

    fn schema(&self) -> BlueprintResult<Arc<Schema>> {
        self.schema
            .as_ref()
            .map_or_else(Schema::embedded, |schema| Ok(Arc::clone(schema)))
    }

    fn merge(
        &self,
        run: &mut Run<'_>,
        schema: &Schema,
        files: Vec<DiscoveredFile>,
    ) -> BlueprintResult<(Value, SemVer)> {
        run.advance(LoadState::Loading);
        let mut set = BlueprintSet::default();
        for file in files {
            set.push(BlueprintFile::load(
                file.path(),
                file.contents(),
                &self.injector,
            )?);
        }
        set.validate_majors()?;

        run.advance(LoadState::Merging);
        let user = set.unify()?;
        let chosen = set.highest_version().unwrap_or_else(|| schema.version());
        let versioned = user.fill(
            &Path::root().child(VERSION_FIELD),
            &Value::string(chosen.to_string()),
        );

        run.advance(LoadState::SchemaUnifying);
        Ok((schema.unify(&versioned), chosen))
    }

    fn apply_version_policy(&self, chosen: SemVer, schema_version: SemVer) -> BlueprintResult<()> {
        match version::validate(chosen, schema_version) {
            Ok(()) => Ok(()),
            Err(VersionMismatch::Minor { version, supported }) => {
                self.sink
                    .warn(&LoadWarning::MinorVersionAhead { version, supported });
                Ok(())
            }
            Err(VersionMismatch::Major { version, supported }) => Err(Arc::new(
                BlueprintError::MajorVersionMismatch { version, supported },
            )),
        }
    }

    fn run(&self, run: &mut Run<'_>) -> BlueprintResult<RawBlueprint> {
        run.advance(LoadState::Discovering);
        let files = self.discovery.discover(run.start)?;
        let schema = self.schema()?;

        let (blueprint, chosen) = if files.is_empty() {
            tracing::info!(start = %run.start, "no blueprint files found; using schema defaults");
            run.advance(LoadState::Skipped);
            (schema.defaults(), schema.version())
        } else {
            tracing::info!(start = %run.start, count = files.len(), "loading blueprint files");
            self.merge(run, &schema, files)?
        };

        run.advance(LoadState::Validating);
        blueprint
            .validate_concrete()
            .map_err(|violations| Arc::new(BlueprintError::SchemaViolation { violations }))?;
        self.apply_version_policy(chosen, schema.version())?;

        run.advance(LoadState::Ready);
        Ok(RawBlueprint::new(blueprint))
    }
}

impl BlueprintLoader for DefaultBlueprintLoader {
    fn load(&self, start: &Utf8Path) -> BlueprintResult<RawBlueprint> {
        let mut run = Run::new(start);
        self.run(&mut run).map_err(|err| run.fail(err))
    }
}

/// Builder for [`DefaultBlueprintLoader`].
pub struct LoaderBuilder {
    schema: Option<Arc<Schema>>,
    env: Arc<dyn EnvSource>,
    overrides: BTreeMap<String, String>,
    walker: Arc<dyn ReverseWalker>,
    sink: Arc<dyn WarningSink>,
    file_name: String,
    root_marker: String,
}

impl fmt::Debug for LoaderBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoaderBuilder")
            .field("overrides", &self.overrides)
            .field("file_name", &self.file_name)
            .field("root_marker", &self.root_marker)
            .finish_non_exhaustive()
    }
}

impl Default for LoaderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LoaderBuilder {
    /// A builder using the embedded schema, the process environment and the
    /// real filesystem.
    #[must_use]
    pub fn new() -> Self {
        Self {
            schema: None,
            env: Arc::new(OsEnv),
            overrides: BTreeMap::new(),
            walker: Arc::new(FsReverseWalker::new()),
            sink: Arc::new(TracingSink),
            file_name: BLUEPRINT_FILE_NAME.to_owned(),
            root_marker: VCS_ROOT_MARKER.to_owned(),
        }
    }

    /// Use `schema` instead of the embedded one.
    #[must_use]
    pub fn schema(mut self, schema: Arc<Schema>) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Read environment attributes from `env`.
    #[must_use]
    pub fn env_source(mut self, env: impl EnvSource + 'static) -> Self {
        self.env = Arc::new(env);
        self
    }

    /// Bind `name` to `value` regardless of the environment source.
    #[must_use]
    pub fn env_override(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.overrides.insert(name.into(), value.into());
        self
    }

    /// Walk directories with `walker`.
    #[must_use]
    pub fn walker(mut self, walker: impl ReverseWalker + 'static) -> Self {
        self.walker = Arc::new(walker);
        self
    }

    /// Deliver warnings to `sink`.
    #[must_use]
    pub fn warning_sink(mut self, sink: Arc<dyn WarningSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Look for files named `file_name` instead of `blueprint.cue`.
    #[must_use]
    pub fn file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    /// Bound discovery by entries named `marker` instead of `.git`.
    #[must_use]
    pub fn root_marker(mut self, marker: impl Into<String>) -> Self {
        self.root_marker = marker.into();
        self
    }

    /// Finish configuration.
    #[must_use]
    pub fn build(self) -> DefaultBlueprintLoader {
        let env = OverlayEnv::new(self.env).with_all(self.overrides);
        DefaultBlueprintLoader {
            schema: self.schema,
            injector: Injector::new(env),
            discovery: Discovery::new(self.walker)
                .with_file_name(self.file_name)
                .with_root_marker(self.root_marker),
            sink: self.sink,
        }
    }
}

#[cfg(test)]
mod tests;
