//! The blueprint schema.
//!
//! The schema source is embedded at build time. Its top-level `version`
//! field is the newest blueprint version the loader understands, and its
//! `#Blueprint` definition is unified with every loaded blueprint.

mod model;

pub use model::{
    Blueprint, Deployment, DeploymentModules, Global, GlobalCi, GlobalDeployment,
    GlobalDeploymentRegistries, GlobalDeploymentRepo, GlobalRepo, Module, Project, ProjectCi,
    ProviderAws, ProviderDocker, ProviderEarthly, ProviderGithub, Providers, Release, Secret,
    Target,
};

use std::sync::{Arc, LazyLock};

use crate::constraint::{Path, Value, compile};
use crate::version::{self, VERSION_FIELD};
use crate::{BlueprintError, BlueprintResult, SemVer};

/// Source of the embedded schema.
pub const SCHEMA_SOURCE: &str = include_str!("blueprint.cue");

/// Definition holding the blueprint shape.
pub const BLUEPRINT_DEFINITION: &str = "#Blueprint";

static EMBEDDED: LazyLock<BlueprintResult<Arc<Schema>>> =
    LazyLock::new(|| Schema::compile(SCHEMA_SOURCE.as_bytes()).map(Arc::new));

/// A compiled schema and its version.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    value: Value,
    version: SemVer,
}

impl Schema {
    /// Compile a schema from source.
    ///
    /// The source must define `#Blueprint` and a concrete top-level
    /// `version`.
    ///
    /// # Errors
    ///
    /// Returns [`BlueprintError::Schema`] when the source does not compile,
    /// lacks the definition or has no valid version.
    pub fn compile(source: &[u8]) -> BlueprintResult<Self> {
        let compiled = compile(source)
            .map_err(|err| schema_error(format!("failed to compile: {err}")))?;
        let value = compiled
            .definition(BLUEPRINT_DEFINITION)
            .cloned()
            .ok_or_else(|| schema_error(format!("missing {BLUEPRINT_DEFINITION} definition")))?;
        let version = version::extract(&compiled)
            .map_err(|err| schema_error(format!("failed to get schema version: {err}")))?;
        tracing::debug!(%version, "compiled blueprint schema");
        Ok(Self { value, version })
    }

    /// The schema embedded in this crate, compiled once per process.
    ///
    /// # Errors
    ///
    /// Returns [`BlueprintError::Schema`] if the embedded source is broken.
    ///
    /// # Examples
    ///
    /// ```
    /// use forge_blueprint::schema::Schema;
    ///
    /// let schema = Schema::embedded()?;
    /// assert_eq!(schema.version().to_string(), "1.0.0");
    /// # Ok::<(), std::sync::Arc<forge_blueprint::BlueprintError>>(())
    /// ```
    pub fn embedded() -> BlueprintResult<Arc<Self>> {
        EMBEDDED.clone()
    }

    /// The `#Blueprint` definition.
    #[must_use]
    pub const fn value(&self) -> &Value {
        &self.value
    }

    /// Newest blueprint version the schema supports.
    #[must_use]
    pub const fn version(&self) -> SemVer {
        self.version
    }

    /// Unify `value` with the schema.
    #[must_use]
    pub fn unify(&self, value: &Value) -> Value {
        self.value.unify(value)
    }

    /// The schema itself with its own version filled in.
    #[must_use]
    pub fn defaults(&self) -> Value {
        self.value.fill(
            &Path::root().child(VERSION_FIELD),
            &Value::string(self.version.to_string()),
        )
    }
}

fn schema_error(message: String) -> Arc<BlueprintError> {
    tracing::error!(%message, "invalid blueprint schema");
    Arc::new(BlueprintError::Schema { message })
}

#[cfg(test)]
mod tests;
