//! The loaded blueprint.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::constraint::{Path, PathError, Value};
use crate::schema::Blueprint;
use crate::{BlueprintError, BlueprintResult, BlueprintResultExt};

/// A fully merged, validated blueprint value.
///
/// It performs no I/O and can be shared freely between threads.
#[derive(Debug, Clone, PartialEq)]
pub struct RawBlueprint {
    value: Value,
}

impl RawBlueprint {
    /// Wrap a value.
    #[must_use]
    pub const fn new(value: Value) -> Self {
        Self { value }
    }

    /// The underlying value.
    #[must_use]
    pub const fn value(&self) -> &Value {
        &self.value
    }

    /// Value at a dotted path such as `project.ci.targets`.
    ///
    /// Returns `None` when the path is malformed or names nothing.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&Value> {
        Path::parse(path)
            .ok()
            .and_then(|parsed| self.value.lookup(&parsed))
    }

    /// Value at `path`.
    #[must_use]
    pub fn lookup(&self, path: &Path) -> Option<&Value> {
        self.value.lookup(path)
    }

    /// Check that the blueprint is concrete.
    ///
    /// # Errors
    ///
    /// Returns [`BlueprintError::SchemaViolation`] listing every problem.
    pub fn validate(&self) -> BlueprintResult<()> {
        self.value
            .validate_concrete()
            .map_err(|violations| Arc::new(BlueprintError::SchemaViolation { violations }))
    }

    /// JSON projection of the blueprint.
    ///
    /// # Errors
    ///
    /// Returns [`BlueprintError::SchemaViolation`] if the value is not
    /// concrete.
    pub fn to_json(&self) -> BlueprintResult<JsonValue> {
        export(&self.value)
    }

    /// Serialise the blueprint as JSON bytes.
    ///
    /// # Errors
    ///
    /// Fails when the value is not concrete.
    pub fn marshal_json(&self) -> BlueprintResult<Vec<u8>> {
        let json = self.to_json()?;
        serde_json::to_vec(&json).map_err(|source| decode_error(&Path::root(), source))
    }

    /// Deserialise the whole blueprint.
    ///
    /// # Errors
    ///
    /// Fails when the value is not concrete or does not match `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> BlueprintResult<T> {
        decode_value(&Path::root(), &self.value)
    }

    /// Deserialise the value at a dotted path.
    ///
    /// # Errors
    ///
    /// Fails when the path is malformed or missing, the value is not
    /// concrete, or it does not match `T`.
    pub fn decode_path<T: DeserializeOwned>(&self, path: &str) -> BlueprintResult<T> {
        let parsed = Path::parse(path).into_blueprint()?;
        let value = self
            .value
            .lookup(&parsed)
            .ok_or_else(|| PathError::NotFound {
                path: parsed.to_string(),
            })
            .into_blueprint()?;
        decode_value(&parsed, value)
    }

    /// Deserialise into the typed schema model.
    ///
    /// # Errors
    ///
    /// Fails when the value is not concrete or does not match the model.
    pub fn decode_blueprint(&self) -> BlueprintResult<Blueprint> {
        self.decode()
    }
}

impl From<RawBlueprint> for Value {
    fn from(raw: RawBlueprint) -> Self {
        raw.value
    }
}

fn export(value: &Value) -> BlueprintResult<JsonValue> {
    value
        .to_json()
        .map_err(|violations| Arc::new(BlueprintError::SchemaViolation { violations }))
}

fn decode_value<T: DeserializeOwned>(path: &Path, value: &Value) -> BlueprintResult<T> {
    serde_json::from_value(export(value)?).map_err(|source| decode_error(path, source))
}

fn decode_error(path: &Path, source: serde_json::Error) -> Arc<BlueprintError> {
    Arc::new(BlueprintError::Decode {
        path: path.to_string(),
        source,
    })
}
