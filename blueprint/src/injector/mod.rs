//! Late binding of fields from environment variables.
//!
//! A field annotated with `@env(name=VAR,type=T)` receives the value of
//! `VAR`, coerced to `T` (`string`, `int` or `bool`). Unset variables leave
//! the field untouched. Malformed attributes and unparseable values bind an
//! error value at the field, which concrete validation reports later.

mod env;

pub use env::{EnvSource, OsEnv, OverlayEnv};

use std::fmt;
use std::sync::Arc;

use crate::constraint::{Attribute, BottomKind, Path, Value};

/// Name of the attribute that requests environment binding.
pub const ENV_ATTRIBUTE: &str = "env";

/// Types an environment attribute may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvType {
    /// Bind the raw string.
    String,
    /// Parse a signed 64-bit integer.
    Int,
    /// Parse a boolean.
    Bool,
}

impl EnvType {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "string" => Some(Self::String),
            "int" => Some(Self::Int),
            "bool" => Some(Self::Bool),
            _ => None,
        }
    }

    fn coerce(self, variable: &str, raw: &str) -> Value {
        match self {
            Self::String => Value::string(raw),
            Self::Int => raw.parse::<i64>().map_or_else(
                |err| {
                    Value::bottom(
                        BottomKind::EnvParse,
                        format!("environment variable {variable}={raw:?} is not an int: {err}"),
                    )
                },
                Value::int,
            ),
            Self::Bool => parse_bool(raw).map_or_else(
                || {
                    Value::bottom(
                        BottomKind::EnvParse,
                        format!("environment variable {variable}={raw:?} is not a bool"),
                    )
                },
                Value::bool,
            ),
        }
    }
}

impl fmt::Display for EnvType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Bool => "bool",
        })
    }
}

/// Empty means present, which reads as `true`.
fn parse_bool(raw: &str) -> Option<bool> {
    const TRUE: [&str; 4] = ["true", "1", "yes", "on"];
    const FALSE: [&str; 4] = ["false", "0", "no", "off"];
    if raw.is_empty() || TRUE.iter().any(|word| raw.eq_ignore_ascii_case(word)) {
        Some(true)
    } else if FALSE.iter().any(|word| raw.eq_ignore_ascii_case(word)) {
        Some(false)
    } else {
        None
    }
}

/// A value to bind at a path.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    path: Path,
    value: Value,
}

impl Binding {
    /// Location of the annotated field.
    #[must_use]
    pub const fn path(&self) -> &Path {
        &self.path
    }

    /// Value to unify into the field.
    #[must_use]
    pub const fn value(&self) -> &Value {
        &self.value
    }
}

/// Binds `@env` fields from an [`EnvSource`].
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
///
/// use forge_blueprint::constraint::{Path, compile};
/// use forge_blueprint::injector::Injector;
///
/// let value = compile(b"port: int @env(name=PORT,type=int)")?;
/// let env = BTreeMap::from([("PORT".to_owned(), "8080".to_owned())]);
/// let injected = Injector::new(env).inject(&value);
/// let port = injected.lookup(&Path::parse("port")?);
/// assert_eq!(port.and_then(|v| v.as_int()), Some(8080));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone)]
pub struct Injector {
    env: Arc<dyn EnvSource>,
}

impl fmt::Debug for Injector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Injector").finish_non_exhaustive()
    }
}

impl Default for Injector {
    fn default() -> Self {
        Self::new(OsEnv)
    }
}

impl Injector {
    /// Create an injector reading from `env`.
    #[must_use]
    pub fn new(env: impl EnvSource + 'static) -> Self {
        Self { env: Arc::new(env) }
    }

    /// Create an injector sharing an existing source.
    #[must_use]
    pub const fn from_shared(env: Arc<dyn EnvSource>) -> Self {
        Self { env }
    }

    /// Bindings the injector would apply to `value`, in document order.
    #[must_use]
    pub fn bindings(&self, value: &Value) -> Vec<Binding> {
        value
            .walk_fields()
            .filter_map(|(path, field)| {
                let attribute = field.attribute(ENV_ATTRIBUTE)?;
                self.resolve(&path, attribute)
                    .map(|bound| Binding { path, value: bound })
            })
            .collect()
    }

    /// Return `value` with every `@env` field bound.
    #[must_use]
    pub fn inject(&self, value: &Value) -> Value {
        self.bindings(value)
            .into_iter()
            .fold(value.clone(), |acc, binding| {
                acc.fill(&binding.path, &binding.value)
            })
    }

    fn resolve(&self, path: &Path, attribute: &Attribute) -> Option<Value> {
        let Some(variable) = attribute.lookup("name").filter(|name| !name.is_empty()) else {
            return Some(invalid_attribute(path, attribute, "missing 'name'"));
        };
        let Some(type_name) = attribute.lookup("type") else {
            return Some(invalid_attribute(path, attribute, "missing 'type'"));
        };
        let Some(env_type) = EnvType::parse(type_name) else {
            tracing::warn!(%path, env_type = type_name, "unsupported environment attribute type");
            return Some(Value::bottom(
                BottomKind::EnvType,
                format!("unsupported environment type {type_name:?} for {variable}; expected string, int or bool"),
            ));
        };
        let Some(raw) = self.env.get(variable) else {
            tracing::debug!(%path, variable, "environment variable not set; skipping");
            return None;
        };
        tracing::debug!(%path, variable, %env_type, "binding environment variable");
        Some(env_type.coerce(variable, &raw))
    }
}

fn invalid_attribute(path: &Path, attribute: &Attribute, reason: &str) -> Value {
    tracing::warn!(%path, %attribute, reason, "malformed environment attribute");
    Value::bottom(
        BottomKind::EnvAttribute,
        format!("invalid attribute {attribute}: {reason}"),
    )
}

#[cfg(test)]
mod tests;
