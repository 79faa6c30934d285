//! Sources of environment variables.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;
use std::sync::Arc;

/// Read-only view of environment variables.
///
/// Lookups are exact: no prefixing and no case folding.
pub trait EnvSource: Send + Sync {
    /// Value of `name`, or `None` when the variable is unset.
    fn get(&self, name: &str) -> Option<String>;
}

/// The process environment.
///
/// Variables whose value is not valid Unicode are treated as unset.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEnv;

impl EnvSource for OsEnv {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var_os(name).and_then(|value| value.into_string().ok())
    }
}

impl<S: BuildHasher + Send + Sync> EnvSource for HashMap<String, String, S> {
    fn get(&self, name: &str) -> Option<String> {
        HashMap::get(self, name).cloned()
    }
}

impl EnvSource for BTreeMap<String, String> {
    fn get(&self, name: &str) -> Option<String> {
        BTreeMap::get(self, name).cloned()
    }
}

impl<T: EnvSource + ?Sized> EnvSource for &T {
    fn get(&self, name: &str) -> Option<String> {
        (**self).get(name)
    }
}

impl<T: EnvSource + ?Sized> EnvSource for Arc<T> {
    fn get(&self, name: &str) -> Option<String> {
        (**self).get(name)
    }
}

impl<T: EnvSource + ?Sized> EnvSource for Box<T> {
    fn get(&self, name: &str) -> Option<String> {
        (**self).get(name)
    }
}

/// Fixed overrides consulted before a base source.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
///
/// use forge_blueprint::injector::{EnvSource, OverlayEnv};
///
/// let base = BTreeMap::from([("A".to_owned(), "base".to_owned())]);
/// let env = OverlayEnv::new(base).with("A", "override");
/// assert_eq!(env.get("A").as_deref(), Some("override"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct OverlayEnv<B> {
    overrides: BTreeMap<String, String>,
    base: B,
}

impl<B: EnvSource> OverlayEnv<B> {
    /// Wrap `base` with no overrides.
    #[must_use]
    pub const fn new(base: B) -> Self {
        Self {
            overrides: BTreeMap::new(),
            base,
        }
    }

    /// Add or replace an override.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.overrides.insert(name.into(), value.into());
        self
    }

    /// Add every override in `overrides`, replacing existing ones.
    #[must_use]
    pub fn with_all<I, K, V>(mut self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.overrides.extend(
            overrides
                .into_iter()
                .map(|(name, value)| (name.into(), value.into())),
        );
        self
    }

    /// Current overrides.
    #[must_use]
    pub const fn overrides(&self) -> &BTreeMap<String, String> {
        &self.overrides
    }
}

impl<B: EnvSource> EnvSource for OverlayEnv<B> {
    fn get(&self, name: &str) -> Option<String> {
        self.overrides
            .get(name)
            .cloned()
            .or_else(|| self.base.get(name))
    }
}
