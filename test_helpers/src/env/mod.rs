//! Guards for mutating process environment variables in tests.
//!
//! Blueprint attributes such as `@env(name=FOO,type=string)` read the process
//! environment. Tests that exercise them set variables through these helpers:
//! every mutation happens under one global re-entrant mutex and returns a
//! guard that restores the previous value when dropped.
//!
//! Guards for the same key restore in LIFO order. Use [`lock`] or [`scope`]
//! when a test needs several mutations to appear atomically.
//!
//! # Examples
//!
//! ```
//! use forge_blueprint_test_helpers::env;
//!
//! let _port = env::set_var("FORGE_TEST_PORT", "8080");
//! assert_eq!(std::env::var("FORGE_TEST_PORT").as_deref(), Ok("8080"));
//! ```

use std::env;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::sync::LazyLock;

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};

static ENV_MUTEX: LazyLock<ReentrantMutex<()>> = LazyLock::new(ReentrantMutex::default);

/// Apply `change` to `key` while `ENV_MUTEX` is held by the caller.
fn record<F>(key: String, change: F, _held: &ReentrantMutexGuard<'static, ()>) -> EnvVarGuard
where
    F: FnOnce(&str),
{
    let original = env::var_os(&key);
    change(&key);
    EnvVarGuard { key, original }
}

fn restore(key: &str, original: Option<OsString>) {
    let _held = ENV_MUTEX.lock();
    match original {
        // SAFETY: environment writes are serialised by `ENV_MUTEX`.
        Some(value) => unsafe { env::set_var(key, value) },
        // SAFETY: environment writes are serialised by `ENV_MUTEX`.
        None => unsafe { env::remove_var(key) },
    }
}

/// Restores one variable to its prior state on drop.
#[must_use = "dropping restores the prior value"]
pub struct EnvVarGuard {
    key: String,
    original: Option<OsString>,
}

impl EnvVarGuard {
    /// Name of the guarded variable.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Debug for EnvVarGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvVarGuard")
            .field("key", &self.key)
            .field("was_set", &self.original.is_some())
            .finish()
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        restore(&self.key, self.original.take());
    }
}

/// Holds the environment lock until dropped.
#[must_use = "dropping releases the environment lock"]
pub struct EnvVarLock {
    held: ReentrantMutexGuard<'static, ()>,
}

impl EnvVarLock {
    /// Set `key` without releasing the lock.
    pub fn set_var<K, V>(&self, key: K, value: V) -> EnvVarGuard
    where
        K: Into<String>,
        V: AsRef<OsStr>,
    {
        // SAFETY: `self.held` serialises environment writes.
        record(key.into(), |k| unsafe { env::set_var(k, value) }, &self.held)
    }

    /// Remove `key` without releasing the lock.
    pub fn remove_var<K>(&self, key: K) -> EnvVarGuard
    where
        K: Into<String>,
    {
        // SAFETY: `self.held` serialises environment writes.
        record(key.into(), |k| unsafe { env::remove_var(k) }, &self.held)
    }
}

/// Keeps the environment lock and a set of guards alive together.
///
/// Guards are restored before the lock is released.
#[must_use = "dropping restores the guards and releases the lock"]
pub struct EnvScope {
    guards: Vec<EnvVarGuard>,
    _lock: EnvVarLock,
}

impl EnvScope {
    /// Take the lock, then build guards with it.
    pub fn new_with<F>(build: F) -> Self
    where
        F: FnOnce(&EnvVarLock) -> Vec<EnvVarGuard>,
    {
        let held = lock();
        let guards = build(&held);
        Self {
            guards,
            _lock: held,
        }
    }

    /// Number of guarded variables.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.guards.len()
    }

    /// Whether the scope guards nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }
}

impl Drop for EnvScope {
    fn drop(&mut self) {
        // Restore in reverse so stacked guards for one key unwind correctly.
        while let Some(guard) = self.guards.pop() {
            drop(guard);
        }
    }
}

/// Set `key` to `value` until the returned guard drops.
pub fn set_var<K, V>(key: K, value: V) -> EnvVarGuard
where
    K: Into<String>,
    V: AsRef<OsStr>,
{
    lock().set_var(key, value)
}

/// Remove `key` until the returned guard drops.
pub fn remove_var<K>(key: K) -> EnvVarGuard
where
    K: Into<String>,
{
    lock().remove_var(key)
}

/// Take the global environment lock.
pub fn lock() -> EnvVarLock {
    EnvVarLock {
        held: ENV_MUTEX.lock(),
    }
}

/// Set every `(key, value)` pair inside one locked scope.
///
/// # Examples
///
/// ```
/// use forge_blueprint_test_helpers::env;
///
/// let scope = env::scope([("FORGE_TEST_A", "1"), ("FORGE_TEST_B", "2")]);
/// assert_eq!(scope.len(), 2);
/// ```
pub fn scope<I, K, V>(pairs: I) -> EnvScope
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: AsRef<OsStr>,
{
    EnvScope::new_with(|held| {
        pairs
            .into_iter()
            .map(|(key, value)| held.set_var(key, value))
            .collect()
    })
}

#[cfg(test)]
mod tests;
