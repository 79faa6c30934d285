//! Running CLI configuration tests inside a [`figment::Jail`].
//!
//! A jail gives each test its own working directory and restores any
//! environment variables it sets. These helpers return `anyhow::Result` so
//! tests can use `?` on both jail setup and the code under test.

use anyhow::{Result, anyhow};

/// Run `f` inside a fresh jail and return its output.
///
/// # Errors
///
/// Returns an error when the jail cannot be created or `f` fails.
///
/// # Examples
///
/// ```
/// use forge_blueprint_test_helpers::figment::{jailed, set_env};
///
/// let level = jailed(|jail| {
///     set_env(jail, [("FORGE_LOG", "debug")]);
///     Ok(std::env::var("FORGE_LOG").unwrap_or_default())
/// })?;
/// assert_eq!(level, "debug");
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn jailed<F, T>(f: F) -> Result<T>
where
    F: FnOnce(&mut figment::Jail) -> figment::error::Result<T>,
{
    let mut output = None;
    figment::Jail::try_with(|jail| {
        output = Some(f(jail)?);
        Ok(())
    })
    .map_err(|err| anyhow!(err.to_string()))?;
    output.ok_or_else(|| anyhow!("jail closure produced no value"))
}

/// Set each `(name, value)` pair in the jail's environment.
pub fn set_env<'a, I>(jail: &mut figment::Jail, pairs: I)
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    for (name, value) in pairs {
        jail.set_env(name, value);
    }
}

/// Convert any displayable error into a [`figment::Error`].
///
/// Lets code returning `anyhow::Error` run inside [`jailed`].
#[must_use]
#[expect(
    clippy::needless_pass_by_value,
    reason = "map_err passes the error by value"
)]
pub fn jail_error<E: ToString>(err: E) -> figment::Error {
    figment::Error::from(err.to_string())
}
