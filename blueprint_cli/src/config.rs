//! Layered configuration for `forge-blueprint`.
//!
//! Values come from built-in defaults, then `FORGE_`-prefixed environment
//! variables, then command-line flags. Later layers win.

use camino::Utf8PathBuf;
use figment::Figment;
use figment::providers::{Env, Serialized};
use serde::{Deserialize, Serialize};

use crate::cli::Args;
use crate::error::CliError;

/// Prefix of environment variables read by the driver.
pub const ENV_PREFIX: &str = "FORGE_";

/// Keys that may be set through the environment.
const ENV_KEYS: [&str; 3] = ["log", "pretty", "dir"];

/// Effective driver settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliConfig {
    /// `tracing` filter directives.
    pub log: String,
    /// Whether to indent JSON output.
    pub pretty: bool,
    /// Directory to load the blueprint for.
    pub dir: Utf8PathBuf,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            log: "warn".to_owned(),
            pretty: false,
            dir: Utf8PathBuf::from("."),
        }
    }
}

/// Settings given explicitly on the command line.
#[derive(Debug, Default, Serialize)]
struct CliLayer {
    #[serde(skip_serializing_if = "Option::is_none")]
    log: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pretty: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dir: Option<Utf8PathBuf>,
}

impl From<&Args> for CliLayer {
    fn from(args: &Args) -> Self {
        Self {
            log: args.log.clone(),
            pretty: args.pretty.then_some(true),
            dir: args.dir.clone(),
        }
    }
}

impl CliConfig {
    /// The layered provider stack for `args`.
    #[must_use]
    pub fn figment(args: &Args) -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Env::prefixed(ENV_PREFIX).only(&ENV_KEYS))
            .merge(Serialized::defaults(CliLayer::from(args)))
    }

    /// Resolve the settings for `args`.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Config`] when a layer holds a value of the wrong
    /// type, such as `FORGE_PRETTY=maybe`.
    pub fn load(args: &Args) -> Result<Self, CliError> {
        Ok(Self::figment(args).extract()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, ensure};
    use clap::Parser;
    use rstest::rstest;
    use test_helpers::figment::{jail_error, jailed, set_env};

    fn resolve(env: &[(&str, &str)], argv: &[&str]) -> Result<CliConfig> {
        jailed(|jail| {
            set_env(jail, env.iter().copied());
            let args = Args::try_parse_from(
                std::iter::once("forge-blueprint").chain(argv.iter().copied()),
            )
            .map_err(jail_error)?;
            CliConfig::load(&args).map_err(jail_error)
        })
    }

    #[rstest]
    fn defaults_apply_without_input() -> Result<()> {
        ensure!(resolve(&[], &[])? == CliConfig::default());
        Ok(())
    }

    #[rstest]
    #[case::env_only(&[("FORGE_LOG", "debug")], &[], "debug")]
    #[case::flag_only(&[], &["--log", "info"], "info")]
    #[case::flag_beats_env(&[("FORGE_LOG", "debug")], &["--log", "trace"], "trace")]
    fn log_filter_layers(
        #[case] env: &[(&str, &str)],
        #[case] argv: &[&str],
        #[case] expected: &str,
    ) -> Result<()> {
        let config = resolve(env, argv)?;
        ensure!(config.log == expected, "got {}", config.log);
        Ok(())
    }

    #[rstest]
    fn environment_sets_pretty_and_dir() -> Result<()> {
        let config = resolve(&[("FORGE_PRETTY", "true"), ("FORGE_DIR", "svc")], &[])?;
        ensure!(config.pretty);
        ensure!(config.dir == "svc");

        let flagged = resolve(&[("FORGE_DIR", "svc")], &["other"])?;
        ensure!(flagged.dir == "other");
        Ok(())
    }

    #[rstest]
    fn unrelated_forge_variables_are_ignored() -> Result<()> {
        let config = resolve(&[("FORGE_PATH", "x"), ("FORGE_ENV", "y")], &[])?;
        ensure!(config == CliConfig::default());
        Ok(())
    }

    #[rstest]
    fn mistyped_environment_value_is_reported() -> Result<()> {
        let outcome = jailed(|jail| {
            jail.set_env("FORGE_PRETTY", "maybe");
            let args = Args::try_parse_from(["forge-blueprint"]).map_err(jail_error)?;
            Ok(CliConfig::load(&args).is_err())
        })?;
        ensure!(outcome, "FORGE_PRETTY=maybe was accepted");
        Ok(())
    }
}
