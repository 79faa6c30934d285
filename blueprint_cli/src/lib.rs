//! Library interface for the `forge-blueprint` command.
//!
//! [`run`] resolves the layered configuration, installs logging, loads the
//! blueprint for the requested directory and writes its JSON projection.

pub mod cli;
pub mod config;
pub mod error;

use std::io::Write;

use forge_blueprint::{BlueprintLoader, LoaderBuilder};
use serde_json::Value as JsonValue;
use tracing_subscriber::EnvFilter;

use crate::cli::Args;
use crate::config::CliConfig;
use crate::error::CliError;

/// Load the blueprint described by `args` and write it to `out`.
///
/// # Errors
///
/// Returns [`CliError`] when configuration, loading or output fails.
pub fn run<W: Write>(args: &Args, out: &mut W) -> Result<(), CliError> {
    let config = CliConfig::load(args)?;
    init_logging(&config.log)?;
    tracing::debug!(?config, "resolved configuration");

    let loader = args
        .env
        .iter()
        .fold(LoaderBuilder::new(), |builder, (name, value)| {
            builder.env_override(name.as_str(), value.as_str())
        })
        .build();
    let blueprint = loader.load(&config.dir)?;
    let json: JsonValue = match &args.path {
        Some(path) => blueprint.decode_path(path)?,
        None => blueprint.to_json()?,
    };
    write_json(out, &json, config.pretty)
}

/// Install a stderr subscriber filtered by `filter`.
///
/// A subscriber installed earlier in the process is left in place.
///
/// # Errors
///
/// Returns [`CliError::LogFilter`] when `filter` does not parse.
pub fn init_logging(filter: &str) -> Result<(), CliError> {
    let env_filter = EnvFilter::try_new(filter).map_err(|source| CliError::LogFilter {
        filter: filter.to_owned(),
        source,
    })?;
    if let Err(err) = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init()
    {
        tracing::debug!(error = %err, "keeping existing subscriber");
    }
    Ok(())
}

fn write_json<W: Write>(out: &mut W, json: &JsonValue, pretty: bool) -> Result<(), CliError> {
    if pretty {
        serde_json::to_writer_pretty(&mut *out, json)?;
    } else {
        serde_json::to_writer(&mut *out, json)?;
    }
    writeln!(out)?;
    out.flush()?;
    Ok(())
}
