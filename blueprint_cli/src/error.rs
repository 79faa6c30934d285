//! Error types for `forge-blueprint`.

use std::sync::Arc;

use forge_blueprint::BlueprintError;
use thiserror::Error;

/// Errors surfaced by the `forge-blueprint` driver.
#[derive(Debug, Error)]
pub enum CliError {
    /// Layered configuration could not be extracted.
    #[error("invalid configuration: {0}")]
    Config(#[source] Box<figment::Error>),

    /// The log filter did not parse.
    #[error("invalid log filter '{filter}': {source}")]
    LogFilter {
        /// Filter as given.
        filter: String,
        /// Parser error.
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },

    /// Loading the blueprint failed.
    #[error(transparent)]
    Blueprint(#[from] Arc<BlueprintError>),

    /// The JSON output could not be written.
    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),

    /// The JSON output could not be serialised.
    #[error("failed to serialise output: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}
