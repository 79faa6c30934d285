//! Command-line interface definitions for `forge-blueprint`.

use camino::Utf8PathBuf;
use clap::Parser;

/// Parsed arguments for `forge-blueprint`.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "forge-blueprint")]
#[command(about = "Load the blueprint for a directory and print it as JSON")]
#[command(version)]
pub struct Args {
    /// Directory to load the blueprint for (defaults to the current one).
    #[arg(value_name = "DIR")]
    pub dir: Option<Utf8PathBuf>,
    /// Print only the value at this dotted path, such as `project.name`.
    #[arg(long, value_name = "dotted.path")]
    pub path: Option<String>,
    /// Bind an `@env` attribute to a value (repeat for several).
    #[arg(long = "env", value_name = "KEY=VALUE", value_parser = parse_env_pair)]
    pub env: Vec<(String, String)>,
    /// Indent the JSON output.
    #[arg(long)]
    pub pretty: bool,
    /// Log filter in `tracing` directive syntax, such as `forge_blueprint=debug`.
    #[arg(long, value_name = "filter")]
    pub log: Option<String>,
}

fn parse_env_pair(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_owned(), value.to_owned())),
        _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, ensure};
    use rstest::rstest;

    #[rstest]
    fn parses_every_flag() -> Result<()> {
        let args = Args::try_parse_from([
            "forge-blueprint",
            "services/api",
            "--path",
            "project.name",
            "--env",
            "FOO=bar",
            "--env",
            "EMPTY=",
            "--env",
            "URL=a=b",
            "--pretty",
            "--log",
            "debug",
        ])?;
        ensure!(args.dir.as_deref().map(camino::Utf8Path::as_str) == Some("services/api"));
        ensure!(args.path.as_deref() == Some("project.name"));
        ensure!(
            args.env
                == [
                    ("FOO".to_owned(), "bar".to_owned()),
                    ("EMPTY".to_owned(), String::new()),
                    ("URL".to_owned(), "a=b".to_owned()),
                ]
        );
        ensure!(args.pretty);
        ensure!(args.log.as_deref() == Some("debug"));
        Ok(())
    }

    #[rstest]
    fn defaults_are_empty() -> Result<()> {
        let args = Args::try_parse_from(["forge-blueprint"])?;
        ensure!(args.dir.is_none() && args.path.is_none() && args.env.is_empty());
        ensure!(!args.pretty && args.log.is_none());
        Ok(())
    }

    #[rstest]
    #[case::no_separator("FOO")]
    #[case::empty_key("=bar")]
    fn rejects_malformed_env_pairs(#[case] pair: &str) -> Result<()> {
        ensure!(Args::try_parse_from(["forge-blueprint", "--env", pair]).is_err());
        Ok(())
    }
}
