//! Tests for single-file loading.

use std::collections::BTreeMap;

use anyhow::{Result, anyhow, ensure};
use rstest::{fixture, rstest};

use super::*;
use crate::ErrorKind;

#[fixture]
fn injector() -> Injector {
    Injector::new(BTreeMap::from([("FOO".to_owned(), "bar".to_owned())]))
}

fn load_err(source: &str, injector: &Injector) -> Result<Arc<BlueprintError>> {
    BlueprintFile::load("/repo/blueprint.cue", source.as_bytes(), injector)
        .err()
        .ok_or_else(|| anyhow!("expected {source:?} to fail"))
}

#[rstest]
#[case::two_part("version: \"1.0\"\nproject: name: \"svc\"", SemVer::new(1, 0, 0))]
#[case::three_part("version: \"1.2.3\"\nproject: name: \"svc\"", SemVer::new(1, 2, 3))]
fn strips_version_and_keeps_payload(
    injector: Injector,
    #[case] source: &str,
    #[case] expected: SemVer,
) -> Result<()> {
    let file = BlueprintFile::load("/repo/blueprint.cue", source.as_bytes(), &injector)?;
    ensure!(file.version() == expected);
    ensure!(file.path().as_str() == "/repo/blueprint.cue");
    ensure!(
        file.value().lookup(&Path::parse(VERSION_FIELD)?).is_none(),
        "version field survived: {}",
        file.value()
    );
    ensure!(file.value().to_json()? == serde_json::json!({"project": {"name": "svc"}}));
    Ok(())
}

#[rstest]
fn injects_environment(injector: Injector) -> Result<()> {
    let file = BlueprintFile::load(
        "/repo/blueprint.cue",
        b"version: \"1.0\"\nfoo: string | *\"default\" @env(name=FOO,type=string)",
        &injector,
    )?;
    ensure!(file.value().to_json()? == serde_json::json!({"foo": "bar"}));
    Ok(())
}

#[rstest]
#[case::missing("project: name: \"svc\"", ErrorKind::VersionMissing)]
#[case::not_concrete("version: string", ErrorKind::VersionMissing)]
#[case::invalid("version: \"foo\"", ErrorKind::VersionInvalid)]
#[case::not_a_string("version: 1", ErrorKind::VersionInvalid)]
#[case::syntax("version: \"1.0\"\nproject: {", ErrorKind::Compile)]
#[case::env_parse("version: \"1.0\"\nfoo: int @env(name=FOO,type=int)", ErrorKind::EnvParse)]
#[case::env_type("version: \"1.0\"\nfoo: _ @env(name=FOO,type=list)", ErrorKind::EnvTypeInvalid)]
#[case::incomplete("version: \"1.0\"\nfoo: int", ErrorKind::SchemaViolation)]
#[case::conflict("version: \"1.0\"\nfoo: 1\nfoo: 2", ErrorKind::Unification)]
fn classifies_failures(
    injector: Injector,
    #[case] source: &str,
    #[case] expected: ErrorKind,
) -> Result<()> {
    let err = load_err(source, &injector)?;
    ensure!(err.kind() == expected, "expected {expected:?}, got {err}");
    ensure!(
        err.to_string().contains("/repo/blueprint.cue"),
        "error does not name the file: {err}"
    );
    Ok(())
}
