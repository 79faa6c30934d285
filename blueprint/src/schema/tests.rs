//! Tests for the embedded schema.

use anyhow::{Result, anyhow, ensure};
use rstest::{fixture, rstest};
use serde_json::json;

use super::*;
use crate::constraint::ViolationKind;

#[fixture]
fn schema() -> Result<Arc<Schema>> {
    Schema::embedded().map_err(|err| anyhow!("embedded schema failed: {err}"))
}

fn user(source: &str) -> Result<Value> {
    Ok(compile(source.as_bytes())?)
}

#[rstest]
fn embedded_schema_declares_version(schema: Result<Arc<Schema>>) -> Result<()> {
    let loaded = schema?;
    ensure!(loaded.version() == SemVer::new(1, 0, 0));
    ensure!(
        Arc::ptr_eq(&loaded, &Schema::embedded()?),
        "expected the embedded schema to be compiled once"
    );
    Ok(())
}

#[rstest]
fn defaults_are_concrete(schema: Result<Arc<Schema>>) -> Result<()> {
    let defaults = schema?.defaults();
    ensure!(defaults.to_json()? == json!({"version": "1.0.0"}));
    Ok(())
}

#[rstest]
fn accepts_project_targets(schema: Result<Arc<Schema>>) -> Result<()> {
    let merged = schema?.unify(&user(
        "version: \"1.0.0\"\nproject: name: \"svc\"\nproject: ci: targets: test: privileged: true",
    )?);
    ensure!(
        merged.to_json()?
            == json!({
                "version": "1.0.0",
                "project": {"name": "svc", "ci": {"targets": {"test": {"privileged": true}}}},
            }),
        "unexpected blueprint {merged}"
    );
    Ok(())
}

#[rstest]
fn fills_nested_defaults(schema: Result<Arc<Schema>>) -> Result<()> {
    let merged = schema?.unify(&user(
        "version: \"1.0\"\nglobal: repo: name: \"org/repo\"\nproject: {name: \"svc\", deployment: {}}",
    )?);
    let exported = merged.to_json()?;
    ensure!(exported["global"]["repo"]["defaultBranch"] == "main", "{exported}");
    ensure!(exported["project"]["deployment"]["environment"] == "dev", "{exported}");
    Ok(())
}

#[rstest]
fn keeps_unknown_top_level_fields(schema: Result<Arc<Schema>>) -> Result<()> {
    let merged = schema?.unify(&user("version: \"1.0\"\nfoo: \"bar\"")?);
    ensure!(merged.to_json()? == json!({"version": "1.0", "foo": "bar"}));
    Ok(())
}

#[rstest]
#[case::unknown_project_field("version: \"1.0\"\nproject: {name: \"svc\", colour: \"red\"}", ViolationKind::NotAllowed)]
#[case::unknown_target_field("version: \"1.0\"\nproject: {name: \"svc\", ci: targets: t: bogus: 1}", ViolationKind::NotAllowed)]
#[case::negative_retries("version: \"1.0\"\nproject: {name: \"svc\", ci: targets: t: retries: -1}", ViolationKind::Conflict)]
#[case::bad_project_name("version: \"1.0\"\nproject: name: \"Not Valid\"", ViolationKind::Conflict)]
#[case::malformed_version("version: \"one\"", ViolationKind::Conflict)]
#[case::missing_name("version: \"1.0\"\nproject: container: \"svc\"", ViolationKind::Incomplete)]
fn rejects_invalid_blueprints(
    schema: Result<Arc<Schema>>,
    #[case] source: &str,
    #[case] expected: ViolationKind,
) -> Result<()> {
    let merged = schema?.unify(&user(source)?);
    let violations = merged
        .validate_concrete()
        .err()
        .ok_or_else(|| anyhow!("expected {source:?} to violate the schema"))?;
    ensure!(violations.contains_kind(expected), "{violations}");
    Ok(())
}

#[rstest]
fn decodes_into_model(schema: Result<Arc<Schema>>) -> Result<()> {
    let merged = schema?.unify(&user(
        "version: \"1.0\"\nproject: name: \"svc\"\nproject: ci: targets: test: {retries: 3, args: {A: \"1\"}}",
    )?);
    let blueprint: Blueprint = serde_json::from_value(merged.to_json()?)?;
    ensure!(blueprint.version == SemVer::new(1, 0, 0));
    let project = blueprint
        .project
        .ok_or_else(|| anyhow!("project missing"))?;
    let target = project
        .ci
        .and_then(|ci| ci.targets.get("test").cloned())
        .ok_or_else(|| anyhow!("target missing"))?;
    ensure!(target.retries == Some(3));
    ensure!(target.args.get("A").map(String::as_str) == Some("1"));
    Ok(())
}

#[rstest]
#[case::syntax("version: \"1.0.0\"\n#Blueprint: {")]
#[case::no_definition("version: \"1.0.0\"")]
#[case::no_version("#Blueprint: {version: string}")]
fn custom_schema_errors_are_reported(#[case] source: &str) -> Result<()> {
    let err = Schema::compile(source.as_bytes())
        .err()
        .ok_or_else(|| anyhow!("expected {source:?} to be rejected"))?;
    ensure!(err.kind() == crate::ErrorKind::Schema, "{err}");
    Ok(())
}
