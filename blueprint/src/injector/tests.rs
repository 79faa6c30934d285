//! Tests for environment injection.

use std::collections::{BTreeMap, HashMap};

use anyhow::{Result, anyhow, ensure};
use rstest::rstest;
use serial_test::serial;
use test_helpers::env as test_env;

use super::*;
use crate::constraint::{ViolationKind, compile};

fn env(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(name, value)| ((*name).to_owned(), (*value).to_owned()))
        .collect()
}

fn inject(source: &str, pairs: &[(&str, &str)]) -> Result<Value> {
    let value = compile(source.as_bytes())?;
    Ok(Injector::new(env(pairs)).inject(&value))
}

fn at(value: &Value, path: &str) -> Result<Value> {
    value
        .lookup(&Path::parse(path)?)
        .cloned()
        .ok_or_else(|| anyhow!("no value at {path}"))
}

#[rstest]
fn binds_string_over_default() -> Result<()> {
    let value = inject(
        "foo: string | *\"default\" @env(name=FOO,type=string)",
        &[("FOO", "bar")],
    )?;
    ensure!(at(&value, "foo")?.as_str() == Some("bar"));
    ensure!(value.validate_concrete().is_ok(), "expected concrete value");
    Ok(())
}

#[rstest]
fn unset_variable_keeps_default() -> Result<()> {
    let value = inject("foo: string | *\"default\" @env(name=FOO,type=string)", &[])?;
    ensure!(at(&value, "foo")?.as_str() == Some("default"));
    Ok(())
}

#[rstest]
#[case::positive("42", 42)]
#[case::negative("-7", -7)]
fn binds_integers(#[case] raw: &str, #[case] expected: i64) -> Result<()> {
    let value = inject("port: int @env(name=PORT,type=int)", &[("PORT", raw)])?;
    ensure!(at(&value, "port")?.as_int() == Some(expected));
    Ok(())
}

#[rstest]
#[case::word("not-a-number")]
#[case::empty("")]
#[case::padded(" 42")]
fn unparseable_integers_bind_errors(#[case] raw: &str) -> Result<()> {
    let value = inject("port: int @env(name=PORT,type=int)", &[("PORT", raw)])?;
    let violations = value
        .validate_concrete()
        .err()
        .ok_or_else(|| anyhow!("expected validation to fail for {raw:?}"))?;
    ensure!(violations.contains_kind(ViolationKind::EnvParse), "{violations}");
    let first = violations
        .iter()
        .next()
        .ok_or_else(|| anyhow!("no violations"))?;
    ensure!(first.path().to_string() == "port", "unexpected path {}", first.path());
    Ok(())
}

#[rstest]
#[case::literal_true("true", true)]
#[case::upper("TRUE", true)]
#[case::one("1", true)]
#[case::yes("yes", true)]
#[case::present_but_empty("", true)]
#[case::literal_false("false", false)]
#[case::zero("0", false)]
#[case::off("Off", false)]
fn binds_booleans(#[case] raw: &str, #[case] expected: bool) -> Result<()> {
    let value = inject("debug: bool @env(name=DEBUG,type=bool)", &[("DEBUG", raw)])?;
    ensure!(at(&value, "debug")?.as_bool() == Some(expected));
    Ok(())
}

#[rstest]
fn unparseable_boolean_binds_error() -> Result<()> {
    let value = inject("debug: bool @env(name=DEBUG,type=bool)", &[("DEBUG", "maybe")])?;
    ensure!(at(&value, "debug")?.is_bottom());
    Ok(())
}

#[rstest]
fn empty_string_variable_binds_empty_string() -> Result<()> {
    let value = inject("name: string @env(name=NAME,type=string)", &[("NAME", "")])?;
    ensure!(at(&value, "name")?.as_str() == Some(""));
    Ok(())
}

#[rstest]
#[case::unknown_type("x: _ @env(name=X,type=float)", ViolationKind::EnvType)]
#[case::missing_type("x: _ @env(name=X)", ViolationKind::EnvAttribute)]
#[case::missing_name("x: _ @env(type=string)", ViolationKind::EnvAttribute)]
fn malformed_attributes_bind_errors_even_when_unset(
    #[case] source: &str,
    #[case] expected: ViolationKind,
) -> Result<()> {
    let value = inject(source, &[])?;
    let violations = value
        .validate_concrete()
        .err()
        .ok_or_else(|| anyhow!("expected {source:?} to fail validation"))?;
    ensure!(violations.contains_kind(expected), "{violations}");
    Ok(())
}

#[rstest]
fn binds_nested_and_optional_fields_in_document_order() -> Result<()> {
    let source = "project: {\n\tname: string @env(name=NAME,type=string)\n\tci?: retries?: int @env(name=RETRIES,type=int)\n}";
    let value = compile(source.as_bytes())?;
    let injector = Injector::new(env(&[("NAME", "svc"), ("RETRIES", "3")]));
    let paths: Vec<String> = injector
        .bindings(&value)
        .iter()
        .map(|binding| binding.path().to_string())
        .collect();
    ensure!(
        paths == ["project.name", "project.ci.retries"],
        "unexpected bindings {paths:?}"
    );
    let injected = injector.inject(&value);
    ensure!(at(&injected, "project.ci.retries")?.as_int() == Some(3));
    ensure!(injected.to_json()?["project"]["ci"]["retries"] == 3);
    Ok(())
}

#[rstest]
#[case::string("foo: string | *\"d\" @env(name=FOO,type=string)", "bar")]
#[case::int("foo: int @env(name=FOO,type=int)", "oops")]
#[case::bool("foo: bool @env(name=FOO,type=bool)", "on")]
fn injection_is_idempotent(#[case] source: &str, #[case] raw: &str) -> Result<()> {
    let value = compile(source.as_bytes())?;
    let injector = Injector::new(env(&[("FOO", raw)]));
    let once = injector.inject(&value);
    let twice = injector.inject(&once);
    ensure!(twice.equivalent(&once), "{once} became {twice}");
    Ok(())
}

#[rstest]
fn unknown_keys_leave_tree_unchanged() -> Result<()> {
    let value = compile(b"foo: string | *\"d\" @env(name=FOO,type=string)\nbar: 1")?;
    let injected = Injector::new(env(&[("OTHER", "x")])).inject(&value);
    ensure!(injected == value, "expected no-op, got {injected}");
    Ok(())
}

#[rstest]
fn overlay_prefers_overrides() {
    let base = HashMap::from([
        ("A".to_owned(), "base".to_owned()),
        ("B".to_owned(), "base".to_owned()),
    ]);
    let overlay = OverlayEnv::new(base).with_all([("A", "override")]);
    assert_eq!(overlay.get("A").as_deref(), Some("override"));
    assert_eq!(overlay.get("B").as_deref(), Some("base"));
    assert_eq!(overlay.get("C"), None);
}

#[rstest]
#[serial]
fn os_env_reads_process_environment() -> Result<()> {
    let _set = test_env::set_var("FORGE_BLUEPRINT_INJECTOR_TEST", "from-os");
    let _unset = test_env::remove_var("FORGE_BLUEPRINT_INJECTOR_UNSET");
    let value = compile(
        b"a: string @env(name=FORGE_BLUEPRINT_INJECTOR_TEST,type=string)\nb: *\"kept\" | string @env(name=FORGE_BLUEPRINT_INJECTOR_UNSET,type=string)",
    )?;
    let injected = Injector::default().inject(&value);
    ensure!(injected.to_json()? == serde_json::json!({"a": "from-os", "b": "kept"}));
    Ok(())
}
