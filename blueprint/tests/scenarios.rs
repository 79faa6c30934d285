//! End-to-end loading of blueprint hierarchies on the real filesystem.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Result, anyhow, ensure};
use forge_blueprint::constraint::Value;
use forge_blueprint::loader::{CollectingSink, LoadWarning, WarningSink};
use forge_blueprint::{
    BlueprintError, BlueprintLoader, ErrorKind, LoaderBuilder, RawBlueprint, SemVer, Stage,
};
use rstest::{fixture, rstest};
use serde_json::json;
use serial_test::serial;
use test_helpers::env;
use test_helpers::repo::RepoTree;

struct Harness {
    tree: RepoTree,
    sink: Arc<CollectingSink>,
}

impl Harness {
    fn builder(&self) -> LoaderBuilder {
        LoaderBuilder::new()
            .env_source(BTreeMap::<String, String>::new())
            .warning_sink(Arc::clone(&self.sink) as Arc<dyn WarningSink>)
    }

    fn load(&self, start: &str) -> Result<RawBlueprint> {
        Ok(self.builder().build().load(&self.tree.path(start))?)
    }

    fn load_err(&self, start: &str) -> Result<Arc<BlueprintError>> {
        self.builder()
            .build()
            .load(&self.tree.path(start))
            .err()
            .ok_or_else(|| anyhow!("expected loading {start:?} to fail"))
    }
}

#[fixture]
fn proj() -> Result<Harness> {
    let tree = RepoTree::new()?;
    tree.git_root("proj")?;
    Ok(Harness {
        tree,
        sink: Arc::new(CollectingSink::new()),
    })
}

fn text<'a>(raw: &'a RawBlueprint, path: &str) -> Option<&'a str> {
    raw.get(path).and_then(Value::as_str)
}

#[rstest]
fn single_file_keeps_its_version(proj: Result<Harness>) -> Result<()> {
    let h = proj?;
    h.tree.write(
        "proj/blueprint.cue",
        concat!(
            "version: \"1.0\"\n",
            "project: name: \"svc\"\n",
            "project: ci: targets: test: privileged: true\n",
        ),
    )?;
    let raw = h.load("proj")?;
    ensure!(text(&raw, "version") == Some("1.0.0"));
    ensure!(text(&raw, "project.name") == Some("svc"));
    ensure!(raw.get("project.ci.targets.test.privileged").and_then(Value::as_bool) == Some(true));
    ensure!(h.sink.warnings().is_empty(), "warnings {:?}", h.sink.warnings());
    Ok(())
}

#[rstest]
fn hierarchy_merges_and_promotes_minor(proj: Result<Harness>) -> Result<()> {
    let h = proj?;
    h.tree.write(
        "proj/sub/blueprint.cue",
        "version: \"1.0\"\nproject: ci: targets: test: privileged: true\n",
    )?;
    h.tree.write(
        "proj/blueprint.cue",
        "version: \"1.1\"\nproject: name: \"svc\"\nproject: ci: targets: test: retries: 3\n",
    )?;
    let raw = h.load("proj/sub")?;
    ensure!(text(&raw, "version") == Some("1.1.0"));
    ensure!(raw.get("project.ci.targets.test.privileged").and_then(Value::as_bool) == Some(true));
    ensure!(raw.get("project.ci.targets.test.retries").and_then(Value::as_int) == Some(3));
    ensure!(
        h.sink.warnings()
            == [LoadWarning::MinorVersionAhead {
                version: SemVer::new(1, 1, 0),
                supported: SemVer::new(1, 0, 0),
            }]
    );
    Ok(())
}

#[rstest]
fn diverging_majors_fail(proj: Result<Harness>) -> Result<()> {
    let h = proj?;
    h.tree.write("proj/blueprint.cue", "version: \"1.0\"\n")?;
    h.tree.write("proj/sub/blueprint.cue", "version: \"2.0\"\n")?;
    let err = h.load_err("proj/sub")?;
    ensure!(err.kind() == ErrorKind::MajorVersionDivergence, "unexpected {err}");
    ensure!(err.stage() == Stage::Merging);
    Ok(())
}

#[rstest]
fn environment_binds_attribute(proj: Result<Harness>) -> Result<()> {
    let h = proj?;
    h.tree.write(
        "proj/blueprint.cue",
        "version: \"1.0\"\nfoo: string | *\"default\" @env(name=FOO,type=string)\n",
    )?;
    let raw = h
        .builder()
        .env_source(BTreeMap::from([("FOO".to_owned(), "bar".to_owned())]))
        .build()
        .load(&h.tree.path("proj"))?;
    ensure!(text(&raw, "foo") == Some("bar"));

    let unset = h.load("proj")?;
    ensure!(text(&unset, "foo") == Some("default"));
    Ok(())
}

#[rstest]
fn unparseable_environment_value_fails(proj: Result<Harness>) -> Result<()> {
    let h = proj?;
    h.tree.write(
        "proj/blueprint.cue",
        "version: \"1.0\"\nfoo: int @env(name=FOO,type=int)\n",
    )?;
    let err = h
        .builder()
        .env_override("FOO", "not-a-number")
        .build()
        .load(&h.tree.path("proj"))
        .err()
        .ok_or_else(|| anyhow!("expected an EnvParse failure"))?;
    ensure!(err.kind() == ErrorKind::EnvParse, "unexpected {err}");
    ensure!(err.to_string().contains("foo"), "path missing from {err}");
    Ok(())
}

#[rstest]
fn major_ahead_of_schema_fails(proj: Result<Harness>) -> Result<()> {
    let h = proj?;
    h.tree.write("proj/blueprint.cue", "version: \"2.0\"\n")?;
    let err = h.load_err("proj")?;
    ensure!(err.kind() == ErrorKind::MajorVersionMismatch, "unexpected {err}");
    ensure!(err.stage() == Stage::VersionPolicy);
    Ok(())
}

#[rstest]
#[case::invalid("version: \"foo\"\n", ErrorKind::VersionInvalid)]
#[case::missing("project: name: \"svc\"\n", ErrorKind::VersionMissing)]
#[case::syntax("version: \"1.0\"\nproject: {\n", ErrorKind::Compile)]
#[case::file_conflict("version: \"1.0\"\na: 1\na: 2\n", ErrorKind::Unification)]
fn per_file_failures_are_classified(
    proj: Result<Harness>,
    #[case] source: &str,
    #[case] expected: ErrorKind,
) -> Result<()> {
    let h = proj?;
    let path = h.tree.write("proj/blueprint.cue", source)?;
    let err = h.load_err("proj")?;
    ensure!(err.kind() == expected, "expected {expected:?}, got {err}");
    ensure!(err.stage() == Stage::FileLoading);
    ensure!(err.to_string().contains(path.as_str()), "path missing from {err}");
    Ok(())
}

#[rstest]
fn conflicting_files_fail_to_merge(proj: Result<Harness>) -> Result<()> {
    let h = proj?;
    h.tree.write("proj/blueprint.cue", "version: \"1.0\"\nproject: name: \"a\"\n")?;
    h.tree.write("proj/sub/blueprint.cue", "version: \"1.0\"\nproject: name: \"b\"\n")?;
    let err = h.load_err("proj/sub")?;
    ensure!(err.kind() == ErrorKind::Unification, "unexpected {err}");
    Ok(())
}

#[rstest]
fn empty_repository_uses_schema_defaults(proj: Result<Harness>) -> Result<()> {
    let h = proj?;
    h.tree.mkdir("proj/sub")?;
    let raw = h.load("proj/sub")?;
    ensure!(raw.to_json()? == json!({"version": "1.0.0"}));
    ensure!(h.sink.warnings().is_empty());
    Ok(())
}

#[rstest]
fn unrooted_empty_directory_uses_schema_defaults() -> Result<()> {
    let h = Harness {
        tree: RepoTree::new()?,
        sink: Arc::new(CollectingSink::new()),
    };
    h.tree.mkdir("loose")?;
    let raw = h
        .builder()
        .root_marker(".forge-root-marker-absent")
        .build()
        .load(&h.tree.path("loose"))?;
    ensure!(raw.to_json()? == json!({"version": "1.0.0"}));
    ensure!(h.sink.warnings().is_empty(), "warnings {:?}", h.sink.warnings());
    Ok(())
}

#[rstest]
fn files_above_the_root_are_ignored(proj: Result<Harness>) -> Result<()> {
    let h = proj?;
    h.tree.write("blueprint.cue", "version: \"2.0\"\n")?;
    h.tree.write("proj/blueprint.cue", "version: \"1.0\"\nproject: name: \"svc\"\n")?;
    let raw = h.load("proj")?;
    ensure!(text(&raw, "version") == Some("1.0.0"));
    Ok(())
}

#[rstest]
fn json_output_round_trips(proj: Result<Harness>) -> Result<()> {
    let h = proj?;
    h.tree.write(
        "proj/blueprint.cue",
        concat!(
            "version: \"1.0\"\n",
            "project: {\n",
            "\tname: \"svc\"\n",
            "\tdeployment: modules: main: version: \"0.1.0\"\n",
            "}\n",
        ),
    )?;
    let raw = h.load("proj")?;
    let parsed: serde_json::Value = serde_json::from_slice(&raw.marshal_json()?)?;
    ensure!(
        parsed
            == json!({
                "version": "1.0.0",
                "project": {
                    "name": "svc",
                    "deployment": {
                        "environment": "dev",
                        "modules": {"main": {"namespace": "default", "version": "0.1.0"}},
                    },
                },
            }),
        "unexpected {parsed}"
    );
    Ok(())
}

#[rstest]
#[serial]
fn process_environment_is_the_default_source(proj: Result<Harness>) -> Result<()> {
    let h = proj?;
    h.tree.write(
        "proj/blueprint.cue",
        "version: \"1.0\"\nport: int | *80 @env(name=FORGE_SCENARIO_PORT,type=int)\n",
    )?;
    let scoped = env::scope([("FORGE_SCENARIO_PORT", "8080")]);
    ensure!(scoped.len() == 1);
    let raw = LoaderBuilder::new()
        .warning_sink(Arc::clone(&h.sink) as Arc<dyn WarningSink>)
        .build()
        .load(&h.tree.path("proj"))?;
    ensure!(raw.get("port").and_then(Value::as_int) == Some(8080));
    Ok(())
}
