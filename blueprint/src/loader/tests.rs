//! Tests for the loader pipeline and its builder.

use std::collections::BTreeMap;

use anyhow::{Result, anyhow, ensure};
use rstest::{fixture, rstest};
use serde_json::json;
use test_helpers::repo::RepoTree;

use super::*;
use crate::{ErrorKind, Stage};

#[fixture]
fn repo() -> Result<RepoTree> {
    let tree = RepoTree::new()?;
    tree.git_root("")?;
    Ok(tree)
}

fn quiet_loader(sink: &Arc<CollectingSink>) -> LoaderBuilder {
    LoaderBuilder::new()
        .env_source(BTreeMap::<String, String>::new())
        .warning_sink(Arc::clone(sink) as Arc<dyn WarningSink>)
}

#[rstest]
#[case::start(LoadState::Fresh, LoadState::Discovering, true)]
#[case::found(LoadState::Discovering, LoadState::Loading, true)]
#[case::nothing_found(LoadState::Discovering, LoadState::Skipped, true)]
#[case::skipped_validates(LoadState::Skipped, LoadState::Validating, true)]
#[case::merge(LoadState::Loading, LoadState::Merging, true)]
#[case::schema(LoadState::Merging, LoadState::SchemaUnifying, true)]
#[case::validate(LoadState::SchemaUnifying, LoadState::Validating, true)]
#[case::ready(LoadState::Validating, LoadState::Ready, true)]
#[case::fail_midway(LoadState::Merging, LoadState::Failed, true)]
#[case::skip_merge(LoadState::Loading, LoadState::SchemaUnifying, false)]
#[case::backwards(LoadState::Validating, LoadState::Loading, false)]
#[case::fail_after_ready(LoadState::Ready, LoadState::Failed, false)]
#[case::fail_twice(LoadState::Failed, LoadState::Failed, false)]
fn state_transitions(
    #[case] from: LoadState,
    #[case] to: LoadState,
    #[case] allowed: bool,
) -> Result<()> {
    ensure!(
        from.can_advance_to(to) == allowed,
        "{from} -> {to} should be {}",
        if allowed { "allowed" } else { "rejected" }
    );
    Ok(())
}

#[rstest]
fn empty_repository_yields_schema_defaults(repo: Result<RepoTree>) -> Result<()> {
    let tree = repo?;
    let sink = Arc::new(CollectingSink::new());
    let raw = quiet_loader(&sink).build().load(tree.root())?;
    ensure!(raw.to_json()? == json!({"version": "1.0.0"}), "got {}", raw.value());
    ensure!(sink.warnings().is_empty());
    Ok(())
}

#[rstest]
fn empty_directory_without_root_yields_schema_defaults() -> Result<()> {
    let tree = RepoTree::new()?;
    let sink = Arc::new(CollectingSink::new());
    // A marker no ancestor carries, so a `.git` above the temp dir is ignored.
    let raw = quiet_loader(&sink)
        .root_marker(".forge-root-marker-absent")
        .build()
        .load(tree.root())?;
    ensure!(raw.to_json()? == json!({"version": "1.0.0"}), "got {}", raw.value());
    ensure!(sink.warnings().is_empty(), "unexpected warnings {:?}", sink.warnings());
    Ok(())
}

#[rstest]
fn newer_minor_version_warns_once(repo: Result<RepoTree>) -> Result<()> {
    let tree = repo?;
    tree.write("blueprint.cue", "version: \"1.4\"\nproject: name: \"svc\"\n")?;
    let sink = Arc::new(CollectingSink::new());
    let raw = quiet_loader(&sink).build().load(tree.root())?;
    ensure!(raw.get("version").and_then(Value::as_str) == Some("1.4.0"));
    ensure!(
        sink.warnings()
            == [LoadWarning::MinorVersionAhead {
                version: SemVer::new(1, 4, 0),
                supported: SemVer::new(1, 0, 0),
            }],
        "unexpected warnings {:?}",
        sink.warnings()
    );
    Ok(())
}

#[rstest]
fn overrides_take_precedence_over_source(repo: Result<RepoTree>) -> Result<()> {
    let tree = repo?;
    tree.write(
        "blueprint.cue",
        concat!(
            "version: \"1.0\"\n",
            "owner: string @env(name=OWNER,type=string)\n",
            "region: string @env(name=REGION,type=string)\n",
        ),
    )?;
    let raw = LoaderBuilder::new()
        .env_source(BTreeMap::from([
            ("OWNER".to_owned(), "from-source".to_owned()),
            ("REGION".to_owned(), "eu-west-1".to_owned()),
        ]))
        .env_override("OWNER", "from-override")
        .warning_sink(Arc::new(CollectingSink::new()))
        .build()
        .load(tree.root())?;
    ensure!(raw.get("owner").and_then(Value::as_str) == Some("from-override"));
    ensure!(raw.get("region").and_then(Value::as_str) == Some("eu-west-1"));
    Ok(())
}

const CUSTOM_SCHEMA: &str = r#"
version: "2.3.0"

#Blueprint: {
	version: string
	tier:    "free" | *"paid"
}
"#;

#[rstest]
fn custom_schema_supplies_defaults_and_closes(repo: Result<RepoTree>) -> Result<()> {
    let tree = repo?;
    let schema = Arc::new(Schema::compile(CUSTOM_SCHEMA.as_bytes())?);
    let sink = Arc::new(CollectingSink::new());

    tree.write("blueprint.cue", "version: \"2.1\"\n")?;
    let raw = quiet_loader(&sink)
        .schema(Arc::clone(&schema))
        .build()
        .load(tree.root())?;
    ensure!(raw.to_json()? == json!({"version": "2.1.0", "tier": "paid"}));

    tree.write("blueprint.cue", "version: \"2.1\"\nextra: 1\n")?;
    let err = quiet_loader(&sink)
        .schema(schema)
        .build()
        .load(tree.root())
        .err()
        .ok_or_else(|| anyhow!("closed schema accepted an unknown field"))?;
    ensure!(err.kind() == ErrorKind::SchemaViolation, "unexpected {err}");
    ensure!(sink.warnings().is_empty());
    Ok(())
}

#[rstest]
fn custom_file_name_and_marker(repo: Result<RepoTree>) -> Result<()> {
    let tree = repo?;
    tree.mkdir("mono/.hg")?;
    tree.write("mono/forge.cue", "version: \"1.0\"\nproject: name: \"outer\"\n")?;
    tree.write("mono/app/forge.cue", "version: \"1.0\"\nproject: container: \"app\"\n")?;
    tree.write("blueprint.cue", "version: \"9.0\"\n")?;
    let sink = Arc::new(CollectingSink::new());
    let raw = quiet_loader(&sink)
        .file_name("forge.cue")
        .root_marker(".hg")
        .build()
        .load(&tree.path("mono/app"))?;
    ensure!(raw.get("project.name").and_then(Value::as_str) == Some("outer"));
    ensure!(raw.get("project.container").and_then(Value::as_str) == Some("app"));
    Ok(())
}

#[rstest]
fn raw_blueprint_accessors(repo: Result<RepoTree>) -> Result<()> {
    let tree = repo?;
    tree.write(
        "blueprint.cue",
        concat!(
            "version: \"1.0\"\n",
            "project: name: \"svc\"\n",
            "project: ci: targets: test: {\n",
            "\tprivileged: true\n",
            "\tretries: 2\n",
            "}\n",
        ),
    )?;
    let sink = Arc::new(CollectingSink::new());
    let raw = quiet_loader(&sink).build().load(tree.root())?;

    raw.validate()?;
    ensure!(raw.get("project..name").is_none());
    ensure!(raw.get("project.missing").is_none());
    ensure!(raw.decode_path::<bool>("project.ci.targets.test.privileged")?);
    ensure!(raw.decode_path::<u32>("project.ci.targets.test.retries")? == 2);

    let missing = raw
        .decode_path::<bool>("project.ci.targets.build")
        .err()
        .ok_or_else(|| anyhow!("missing path decoded"))?;
    ensure!(missing.kind() == ErrorKind::InvalidPath, "unexpected {missing}");
    let mistyped = raw
        .decode_path::<u32>("project.name")
        .err()
        .ok_or_else(|| anyhow!("string decoded as u32"))?;
    ensure!(mistyped.kind() == ErrorKind::Decode, "unexpected {mistyped}");

    let model = raw.decode_blueprint()?;
    let target = model
        .project
        .as_ref()
        .and_then(|project| project.ci.as_ref())
        .and_then(|ci| ci.targets.get("test"))
        .ok_or_else(|| anyhow!("target missing from {model:?}"))?;
    ensure!(target.privileged == Some(true) && target.retries == Some(2));

    let bytes = raw.marshal_json()?;
    let reparsed: serde_json::Value = serde_json::from_slice(&bytes)?;
    ensure!(reparsed == raw.to_json()?);
    ensure!(Value::from(raw.clone()) == *raw.value());
    Ok(())
}

#[rstest]
fn errors_leave_no_partial_result(repo: Result<RepoTree>) -> Result<()> {
    let tree = repo?;
    tree.write("blueprint.cue", "version: \"1.0\"\nproject: name: \"Not Valid\"\n")?;
    let sink = Arc::new(CollectingSink::new());
    let err = quiet_loader(&sink)
        .build()
        .load(tree.root())
        .err()
        .ok_or_else(|| anyhow!("invalid project name accepted"))?;
    ensure!(err.kind() == ErrorKind::SchemaViolation, "unexpected {err}");
    ensure!(err.stage() == Stage::Validation, "unexpected stage {}", err.stage());
    ensure!(err.to_string().starts_with("validation: "), "unexpected {err}");
    ensure!(err.violations().is_some_and(|violations| !violations.is_empty()));
    Ok(())
}

#[rstest]
fn loaders_are_interchangeable(repo: Result<RepoTree>) -> Result<()> {
    struct Fixed(RawBlueprint);

    impl BlueprintLoader for Fixed {
        fn load(&self, _start: &Utf8Path) -> BlueprintResult<RawBlueprint> {
            Ok(self.0.clone())
        }
    }

    fn project_name(loader: &dyn BlueprintLoader, start: &Utf8Path) -> Result<Option<String>> {
        let raw = loader.load(start)?;
        Ok(raw.get("project.name").and_then(Value::as_str).map(str::to_owned))
    }

    let tree = repo?;
    tree.write("blueprint.cue", "version: \"1.0\"\nproject: name: \"real\"\n")?;
    let fixed = Fixed(RawBlueprint::new(
        Value::empty_struct().fill(&Path::parse("project.name")?, &Value::string("stub")),
    ));
    let real = DefaultBlueprintLoader::builder()
        .env_source(BTreeMap::<String, String>::new())
        .build();
    ensure!(project_name(&real, tree.root())?.as_deref() == Some("real"));
    ensure!(project_name(&fixed, tree.root())?.as_deref() == Some("stub"));
    Ok(())
}
