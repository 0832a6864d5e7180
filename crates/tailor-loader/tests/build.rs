//! Directory builds

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;
use tailor_loader::{BuildError, Builder, Fetcher, LoadRestriction, LoaderError, RemoteTarget};
use tailor_test_utils::{
    collection_from_yaml, name_of, render, CONFIG_MAP, DEPLOYMENT_USING_SECRET, SECRET,
};
use tempfile::TempDir;

fn write(root: &Path, file: &str, text: &str) {
    let path = root.join(file);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, text).unwrap();
}

/// Base with a secret and a deployment reading it, under an overlay
fn layered() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "base/secret.yaml", SECRET);
    write(dir.path(), "base/web.yaml", DEPLOYMENT_USING_SECRET);
    write(
        dir.path(),
        "base/tailor.yaml",
        "resources:\n- secret.yaml\n- web.yaml\nnamePrefix: base-\n",
    );
    write(dir.path(), "dev/tailor.yaml", "resources:\n- ../base\nnamePrefix: dev-\n");
    dir
}

#[test]
fn builds_local_directory() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "cm.yaml", CONFIG_MAP);
    write(dir.path(), "tailor.yaml", "resources:\n- cm.yaml\nnameSuffix: -v2\n");

    let output = Builder::new().build(dir.path()).unwrap();

    let expected = collection_from_yaml(&CONFIG_MAP.replace("name: cm", "name: cm-v2"));
    assert_eq!(output.render().unwrap(), render(&expected));
    assert!(output.warnings.is_empty());
}

#[test]
fn overlay_renames_follow_into_base_references() {
    let dir = layered();

    let output = Builder::new().build(dir.path().join("dev")).unwrap();

    assert_eq!(name_of(&output.collection, "Secret", "base-sec"), "dev-base-sec");
    assert_eq!(name_of(&output.collection, "Deployment", "base-web"), "dev-base-web");
    let rendered = output.render().unwrap();
    assert_eq!(rendered.matches("name: dev-base-sec\n").count(), 2, "{rendered}");
    assert!(output.warnings.is_empty(), "{:?}", output.warnings);
}

#[test]
fn references_follow_prefix_then_transformer_rename() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "secret.yaml", SECRET);
    write(dir.path(), "web.yaml", DEPLOYMENT_USING_SECRET);
    write(
        dir.path(),
        "tailor.yaml",
        "\
resources:
- secret.yaml
- web.yaml
namePrefix: dev-
transformers:
- kind: PrefixSuffixTransformer
  prefix: blue-
  fieldSpecs:
  - kind: Secret
    path: metadata/name
",
    );

    let output = Builder::new().build(dir.path()).unwrap();

    assert!(output.warnings.is_empty(), "{:?}", output.warnings);
    assert_eq!(name_of(&output.collection, "Secret", "sec"), "blue-dev-sec");
    assert_eq!(name_of(&output.collection, "Deployment", "web"), "dev-web");
    let rendered = output.render().unwrap();
    assert_eq!(rendered.matches("name: blue-dev-sec\n").count(), 2, "{rendered}");
}

#[test]
fn base_builds_on_its_own() {
    let dir = layered();

    let output = Builder::new().build(dir.path().join("base")).unwrap();

    assert_eq!(name_of(&output.collection, "Secret", "sec"), "base-sec");
    assert_eq!(output.render().unwrap().matches("name: base-sec\n").count(), 2);
}

#[test]
fn common_labels_reach_templates() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "web.yaml", DEPLOYMENT_USING_SECRET);
    write(dir.path(), "tailor.yaml", "resources:\n- web.yaml\ncommonLabels:\n  env: dev\n");

    let output = Builder::new().build(dir.path()).unwrap();

    let rendered = output.render().unwrap();
    assert_eq!(rendered.matches("env: dev").count(), 3, "{rendered}");
}

#[test]
fn mutual_bases_are_a_cycle() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a/tailor.yaml", "resources:\n- ../b\n");
    write(dir.path(), "b/tailor.yaml", "resources:\n- ../a\n");

    let err = Builder::new().build(dir.path().join("a")).unwrap_err();

    assert!(matches!(err, BuildError::Cycle(_)), "{err}");
}

#[test]
fn file_outside_root_is_refused() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "outside.yaml", CONFIG_MAP);
    write(dir.path(), "app/tailor.yaml", "resources:\n- ../outside.yaml\n");

    let err = Builder::new().build(dir.path().join("app")).unwrap_err();
    assert!(matches!(&err, BuildError::Loader(e) if e.is_restriction_violation()), "{err}");

    let output = Builder::new()
        .with_restriction(LoadRestriction::None)
        .build(dir.path().join("app"))
        .unwrap();
    assert_eq!(output.collection.len(), 1);
}

#[test]
fn malformed_build_file_names_its_path() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "tailor.yaml", "resource:\n- cm.yaml\n");

    let err = Builder::new().build(dir.path()).unwrap_err();

    match err {
        BuildError::Config { path, .. } => assert!(path.ends_with("tailor.yaml")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn failing_step_fails_the_build() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "cm.yaml", CONFIG_MAP);
    write(
        dir.path(),
        "tailor.yaml",
        "\
resources:
- cm.yaml
transformers:
- kind: LabelTransformer
  labels:
    env: dev
  fieldSpecs:
  - path: metadata/name
",
    );

    let err = Builder::new().build(dir.path()).unwrap_err();

    match err {
        BuildError::Pipeline(e) => {
            assert_eq!(e.step, 0);
            assert_eq!(e.transformer, "LabelTransformer");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn duplicate_resources_fail_the_build() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "cm.yaml", CONFIG_MAP);
    write(dir.path(), "again.yaml", CONFIG_MAP);
    write(dir.path(), "tailor.yaml", "resources:\n- cm.yaml\n- again.yaml\n");

    let err = Builder::new().build(dir.path()).unwrap_err();

    assert!(matches!(err, BuildError::Resource(_)), "{err}");
}

/// Serves a small build directory instead of cloning
#[derive(Debug, Default)]
struct FakeFetcher {
    checkouts: Mutex<Vec<PathBuf>>,
}

impl Fetcher for FakeFetcher {
    fn fetch(&self, target: &RemoteTarget, dest: &Path) -> Result<(), LoaderError> {
        self.checkouts.lock().unwrap().push(dest.to_path_buf());
        assert_eq!(target.repo, "https://github.com/org/repo.git");
        write(dest, "app/cm.yaml", CONFIG_MAP);
        write(dest, "app/tailor.yaml", "resources:\n- cm.yaml\n");
        Ok(())
    }
}

#[test]
fn remote_base_is_fetched_built_and_removed() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "tailor.yaml", "resources:\n- github.com/org/repo//app\nnamePrefix: r-\n");
    let fetcher = Arc::new(FakeFetcher::default());

    let output = Builder::new().with_fetcher(fetcher.clone()).build(dir.path()).unwrap();

    assert_eq!(name_of(&output.collection, "ConfigMap", "cm"), "r-cm");
    let checkouts = fetcher.checkouts.lock().unwrap();
    assert_eq!(checkouts.len(), 1);
    assert!(!checkouts[0].exists());
}
