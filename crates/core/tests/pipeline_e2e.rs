//! End-to-end tests for the retrieve postcondition pipeline.
//!
//! These tests exercise the real `OverwriteComponentPrompt`,
//! `BaselineConflictDetector` and `CompositeChecker` with:
//! - A temporary project directory on disk
//! - A baseline snapshot written next to it
//! - Scripted modal answers in place of an interactive user

use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;

use metaguard_core::conflict::{
    BaselineConflictDetector, ConflictDetectionChecker, ConflictPanel, ConflictServices,
    ConflictSettings,
};
use metaguard_core::metadata::{MetadataDictionary, MetadataRegistry};
use metaguard_core::notify::scripted::{RecordingTelemetry, ScriptedNotifier};
use metaguard_core::overwrite::{ExistenceProber, OverwriteComponentPrompt};
use metaguard_core::{
    CancelReason, CompositeChecker, Decision, LocalComponent, Payload, PostconditionChecker,
    Workspace,
};

// ===========================================================================
// Helpers
// ===========================================================================

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

fn foo() -> LocalComponent {
    LocalComponent::new("Foo", "ApexClass", "classes")
}

fn bar() -> LocalComponent {
    LocalComponent::new("Bar", "ApexClass", "classes")
}

fn registry() -> Arc<dyn MetadataRegistry> {
    Arc::new(MetadataDictionary::builtin())
}

fn overwrite_prompt(root: &Path, notifier: Arc<ScriptedNotifier>) -> OverwriteComponentPrompt {
    OverwriteComponentPrompt::new(
        ExistenceProber::new(registry(), Workspace::new(root)),
        notifier,
        Arc::new(RecordingTelemetry::default()),
    )
}

fn conflict_checker(
    root: &Path,
    notifier: Arc<ScriptedNotifier>,
    panel: Arc<ConflictPanel>,
) -> ConflictDetectionChecker {
    let workspace = Workspace::new(root);
    ConflictDetectionChecker::new(
        "retrieve",
        false,
        ConflictSettings {
            principal: "dev-hub".into(),
            outputdir: "classes".into(),
        },
        workspace.clone(),
        ConflictServices {
            registry: registry(),
            detector: Arc::new(BaselineConflictDetector::new(
                registry(),
                workspace,
                ".metaguard/baseline",
            )),
            view: panel,
            notifier,
        },
    )
}

fn both() -> Decision<Payload> {
    Decision::Continue(Payload::Components(vec![foo(), bar()]))
}

// ===========================================================================
// Overwrite prompt against a real project
// ===========================================================================

#[tokio::test]
async fn test_overwrite_keeps_every_component() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "classes/Foo.cls", "public class Foo {}");
    let notifier = Arc::new(ScriptedNotifier::answering(["Overwrite"]));

    let out = overwrite_prompt(tmp.path(), notifier.clone())
        .check(both())
        .await
        .unwrap();

    assert_eq!(out, both());
    let prompts = notifier.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].message.starts_with("ApexClass:Foo already exists"));
}

#[tokio::test]
async fn test_skip_removes_existing_component() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "classes/Foo.cls-meta.xml", "<ApexClass/>");
    let notifier = Arc::new(ScriptedNotifier::answering(["Skip"]));

    let out = overwrite_prompt(tmp.path(), notifier)
        .check(both())
        .await
        .unwrap();

    assert_eq!(out, Decision::Continue(Payload::Components(vec![bar()])));
}

#[tokio::test]
async fn test_skip_all_cancels_when_nothing_remains() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "classes/Foo.cls", "public class Foo {}");
    write(tmp.path(), "classes/Bar.cls", "public class Bar {}");
    let notifier = Arc::new(ScriptedNotifier::answering(["Skip All (2)"]));

    let out = overwrite_prompt(tmp.path(), notifier.clone())
        .check(both())
        .await
        .unwrap();

    assert_eq!(out, Decision::Cancel(CancelReason::AllSkipped));
    assert_eq!(notifier.prompts().len(), 1);
}

#[tokio::test]
async fn test_fresh_project_is_not_prompted() {
    let tmp = TempDir::new().unwrap();
    let notifier = Arc::new(ScriptedNotifier::answering(Vec::<String>::new()));

    let out = overwrite_prompt(tmp.path(), notifier.clone())
        .check(both())
        .await
        .unwrap();

    assert_eq!(out, both());
    assert!(notifier.prompts().is_empty());
}

// ===========================================================================
// Full pipeline
// ===========================================================================

#[tokio::test]
async fn test_pipeline_narrows_to_unskipped_components() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "classes/Foo.cls", "public class Foo {}");
    write(tmp.path(), ".metaguard/baseline/dev-hub/classes/Foo.cls", "public class Foo {}");
    let notifier = Arc::new(ScriptedNotifier::answering(["Skip"]));
    let panel = Arc::new(ConflictPanel::new());

    let pipeline = CompositeChecker::default()
        .with(overwrite_prompt(tmp.path(), notifier.clone()))
        .with(conflict_checker(tmp.path(), notifier.clone(), panel.clone()));

    let out = pipeline.check(both()).await.unwrap();

    assert_eq!(out, Decision::Continue(Payload::Components(vec![bar()])));
    let snapshot = panel.snapshot().unwrap();
    assert_eq!(snapshot.principal, "dev-hub");
    assert!(snapshot.differing.is_empty());
}

#[tokio::test]
async fn test_pipeline_cancels_on_baseline_conflict() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "classes/Foo.cls", "public class Foo { /* local */ }");
    write(tmp.path(), ".metaguard/baseline/dev-hub/classes/Foo.cls", "public class Foo {}");
    let notifier = Arc::new(ScriptedNotifier::answering(["Overwrite", "Force"]));
    let panel = Arc::new(ConflictPanel::new());

    let pipeline = CompositeChecker::default()
        .with(overwrite_prompt(tmp.path(), notifier.clone()))
        .with(conflict_checker(tmp.path(), notifier.clone(), panel.clone()));

    let out = pipeline.check(both()).await.unwrap();

    assert_eq!(out, Decision::Cancel(CancelReason::ConflictsDetected));
    assert_eq!(panel.snapshot().unwrap().differing, vec!["classes/Foo.cls"]);
    let prompts = notifier.prompts();
    assert_eq!(prompts.len(), 2);
    assert_eq!(prompts[1].message, "Resource conflicts detected during retrieve");
}

#[tokio::test]
async fn test_pipeline_stops_before_conflict_check_when_declined() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "classes/Foo.cls", "public class Foo {}");
    let notifier = Arc::new(ScriptedNotifier::new([None::<String>]));
    let panel = Arc::new(ConflictPanel::new());

    let pipeline = CompositeChecker::default()
        .with(overwrite_prompt(tmp.path(), notifier.clone()))
        .with(conflict_checker(tmp.path(), notifier.clone(), panel.clone()));

    let out = pipeline.check(both()).await.unwrap();

    assert_eq!(out, Decision::Cancel(CancelReason::UserDeclined));
    assert!(panel.snapshot().is_none());
}

// ===========================================================================
// Path targets
// ===========================================================================

#[tokio::test]
async fn test_absolute_path_conflict_with_relative_root() {
    // Integration tests run from the crate directory; a root named relative
    // to it stands in for the default root of ".".
    let project = tempfile::Builder::new()
        .prefix("e2e-relative-root-")
        .tempdir_in(".")
        .unwrap();
    let classes = "force-app/main/default/classes";
    write(project.path(), &format!("{classes}/Foo.cls"), "public class Foo { /* local */ }");
    write(
        project.path(),
        &format!(".metaguard/baseline/dev-hub/{classes}/Foo.cls"),
        "public class Foo {}",
    );

    let root = Path::new(".").join(project.path().file_name().unwrap());
    let absolute = std::fs::canonicalize(project.path().join(classes).join("Foo.cls")).unwrap();
    let notifier = Arc::new(ScriptedNotifier::answering(["Force"]));
    let panel = Arc::new(ConflictPanel::new());

    let out = conflict_checker(&root, notifier, panel.clone())
        .check(Decision::Continue(Payload::Path(absolute)))
        .await
        .unwrap();

    assert_eq!(out, Decision::Cancel(CancelReason::ConflictsDetected));
    assert_eq!(
        panel.snapshot().unwrap().differing,
        vec![format!("{classes}/Foo.cls")]
    );
}
