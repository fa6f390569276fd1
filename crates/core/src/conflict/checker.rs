//! Checker that stops a retrieve when the workspace has diverged from the
//! tracked baseline.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::detector::{ConflictCheckRequest, ConflictDetector};
use super::view::ConflictView;
use crate::decision::{CancelReason, Decision, Payload, PostconditionChecker, Shape};
use crate::errors::CheckError;
use crate::messages;
use crate::metadata::MetadataRegistry;
use crate::models::LocalComponent;
use crate::notify::Notifier;
use crate::workspace::Workspace;

/// Identity and package directory conflict checks run against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictSettings {
    pub principal: String,
    pub outputdir: String,
}

/// Collaborators a [`ConflictDetectionChecker`] delegates to.
#[derive(Clone)]
pub struct ConflictServices {
    pub registry: Arc<dyn MetadataRegistry>,
    pub detector: Arc<dyn ConflictDetector>,
    pub view: Arc<dyn ConflictView>,
    pub notifier: Arc<dyn Notifier>,
}

/// Normalizes the pending retrieve into a [`ConflictCheckRequest`], runs the
/// detector and cancels when anything differs.
pub struct ConflictDetectionChecker {
    operation: String,
    manifest_mode: bool,
    settings: ConflictSettings,
    workspace: Workspace,
    services: ConflictServices,
}

impl ConflictDetectionChecker {
    /// `operation` names the command in the warning shown to the user. In
    /// `manifest_mode` a path payload is treated as a manifest file.
    pub fn new(
        operation: impl Into<String>,
        manifest_mode: bool,
        settings: ConflictSettings,
        workspace: Workspace,
        services: ConflictServices,
    ) -> Self {
        Self {
            operation: operation.into(),
            manifest_mode,
            settings,
            workspace,
            services,
        }
    }

    /// Best-effort component for a source file or metadata directory path.
    pub fn convert_to_component(&self, path: &Path) -> LocalComponent {
        self.workspace
            .component_for_path(self.services.registry.as_ref(), path)
    }

    fn build_request(&self, data: &Payload) -> Result<ConflictCheckRequest, CheckError> {
        let (components, manifest_path) = match data {
            Payload::Components(components) => (components.clone(), None),
            Payload::Component(component) => (vec![component.clone()], None),
            Payload::Path(path) if self.manifest_mode => (Vec::new(), Some(path.clone())),
            Payload::Path(path) => (vec![self.convert_to_component(path)], None),
            Payload::Record(_) => {
                return Err(CheckError::UnsupportedPayload {
                    checker: "conflict detection",
                    shape: Shape::Record,
                })
            }
        };
        Ok(ConflictCheckRequest {
            principal: self.settings.principal.clone(),
            outputdir: self.settings.outputdir.clone(),
            manifest_path,
            components,
        })
    }
}

#[async_trait]
impl PostconditionChecker for ConflictDetectionChecker {
    async fn check(&self, input: Decision<Payload>) -> Result<Decision<Payload>, CheckError> {
        let data = match input {
            Decision::Continue(data) => data,
            cancel @ Decision::Cancel(_) => return Ok(cancel),
        };

        let request = self.build_request(&data)?;
        info!(
            operation = %self.operation,
            principal = %request.principal,
            components = request.components.len(),
            "checking for conflicts"
        );
        let result = self.services.detector.detect(&request).await?;

        self.services
            .view
            .reset(&request.principal, result.different.iter().cloned().collect());

        if result.is_empty() {
            return Ok(Decision::Continue(data));
        }

        warn!(operation = %self.operation, count = result.len(), "resource conflicts detected");
        let choices = [messages::VIEW_CONFLICTS.to_string(), messages::FORCE.to_string()];
        let choice = self
            .services
            .notifier
            .show_warning_modal(&messages::conflicts_detected(&self.operation), &choices)
            .await?;
        // Every answer cancels while conflicts exist.
        debug!(?choice, "conflict warning answered");
        Ok(Decision::Cancel(CancelReason::ConflictsDetected))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conflict::detector::ConflictCheckResult;
    use crate::conflict::view::ConflictPanel;
    use crate::errors::DetectionError;
    use crate::metadata::MetadataDictionary;
    use crate::notify::scripted::ScriptedNotifier;
    use std::path::PathBuf;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeDetector {
        different: Vec<String>,
        fail: bool,
        requests: Mutex<Vec<ConflictCheckRequest>>,
    }

    #[async_trait]
    impl ConflictDetector for FakeDetector {
        async fn detect(
            &self,
            request: &ConflictCheckRequest,
        ) -> Result<ConflictCheckResult, DetectionError> {
            self.requests.lock().unwrap().push(request.clone());
            if self.fail {
                return Err(DetectionError::IoError(std::io::Error::other("backend down")));
            }
            Ok(ConflictCheckResult {
                different: self.different.iter().cloned().collect(),
            })
        }
    }

    struct Harness {
        detector: Arc<FakeDetector>,
        view: Arc<ConflictPanel>,
        notifier: Arc<ScriptedNotifier>,
    }

    impl Harness {
        fn new(detector: FakeDetector, answers: &[&str]) -> Self {
            Self {
                detector: Arc::new(detector),
                view: Arc::new(ConflictPanel::new()),
                notifier: Arc::new(ScriptedNotifier::answering(answers.iter().copied())),
            }
        }

        fn checker(&self, manifest_mode: bool) -> ConflictDetectionChecker {
            ConflictDetectionChecker::new(
                "retrieve",
                manifest_mode,
                ConflictSettings {
                    principal: "dev-hub".into(),
                    outputdir: "force-app".into(),
                },
                Workspace::new("/ws"),
                ConflictServices {
                    registry: Arc::new(MetadataDictionary::builtin()),
                    detector: self.detector.clone(),
                    view: self.view.clone(),
                    notifier: self.notifier.clone(),
                },
            )
        }

        fn last_request(&self) -> ConflictCheckRequest {
            self.detector.requests.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[test]
    fn test_convert_source_file() {
        let h = Harness::new(FakeDetector::default(), &[]);
        let c = h
            .checker(false)
            .convert_to_component(Path::new("/ws/force-app/main/default/classes/Foo.cls"));
        assert_eq!(c, LocalComponent::new("Foo", "ApexClass", "force-app/main/default/classes"));
    }

    #[test]
    fn test_convert_metadata_directory() {
        let h = Harness::new(FakeDetector::default(), &[]);
        let c = h
            .checker(false)
            .convert_to_component(Path::new("/ws/force-app/main/default/triggers"));
        assert_eq!(c, LocalComponent::type_only("ApexTrigger"));
    }

    #[test]
    fn test_convert_unknown_path_is_best_effort() {
        let h = Harness::new(FakeDetector::default(), &[]);
        let checker = h.checker(false);

        let c = checker.convert_to_component(Path::new("/ws/force-app/docs/readme.md"));
        assert_eq!(c, LocalComponent::new("readme.md", "", "force-app/docs"));

        let c = checker.convert_to_component(Path::new("/ws/force-app/main"));
        assert_eq!(c, LocalComponent::new("main", "", "force-app"));
    }

    #[tokio::test]
    async fn test_cancel_input_skips_detection() {
        let h = Harness::new(FakeDetector::default(), &[]);
        let out = h
            .checker(false)
            .check(Decision::Cancel(CancelReason::UserDeclined))
            .await
            .unwrap();
        assert_eq!(out, Decision::Cancel(CancelReason::UserDeclined));
        assert!(h.detector.requests.lock().unwrap().is_empty());
        assert!(h.view.snapshot().is_none());
    }

    #[tokio::test]
    async fn test_no_conflicts_continues_with_input() {
        let h = Harness::new(FakeDetector::default(), &[]);
        let components = vec![LocalComponent::new("Foo", "ApexClass", "classes")];
        let input = Decision::Continue(Payload::Components(components.clone()));

        let out = h.checker(false).check(input.clone()).await.unwrap();

        assert_eq!(out, input);
        let req = h.last_request();
        assert_eq!(req.principal, "dev-hub");
        assert_eq!(req.outputdir, "force-app");
        assert_eq!(req.components, components);
        assert!(req.manifest_path.is_none());

        let snap = h.view.snapshot().unwrap();
        assert!(snap.differing.is_empty());
        assert!(h.notifier.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_conflicts_cancel_even_when_forced() {
        let detector = FakeDetector {
            different: vec!["force-app/main/default/classes/Foo.cls".into()],
            ..FakeDetector::default()
        };
        let h = Harness::new(detector, &["Force"]);

        let out = h
            .checker(false)
            .check(Decision::Continue(Payload::Path(PathBuf::from(
                "/ws/force-app/main/default/classes/Foo.cls",
            ))))
            .await
            .unwrap();

        assert_eq!(out, Decision::Cancel(CancelReason::ConflictsDetected));
        let prompts = h.notifier.prompts();
        assert_eq!(prompts[0].message, "Resource conflicts detected during retrieve");
        assert_eq!(prompts[0].choices, vec!["View Conflicts", "Force"]);
        assert_eq!(
            h.view.snapshot().unwrap().differing,
            vec!["force-app/main/default/classes/Foo.cls"]
        );
    }

    #[tokio::test]
    async fn test_manifest_mode_passes_manifest_path() {
        let h = Harness::new(FakeDetector::default(), &[]);
        let input = Decision::Continue(Payload::Path(PathBuf::from("manifest/package.xml")));

        let out = h.checker(true).check(input.clone()).await.unwrap();

        assert_eq!(out, input);
        let req = h.last_request();
        assert_eq!(req.manifest_path, Some(PathBuf::from("manifest/package.xml")));
        assert!(req.components.is_empty());
    }

    #[tokio::test]
    async fn test_detector_failure_propagates() {
        let detector = FakeDetector {
            fail: true,
            ..FakeDetector::default()
        };
        let h = Harness::new(detector, &[]);
        let result = h
            .checker(false)
            .check(Decision::Continue(Payload::Components(Vec::new())))
            .await;
        assert!(matches!(result, Err(CheckError::Detection(_))));
    }

    #[tokio::test]
    async fn test_record_payload_is_rejected() {
        let h = Harness::new(FakeDetector::default(), &[]);
        let result = h
            .checker(false)
            .check(Decision::Continue(Payload::Record(Default::default())))
            .await;
        assert!(matches!(
            result,
            Err(CheckError::UnsupportedPayload { shape: Shape::Record, .. })
        ));
    }
}
