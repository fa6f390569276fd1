//! Conflict detection backends.
//!
//! A [`ConflictDetector`] compares what a retrieve would write against a
//! tracked baseline and reports the resources that differ. The bundled
//! [`BaselineConflictDetector`] compares workspace files with a snapshot
//! directory kept per principal.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::errors::DetectionError;
use crate::metadata::MetadataRegistry;
use crate::models::LocalComponent;
use crate::overwrite::ExistenceProber;
use crate::workspace::Workspace;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Normalized input for one conflict check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictCheckRequest {
    /// Identity the baseline belongs to.
    pub principal: String,
    /// Package directory, relative to the workspace root.
    pub outputdir: String,
    pub manifest_path: Option<PathBuf>,
    pub components: Vec<LocalComponent>,
}

/// Resources that differ between the workspace and the baseline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConflictCheckResult {
    pub different: BTreeSet<String>,
}

impl ConflictCheckResult {
    pub fn is_empty(&self) -> bool {
        self.different.is_empty()
    }

    pub fn len(&self) -> usize {
        self.different.len()
    }
}

/// Backend that diffs local state against a baseline.
#[async_trait]
pub trait ConflictDetector: Send + Sync {
    async fn detect(&self, request: &ConflictCheckRequest) -> Result<ConflictCheckResult, DetectionError>;
}

// ---------------------------------------------------------------------------
// Baseline detector
// ---------------------------------------------------------------------------

/// Compares workspace files with `<baseline_root>/<principal>/`, which
/// mirrors the workspace layout.
///
/// A resource conflicts when both copies exist and their SHA-256 digests
/// differ; files present on only one side are not conflicts.
pub struct BaselineConflictDetector {
    registry: Arc<dyn MetadataRegistry>,
    prober: ExistenceProber,
    baseline_root: PathBuf,
}

impl BaselineConflictDetector {
    /// `baseline_root` is resolved against the workspace root when relative.
    pub fn new(
        registry: Arc<dyn MetadataRegistry>,
        workspace: Workspace,
        baseline_root: impl AsRef<Path>,
    ) -> Self {
        let baseline_root = workspace.resolve(baseline_root);
        Self {
            prober: ExistenceProber::new(registry.clone(), workspace),
            registry,
            baseline_root,
        }
    }

    /// Snapshot directory for `principal`.
    pub fn baseline_for(&self, principal: &str) -> PathBuf {
        self.baseline_root.join(principal)
    }

    /// Workspace-relative files covered by `request`.
    async fn files_for(&self, request: &ConflictCheckRequest) -> Result<BTreeSet<PathBuf>, DetectionError> {
        let workspace = self.prober.workspace();
        let outputdir = Path::new(&request.outputdir);
        let mut files = BTreeSet::new();

        if let Some(manifest) = &request.manifest_path {
            let manifest = workspace.resolve(manifest);
            tokio::fs::metadata(&manifest).await.map_err(|e| DetectionError::Manifest {
                path: manifest.display().to_string(),
                detail: e.to_string(),
            })?;
            collect_files(workspace.root(), outputdir, &mut files).await?;
            return Ok(files);
        }

        for component in &request.components {
            if component.is_type_only() {
                let Some(info) = self.registry.lookup_by_type(&component.component_type) else {
                    debug!(component_type = %component.component_type, "unregistered type-only component");
                    continue;
                };
                let mut all = BTreeSet::new();
                collect_files(workspace.root(), outputdir, &mut all).await?;
                files.extend(
                    all.into_iter()
                        .filter(|p| p.components().any(|c| c.as_os_str() == info.directory.as_str())),
                );
                continue;
            }
            match self.prober.candidate_paths(component) {
                Ok(paths) => files.extend(paths),
                Err(e) => {
                    debug!(component = %component, error = %e, "falling back to bare component path");
                    files.insert(Path::new(&component.outputdir).join(&component.file_name));
                }
            }
        }
        Ok(files)
    }
}

#[async_trait]
impl ConflictDetector for BaselineConflictDetector {
    async fn detect(&self, request: &ConflictCheckRequest) -> Result<ConflictCheckResult, DetectionError> {
        let baseline = self.baseline_for(&request.principal);
        if !baseline.is_dir() {
            return Err(DetectionError::BaselineMissing {
                principal: request.principal.clone(),
                path: baseline.display().to_string(),
            });
        }

        let files = self.files_for(request).await?;
        info!(
            principal = %request.principal,
            files = files.len(),
            manifest = request.manifest_path.is_some(),
            "comparing workspace with baseline"
        );

        let workspace = self.prober.workspace();
        let mut result = ConflictCheckResult::default();
        for relative in files {
            let local = workspace.resolve(&relative);
            let remote = baseline.join(&relative);
            let (Some(local_digest), Some(remote_digest)) =
                (digest(&local).await?, digest(&remote).await?)
            else {
                continue;
            };
            if local_digest != remote_digest {
                debug!(
                    path = %relative.display(),
                    local = %local_digest,
                    baseline = %remote_digest,
                    "resource differs from baseline"
                );
                result.different.insert(relative.to_string_lossy().replace('\\', "/"));
            }
        }

        info!(count = result.len(), "conflict detection complete");
        Ok(result)
    }
}

/// Hex SHA-256 of a file, or `None` when it does not exist.
async fn digest(path: &Path) -> Result<Option<String>, DetectionError> {
    match tokio::fs::read(path).await {
        Ok(content) => {
            let mut hasher = Sha256::new();
            hasher.update(&content);
            Ok(Some(hex::encode(hasher.finalize())))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Collect every file under `root/dir`, as paths relative to `root`.
/// A missing directory yields nothing.
async fn collect_files(root: &Path, dir: &Path, out: &mut BTreeSet<PathBuf>) -> Result<(), DetectionError> {
    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        let mut entries = match tokio::fs::read_dir(root.join(&current)).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            let relative = current.join(entry.file_name());
            if entry.file_type().await?.is_dir() {
                pending.push(relative);
            } else {
                out.insert(relative);
            }
        }
    }
    Ok(())
}
