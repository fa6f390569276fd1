//! Decides whether a component already has files in the workspace.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::errors::ProbeError;
use crate::metadata::MetadataRegistry;
use crate::models::LocalComponent;
use crate::workspace::{FileProbe, LocalFs, Workspace};

/// Computes candidate source paths for components and probes them.
#[derive(Clone)]
pub struct ExistenceProber {
    registry: Arc<dyn MetadataRegistry>,
    workspace: Workspace,
    probe: Arc<dyn FileProbe>,
}

impl ExistenceProber {
    pub fn new(registry: Arc<dyn MetadataRegistry>, workspace: Workspace) -> Self {
        Self {
            registry,
            workspace,
            probe: Arc::new(LocalFs),
        }
    }

    /// Replace the file-system probe.
    pub fn with_probe(mut self, probe: Arc<dyn FileProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Extensions a component may occupy on disk: the `-meta.xml` descriptor
    /// first, then the content extensions declared by its type.
    pub fn candidate_extensions(&self, component: &LocalComponent) -> Result<Vec<String>, ProbeError> {
        let info = self.registry.lookup_by_type(&component.component_type);
        let suffix = component
            .suffix
            .as_deref()
            .or_else(|| info.and_then(|i| i.suffix.as_deref()))
            .ok_or_else(|| ProbeError::MissingSuffix {
                component_type: component.component_type.clone(),
            })?;

        let mut extensions = vec![format!(".{suffix}-meta.xml")];
        if let Some(info) = info {
            extensions.extend(info.extensions.iter().cloned());
        }
        Ok(extensions)
    }

    /// Workspace-relative paths of every file the component may occupy.
    pub fn candidate_paths(&self, component: &LocalComponent) -> Result<Vec<PathBuf>, ProbeError> {
        let strategy = self.registry.path_strategy(&component.component_type);
        Ok(self
            .candidate_extensions(component)?
            .iter()
            .map(|ext| strategy.source_path(&component.outputdir, &component.file_name, ext))
            .collect())
    }

    /// `true` when the descriptor or any content file already exists.
    pub fn exists(&self, component: &LocalComponent) -> Result<bool, ProbeError> {
        for relative in self.candidate_paths(component)? {
            let path = self.workspace.resolve(&relative);
            if self.probe.exists(&path) {
                debug!(component = %component, path = %path.display(), "component exists locally");
                return Ok(true);
            }
        }
        Ok(false)
    }
}
