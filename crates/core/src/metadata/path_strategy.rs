//! How a component's files are laid out under its output directory.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Path construction rule for a metadata type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathStrategy {
    /// `outputdir/<file_name><extension>`
    #[default]
    Default,
    /// `outputdir/<file_name>/<file_name><extension>`, used by bundle types
    /// that keep each component in its own folder.
    Bundle,
}

impl PathStrategy {
    /// Relative source path of one file of a component.
    pub fn source_path(&self, outputdir: &str, file_name: &str, extension: &str) -> PathBuf {
        let file = format!("{file_name}{extension}");
        match self {
            Self::Default => PathBuf::from(outputdir).join(file),
            Self::Bundle => PathBuf::from(outputdir).join(file_name).join(file),
        }
    }
}
