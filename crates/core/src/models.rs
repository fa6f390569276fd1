//! Data models shared across the pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One concrete metadata artifact a command is about to write locally.
///
/// `file_name` is empty for type-only components (a whole metadata
/// directory), and `component_type` is empty when the type could not be
/// resolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalComponent {
    pub file_name: String,
    #[serde(rename = "type")]
    pub component_type: String,
    /// Directory relative to the workspace root.
    pub outputdir: String,
    /// Explicit suffix overriding the one registered for the type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
}

impl LocalComponent {
    pub fn new(
        file_name: impl Into<String>,
        component_type: impl Into<String>,
        outputdir: impl Into<String>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            component_type: component_type.into(),
            outputdir: outputdir.into(),
            suffix: None,
        }
    }

    /// A component naming a whole metadata type rather than one file.
    pub fn type_only(component_type: impl Into<String>) -> Self {
        Self::new(String::new(), component_type, String::new())
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    pub fn is_type_only(&self) -> bool {
        self.file_name.is_empty()
    }
}

impl fmt::Display for LocalComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.component_type, self.file_name)
    }
}
