//! Registry mapping metadata types to their file layout.
//!
//! The [`MetadataRegistry`] trait is the seam the checkers depend on;
//! [`MetadataDictionary`] is the built-in table, optionally extended with
//! `[[metadata]]` entries from the configuration file.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::path_strategy::PathStrategy;

/// File layout rules for one metadata type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataInfo {
    #[serde(rename = "type")]
    pub type_name: String,
    /// Suffix used to build the `.<suffix>-meta.xml` descriptor name.
    #[serde(default)]
    pub suffix: Option<String>,
    /// Conventional directory name (e.g. `classes`).
    pub directory: String,
    /// Content file extensions, each including the leading dot.
    #[serde(default)]
    pub extensions: Vec<String>,
    #[serde(default, rename = "strategy")]
    pub path_strategy: PathStrategy,
}

impl MetadataInfo {
    pub fn new(
        type_name: &str,
        suffix: &str,
        directory: &str,
        extensions: &[&str],
        path_strategy: PathStrategy,
    ) -> Self {
        Self {
            type_name: type_name.to_string(),
            suffix: Some(suffix.to_string()),
            directory: directory.to_string(),
            extensions: extensions.iter().map(|e| e.to_string()).collect(),
            path_strategy,
        }
    }
}

/// Lookup interface for metadata type information.
pub trait MetadataRegistry: Send + Sync {
    fn lookup_by_type(&self, type_name: &str) -> Option<&MetadataInfo>;

    /// `extension` includes the leading dot, e.g. `.cls`.
    fn lookup_by_extension(&self, extension: &str) -> Option<&MetadataInfo>;

    fn lookup_by_directory(&self, name: &str) -> Option<&MetadataInfo>;

    /// Path strategy for a type, falling back to [`PathStrategy::Default`]
    /// when the type is unregistered.
    fn path_strategy(&self, type_name: &str) -> PathStrategy {
        self.lookup_by_type(type_name)
            .map(|info| info.path_strategy)
            .unwrap_or_default()
    }
}

/// In-memory metadata table.
#[derive(Debug, Clone, Default)]
pub struct MetadataDictionary {
    entries: Vec<MetadataInfo>,
    by_type: HashMap<String, usize>,
}

impl MetadataDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in set of common metadata types.
    pub fn builtin() -> Self {
        let mut dict = Self::new();
        for info in [
            MetadataInfo::new("ApexClass", "cls", "classes", &[".cls"], PathStrategy::Default),
            MetadataInfo::new("ApexTrigger", "trigger", "triggers", &[".trigger"], PathStrategy::Default),
            MetadataInfo::new("ApexPage", "page", "pages", &[".page"], PathStrategy::Default),
            MetadataInfo::new(
                "ApexComponent",
                "component",
                "components",
                &[".component"],
                PathStrategy::Default,
            ),
            MetadataInfo::new(
                "StaticResource",
                "resource",
                "staticresources",
                &[".resource"],
                PathStrategy::Default,
            ),
            MetadataInfo::new("AuraDefinitionBundle", "cmp", "aura", &[".cmp"], PathStrategy::Bundle),
            MetadataInfo::new(
                "LightningComponentBundle",
                "js",
                "lwc",
                &[".js", ".html"],
                PathStrategy::Bundle,
            ),
            MetadataInfo::new("CustomObject", "object", "objects", &[], PathStrategy::Default),
        ] {
            dict.insert(info);
        }
        dict
    }

    /// Add or replace the entry for `info.type_name`.
    pub fn insert(&mut self, info: MetadataInfo) {
        if let Some(&idx) = self.by_type.get(&info.type_name) {
            debug!(type_name = %info.type_name, "replacing metadata type");
            self.entries[idx] = info;
        } else {
            self.by_type.insert(info.type_name.clone(), self.entries.len());
            self.entries.push(info);
        }
    }

    /// Insert every entry of `extra`, overriding built-ins of the same type.
    pub fn extend(&mut self, extra: impl IntoIterator<Item = MetadataInfo>) {
        for info in extra {
            self.insert(info);
        }
    }

    /// Entries in registration order.
    pub fn entries(&self) -> &[MetadataInfo] {
        &self.entries
    }
}

impl MetadataRegistry for MetadataDictionary {
    fn lookup_by_type(&self, type_name: &str) -> Option<&MetadataInfo> {
        self.by_type.get(type_name).map(|&idx| &self.entries[idx])
    }

    fn lookup_by_extension(&self, extension: &str) -> Option<&MetadataInfo> {
        self.entries
            .iter()
            .find(|info| info.extensions.iter().any(|e| e == extension))
    }

    fn lookup_by_directory(&self, name: &str) -> Option<&MetadataInfo> {
        self.entries.iter().find(|info| info.directory == name)
    }
}
