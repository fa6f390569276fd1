//! User-facing strings.

/// Label of the single-item overwrite choice.
pub const OVERWRITE: &str = "Overwrite";
/// Label of the single-item skip choice.
pub const SKIP: &str = "Skip";
/// Prefix of the batch overwrite choice, rendered as `Overwrite All (k)`.
pub const OVERWRITE_ALL: &str = "Overwrite All";
/// Prefix of the batch skip choice, rendered as `Skip All (k)`.
pub const SKIP_ALL: &str = "Skip All";

pub const VIEW_CONFLICTS: &str = "View Conflicts";
pub const FORCE: &str = "Force";

pub const OVERWRITE_PROMPT_ERROR: &str =
    "Could not determine the file suffix of a component; it was not checked for overwrites.";

/// Header of the overwrite modal.
pub fn overwrite_message(component_type: &str, file_name: &str, others: &str, body: &str) -> String {
    format!(
        "{component_type}:{file_name} already exists in your local project.{others}\n\nOverwrite?\n\n{body}"
    )
}

/// Sentence appended to the header when more existing components follow.
pub fn other_existing(count: usize) -> String {
    format!(" {count} other existing component(s) will also be affected:")
}

pub fn other_not_shown(count: usize) -> String {
    format!("...{count} more not shown\n")
}

pub fn conflicts_detected(operation: &str) -> String {
    format!("Resource conflicts detected during {operation}")
}
