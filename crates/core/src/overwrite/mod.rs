//! Overwrite protection for components that already exist locally.
//!
//! 1. **Probing** -- [`ExistenceProber`] maps a component to its candidate
//!    files and checks the workspace.
//! 2. **Resolution** -- [`OverwriteResolution`] walks the user through each
//!    existing component with skip / overwrite / batch choices.
//! 3. **Checking** -- [`OverwriteComponentPrompt`] ties both into a
//!    postcondition checker.

pub mod prober;
pub mod prompt;
pub mod resolution;

pub use prober::ExistenceProber;
pub use prompt::OverwriteComponentPrompt;
pub use resolution::{Choice, OverwriteResolution, ResolutionState, SkipSet};
