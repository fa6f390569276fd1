//! Conflict detection against a tracked baseline.
//!
//! The conflict subsystem is responsible for:
//! 1. **Detection** -- diffing what a retrieve would touch against the
//!    baseline snapshot for the current principal.
//! 2. **Display** -- keeping the shared conflict view in sync with the last
//!    check.
//! 3. **Checking** -- turning the result into continue or cancel.

pub mod checker;
pub mod detector;
pub mod view;

pub use checker::{ConflictDetectionChecker, ConflictServices, ConflictSettings};
pub use detector::{BaselineConflictDetector, ConflictCheckRequest, ConflictCheckResult, ConflictDetector};
pub use view::{ConflictPanel, ConflictSnapshot, ConflictView};
