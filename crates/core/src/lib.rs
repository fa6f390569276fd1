//! metaguard core library.
//!
//! Postcondition checks run just before a retrieve writes metadata
//! components into a local project: the continue-or-cancel decision
//! protocol, the interactive overwrite prompt, conflict detection against a
//! tracked baseline, and the composer that chains checkers into one stage.

pub mod config;
pub mod conflict;
pub mod decision;
pub mod errors;
pub mod messages;
pub mod metadata;
pub mod models;
pub mod notify;
pub mod overwrite;
pub mod pipeline;
pub mod workspace;

// Re-exports for convenience.
pub use config::MetaguardConfig;
pub use decision::{CancelReason, Decision, PassThroughChecker, Payload, PostconditionChecker};
pub use models::LocalComponent;
pub use pipeline::CompositeChecker;
pub use workspace::Workspace;
