//! The continue-or-cancel protocol every postcondition checker honors.
//!
//! A command produces a tentative [`Payload`] wrapped in
//! [`Decision::Continue`]. Each checker either passes a (possibly narrowed)
//! payload on or answers [`Decision::Cancel`]; once cancelled, no later stage
//! does any work.

use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::CheckError;
use crate::models::LocalComponent;

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

/// Why a pipeline stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelReason {
    /// The input was already cancelled by an earlier stage.
    Upstream,
    /// The user dismissed or declined a prompt.
    UserDeclined,
    /// Every component to be written was skipped.
    AllSkipped,
    /// The conflict detector reported differing resources.
    ConflictsDetected,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Upstream => write!(f, "upstream"),
            Self::UserDeclined => write!(f, "user_declined"),
            Self::AllSkipped => write!(f, "all_skipped"),
            Self::ConflictsDetected => write!(f, "conflicts_detected"),
        }
    }
}

/// Result of one postcondition stage.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision<T> {
    Continue(T),
    Cancel(CancelReason),
}

impl<T> Decision<T> {
    pub fn is_cancel(&self) -> bool {
        matches!(self, Self::Cancel(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Continue(data) => Some(data),
            Self::Cancel(_) => None,
        }
    }

    pub fn into_data(self) -> Option<T> {
        match self {
            Self::Continue(data) => Some(data),
            Self::Cancel(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

/// Shape of a [`Payload`], used when merging composed checker outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Component,
    Components,
    Path,
    Record,
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Component => write!(f, "component"),
            Self::Components => write!(f, "components"),
            Self::Path => write!(f, "path"),
            Self::Record => write!(f, "record"),
        }
    }
}

/// Continuation data carried through the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// A single component.
    Component(LocalComponent),
    /// An ordered batch of components.
    Components(Vec<LocalComponent>),
    /// A path-like value: a source path, or a manifest in manifest mode.
    Path(PathBuf),
    /// String-keyed data merged key by key when composed.
    Record(Map<String, Value>),
}

impl Payload {
    pub fn shape(&self) -> Shape {
        match self {
            Self::Component(_) => Shape::Component,
            Self::Components(_) => Shape::Components,
            Self::Path(_) => Shape::Path,
            Self::Record(_) => Shape::Record,
        }
    }
}

impl From<LocalComponent> for Payload {
    fn from(component: LocalComponent) -> Self {
        Self::Component(component)
    }
}

impl From<Vec<LocalComponent>> for Payload {
    fn from(components: Vec<LocalComponent>) -> Self {
        Self::Components(components)
    }
}

impl From<PathBuf> for Payload {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

// ---------------------------------------------------------------------------
// Checker trait
// ---------------------------------------------------------------------------

/// A pipeline stage run just before a destructive write.
///
/// Implementations must return `Cancel` for `Cancel` input without doing any
/// work. `Err` is reserved for collaborator failures with no defined
/// recovery.
#[async_trait]
pub trait PostconditionChecker: Send + Sync {
    async fn check(&self, input: Decision<Payload>) -> Result<Decision<Payload>, CheckError>;
}

/// Checker for commands that need no postcondition verification.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassThroughChecker;

#[async_trait]
impl PostconditionChecker for PassThroughChecker {
    async fn check(&self, input: Decision<Payload>) -> Result<Decision<Payload>, CheckError> {
        Ok(input)
    }
}
