//! Shared display of the most recent conflict check.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

/// Display surface reset by every conflict check.
pub trait ConflictView: Send + Sync {
    fn reset(&self, principal: &str, differing: Vec<String>);
}

/// What a [`ConflictPanel`] currently shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictSnapshot {
    pub principal: String,
    pub differing: Vec<String>,
    pub reset_at: DateTime<Utc>,
}

/// In-memory [`ConflictView`] holding the last reset.
#[derive(Debug, Default)]
pub struct ConflictPanel {
    current: Mutex<Option<ConflictSnapshot>>,
}

impl ConflictPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Option<ConflictSnapshot> {
        self.current.lock().ok().and_then(|s| s.clone())
    }
}

impl ConflictView for ConflictPanel {
    fn reset(&self, principal: &str, differing: Vec<String>) {
        debug!(principal, count = differing.len(), "resetting conflict view");
        if let Ok(mut current) = self.current.lock() {
            *current = Some(ConflictSnapshot {
                principal: principal.to_string(),
                differing,
                reset_at: Utc::now(),
            });
        }
    }
}
