//! Replay-based [`Notifier`] and recording [`Telemetry`] for tests and
//! non-interactive runs.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{Notifier, Telemetry};
use crate::errors::CheckError;

/// One modal shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub message: String,
    pub choices: Vec<String>,
}

/// Answers modals from a fixed script of selections.
///
/// Each `Some(label)` is returned verbatim; `None` (or running out of script)
/// behaves like the user dismissing the modal.
#[derive(Debug, Default)]
pub struct ScriptedNotifier {
    script: Mutex<VecDeque<Option<String>>>,
    prompts: Mutex<Vec<Prompt>>,
    errors: Mutex<Vec<String>>,
}

impl ScriptedNotifier {
    pub fn new<I, S>(selections: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        Self {
            script: Mutex::new(selections.into_iter().map(|s| s.map(Into::into)).collect()),
            ..Self::default()
        }
    }

    /// Script that always picks the given labels in order.
    pub fn answering<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(labels.into_iter().map(Some))
    }

    pub fn prompts(&self) -> Vec<Prompt> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Notifier for ScriptedNotifier {
    async fn show_error(&self, message: &str) {
        if let Ok(mut errors) = self.errors.lock() {
            errors.push(message.to_string());
        }
    }

    async fn show_warning_modal(
        &self,
        message: &str,
        choices: &[String],
    ) -> Result<Option<String>, CheckError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(Prompt {
                message: message.to_string(),
                choices: choices.to_vec(),
            });
        }
        let mut script = self
            .script
            .lock()
            .map_err(|e| CheckError::Prompt(e.to_string()))?;
        Ok(script.pop_front().flatten())
    }
}

/// [`Telemetry`] that keeps every exception name and message.
#[derive(Debug, Default)]
pub struct RecordingTelemetry {
    exceptions: Mutex<Vec<(String, String)>>,
    events: Mutex<Vec<String>>,
}

impl RecordingTelemetry {
    pub fn exceptions(&self) -> Vec<(String, String)> {
        self.exceptions.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl Telemetry for RecordingTelemetry {
    fn send_exception(&self, name: &str, message: &str) {
        if let Ok(mut exceptions) = self.exceptions.lock() {
            exceptions.push((name.to_string(), message.to_string()));
        }
    }

    fn send_event(&self, name: &str, _properties: &[(&str, String)]) {
        if let Ok(mut events) = self.events.lock() {
            events.push(name.to_string());
        }
    }
}
