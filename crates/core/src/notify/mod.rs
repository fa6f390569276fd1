//! User notification and telemetry seams.
//!
//! Checkers talk to the user only through [`Notifier`]; the CLI backs it with
//! terminal prompts and tests back it with [`scripted::ScriptedNotifier`].
//! [`Telemetry`] is fire-and-forget: implementations must not block and
//! their failures are never surfaced to the pipeline.

pub mod scripted;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::errors::CheckError;

/// Presents messages and modal choices to the user.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Show a non-blocking error message.
    async fn show_error(&self, message: &str);

    /// Show a modal warning with `choices` and wait for a selection.
    ///
    /// Returns the selected label, or `None` when the user dismissed the
    /// modal.
    async fn show_warning_modal(
        &self,
        message: &str,
        choices: &[String],
    ) -> Result<Option<String>, CheckError>;
}

/// Exception and event reporting.
pub trait Telemetry: Send + Sync {
    fn send_exception(&self, name: &str, message: &str);

    fn send_event(&self, name: &str, properties: &[(&str, String)]);
}

/// [`Telemetry`] that writes through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingTelemetry;

impl Telemetry for TracingTelemetry {
    fn send_exception(&self, name: &str, message: &str) {
        warn!(target: "metaguard::telemetry", name, message, "exception");
    }

    fn send_event(&self, name: &str, properties: &[(&str, String)]) {
        let props = properties
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(" ");
        info!(target: "metaguard::telemetry", name, props = %props, "event");
    }
}
