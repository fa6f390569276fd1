//! Checker that asks before overwriting components that already exist.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::prober::ExistenceProber;
use super::resolution::resolve;
use crate::decision::{CancelReason, Decision, Payload, PostconditionChecker};
use crate::errors::{CheckError, ProbeError};
use crate::messages;
use crate::models::LocalComponent;
use crate::notify::{Notifier, Telemetry};

/// Postcondition checker that walks the user through every component the
/// command would overwrite.
pub struct OverwriteComponentPrompt {
    prober: ExistenceProber,
    notifier: Arc<dyn Notifier>,
    telemetry: Arc<dyn Telemetry>,
}

impl OverwriteComponentPrompt {
    pub fn new(
        prober: ExistenceProber,
        notifier: Arc<dyn Notifier>,
        telemetry: Arc<dyn Telemetry>,
    ) -> Self {
        Self {
            prober,
            notifier,
            telemetry,
        }
    }

    /// Probe `components` in order and return the positions and values of
    /// those that exist. Components whose suffix cannot be resolved are
    /// reported and treated as absent.
    async fn find_existing(&self, components: &[&LocalComponent]) -> (Vec<usize>, Vec<LocalComponent>) {
        let mut positions = Vec::new();
        let mut found = Vec::new();
        for (pos, component) in components.iter().enumerate() {
            match self.prober.exists(component) {
                Ok(true) => {
                    positions.push(pos);
                    found.push((*component).clone());
                }
                Ok(false) => {}
                Err(e) => self.report_probe_error(component, &e).await,
            }
        }
        (positions, found)
    }

    async fn report_probe_error(&self, component: &LocalComponent, error: &ProbeError) {
        warn!(component = %component, error = %error, "skipping overwrite check for component");
        self.notifier.show_error(messages::OVERWRITE_PROMPT_ERROR).await;
        self.telemetry
            .send_exception("OverwriteComponentPromptException", &error.to_string());
    }
}

#[async_trait]
impl PostconditionChecker for OverwriteComponentPrompt {
    async fn check(&self, input: Decision<Payload>) -> Result<Decision<Payload>, CheckError> {
        let data = match input {
            Decision::Continue(data) => data,
            cancel @ Decision::Cancel(_) => return Ok(cancel),
        };

        let (total, positions, found) = {
            let components: Vec<&LocalComponent> = match &data {
                Payload::Component(c) => vec![c],
                Payload::Components(cs) => cs.iter().collect(),
                Payload::Path(_) | Payload::Record(_) => Vec::new(),
            };
            let (positions, found) = self.find_existing(&components).await;
            (components.len(), positions, found)
        };

        if found.is_empty() {
            debug!(total, shape = %data.shape(), "no existing components");
            return Ok(Decision::Continue(data));
        }

        info!(total, existing = found.len(), "components already exist locally");
        let Some(skipped) = resolve(&found, self.notifier.as_ref()).await? else {
            info!("overwrite prompt cancelled");
            return Ok(Decision::Cancel(CancelReason::UserDeclined));
        };

        self.telemetry.send_event(
            "overwrite_prompt",
            &[
                ("existing", found.len().to_string()),
                ("skipped", skipped.len().to_string()),
            ],
        );

        if skipped.len() == total {
            info!(total, "every component skipped");
            return Ok(Decision::Cancel(CancelReason::AllSkipped));
        }

        let skipped: BTreeSet<usize> = skipped.iter().map(|&i| positions[i]).collect();
        let data = match data {
            Payload::Components(components) => Payload::Components(
                components
                    .into_iter()
                    .enumerate()
                    .filter(|(pos, _)| !skipped.contains(pos))
                    .map(|(_, c)| c)
                    .collect(),
            ),
            other => other,
        };
        Ok(Decision::Continue(data))
    }
}
