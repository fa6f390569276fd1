//! Terminal implementation of the core `Notifier`.

use async_trait::async_trait;
use dialoguer::Select;

use metaguard_core::errors::CheckError;
use metaguard_core::notify::Notifier;

use crate::style;

/// Shows modals as a `dialoguer` selection list on stderr.
///
/// Escape or `q` dismisses the modal, which the core treats as no selection.
pub struct DialoguerNotifier;

#[async_trait]
impl Notifier for DialoguerNotifier {
    async fn show_error(&self, message: &str) {
        eprintln!("{}", style::error(message));
    }

    async fn show_warning_modal(
        &self,
        message: &str,
        choices: &[String],
    ) -> Result<Option<String>, CheckError> {
        let prompt = style::warn(message);
        let items = choices.to_vec();

        // dialoguer blocks on the terminal.
        let picked = tokio::task::spawn_blocking(move || {
            Select::new()
                .with_prompt(prompt)
                .items(&items[..])
                .default(0)
                .interact_opt()
                .map(|idx| idx.and_then(|i| items.get(i).cloned()))
        })
        .await
        .map_err(|e| CheckError::Prompt(e.to_string()))?
        .map_err(|e| CheckError::Prompt(e.to_string()))?;

        Ok(picked)
    }
}
