//! The sequential overwrite decision walk.
//!
//! [`OverwriteResolution`] is a small state machine over the list of
//! components that already exist locally. Each step shows one modal; batch
//! choices end the walk early. Driving it with [`resolve`] uses a
//! [`Notifier`], while tests can call [`OverwriteResolution::advance`]
//! directly with scripted choices.

use std::collections::BTreeSet;
use std::fmt::{self, Write as _};

use tracing::debug;

use crate::errors::CheckError;
use crate::messages;
use crate::models::LocalComponent;
use crate::notify::Notifier;

/// Number of upcoming components listed in a preview before truncating.
pub const PREVIEW_LIMIT: usize = 10;

/// Positions (into the found list) the user chose not to overwrite.
pub type SkipSet = BTreeSet<usize>;

/// One option offered in the overwrite modal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Overwrite,
    Skip,
    /// Overwrite the current and all remaining components; carries the count.
    OverwriteAll(usize),
    /// Skip the current and all remaining components; carries the count.
    SkipAll(usize),
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overwrite => f.write_str(messages::OVERWRITE),
            Self::Skip => f.write_str(messages::SKIP),
            Self::OverwriteAll(k) => write!(f, "{} ({k})", messages::OVERWRITE_ALL),
            Self::SkipAll(k) => write!(f, "{} ({k})", messages::SKIP_ALL),
        }
    }
}

/// Where the walk currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionState {
    Prompting { index: usize, skipped: SkipSet },
    Cancelled,
    Resolved(SkipSet),
}

/// Overwrite decision walk over `found`, in discovery order.
#[derive(Debug)]
pub struct OverwriteResolution<'a> {
    found: &'a [LocalComponent],
    state: ResolutionState,
}

impl<'a> OverwriteResolution<'a> {
    pub fn new(found: &'a [LocalComponent]) -> Self {
        let state = if found.is_empty() {
            ResolutionState::Resolved(SkipSet::new())
        } else {
            ResolutionState::Prompting {
                index: 0,
                skipped: SkipSet::new(),
            }
        };
        Self { found, state }
    }

    pub fn state(&self) -> &ResolutionState {
        &self.state
    }

    /// The modal message and choices for the current step, if still prompting.
    pub fn current_prompt(&self) -> Option<(String, Vec<Choice>)> {
        match &self.state {
            ResolutionState::Prompting { index, skipped } => Some((
                preview_message(self.found, *index),
                choices(self.found.len(), *index, skipped.len()),
            )),
            _ => None,
        }
    }

    /// Apply the label the user picked. Any of the four labels for the
    /// current step is honored, even one the predicate in [`choices`] hid;
    /// unrecognized labels and `None` cancel the walk.
    pub fn select(&mut self, label: Option<&str>) {
        let choice = match (&self.state, label) {
            (ResolutionState::Prompting { index, .. }, Some(label)) => {
                let remaining = self.found.len() - index;
                [
                    Choice::Overwrite,
                    Choice::Skip,
                    Choice::OverwriteAll(remaining),
                    Choice::SkipAll(remaining),
                ]
                .into_iter()
                .find(|c| c.to_string() == label)
            }
            _ => None,
        };
        self.advance(choice);
    }

    /// Apply one decision. No-op once the walk has finished.
    pub fn advance(&mut self, choice: Option<Choice>) {
        let ResolutionState::Prompting { index, skipped } = &mut self.state else {
            return;
        };
        let index = *index;
        let mut skipped = std::mem::take(skipped);
        let total = self.found.len();

        debug!(index, ?choice, "overwrite decision");
        self.state = match choice {
            None => ResolutionState::Cancelled,
            Some(Choice::Overwrite) => next(index, total, skipped),
            Some(Choice::Skip) => {
                skipped.insert(index);
                next(index, total, skipped)
            }
            Some(Choice::OverwriteAll(_)) => ResolutionState::Resolved(skipped),
            Some(Choice::SkipAll(_)) => {
                skipped.extend(index..total);
                ResolutionState::Resolved(skipped)
            }
        };
    }

    /// `Some(skip set)` once resolved, `None` if cancelled or unfinished.
    pub fn into_outcome(self) -> Option<SkipSet> {
        match self.state {
            ResolutionState::Resolved(skipped) => Some(skipped),
            _ => None,
        }
    }
}

fn next(index: usize, total: usize, skipped: SkipSet) -> ResolutionState {
    if index + 1 >= total {
        ResolutionState::Resolved(skipped)
    } else {
        ResolutionState::Prompting {
            index: index + 1,
            skipped,
        }
    }
}

/// Run the walk to completion, prompting through `notifier`.
///
/// Returns `None` when the user cancelled.
pub async fn resolve(
    found: &[LocalComponent],
    notifier: &dyn Notifier,
) -> Result<Option<SkipSet>, CheckError> {
    let mut resolution = OverwriteResolution::new(found);
    while let Some((message, offered)) = resolution.current_prompt() {
        let labels: Vec<String> = offered.iter().map(Choice::to_string).collect();
        let selection = notifier.show_warning_modal(&message, &labels).await?;
        resolution.select(selection.as_deref());
    }
    Ok(resolution.into_outcome())
}

/// Choices offered at `index`, in display order.
///
/// `Skip` is offered when something was already skipped or the skip count
/// differs from `total - 1`; with at least two found components that holds
/// for every reachable state.
pub fn choices(total: usize, index: usize, skipped: usize) -> Vec<Choice> {
    let mut choices = vec![Choice::Overwrite];
    if skipped > 0 || skipped + 1 != total {
        choices.push(Choice::Skip);
    }
    if index + 1 < total {
        let remaining = total - index;
        choices.push(Choice::OverwriteAll(remaining));
        choices.push(Choice::SkipAll(remaining));
    }
    choices
}

/// Modal text for `found[index]`, previewing up to [`PREVIEW_LIMIT`]
/// upcoming components.
pub fn preview_message(found: &[LocalComponent], index: usize) -> String {
    let total = found.len();
    let current = &found[index];

    let mut body = String::new();
    for (j, upcoming) in found.iter().enumerate().skip(index + 1) {
        if j == index + 1 + PREVIEW_LIMIT {
            body.push_str(&messages::other_not_shown(total - j));
            break;
        }
        let _ = writeln!(body, "{upcoming}");
    }

    let others = total - index - 1;
    let others = if others > 0 {
        messages::other_existing(others)
    } else {
        String::new()
    };
    messages::overwrite_message(&current.component_type, &current.file_name, &others, &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classes(n: usize) -> Vec<LocalComponent> {
        (0..n)
            .map(|i| LocalComponent::new(format!("C{i}"), "ApexClass", "classes"))
            .collect()
    }

    #[test]
    fn test_choice_labels() {
        assert_eq!(Choice::Overwrite.to_string(), "Overwrite");
        assert_eq!(Choice::SkipAll(3).to_string(), "Skip All (3)");
        assert_eq!(Choice::OverwriteAll(12).to_string(), "Overwrite All (12)");
    }

    #[test]
    fn test_single_component_offers_overwrite_only() {
        assert_eq!(choices(1, 0, 0), vec![Choice::Overwrite]);
    }

    #[test]
    fn test_batch_choices_until_last_item() {
        assert_eq!(
            choices(3, 0, 0),
            vec![
                Choice::Overwrite,
                Choice::Skip,
                Choice::OverwriteAll(3),
                Choice::SkipAll(3)
            ]
        );
        assert_eq!(choices(3, 2, 2), vec![Choice::Overwrite, Choice::Skip]);
        assert_eq!(choices(3, 2, 0), vec![Choice::Overwrite, Choice::Skip]);
    }

    #[test]
    fn test_preview_truncates_after_ten() {
        let found = classes(15);
        let msg = preview_message(&found, 0);

        assert!(msg.starts_with("ApexClass:C0 already exists"));
        assert!(msg.contains("14 other existing"));
        for i in 1..=10 {
            assert!(msg.contains(&format!("ApexClass:C{i}\n")), "missing C{i}");
        }
        for i in 11..15 {
            assert!(!msg.contains(&format!("ApexClass:C{i}\n")), "C{i} listed");
        }
        assert!(msg.contains("4 more not shown"));
    }

    #[test]
    fn test_preview_without_truncation() {
        let found = classes(11);
        let msg = preview_message(&found, 0);
        assert!(msg.contains("ApexClass:C10\n"));
        assert!(!msg.contains("more not shown"));

        let last = preview_message(&found, 10);
        assert!(!last.contains("other existing"));
    }

    #[test]
    fn test_skip_then_overwrite() {
        let found = classes(2);
        let mut r = OverwriteResolution::new(&found);
        r.advance(Some(Choice::Skip));
        r.advance(Some(Choice::Overwrite));
        assert_eq!(r.into_outcome(), Some(SkipSet::from([0])));
    }

    #[test]
    fn test_skip_all_includes_current_and_earlier() {
        let found = classes(5);
        let mut r = OverwriteResolution::new(&found);
        r.advance(Some(Choice::Skip));
        r.advance(Some(Choice::Overwrite));
        r.advance(Some(Choice::SkipAll(3)));
        assert_eq!(r.into_outcome(), Some(SkipSet::from([0, 2, 3, 4])));
    }

    #[test]
    fn test_overwrite_all_leaves_rest_unskipped() {
        let found = classes(5);
        let mut r = OverwriteResolution::new(&found);
        r.advance(Some(Choice::Skip));
        r.advance(Some(Choice::OverwriteAll(4)));
        assert_eq!(r.into_outcome(), Some(SkipSet::from([0])));
    }

    #[test]
    fn test_dismissal_cancels() {
        let found = classes(3);
        let mut r = OverwriteResolution::new(&found);
        r.advance(Some(Choice::Skip));
        r.advance(None);
        assert_eq!(r.state(), &ResolutionState::Cancelled);
        assert_eq!(r.into_outcome(), None);
    }

    #[test]
    fn test_unknown_label_cancels() {
        let found = classes(2);
        let mut r = OverwriteResolution::new(&found);
        // Count does not match the two remaining components.
        r.select(Some("Skip All (3)"));
        assert_eq!(r.state(), &ResolutionState::Cancelled);
    }

    #[test]
    fn test_select_honors_hidden_skip() {
        let found = classes(1);
        let mut r = OverwriteResolution::new(&found);
        assert_eq!(r.current_prompt().unwrap().1, vec![Choice::Overwrite]);
        r.select(Some("Skip"));
        assert_eq!(r.into_outcome(), Some(SkipSet::from([0])));
    }

    #[test]
    fn test_select_batch_label_with_count() {
        let found = classes(4);
        let mut r = OverwriteResolution::new(&found);
        r.select(Some("Overwrite"));
        r.select(Some("Skip All (3)"));
        assert_eq!(r.into_outcome(), Some(SkipSet::from([1, 2, 3])));
    }

    #[test]
    fn test_advance_after_finish_is_noop() {
        let found = classes(1);
        let mut r = OverwriteResolution::new(&found);
        r.advance(Some(Choice::Overwrite));
        r.advance(None);
        assert_eq!(r.state(), &ResolutionState::Resolved(SkipSet::new()));
    }
}
