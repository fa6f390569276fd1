//! Composition of several checkers into one postcondition stage.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::decision::{Decision, Payload, PostconditionChecker};
use crate::errors::CheckError;

/// Runs checkers in order against the same input and merges their results.
///
/// Each checker sees the pipeline's original input, not the previous
/// checker's output. The first `Cancel` stops the pipeline. Continuation
/// payloads are merged with [`merge`].
#[derive(Default)]
pub struct CompositeChecker {
    checkers: Vec<Box<dyn PostconditionChecker>>,
}

impl CompositeChecker {
    pub fn new(checkers: Vec<Box<dyn PostconditionChecker>>) -> Self {
        Self { checkers }
    }

    /// Append a checker to the end of the pipeline.
    pub fn with(mut self, checker: impl PostconditionChecker + 'static) -> Self {
        self.checkers.push(Box::new(checker));
        self
    }

    pub fn len(&self) -> usize {
        self.checkers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checkers.is_empty()
    }
}

#[async_trait]
impl PostconditionChecker for CompositeChecker {
    async fn check(&self, input: Decision<Payload>) -> Result<Decision<Payload>, CheckError> {
        if input.is_cancel() || self.checkers.is_empty() {
            return Ok(input);
        }

        let mut merged: Option<Payload> = None;
        for (stage, checker) in self.checkers.iter().enumerate() {
            match checker.check(input.clone()).await? {
                Decision::Continue(data) => {
                    debug!(stage, shape = %data.shape(), "checker continued");
                    merged = Some(match merged {
                        None => data,
                        Some(acc) => merge(acc, data)?,
                    });
                }
                Decision::Cancel(reason) => {
                    info!(stage, %reason, "postcondition pipeline cancelled");
                    return Ok(Decision::Cancel(reason));
                }
            }
        }

        // Non-empty pipeline that did not cancel always produced a payload.
        Ok(merged.map_or(input, Decision::Continue))
    }
}

/// Merge `next` into `acc`.
///
/// - records merge key by key, later values winning;
/// - component lists keep the entries of `acc` that `next` also kept, so
///   every checker can only narrow the batch;
/// - single components and paths take the later value;
/// - anything else is a [`CheckError::ShapeMismatch`].
pub fn merge(acc: Payload, next: Payload) -> Result<Payload, CheckError> {
    match (acc, next) {
        (Payload::Record(mut acc), Payload::Record(next)) => {
            acc.extend(next);
            Ok(Payload::Record(acc))
        }
        (Payload::Components(acc), Payload::Components(next)) => {
            let mut remaining = next;
            let kept = acc
                .into_iter()
                .filter(|c| match remaining.iter().position(|n| n == c) {
                    Some(pos) => {
                        remaining.remove(pos);
                        true
                    }
                    None => false,
                })
                .collect();
            Ok(Payload::Components(kept))
        }
        (Payload::Component(_), next @ Payload::Component(_)) => Ok(next),
        (Payload::Path(_), next @ Payload::Path(_)) => Ok(next),
        (acc, next) => Err(CheckError::ShapeMismatch {
            expected: acc.shape(),
            found: next.shape(),
        }),
    }
}
