//! Reconciles remote validation responses into leaf error state

use std::collections::BTreeMap;

use tracing::{debug, instrument};

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::path::FieldPath;
use crate::domain::tree::FieldTree;

/// Field-scoped message returned by the validation endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationMessage {
    pub field: FieldPath,
    pub message: String,
}

impl ValidationMessage {
    pub fn new(field: FieldPath, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Outcome of one merge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// Leaves that lost a server error during the clearing pass.
    pub cleared: usize,
    /// Leaves carrying a server error afterwards.
    pub flagged: usize,
}

/// Writes server-kind errors. Client-kind errors are never touched.
pub struct ErrorMerger;

impl ErrorMerger {
    /// Replace all server errors of `tree` with the ones in `messages`.
    ///
    /// Every path is resolved before anything is written: an unknown field
    /// fails the whole merge and the tree keeps its previous state. When a
    /// response names a leaf more than once, the last message wins.
    #[instrument(level = "debug", skip_all, fields(messages = messages.len()))]
    pub fn apply(
        tree: &mut FieldTree,
        messages: &[ValidationMessage],
    ) -> DomainResult<MergeSummary> {
        let mut latest: BTreeMap<&FieldPath, &str> = BTreeMap::new();
        for msg in messages {
            tree.leaf(&msg.field)
                .map_err(|_| DomainError::UnknownField(msg.field.clone()))?;
            latest.insert(&msg.field, msg.message.as_str());
        }

        let mut cleared = 0;
        tree.for_each_leaf_mut(|_, leaf| {
            cleared += usize::from(leaf.errors_mut().clear_server());
        });

        for (path, message) in &latest {
            tree.leaf_mut(path)?.errors_mut().set_server(message.to_string());
        }

        let summary = MergeSummary {
            cleared,
            flagged: latest.len(),
        };
        debug!(?summary, "merged server errors");
        Ok(summary)
    }
}
