//! Synchronous field rules

use std::collections::HashMap;

use regex::Regex;
use tracing::{debug, instrument};

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::errors::ClientError;
use crate::domain::path::FieldPath;
use crate::domain::tree::FieldTree;
use crate::domain::value::FieldValue;

/// A pure check on a single leaf value.
#[derive(Debug, Clone)]
pub enum Rule {
    /// Value must not be empty.
    Required,
    /// Whole value must match; empty values pass.
    Pattern { source: String, regex: Regex },
    /// Numeric value must lie in the inclusive bounds; empty and non-numeric values pass.
    Range { min: Option<f64>, max: Option<f64> },
}

impl Rule {
    /// Whole-value pattern rule, e.g. `[A-Z]{2}`.
    pub fn pattern(source: &str) -> DomainResult<Self> {
        let regex = Regex::new(&format!("^(?:{source})$")).map_err(|e| {
            DomainError::InvalidPattern {
                pattern: source.to_string(),
                source: e,
            }
        })?;
        Ok(Rule::Pattern {
            source: source.to_string(),
            regex,
        })
    }

    pub fn range(min: f64, max: f64) -> Self {
        Rule::Range {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn check(&self, value: &FieldValue) -> Option<ClientError> {
        match self {
            Rule::Required => value.is_empty().then_some(ClientError::Required),
            Rule::Pattern { source, regex } => {
                if value.is_empty() {
                    return None;
                }
                let text = value.as_text()?;
                (!regex.is_match(&text)).then(|| ClientError::PatternMismatch {
                    pattern: source.clone(),
                })
            }
            Rule::Range { min, max } => {
                let n = value.as_number()?;
                let below = min.is_some_and(|min| n < min);
                let above = max.is_some_and(|max| n > max);
                (below || above).then_some(ClientError::RangeViolation {
                    min: *min,
                    max: *max,
                })
            }
        }
    }
}

/// Ordered rules per field path.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: HashMap<FieldPath, Vec<Rule>>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append rules for `path`, after any already registered.
    pub fn add(&mut self, path: FieldPath, rules: impl IntoIterator<Item = Rule>) -> &mut Self {
        self.rules.entry(path).or_default().extend(rules);
        self
    }

    pub fn rules_for(&self, path: &FieldPath) -> &[Rule] {
        self.rules.get(path).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn paths(&self) -> impl Iterator<Item = &FieldPath> {
        self.rules.keys()
    }

    /// First failing rule for `value`, in registration order.
    pub fn evaluate(&self, path: &FieldPath, value: &FieldValue) -> Option<ClientError> {
        self.rules_for(path).iter().find_map(|rule| rule.check(value))
    }

    /// Evaluate the rules of one leaf and store the outcome as its client error.
    #[instrument(level = "debug", skip(self, tree), fields(path = %path))]
    pub fn apply(
        &self,
        tree: &mut FieldTree,
        path: &FieldPath,
    ) -> DomainResult<Option<ClientError>> {
        let leaf = tree.leaf_mut(path)?;
        let outcome = self.evaluate(path, leaf.value());
        if let Some(error) = &outcome {
            debug!(%error, "client rule failed");
        }
        leaf.errors_mut().set_client(outcome.clone());
        Ok(outcome)
    }

    /// Evaluate every leaf; returns the number of leaves left with a client error.
    pub fn apply_all(&self, tree: &mut FieldTree) -> usize {
        let mut failing = 0;
        tree.for_each_leaf_mut(|path, leaf| {
            let outcome = self.evaluate(path, leaf.value());
            failing += usize::from(outcome.is_some());
            leaf.errors_mut().set_client(outcome);
        });
        debug!(failing, "apply_all");
        failing
    }

    /// Every registered path must address a leaf of `tree`.
    pub fn verify(&self, tree: &FieldTree) -> DomainResult<()> {
        let mut paths: Vec<&FieldPath> = self.paths().collect();
        paths.sort();
        for path in paths {
            tree.leaf(path)?;
        }
        Ok(())
    }
}
