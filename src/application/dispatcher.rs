//! Edit coordination and debounced remote validation
//!
//! Every edit runs the field's rules at once and restarts the quiet period.
//! When the quiet period elapses a snapshot is sent to the remote validator
//! under a fresh sequence number. Only the response to the most recently
//! dispatched request is merged. Earlier ones are discarded when they arrive
//! first, and dropped unanswered once the latest request has settled.
//!
//! Everything runs on the caller's task. `next_event` is cancel-safe, so it can
//! sit in a `tokio::select!` next to an input source.

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use serde::Serialize;
use tokio::time::{self, Instant};
use tracing::{debug, info, instrument, warn};

use crate::domain::{
    ClientError, DomainResult, ErrorMerger, FieldPath, FieldTree, FieldValue, MergeSummary,
    RuleSet, ValidationMessage,
};
use crate::infrastructure::{RemoteValidator, TransportError};

/// Quiet period after the last edit before remote validation starts.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(600);

/// Where the current validation cycle stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchPhase {
    /// Nothing scheduled, latest response handled.
    Idle,
    /// Quiet-period timer running.
    Pending,
    /// Latest request dispatched, response outstanding.
    InFlight,
}

/// Something the dispatcher did while being driven.
#[derive(Debug)]
pub enum DispatchEvent {
    /// Snapshot sent under this sequence number.
    Dispatched { seq: u64 },
    /// Response of the latest request merged into the tree.
    Merged { seq: u64, summary: MergeSummary },
    /// Response of a superseded request dropped.
    Discarded { seq: u64 },
    /// Latest request failed; server errors were left as they were.
    Failed { seq: u64, error: TransportError },
}

type Completion = (u64, Result<Vec<ValidationMessage>, TransportError>);

enum Wake {
    Completed(Completion),
    QuietPeriodElapsed,
}

pub struct ChangeDispatcher {
    tree: FieldTree,
    rules: RuleSet,
    validator: Arc<dyn RemoteValidator>,
    quiet_period: Duration,
    deadline: Option<Instant>,
    /// Sequence number of the latest dispatched request, 0 before the first.
    latest_seq: u64,
    /// Highest sequence number whose outcome has been handled.
    settled_seq: u64,
    in_flight: FuturesUnordered<BoxFuture<'static, Completion>>,
    last_failure: Option<String>,
}

impl ChangeDispatcher {
    /// Take ownership of `tree` and evaluate every rule once.
    ///
    /// No remote request is made until the first edit.
    pub fn new(
        mut tree: FieldTree,
        rules: RuleSet,
        validator: Arc<dyn RemoteValidator>,
        quiet_period: Duration,
    ) -> DomainResult<Self> {
        rules.verify(&tree)?;
        let failing = rules.apply_all(&mut tree);
        debug!(failing, ?quiet_period, "dispatcher ready");
        Ok(Self {
            tree,
            rules,
            validator,
            quiet_period,
            deadline: None,
            latest_seq: 0,
            settled_seq: 0,
            in_flight: FuturesUnordered::new(),
            last_failure: None,
        })
    }

    pub fn tree(&self) -> &FieldTree {
        &self.tree
    }

    pub fn into_tree(self) -> FieldTree {
        self.tree
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet_period
    }

    pub fn latest_seq(&self) -> u64 {
        self.latest_seq
    }

    /// Message of the last transport failure, cleared by the next successful merge.
    pub fn last_failure(&self) -> Option<&str> {
        self.last_failure.as_deref()
    }

    pub fn phase(&self) -> DispatchPhase {
        if self.deadline.is_some() {
            DispatchPhase::Pending
        } else if self.settled_seq < self.latest_seq {
            DispatchPhase::InFlight
        } else {
            DispatchPhase::Idle
        }
    }

    /// True while a timer runs or the latest request is outstanding.
    ///
    /// Superseded requests are dropped once the latest one settles, so they
    /// never keep the dispatcher busy on their own.
    pub fn is_active(&self) -> bool {
        self.deadline.is_some() || !self.in_flight.is_empty()
    }

    /// Apply an edit: store the value, run the field's rules, restart the quiet period.
    #[instrument(level = "debug", skip(self, value), fields(path = %path))]
    pub fn edit(
        &mut self,
        path: &FieldPath,
        value: FieldValue,
    ) -> DomainResult<Option<ClientError>> {
        self.tree.set_value(path, value)?;
        let outcome = self.rules.apply(&mut self.tree, path)?;
        self.deadline = Some(Instant::now() + self.quiet_period);
        Ok(outcome)
    }

    /// Wait for the next timer expiry or response and handle it.
    ///
    /// Returns `Ok(None)` right away when nothing is pending.
    pub async fn next_event(&mut self) -> DomainResult<Option<DispatchEvent>> {
        if !self.is_active() {
            return Ok(None);
        }
        let pending = self.deadline.is_some();
        let deadline = self.deadline.unwrap_or_else(Instant::now);
        let busy = !self.in_flight.is_empty();

        let wake = tokio::select! {
            biased;
            Some(done) = self.in_flight.next(), if busy => Wake::Completed(done),
            _ = time::sleep_until(deadline), if pending => Wake::QuietPeriodElapsed,
        };

        match wake {
            Wake::Completed((seq, outcome)) => self.complete(seq, outcome).map(Some),
            Wake::QuietPeriodElapsed => Ok(Some(self.dispatch())),
        }
    }

    /// Drive until no timer runs and no request is outstanding.
    pub async fn settle(&mut self) -> DomainResult<Vec<DispatchEvent>> {
        let mut events = Vec::new();
        while let Some(event) = self.next_event().await? {
            events.push(event);
        }
        Ok(events)
    }

    fn dispatch(&mut self) -> DispatchEvent {
        self.deadline = None;
        self.latest_seq += 1;
        let seq = self.latest_seq;
        let snapshot = self.tree.snapshot();
        let validator = Arc::clone(&self.validator);
        info!(seq, "dispatching remote validation");
        self.in_flight.push(
            async move {
                let outcome = validator.validate(snapshot).await;
                (seq, outcome)
            }
            .boxed(),
        );
        DispatchEvent::Dispatched { seq }
    }

    fn complete(
        &mut self,
        seq: u64,
        outcome: Result<Vec<ValidationMessage>, TransportError>,
    ) -> DomainResult<DispatchEvent> {
        if seq != self.latest_seq {
            debug!(seq, latest = self.latest_seq, "discarding superseded response");
            return Ok(DispatchEvent::Discarded { seq });
        }
        self.settled_seq = seq;
        if !self.in_flight.is_empty() {
            // everything still outstanding was dispatched before `seq`
            debug!(seq, dropped = self.in_flight.len(), "dropping superseded requests");
            self.in_flight = FuturesUnordered::new();
        }
        match outcome {
            Ok(messages) => {
                let summary = ErrorMerger::apply(&mut self.tree, &messages)?;
                self.last_failure = None;
                Ok(DispatchEvent::Merged { seq, summary })
            }
            Err(error) => {
                warn!(seq, %error, "remote validation failed, keeping previous server errors");
                self.last_failure = Some(error.to_string());
                Ok(DispatchEvent::Failed { seq, error })
            }
        }
    }
}
