//! Test support: logging setup and a scripted remote validator

use std::collections::VecDeque;
use std::env;
use std::sync::{Mutex, MutexGuard, Once, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};
use tracing_subscriber::{
    filter::filter_fn,
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

use crate::domain::{FieldPath, Snapshot, ValidationMessage};
use crate::infrastructure::{RemoteValidator, TransportError};

static TEST_SETUP: Once = Once::new();

pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        if env::var("RUST_LOG").is_err() {
            env::set_var("RUST_LOG", "trace");
        }
        // global logging subscriber, used by all tracing log macros
        setup_test_logging();
        info!("Test Setup complete");
    });
}

fn setup_test_logging() {
    debug!("INIT: Attempting logger init from testing.rs");

    // Create a filter for noisy modules
    let noisy_modules = ["tokio::", "runtime::"];
    let module_filter = filter_fn(move |metadata| {
        !noisy_modules
            .iter()
            .any(|name| metadata.target().starts_with(name))
    });

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    let subscriber = tracing_subscriber::registry().with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_names(false)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(module_filter)
            .with_filter(env_filter),
    );

    // Only set if we haven't already set a global subscriber
    if tracing::dispatcher::has_been_set() {
        debug!("Tracing subscriber already set");
    } else {
        subscriber.try_init().unwrap_or_else(|e| {
            eprintln!("Error: Failed to set up logging: {}", e);
        });
    }
}

/// Shorthand for a message on a dotted path.
///
/// Panics on a malformed path; meant for test fixtures.
pub fn message(path: &str, text: &str) -> ValidationMessage {
    match FieldPath::parse(path) {
        Ok(field) => ValidationMessage::new(field, text),
        Err(e) => panic!("bad fixture path {path:?}: {e}"),
    }
}

/// One canned answer of a [`ScriptedValidator`].
#[derive(Debug)]
pub struct ScriptedReply {
    pub delay: Duration,
    pub outcome: Result<Vec<ValidationMessage>, TransportError>,
}

impl ScriptedReply {
    pub fn ok(messages: Vec<ValidationMessage>) -> Self {
        Self {
            delay: Duration::ZERO,
            outcome: Ok(messages),
        }
    }

    pub fn fail(error: TransportError) -> Self {
        Self {
            delay: Duration::ZERO,
            outcome: Err(error),
        }
    }

    /// Never answer; the call stays pending until it is dropped.
    pub fn never() -> Self {
        Self::ok(vec![]).after(Duration::MAX)
    }

    /// Answer only after `delay` of (virtual) time.
    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Remote validator that records every snapshot and replays queued replies.
///
/// Once the queue is empty every call succeeds immediately with no messages.
#[derive(Debug, Default)]
pub struct ScriptedValidator {
    replies: Mutex<VecDeque<ScriptedReply>>,
    received: Mutex<Vec<Snapshot>>,
}

impl ScriptedValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_replies(replies: impl IntoIterator<Item = ScriptedReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            received: Mutex::default(),
        }
    }

    pub fn push(&self, reply: ScriptedReply) {
        lock(&self.replies).push_back(reply);
    }

    /// Snapshots received so far, in call order.
    pub fn received(&self) -> Vec<Snapshot> {
        lock(&self.received).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.received).len()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl RemoteValidator for ScriptedValidator {
    async fn validate(&self, snapshot: Snapshot) -> Result<Vec<ValidationMessage>, TransportError> {
        lock(&self.received).push(snapshot);
        let reply = lock(&self.replies)
            .pop_front()
            .unwrap_or_else(|| ScriptedReply::ok(vec![]));
        if reply.delay == Duration::MAX {
            std::future::pending::<()>().await;
        } else if !reply.delay.is_zero() {
            tokio::time::sleep(reply.delay).await;
        }
        reply.outcome
    }
}
