//! Validation boundary traits
//!
//! `RemoteValidator` is what the dispatcher talks to. `ValidationEndpoint`
//! is the raw JSON exchange; transport (HTTP, retries, headers) lives behind it.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::domain::{Snapshot, ValidationMessage};
use crate::infrastructure::error::TransportError;
use crate::infrastructure::wire::ValidationResponse;

/// Remote validation of a whole form snapshot.
///
/// Calls are idempotent from the caller's view: validating the same snapshot
/// twice is safe.
#[async_trait]
pub trait RemoteValidator: Send + Sync {
    async fn validate(&self, snapshot: Snapshot) -> Result<Vec<ValidationMessage>, TransportError>;
}

/// JSON request/response exchange with the validation service.
#[async_trait]
pub trait ValidationEndpoint: Send + Sync {
    async fn post(&self, body: Value) -> Result<Value, TransportError>;
}

// ============================================================
// IMPLEMENTATIONS
// ============================================================

/// Encodes snapshots for a [`ValidationEndpoint`] and decodes its replies.
pub struct EndpointValidator {
    endpoint: Arc<dyn ValidationEndpoint>,
}

impl EndpointValidator {
    pub fn new(endpoint: Arc<dyn ValidationEndpoint>) -> Self {
        Self { endpoint }
    }
}

#[async_trait]
impl RemoteValidator for EndpointValidator {
    #[instrument(level = "debug", skip_all, fields(leaves = snapshot.len()))]
    async fn validate(&self, snapshot: Snapshot) -> Result<Vec<ValidationMessage>, TransportError> {
        let body = self.endpoint.post(snapshot.to_wire()).await?;
        let messages = ValidationResponse::from_json(body)?.into_messages()?;
        debug!(messages = messages.len(), "endpoint replied");
        Ok(messages)
    }
}

/// Fails a validation with [`TransportError::Timeout`] once `limit` has passed.
pub struct TimeoutValidator {
    inner: Arc<dyn RemoteValidator>,
    limit: Duration,
}

impl TimeoutValidator {
    pub fn new(inner: Arc<dyn RemoteValidator>, limit: Duration) -> Self {
        Self { inner, limit }
    }
}

#[async_trait]
impl RemoteValidator for TimeoutValidator {
    async fn validate(&self, snapshot: Snapshot) -> Result<Vec<ValidationMessage>, TransportError> {
        tokio::time::timeout(self.limit, self.inner.validate(snapshot))
            .await
            .map_err(|_| TransportError::Timeout(self.limit))?
    }
}
