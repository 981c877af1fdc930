//! Service container for dependency injection
//!
//! Wires settings and the validation endpoint into dispatchers and sessions.

use std::sync::Arc;

use tracing::debug;

use crate::application::{ApplicationResult, ChangeDispatcher, FormHandle, FormSession};
use crate::config::Settings;
use crate::domain::BillRecord;
use crate::infrastructure::traits::{
    EndpointValidator, RemoteValidator, TimeoutValidator, ValidationEndpoint,
};

/// Queued edits a session accepts before `FormHandle::edit` waits.
pub const COMMAND_CAPACITY: usize = 64;

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Remote validation, with the configured timeout applied
    pub validator: Arc<dyn RemoteValidator>,
}

impl ServiceContainer {
    /// Create a container talking to a JSON validation endpoint.
    pub fn new(settings: Settings, endpoint: Arc<dyn ValidationEndpoint>) -> Self {
        Self::with_deps(settings, Arc::new(EndpointValidator::new(endpoint)))
    }

    /// Create a container with a custom validator (for testing).
    pub fn with_deps(settings: Settings, validator: Arc<dyn RemoteValidator>) -> Self {
        let validator: Arc<dyn RemoteValidator> = match settings.remote_timeout() {
            Some(limit) => Arc::new(TimeoutValidator::new(validator, limit)),
            None => validator,
        };
        let settings = Arc::new(settings);

        Self {
            settings,
            validator,
        }
    }

    /// Dispatcher over `record` with the bill rules and configured quiet period.
    pub fn open_dispatcher(&self, record: &BillRecord) -> ApplicationResult<ChangeDispatcher> {
        let tree = record.to_field_tree()?;
        let rules = BillRecord::rules()?;
        debug!(leaves = tree.leaf_count(), "opening bill form");
        Ok(ChangeDispatcher::new(
            tree,
            rules,
            Arc::clone(&self.validator),
            self.settings.quiet_period(),
        )?)
    }

    /// Session over `record`; spawn or await `FormSession::run` to drive it.
    pub fn open_session(
        &self,
        record: &BillRecord,
    ) -> ApplicationResult<(FormSession, FormHandle)> {
        let dispatcher = self.open_dispatcher(record)?;
        Ok(FormSession::open(dispatcher, COMMAND_CAPACITY))
    }
}
