//! Interactive form session
//!
//! Owns a [`ChangeDispatcher`] and drives it from a single task: edits arrive
//! over an mpsc channel, the rendered state is published through a watch
//! channel after every change.
//!
//! Contract errors never end a session. A rejected edit is answered to its
//! sender, a server reply that cannot be merged shows up as
//! [`FormView::last_error`].

use serde::Serialize;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, instrument, warn};

use crate::application::dispatcher::{ChangeDispatcher, DispatchEvent, DispatchPhase};
use crate::application::error::{ApplicationError, ApplicationResult};
use crate::domain::{ClientError, DomainResult, ErrorEntry, FieldPath, FieldTree, FieldValue};

/// Input accepted by a running session.
#[derive(Debug)]
pub enum FormCommand {
    Edit {
        path: FieldPath,
        value: FieldValue,
        reply: oneshot::Sender<DomainResult<Option<ClientError>>>,
    },
}

/// One leaf as the rendering layer sees it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldView {
    pub path: String,
    pub value: serde_json::Value,
    pub errors: Vec<ErrorEntry>,
}

/// Whole-form state published after each change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormView {
    pub fields: Vec<FieldView>,
    pub phase: DispatchPhase,
    pub last_failure: Option<String>,
    /// Server reply rejected as a contract error, cleared by the next merge.
    pub last_error: Option<String>,
}

impl FormView {
    pub fn of(dispatcher: &ChangeDispatcher) -> Self {
        Self::from_tree(dispatcher.tree(), dispatcher.phase(), dispatcher.last_failure())
    }

    pub fn from_tree(tree: &FieldTree, phase: DispatchPhase, last_failure: Option<&str>) -> Self {
        let fields = tree
            .leaves()
            .map(|(path, leaf)| FieldView {
                path: path.to_string(),
                value: leaf.value().to_wire(),
                errors: leaf.errors().entries(),
            })
            .collect();
        Self {
            fields,
            phase,
            last_failure: last_failure.map(str::to_owned),
            last_error: None,
        }
    }

    pub fn field(&self, path: &str) -> Option<&FieldView> {
        self.fields.iter().find(|f| f.path == path)
    }

    /// Number of leaves with at least one error.
    pub fn invalid_count(&self) -> usize {
        self.fields.iter().filter(|f| !f.errors.is_empty()).count()
    }
}

/// Client side of a session: send edits, observe the view.
#[derive(Debug, Clone)]
pub struct FormHandle {
    commands: mpsc::Sender<FormCommand>,
    view: watch::Receiver<FormView>,
}

impl FormHandle {
    /// Apply an edit and return the failing client rule, if any.
    ///
    /// An unknown path or a group path is reported here; the session keeps running.
    pub async fn edit(
        &self,
        path: FieldPath,
        value: impl Into<FieldValue>,
    ) -> ApplicationResult<Option<ClientError>> {
        let (reply, outcome) = oneshot::channel();
        self.commands
            .send(FormCommand::Edit {
                path,
                value: value.into(),
                reply,
            })
            .await
            .map_err(|_| ApplicationError::SessionClosed)?;
        let outcome = outcome.await.map_err(|_| ApplicationError::SessionClosed)?;
        Ok(outcome?)
    }

    /// Latest published view.
    pub fn current(&self) -> FormView {
        self.view.borrow().clone()
    }

    /// Receiver for awaiting view changes.
    pub fn subscribe(&self) -> watch::Receiver<FormView> {
        self.view.clone()
    }
}

pub struct FormSession {
    dispatcher: ChangeDispatcher,
    commands: mpsc::Receiver<FormCommand>,
    view: watch::Sender<FormView>,
    last_error: Option<String>,
}

impl FormSession {
    /// Wrap `dispatcher` in a session; `capacity` bounds queued edits.
    pub fn open(dispatcher: ChangeDispatcher, capacity: usize) -> (Self, FormHandle) {
        let (command_tx, command_rx) = mpsc::channel(capacity.max(1));
        let (view_tx, view_rx) = watch::channel(FormView::of(&dispatcher));
        let session = Self {
            dispatcher,
            commands: command_rx,
            view: view_tx,
            last_error: None,
        };
        let handle = FormHandle {
            commands: command_tx,
            view: view_rx,
        };
        (session, handle)
    }

    /// Run until every handle is dropped, then finish outstanding validation
    /// and return the final tree.
    #[instrument(level = "debug", skip(self))]
    pub async fn run(mut self) -> FieldTree {
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(FormCommand::Edit { path, value, reply }) => {
                        let outcome = self.dispatcher.edit(&path, value);
                        match &outcome {
                            Ok(failing) => debug!(%path, valid = failing.is_none(), "edit applied"),
                            Err(e) => warn!(%path, error = %e, "edit rejected"),
                        }
                        // the sender may have stopped waiting
                        let _ = reply.send(outcome);
                    }
                    None => break,
                },
                event = self.dispatcher.next_event(), if self.dispatcher.is_active() => {
                    self.handle_event(event);
                }
            }
            self.publish();
        }

        info!("all handles dropped, settling");
        while self.dispatcher.is_active() {
            let event = self.dispatcher.next_event().await;
            self.handle_event(event);
        }
        self.publish();
        self.dispatcher.into_tree()
    }

    fn handle_event(&mut self, event: DomainResult<Option<DispatchEvent>>) {
        match event {
            Ok(Some(event)) => {
                if matches!(event, DispatchEvent::Merged { .. }) {
                    self.last_error = None;
                }
                log_event(&event);
            }
            Ok(None) => {}
            Err(e) => {
                warn!(error = %e, "server reply rejected, tree left unchanged");
                self.last_error = Some(e.to_string());
            }
        }
    }

    fn publish(&self) {
        let mut view = FormView::of(&self.dispatcher);
        view.last_error = self.last_error.clone();
        // send_replace keeps the value even when no receiver is left
        self.view.send_replace(view);
    }
}

fn log_event(event: &DispatchEvent) {
    match event {
        DispatchEvent::Merged { seq, summary } => {
            debug!(seq, flagged = summary.flagged, cleared = summary.cleared, "merged")
        }
        other => debug!(?other, "dispatch event"),
    }
}
