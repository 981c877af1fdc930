//! Per-leaf validation state
//!
//! A leaf carries at most one client-side and one server-side error. The two
//! slots are owned by different writers: `RuleSet` writes the client slot,
//! `ErrorMerger` writes the server slot.

use std::fmt;

use serde::Serialize;

/// Origin of a field error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// Produced by synchronous field rules.
    Client,
    /// Produced by the remote validation endpoint.
    Server,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Client => write!(f, "client"),
            ErrorKind::Server => write!(f, "server"),
        }
    }
}

/// Failure of a synchronous field rule.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientError {
    Required,
    PatternMismatch { pattern: String },
    RangeViolation { min: Option<f64>, max: Option<f64> },
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Required => write!(f, "field is required"),
            ClientError::PatternMismatch { pattern } => {
                write!(f, "value does not match pattern {pattern}")
            }
            ClientError::RangeViolation { min, max } => match (min, max) {
                (Some(min), Some(max)) => write!(f, "value must be between {min} and {max}"),
                (Some(min), None) => write!(f, "value must be at least {min}"),
                (None, Some(max)) => write!(f, "value must be at most {max}"),
                (None, None) => write!(f, "value out of range"),
            },
        }
    }
}

/// A single (kind, message) pair, as handed to the rendering layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorEntry {
    pub kind: ErrorKind,
    pub message: String,
}

/// Errors currently attached to a leaf, at most one per kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorSet {
    client: Option<ClientError>,
    server: Option<String>,
}

impl ErrorSet {
    pub fn client(&self) -> Option<&ClientError> {
        self.client.as_ref()
    }

    pub fn server(&self) -> Option<&str> {
        self.server.as_deref()
    }

    pub fn contains(&self, kind: ErrorKind) -> bool {
        self.get(kind).is_some()
    }

    pub fn get(&self, kind: ErrorKind) -> Option<ErrorEntry> {
        let message = match kind {
            ErrorKind::Client => self.client.as_ref().map(ToString::to_string),
            ErrorKind::Server => self.server.clone(),
        }?;
        Some(ErrorEntry { kind, message })
    }

    /// Entries in fixed order: client first, then server.
    pub fn entries(&self) -> Vec<ErrorEntry> {
        [ErrorKind::Client, ErrorKind::Server]
            .into_iter()
            .filter_map(|kind| self.get(kind))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.client.is_none() && self.server.is_none()
    }

    pub(in crate::domain) fn set_client(&mut self, error: Option<ClientError>) {
        self.client = error;
    }

    pub(in crate::domain) fn set_server(&mut self, message: String) {
        self.server = Some(message);
    }

    pub(in crate::domain) fn clear_server(&mut self) -> bool {
        self.server.take().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_both_kinds_when_listing_entries_then_client_comes_first() {
        let mut set = ErrorSet::default();
        set.set_server("invalid account".into());
        set.set_client(Some(ClientError::Required));

        let entries = set.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kind, ErrorKind::Client);
        assert_eq!(entries[0].message, "field is required");
        assert_eq!(entries[1].kind, ErrorKind::Server);
        assert_eq!(entries[1].message, "invalid account");
    }

    #[test]
    fn given_server_entry_when_setting_again_then_replaces() {
        let mut set = ErrorSet::default();
        set.set_server("first".into());
        set.set_server("second".into());
        assert_eq!(set.server(), Some("second"));
        assert_eq!(set.entries().len(), 1);
    }

    #[test]
    fn given_both_kinds_when_clearing_server_then_client_survives() {
        let mut set = ErrorSet::default();
        set.set_client(Some(ClientError::Required));
        set.set_server("unknown town".into());

        assert!(set.clear_server());
        assert!(!set.clear_server());
        assert!(set.contains(ErrorKind::Client));
        assert!(!set.contains(ErrorKind::Server));
    }

    #[test]
    fn given_range_bounds_when_formatting_then_names_both_bounds() {
        let err = ClientError::RangeViolation {
            min: Some(0.01),
            max: Some(999999999.99),
        };
        assert_eq!(err.to_string(), "value must be between 0.01 and 999999999.99");
    }
}
