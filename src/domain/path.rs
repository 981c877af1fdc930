//! Field addressing

use std::fmt;
use std::str::FromStr;

use itertools::Itertools;

use crate::domain::error::{DomainError, DomainResult};

/// Separator between path segments, both in display form and on the wire.
pub const SEPARATOR: char = '.';

/// Dot-delimited address of a node in the field tree, e.g. `creditor.name`.
///
/// The empty path addresses the root group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    /// Path of the root group.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a dotted path. Empty input and empty segments are rejected.
    pub fn parse(s: &str) -> DomainResult<Self> {
        if s.is_empty() {
            return Err(DomainError::InvalidPath(s.to_string()));
        }
        let segments = s
            .split(SEPARATOR)
            .map(|segment| {
                if segment.is_empty() {
                    Err(DomainError::InvalidPath(s.to_string()))
                } else {
                    Ok(segment.to_string())
                }
            })
            .collect::<DomainResult<Vec<_>>>()?;
        Ok(Self { segments })
    }

    /// Parse a path as sent by the validation endpoint (`.creditor.name`).
    ///
    /// Exactly one leading separator is stripped; a path without one is accepted as is.
    pub fn from_wire(s: &str) -> DomainResult<Self> {
        Self::parse(s.strip_prefix(SEPARATOR).unwrap_or(s))
    }

    /// Path of the named child of this node.
    pub fn child(&self, name: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Self { segments }
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(String::as_str)
    }

    /// Last segment, None for the root.
    pub fn name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.iter().join(&SEPARATOR.to_string()))
    }
}

impl FromStr for FieldPath {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_dotted_string_when_parsing_then_splits_segments() {
        let path = FieldPath::parse("creditor.name").unwrap();
        assert_eq!(path.segments().collect::<Vec<_>>(), vec!["creditor", "name"]);
        assert_eq!(path.to_string(), "creditor.name");
        assert_eq!(path.name(), Some("name"));
    }

    #[test]
    fn given_wire_path_when_parsing_then_strips_leading_separator() {
        let path = FieldPath::from_wire(".debtor.town").unwrap();
        assert_eq!(path, FieldPath::parse("debtor.town").unwrap());

        let bare = FieldPath::from_wire("amount").unwrap();
        assert_eq!(bare.to_string(), "amount");
    }

    #[test]
    fn given_empty_segment_when_parsing_then_fails() {
        assert!(matches!(
            FieldPath::parse("creditor..name"),
            Err(DomainError::InvalidPath(_))
        ));
        assert!(matches!(FieldPath::parse(""), Err(DomainError::InvalidPath(_))));
        assert!(matches!(
            FieldPath::from_wire(".."),
            Err(DomainError::InvalidPath(_))
        ));
    }

    #[test]
    fn given_root_when_adding_children_then_builds_nested_path() {
        let path = FieldPath::root().child("finalCreditor").child("houseNo");
        assert!(!path.is_root());
        assert_eq!(path.to_string(), "finalCreditor.houseNo");
        assert!(FieldPath::root().is_root());
    }
}
