//! Domain layer: field tree, rules and error reconciliation
//!
//! This layer is independent of external concerns (no I/O, no async, no config loading).

pub mod error;
pub mod errors;
pub mod merger;
pub mod path;
pub mod record;
pub mod rules;
pub mod snapshot;
pub mod tree;
pub mod value;

pub use error::{DomainError, DomainResult};
pub use errors::{ClientError, ErrorEntry, ErrorKind, ErrorSet};
pub use merger::{ErrorMerger, MergeSummary, ValidationMessage};
pub use path::FieldPath;
pub use record::{Address, BillRecord};
pub use rules::{Rule, RuleSet};
pub use snapshot::Snapshot;
pub use tree::{FieldNode, FieldTree, FieldTreeBuilder, Group, Leaf, Leaves};
pub use value::FieldValue;
