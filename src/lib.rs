//! billform: nested form model with synchronous field rules and debounced
//! remote validation.
//!
//! Layers, innermost first:
//! - [`domain`]: field tree, rules, error reconciliation
//! - [`application`]: edit dispatcher and form session
//! - [`infrastructure`]: validation boundary, wire format, service container
//! - [`cli`]: offline `billform` binary

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
