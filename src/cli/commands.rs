//! Command handlers for the `billform` binary
//!
//! All commands work offline: the remote endpoint is replaced by a recorded
//! response file where one is needed.

use std::io;
use std::path::Path;

use clap::CommandFactory;
use clap_complete::generate;
use colored::Colorize;
use termtree::Tree;
use tracing::{debug, instrument};

use crate::application::{DispatchPhase, FormView};
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, Settings};
use crate::domain::{BillRecord, ErrorMerger, FieldNode, FieldPath, FieldTree};
use crate::infrastructure::wire::ValidationResponse;
use crate::infrastructure::InfraError;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Check { record }) => cmd_check(record),
        Some(Commands::Merge { record, response }) => cmd_merge(record, response),
        Some(Commands::Tree { record }) => cmd_tree(record.as_deref()),
        Some(Commands::Snapshot { record }) => cmd_snapshot(record.as_deref()),
        Some(Commands::Config { command }) => cmd_config(command, cli.config.as_deref()),
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        None => Err(CliError::InvalidArgs("no command given, see --help".into())),
    }
}

/// Read a bill record from a JSON file.
pub fn load_record(path: &Path) -> CliResult<BillRecord> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| InfraError::io(format!("read {}", path.display()), e))?;
    let record = serde_json::from_str(&content)
        .map_err(|e| InfraError::json(format!("parse {}", path.display()), e))?;
    Ok(record)
}

fn record_or_sample(path: Option<&Path>) -> CliResult<BillRecord> {
    match path {
        Some(path) => load_record(path),
        None => Ok(BillRecord::sample()),
    }
}

/// Field tree of `record` with every client rule applied.
pub fn validated_tree(record: &BillRecord) -> CliResult<FieldTree> {
    let mut tree = record.to_field_tree()?;
    let failing = BillRecord::rules()?.apply_all(&mut tree);
    debug!(failing, "client rules applied");
    Ok(tree)
}

/// Apply a recorded endpoint response to `tree`.
pub fn merge_response(tree: &mut FieldTree, body: serde_json::Value) -> CliResult<usize> {
    let messages = ValidationResponse::from_json(body)
        .and_then(ValidationResponse::into_messages)
        .map_err(InfraError::from)?;
    let summary = ErrorMerger::apply(tree, &messages)?;
    Ok(summary.flagged)
}

fn report(tree: &FieldTree) -> CliResult<()> {
    let view = FormView::from_tree(tree, DispatchPhase::Idle, None);
    let count = view.invalid_count();
    if count == 0 {
        output::success(&format!("all {} fields valid", view.fields.len()));
        return Ok(());
    }
    output::header(&format!("{count} of {} fields invalid", view.fields.len()));
    for field in view.fields.iter().filter(|f| !f.errors.is_empty()) {
        output::field_errors(&field.path, &field.errors);
    }
    Err(CliError::Invalid { count })
}

#[instrument]
fn cmd_check(record: &Path) -> CliResult<()> {
    let tree = validated_tree(&load_record(record)?)?;
    report(&tree)
}

#[instrument]
fn cmd_merge(record: &Path, response: &Path) -> CliResult<()> {
    let mut tree = validated_tree(&load_record(record)?)?;
    let content = std::fs::read_to_string(response)
        .map_err(|e| InfraError::io(format!("read {}", response.display()), e))?;
    let body = serde_json::from_str(&content)
        .map_err(|e| InfraError::json(format!("parse {}", response.display()), e))?;
    let flagged = merge_response(&mut tree, body)?;
    debug!(flagged, "response merged");
    report(&tree)
}

#[instrument]
fn cmd_tree(record: Option<&Path>) -> CliResult<()> {
    let tree = validated_tree(&record_or_sample(record)?)?;
    output::info(&render_tree(&tree)?);
    Ok(())
}

#[instrument]
fn cmd_snapshot(record: Option<&Path>) -> CliResult<()> {
    let tree = record_or_sample(record)?.to_field_tree()?;
    let body = serde_json::to_string_pretty(&tree.snapshot().to_wire())
        .map_err(|e| InfraError::json("serialize snapshot", e))?;
    output::info(&body);
    Ok(())
}

fn cmd_config(command: &ConfigCommands, local: Option<&Path>) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = Settings::load(local)?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Template => output::info(&Settings::template()),
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => {
                    let state = if path.exists() { "" } else { " (not found)" };
                    output::action("global", &format!("{}{state}", path.display()));
                }
                None => output::action("global", &"no config directory"),
            }
            if let Some(path) = local {
                output::action("local", &path.display());
            }
        }
    }
    Ok(())
}

/// Render the field tree with values and error annotations.
pub fn render_tree(tree: &FieldTree) -> CliResult<Tree<String>> {
    Ok(build_node(tree, &FieldPath::root(), "bill".bold().to_string())?)
}

fn build_node(
    tree: &FieldTree,
    path: &FieldPath,
    label: String,
) -> Result<Tree<String>, crate::domain::DomainError> {
    let mut node = Tree::new(label);
    if let FieldNode::Group(group) = tree.get(path)? {
        for name in group.names() {
            let child = path.child(name);
            let child_node = match tree.get(&child)? {
                FieldNode::Group(_) => build_node(tree, &child, name.cyan().to_string())?,
                FieldNode::Leaf(leaf) => {
                    let mut label = format!("{name} = {}", leaf.value());
                    for entry in leaf.errors().entries() {
                        label.push_str(&format!(
                            " {} {}",
                            output::kind_tag(entry.kind),
                            entry.message.red()
                        ));
                    }
                    Tree::new(label)
                }
            };
            node.push(child_node);
        }
    }
    Ok(node)
}
