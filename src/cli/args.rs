//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

/// Bill data form: field validation, server error merging and request preview
#[derive(Parser, Debug)]
#[command(name = "billform")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Turn debugging information on (repeat for more: -d -d -d)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub debug: u8,

    /// Local config file (overrides the global config)
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath, env = "BILLFORM_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the client-side rules and list failing fields
    Check {
        /// Bill record (JSON)
        #[arg(value_hint = ValueHint::FilePath)]
        record: PathBuf,
    },

    /// Apply a recorded validation response on top of the client rules
    Merge {
        /// Bill record (JSON)
        #[arg(value_hint = ValueHint::FilePath)]
        record: PathBuf,
        /// Endpoint response (JSON with `validationMessages`)
        #[arg(value_hint = ValueHint::FilePath)]
        response: PathBuf,
    },

    /// Show the form as a tree with values and errors
    Tree {
        /// Bill record (JSON); the built-in sample when omitted
        #[arg(value_hint = ValueHint::FilePath)]
        record: Option<PathBuf>,
    },

    /// Print the request body sent for remote validation
    Snapshot {
        /// Bill record (JSON); the built-in sample when omitted
        #[arg(value_hint = ValueHint::FilePath)]
        record: Option<PathBuf>,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Print a config template
    Template,

    /// Show config paths
    Path,
}
