//! Terminal output formatting with colors
//!
//! Respects NO_COLOR, CLICOLOR, CLICOLOR_FORCE automatically.

use colored::{ColoredString, Colorize};

use crate::domain::{ErrorEntry, ErrorKind};

/// Print error (red bold "error:" prefix) to stderr
pub fn error(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "error".red().bold(), msg);
}

/// Print success status (green checkmark)
pub fn success(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{} {}", "✓".green(), msg);
}

/// Print failure status (red X, indented)
pub fn failure(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("  {} {}", "✗".red(), msg);
}

/// Print section header (cyan bold)
pub fn header(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg.to_string().cyan().bold());
}

/// Print completed action (green label)
pub fn action(label: &str, msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}: {}", label.green(), msg);
}

/// Print plain output (no color, for data)
pub fn info(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg);
}

/// `[client]` in yellow, `[server]` in magenta
pub fn kind_tag(kind: ErrorKind) -> ColoredString {
    let tag = format!("[{kind}]");
    match kind {
        ErrorKind::Client => tag.yellow(),
        ErrorKind::Server => tag.magenta(),
    }
}

/// One line per error of a field: `✗ path [kind] message`
pub fn field_errors(path: &str, entries: &[ErrorEntry]) {
    for entry in entries {
        failure(&format!("{} {} {}", path.bold(), kind_tag(entry.kind), entry.message));
    }
}
