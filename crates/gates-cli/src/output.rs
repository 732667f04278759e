//! Output formatting utilities

use colored::*;
use serde::Serialize;
use tabled::{Table, Tabled};

use crate::error::CliResult;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed table format
    #[default]
    Table,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

/// Print any serializable value as JSON or YAML. Tables fall back to JSON.
pub fn print_document<T: Serialize + ?Sized>(data: &T, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Table | OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(data)?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yaml::to_string(data)?);
        }
    }
    Ok(())
}

/// Print table rows, or nothing but a dimmed note when empty.
pub fn print_table<T: Tabled>(title: &str, rows: Vec<T>, empty: &str) {
    println!("{}", title.bold().cyan());
    if rows.is_empty() {
        println!("{}", empty.dimmed());
    } else {
        println!("{}", Table::new(rows));
    }
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

/// Render an optional cell.
pub fn cell(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}

/// Render a pass/block flag.
pub fn verdict(passed: bool) -> String {
    if passed { "pass" } else { "block" }.to_string()
}
