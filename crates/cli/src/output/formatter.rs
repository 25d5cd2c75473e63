//! Output formatter for human-readable and JSON output
//!
//! Every command reports through a Formatter so `--json`, `--quiet` and
//! `--no-color` behave the same everywhere.

use serde::Serialize;

use super::OutputConfig;

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const RESET: &str = "\x1b[0m";

/// Formatter for CLI output
///
/// In JSON mode stdout carries exactly one JSON document per command and
/// nothing else; human messages and colors are suppressed.
#[derive(Debug, Clone, Default)]
pub struct Formatter {
    config: OutputConfig,
}

impl Formatter {
    /// Create a new formatter with the given configuration
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    /// Check if JSON output mode is enabled
    pub fn is_json(&self) -> bool {
        self.config.json
    }

    /// Check if quiet mode is enabled
    pub fn is_quiet(&self) -> bool {
        self.config.quiet
    }

    /// Check if colors are enabled
    pub fn colors_enabled(&self) -> bool {
        !self.config.no_color && !self.config.json
    }

    /// Output a command result
    ///
    /// JSON mode serializes the value, human mode uses its Display impl.
    pub fn output<T: Serialize + std::fmt::Display>(&self, value: &T) {
        if self.config.quiet {
            return;
        }

        if self.config.json {
            match serde_json::to_string_pretty(value) {
                Ok(json) => println!("{json}"),
                Err(e) => eprintln!("Error serializing output: {e}"),
            }
        } else {
            println!("{value}");
        }
    }

    /// Output a success message
    pub fn success(&self, message: &str) {
        if self.config.quiet || self.config.json {
            return;
        }
        println!("{}", self.paint(GREEN, "✓", message));
    }

    /// Output an error message
    ///
    /// Errors are always printed, even in quiet mode.
    pub fn error(&self, message: &str) {
        if self.config.json {
            eprintln!("{}", serde_json::json!({ "error": message }));
        } else {
            eprintln!("{}", self.paint(RED, "✗", message));
        }
    }

    /// Output a warning message
    pub fn warning(&self, message: &str) {
        if self.config.quiet || self.config.json {
            return;
        }
        eprintln!("{}", self.paint(YELLOW, "⚠", message));
    }

    fn paint(&self, color: &str, symbol: &str, message: &str) -> String {
        if self.colors_enabled() {
            format!("{color}{symbol}{RESET} {message}")
        } else {
            format!("{symbol} {message}")
        }
    }
}
