//! CLI output formatting.
//!
//! Human-readable output with colored symbols, or one JSON object per line
//! in `--json` mode. Quiet mode suppresses everything but warnings and
//! errors.

use std::fmt::Display;
use std::sync::{OnceLock, PoisonError, RwLock};

use owo_colors::OwoColorize;
use serde_json::{json, Value};

use crate::domain::weightage::Weightage;

/// Output settings taken from the global CLI flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputConfig {
    /// One JSON object per line instead of text.
    pub json: bool,
    /// Suppress everything but warnings and errors.
    pub quiet: bool,
    /// Number of `-v` flags.
    pub verbose: u8,
}

impl OutputConfig {
    #[must_use]
    pub const fn new(json: bool, quiet: bool, verbose: u8) -> Self {
        Self {
            json,
            quiet,
            verbose,
        }
    }

    /// Whether a text line of ordinary importance should be printed.
    const fn prints_text(self) -> bool {
        !self.json && !self.quiet
    }
}

static OUTPUT_CONFIG: OnceLock<RwLock<OutputConfig>> = OnceLock::new();

fn config_cell() -> &'static RwLock<OutputConfig> {
    OUTPUT_CONFIG.get_or_init(|| RwLock::new(OutputConfig::default()))
}

fn current() -> OutputConfig {
    *config_cell().read().unwrap_or_else(PoisonError::into_inner)
}

/// Write `{"type": kind, "payload": payload}` to stdout.
fn json_line(kind: &str, payload: Value) {
    println!("{}", json!({ "type": kind, "payload": payload }));
}

/// Route one message: a JSON line in JSON mode, otherwise `text` unless quiet.
fn emit(kind: &str, payload: impl FnOnce() -> Value, text: impl FnOnce()) {
    let config = current();
    if config.json {
        json_line(kind, payload());
    } else if config.prints_text() {
        text();
    }
}

/// Apply output settings. Call once, before any handler runs.
pub fn configure(config: OutputConfig) {
    *config_cell().write().unwrap_or_else(PoisonError::into_inner) = config;
}

#[must_use]
pub fn is_json() -> bool {
    current().json
}

#[must_use]
pub fn verbosity() -> u8 {
    current().verbose
}

/// Print a labeled value.
pub fn field(label: &str, value: impl Display) {
    let value = value.to_string();
    emit(
        "field",
        || json!({ "label": label, "value": value }),
        || println!("  {:<12} {}", label.dimmed(), value),
    );
}

pub fn success(message: &str) {
    emit(
        "success",
        || json!({ "message": message }),
        || println!("  {} {}", "✓".green(), message),
    );
}

/// Print a warning. Shown in quiet mode too.
pub fn warning(message: &str) {
    if current().json {
        json_line("warning", json!({ "message": message }));
    } else {
        println!("  {} {}", "⚠".yellow(), message);
    }
}

/// Print an error to stderr. Shown in quiet mode too.
pub fn error(message: &str) {
    if current().json {
        eprintln!("{}", json!({ "type": "error", "payload": { "message": message } }));
    } else {
        eprintln!("  {} {}", "×".red(), message);
    }
}

pub fn section(title: &str) {
    emit(
        "section",
        || json!({ "title": title }),
        || {
            println!();
            println!("{}", title.bold());
        },
    );
}

pub fn note(message: &str) {
    emit(
        "note",
        || json!({ "message": message }),
        || println!("  {}", message.dimmed()),
    );
}

/// Print a raw JSON value, for commands with their own JSON shape.
pub fn json_output(value: Value) {
    println!("{value}");
}

/// Print fault weights as an aligned two-column list.
pub fn weights(weightages: &[Weightage]) {
    emit(
        "weights",
        || json!({ "weightages": weightages }),
        || {
            let width = weightages
                .iter()
                .map(|w| w.fault_name.len())
                .max()
                .unwrap_or(0);
            for w in weightages {
                println!("  {:<width$} {}", w.fault_name, w.weight.to_string().cyan());
            }
        },
    );
}

/// Print a normalized manifest.
///
/// JSON mode embeds the document itself rather than its text.
pub fn manifest(text: &str) {
    emit(
        "manifest",
        || {
            let document = serde_json::from_str(text)
                .unwrap_or_else(|_| Value::String(text.to_string()));
            json!({ "document": document })
        },
        || println!("{text}"),
    );
}
