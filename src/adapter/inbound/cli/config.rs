//! Handler for the `config` command group.

use std::path::Path;

use crate::adapter::inbound::cli::output;
use crate::error::Result;
use crate::infrastructure::config::settings::{Config, DATABASE_URL_ENV};

/// Load `path`, or the defaults when the file does not exist.
///
/// # Errors
/// Returns an error if an existing file cannot be read, parsed or validated.
pub fn load_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        Config::load(path)
    } else {
        Config::parse_toml("")
    }
}

/// Execute `config show`.
pub fn execute_show(path: &Path) -> Result<()> {
    let config = load_or_default(path)?;

    if output::is_json() {
        output::json_output(serde_json::to_value(&config)?);
        return Ok(());
    }

    output::section("Effective Configuration");
    output::field(
        "Source",
        if path.exists() {
            path.display().to_string()
        } else {
            "(defaults)".to_string()
        },
    );

    output::section("Database");
    output::field("URL", &config.database.url);
    output::field("Pool size", config.database.pool_size);
    output::field(
        "Busy wait",
        format!("{}ms", config.database.busy_timeout_ms),
    );
    if std::env::var(DATABASE_URL_ENV).is_ok() {
        output::note(&format!("URL overridden by {DATABASE_URL_ENV}"));
    }

    output::section("Service");
    output::field(
        "Deadline",
        format!("{}ms", config.service.request_timeout_ms),
    );

    output::section("Dispatch");
    output::field("Queue depth", config.dispatch.channel_capacity);

    output::section("Logging");
    output::field("Level", &config.logging.level);
    output::field("Format", &config.logging.format);
    Ok(())
}

/// Execute `config validate`.
pub fn execute_validate(path: &Path) -> Result<()> {
    Config::load(path)?;
    output::success(&format!("{} is valid", path.display()));
    Ok(())
}
