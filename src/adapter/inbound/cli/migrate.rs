//! Handler for `faultline migrate`.

use std::path::Path;

use crate::adapter::inbound::cli::{config, output};
use crate::error::Result;
use crate::infrastructure::bootstrap::Runtime;

/// Execute `migrate`: open the configured database and apply pending
/// migrations.
pub fn execute(path: &Path) -> Result<()> {
    let config = config::load_or_default(path)?;
    let runtime = Runtime::start(&config)?;
    runtime.shutdown();

    output::success("Database schema is up to date");
    output::field("Database", &config.database.url);
    Ok(())
}
