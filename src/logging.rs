//! Diagnostic log. The terminal belongs to the UI, so everything goes to a file in the cache dir.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use color_eyre::eyre::eyre;
use color_eyre::Result;
use tracing_subscriber::EnvFilter;

/// `<cache_dir>/<app_name>/<app_name>.log`
pub fn log_file_path(app_name: &str) -> Result<PathBuf> {
    let dir = dirs::cache_dir()
        .ok_or_else(|| eyre!("Could not determine cache directory"))?
        .join(app_name);
    Ok(dir.join(format!("{app_name}.log")))
}

/// Pick the filter directive: explicit flag, then `RUST_LOG`, then the configured level.
pub fn build_filter(
    explicit: Option<&str>,
    env_value: Option<&str>,
    configured: &str,
) -> Result<EnvFilter> {
    let directive = explicit
        .or(env_value.filter(|v| !v.trim().is_empty()))
        .unwrap_or(configured);
    EnvFilter::try_new(directive).map_err(|e| eyre!("Invalid log filter '{}': {}", directive, e))
}

/// Install the global subscriber, appending to `path`.
pub fn init(path: &Path, filter: EnvFilter) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|e| eyre!("Could not initialise logging: {}", e))
}
