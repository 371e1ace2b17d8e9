// File-backed logging
// The terminal belongs to the UI, so log lines go to a file in the platform data directory

use directories::ProjectDirs;
use std::env;
use std::error::Error;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;
use tracing::Level;

/// Environment variable holding the log level (error, warn, info, debug, trace)
pub const LOG_ENV: &str = "MSWPR_LOG";

/// Log file location, e.g. ~/.local/share/mswpr/mswpr.log on Linux
pub fn log_path() -> PathBuf {
    match ProjectDirs::from("com", "xhbl", "mswpr") {
        Some(proj) => proj.data_local_dir().join("mswpr.log"),
        None => env::temp_dir().join("mswpr.log"),
    }
}

/// Level from a raw setting, defaulting to info
pub fn parse_level(value: Option<&str>) -> Level {
    value
        .and_then(|v| Level::from_str(v.trim()).ok())
        .unwrap_or(Level::INFO)
}

/// Install the global subscriber. Returns the file being written.
pub fn init_logging() -> Result<PathBuf, Box<dyn Error>> {
    let path = log_path();
    init_logging_at(&path)?;
    Ok(path)
}

/// Install the global subscriber writing to `path`
pub fn init_logging_at(path: &Path) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    let level = parse_level(env::var(LOG_ENV).ok().as_deref());
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(level)
        .try_init()
        .map_err(|e| e as Box<dyn Error>)?;
    Ok(())
}
