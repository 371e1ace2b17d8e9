// Entry point for the Minesweeper terminal application
// Starts logging, loads preferences, and launches the main UI

use std::error::Error;

use mswpr::msw_config::load_or_create_config;
use mswpr::msw_log::init_logging;
use mswpr::msw_ui::run as run_ui;

fn main() -> Result<(), Box<dyn Error>> {
    // Logging is optional; the game runs without it
    match init_logging() {
        Ok(path) => tracing::info!(path = %path.display(), version = env!("CARGO_PKG_VERSION"), "mswpr starting"),
        Err(e) => eprintln!("mswpr: logging disabled ({e})"),
    }

    // Load or create user preferences (difficulty, custom size)
    let mut cfg = load_or_create_config();

    // Launch the main UI loop
    run_ui(&mut cfg)
}
