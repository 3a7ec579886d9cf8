// Copyright (c) 2026 rezky_nightky

//! File logging. The terminal belongs to the renderer, so logs only go to a
//! file and only when one is asked for.

use std::fs::File;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::error::FxResult;

pub const LOG_ENV: &str = "ASCIIFIELD_LOG";
const DEFAULT_FILTER: &str = "info";

fn filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs the global subscriber writing to `path`. Without a path nothing
/// is installed and every event is dropped.
pub fn init(path: Option<&Path>) -> FxResult<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = File::create(path)?;
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_ansi(false)
        .with_target(false)
        .with_writer(Mutex::new(file))
        .try_init();
    if installed.is_err() {
        // A subscriber is already set; keep it.
        tracing::debug!("log subscriber already installed");
    }
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        build = env!("ASCIIFIELD_BUILD"),
        "logging to {}",
        path.display()
    );
    Ok(())
}
