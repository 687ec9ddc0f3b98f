use std::fs;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::Settings;

/// Route `tracing` output to `playdeck.log` so it does not draw over the TUI.
///
/// `PLAYDECK_LOG` takes precedence over `logging.filter`. Returns the guard
/// that flushes the writer; keep it alive for the whole run.
pub fn init(settings: &Settings) -> Option<WorkerGuard> {
    let dir = settings.log_dir()?;
    if let Err(e) = fs::create_dir_all(&dir) {
        eprintln!("playdeck: cannot create log directory {}: {e}", dir.display());
        return None;
    }

    let filter = EnvFilter::try_from_env("PLAYDECK_LOG")
        .or_else(|_| EnvFilter::try_new(&settings.logging.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let appender = tracing_appender::rolling::never(&dir, "playdeck.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init();
    if installed.is_err() {
        return None;
    }
    Some(guard)
}
