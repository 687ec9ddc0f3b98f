use crate::cli::Args;
use crate::config;

/// Load settings, falling back to defaults. Returns the reason for a fallback, if any.
pub fn load_settings() -> (config::Settings, Option<String>) {
    match config::Settings::load() {
        Ok(s) => {
            if let Err(msg) = s.validate() {
                (
                    config::Settings::default(),
                    Some(format!("invalid config, using defaults: {msg}")),
                )
            } else {
                (s, None)
            }
        }
        // Config is optional; failures should not prevent the app from starting.
        Err(e) => (
            config::Settings::default(),
            Some(format!("failed to load config, using defaults: {e}")),
        ),
    }
}

/// Fold command line switches into the loaded settings.
pub fn apply_args(settings: &mut config::Settings, args: &Args) {
    if args.no_seek_bar {
        settings.player.enable_seek_bar = false;
    }
    if let Some(path) = &args.store {
        settings.storage.path = Some(path.clone());
    }
}
