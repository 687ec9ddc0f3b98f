use std::sync::Arc;

use anyhow::Context;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::app::App;
use crate::audio::AudioElement;
use crate::blob::{BlobUrls, UrlMinter};
use crate::cli::Args;
use crate::playlist::PlaylistController;

mod event_loop;
mod logging;
mod settings;
mod startup;
#[cfg(test)]
mod testing;

pub fn run(args: Args) -> anyhow::Result<()> {
    let (mut settings, fallback) = settings::load_settings();
    settings::apply_args(&mut settings, &args);

    if args.print_config {
        print!("{}", toml::to_string_pretty(&settings).context("failed to render config")?);
        return Ok(());
    }

    let _log_guard = logging::init(&settings);
    if let Some(reason) = fallback {
        tracing::warn!("{reason}");
    }

    let store = startup::open_store(&settings, args.ephemeral);
    let urls = Arc::new(BlobUrls::new());
    let minter: Arc<dyn UrlMinter> = urls.clone();
    let element = AudioElement::new(Arc::clone(&urls), settings.audio.clone());
    let mut deck = PlaylistController::new(
        store,
        element,
        minter,
        startup::controller_options(&settings),
    );

    let added = startup::prepare(&mut deck, &settings, args.reset, &args.paths);
    let mut app = App::new();
    app.selected = deck.current_index();
    if !args.paths.is_empty() {
        let noun = if added == 1 { "track" } else { "tracks" };
        app.push_notice(format!("added {added} {noun}"), std::time::Instant::now());
    }

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut state = event_loop::EventLoopState::default();
    let run_result = event_loop::run(&mut terminal, &settings, &mut app, &mut deck, &mut state);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    deck.into_element().quit_softly();
    tracing::info!(live_urls = urls.live(), "shut down");
    run_result
}
