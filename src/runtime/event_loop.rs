use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::app::{App, InputMode};
use crate::config;
use crate::media::PlaybackElement;
use crate::playlist::PlaylistController;
use crate::store::Store;
use crate::ui;
use crate::upload;

/// State tracked by the runtime event loop across iterations.
#[derive(Default)]
pub struct EventLoopState {
    /// Internal two-key prefix state used for `gg` handling.
    pub pending_gg: bool,
}

/// Main terminal event loop: handles input, feeds element events to the
/// controller and redraws. Returns `Ok(())` when the user quits.
pub fn run<S: Store, E: PlaybackElement>(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    app: &mut App,
    deck: &mut PlaylistController<S, E>,
    state: &mut EventLoopState,
) -> anyhow::Result<()> {
    let notice_ttl = Duration::from_millis(settings.ui.notice_ms);
    loop {
        tick(app, deck, Instant::now(), notice_ttl);
        terminal.draw(|f| ui::draw(f, app, deck, settings))?;

        if !event::poll(Duration::from_millis(50))? {
            continue;
        }
        let quit = match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                handle_key_event(key, settings, app, deck, state)
            }
            Event::Mouse(mouse) => {
                handle_mouse_event(mouse, app, deck);
                false
            }
            _ => false,
        };
        if quit {
            return Ok(());
        }
    }
}

/// Per-frame bookkeeping: drain element events and surface notices.
fn tick<S: Store, E: PlaybackElement>(
    app: &mut App,
    deck: &mut PlaylistController<S, E>,
    now: Instant,
    notice_ttl: Duration,
) {
    deck.pump_events();
    for notice in deck.take_notices() {
        app.push_notice(notice.to_string(), now);
    }
    if app.follow_playback && !deck.is_empty() {
        app.selected = deck.current_index();
    }
    app.clamp_selection(deck.len());
    app.prune_notices(now, notice_ttl);
}

fn handle_mouse_event<S: Store, E: PlaybackElement>(
    mouse: MouseEvent,
    app: &mut App,
    deck: &mut PlaylistController<S, E>,
) {
    if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
        return;
    }
    let Some(fraction) = app
        .seek_bar
        .and_then(|bar| bar.fraction_at(mouse.column, mouse.row))
    else {
        return;
    };
    if let Err(e) = deck.seek_to(fraction) {
        tracing::debug!(error = %e, "click on progress bar ignored");
    }
}

/// Returns `true` when the user asked to quit.
fn handle_key_event<S: Store, E: PlaybackElement>(
    key: KeyEvent,
    settings: &config::Settings,
    app: &mut App,
    deck: &mut PlaylistController<S, E>,
    state: &mut EventLoopState,
) -> bool {
    if app.mode == InputMode::Upload {
        state.pending_gg = false;
        match key.code {
            KeyCode::Esc => app.cancel_upload(),
            KeyCode::Backspace => {
                app.input.pop();
            }
            KeyCode::Enter => upload_input(settings, app, deck),
            KeyCode::Char(c) if !c.is_control() => app.input.push(c),
            _ => {}
        }
        return false;
    }

    let len = deck.len();
    match key.code {
        KeyCode::Char('q') => {
            state.pending_gg = false;
            return true;
        }
        KeyCode::Char('g') => {
            if state.pending_gg {
                state.pending_gg = false;
                app.follow_playback_off();
                app.selected = 0;
            } else {
                state.pending_gg = true;
            }
        }
        KeyCode::Char('G') => {
            state.pending_gg = false;
            app.follow_playback_off();
            app.selected = len.saturating_sub(1);
        }
        KeyCode::Char('j') | KeyCode::Down => {
            state.pending_gg = false;
            app.follow_playback_off();
            app.next(len);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            state.pending_gg = false;
            app.follow_playback_off();
            app.prev(len);
        }
        KeyCode::Enter => {
            state.pending_gg = false;
            if let Err(e) = deck.select_track(app.selected) {
                app.push_notice(e.to_string(), Instant::now());
            } else {
                app.follow_playback_on();
            }
        }
        KeyCode::Char('p') | KeyCode::Char(' ') => {
            state.pending_gg = false;
            app.follow_playback_on();
            deck.toggle_playback();
        }
        KeyCode::Char('o') => {
            state.pending_gg = false;
            app.enter_upload_mode();
        }
        KeyCode::Char('R') => {
            state.pending_gg = false;
            deck.reset();
            app.clamp_selection(deck.len());
            app.push_notice("playlist cleared", Instant::now());
        }
        KeyCode::Char('L') => {
            state.pending_gg = false;
            scrub(deck, settings.controls.scrub_seconds, true);
        }
        KeyCode::Char('H') => {
            state.pending_gg = false;
            scrub(deck, settings.controls.scrub_seconds, false);
        }
        KeyCode::Char(_) => {
            // g pending should clear on any other printable char
            state.pending_gg = false;
        }
        _ => {}
    }

    false
}

fn upload_input<S: Store, E: PlaybackElement>(
    settings: &config::Settings,
    app: &mut App,
    deck: &mut PlaylistController<S, E>,
) {
    let line = app.take_input();
    let paths = upload::split_input(&line);
    if paths.is_empty() {
        return;
    }
    let added = deck.upload_files(upload::collect(&paths, &settings.upload));
    let msg = match added {
        0 => "no audio files found".to_string(),
        1 => "added 1 track".to_string(),
        n => format!("added {n} tracks"),
    };
    app.push_notice(msg, Instant::now());
}

/// Move the play position by `secs`, expressed as a seek-bar fraction.
fn scrub<S: Store, E: PlaybackElement>(deck: &mut PlaylistController<S, E>, secs: u64, forward: bool) {
    let Some(total) = deck.duration().filter(|d| !d.is_zero()) else {
        return;
    };
    let step = Duration::from_secs(secs);
    let now = deck.current_time();
    let target = if forward {
        now.saturating_add(step).min(total)
    } else {
        now.saturating_sub(step)
    };
    if let Err(e) = deck.seek_to(target.as_secs_f64() / total.as_secs_f64()) {
        tracing::debug!(error = %e, "scrub ignored");
    }
}
