//! UI rendering helpers for the terminal user interface.
//!
//! This module contains functions to render the TUI using `ratatui`.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    widgets::{Block, Borders, Gauge, List, ListItem, ListState, Padding, Paragraph, Wrap},
};
use std::time::Duration;

use crate::app::{App, InputMode, SeekBar};
use crate::config::Settings;
use crate::media::PlaybackElement;
use crate::playlist::{PlayerState, PlaylistController};
use crate::store::Store;

/// Render the controls help text, incorporating scrub seconds.
fn controls_text(scrub_seconds: u64, seek_bar: bool) -> String {
    let mut parts = vec![
        "[j/k] up/down".to_string(),
        "[enter] play selected".to_string(),
        "[space/p] play/pause".to_string(),
    ];
    if seek_bar {
        parts.push(format!("[H/L] scrub -/+{}s", scrub_seconds));
        parts.push("[click bar] seek".to_string());
    }
    parts.push("[o] upload".to_string());
    parts.push("[R] reset".to_string());
    parts.push("[q] quit".to_string());
    parts.join(" | ")
}

/// Format a `Duration` as `MM:SS`.
fn format_mmss(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

fn status_text<S: Store, E: PlaybackElement>(deck: &PlaylistController<S, E>) -> String {
    let mut parts: Vec<String> = Vec::new();
    match deck.state() {
        PlayerState::Idle => parts.push(" No tracks - press [o] to upload".to_string()),
        PlayerState::LoadedPaused => parts.push(" Paused".to_string()),
        PlayerState::LoadedPlaying => parts.push(" Playing".to_string()),
    }
    if let Some(track) = deck.current_track() {
        parts.push(format!(
            "Track {}/{}: {}",
            deck.current_index() + 1,
            deck.len(),
            track.name()
        ));
    }
    parts.join(" • ")
}

fn progress_label(elapsed: Duration, total: Option<Duration>) -> String {
    match total {
        Some(t) => format!("{} / {}", format_mmss(elapsed), format_mmss(t)),
        None => format_mmss(elapsed),
    }
}

fn progress_ratio(elapsed: Duration, total: Option<Duration>) -> f64 {
    match total {
        Some(t) if !t.is_zero() => (elapsed.as_secs_f64() / t.as_secs_f64()).clamp(0.0, 1.0),
        _ => 0.0,
    }
}

/// Render the entire UI and record where the seek bar landed.
pub fn draw<S: Store, E: PlaybackElement>(
    frame: &mut Frame,
    app: &mut App,
    deck: &PlaylistController<S, E>,
    settings: &Settings,
) {
    let seek_enabled = deck.options().enable_seek_bar;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(if seek_enabled { 3 } else { 0 }),
            Constraint::Length(3),
            Constraint::Length(4),
        ])
        .split(frame.area());

    // Header
    let header = Paragraph::new(settings.ui.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" playdeck ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    let status = Paragraph::new(status_text(deck))
        .block(Block::bordered().title(" status "))
        .wrap(Wrap { trim: true });
    frame.render_widget(status, chunks[1]);

    // Playlist
    {
        let items: Vec<ListItem> = deck
            .tracks()
            .iter()
            .enumerate()
            .map(|(i, t)| {
                if i == deck.current_index() {
                    ListItem::new(format!("{} (Now Playing)", t.name()))
                } else {
                    ListItem::new(t.name())
                }
            })
            .collect();

        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(" playlist "))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");
        let mut state = ListState::default();
        if !deck.is_empty() {
            state.select(Some(app.selected.min(deck.len() - 1)));
        }
        frame.render_stateful_widget(list, chunks[2], &mut state);
    }

    // Progress bar; clicks on its inner row seek.
    app.seek_bar = None;
    if seek_enabled {
        let area = chunks[3];
        let total = deck.duration();
        let elapsed = deck.current_time();
        let gauge = Gauge::default()
            .block(Block::default().borders(Borders::ALL).title(" progress "))
            .ratio(progress_ratio(elapsed, total))
            .label(progress_label(elapsed, total));
        frame.render_widget(gauge, area);

        if area.height >= 3 && area.width > 2 {
            app.seek_bar = Some(SeekBar {
                x: area.x + 1,
                y: area.y + 1,
                width: area.width - 2,
            });
        }
    }

    // Upload prompt or notices
    let (title, body) = match app.mode {
        InputMode::Upload => (
            " upload (enter adds, esc cancels) ",
            format!("path> {}", app.input),
        ),
        InputMode::Normal => (" notices ", app.notices().collect::<Vec<_>>().join(" • ")),
    };
    let bottom = Paragraph::new(body)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .padding(Padding::horizontal(1)),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(bottom, chunks[4]);
    if app.mode == InputMode::Upload {
        let inner: Rect = chunks[4];
        let x = inner.x + 2 + 6 + app.input.chars().count() as u16;
        frame.set_cursor_position((x.min(inner.right().saturating_sub(2)), inner.y + 1));
    }

    let footer = Paragraph::new(controls_text(settings.controls.scrub_seconds, seek_enabled))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                }),
        )
        .wrap(Wrap { trim: true });

    frame.render_widget(footer, chunks[5]);
}
