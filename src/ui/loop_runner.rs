//! Event loop: terminal input, background results and the playback tick.

use crate::app::App;
use crate::controller::FeedEvent;
use crate::feed::RemoteApi;
use anyhow::Result;
use crossterm::{
    event::{DisableFocusChange, EnableFocusChange, Event, EventStream},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::time::Duration;
use tokio::sync::mpsc;

use super::input::handle_input;
use super::render::render;

/// Drives scroll animation and playback clocks.
const TICK: Duration = Duration::from_millis(250);

/// Outcome of a key press.
pub enum Action {
    Continue,
    Quit,
}

/// Raw mode plus alternate screen, undone on drop.
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableFocusChange)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(
            self.terminal.backend_mut(),
            DisableFocusChange,
            LeaveAlternateScreen
        );
        let _ = self.terminal.show_cursor();
    }
}

/// Wait for SIGINT or SIGTERM. Never resolves off Unix; Ctrl+C then arrives
/// as a key event.
#[cfg(unix)]
async fn shutdown_signal() -> Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};
    let mut term = signal(SignalKind::terminate())?;
    let mut int = signal(SignalKind::interrupt())?;
    Ok(tokio::select! {
        _ = term.recv() => "SIGTERM",
        _ = int.recv() => "SIGINT",
    })
}

#[cfg(not(unix))]
async fn shutdown_signal() -> Result<&'static str> {
    std::future::pending().await
}

/// Run the terminal front-end until the user quits or a shutdown signal
/// arrives.
///
/// The viewport is reported to the controller after every draw, so playback
/// follows exactly what is on screen.
pub async fn run<A: RemoteApi>(
    app: &mut App<A>,
    mut event_rx: mpsc::Receiver<FeedEvent>,
) -> Result<()> {
    // Raw mode must not outlive a panic
    let previous_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), DisableFocusChange, LeaveAlternateScreen);
        previous_hook(info);
    }));

    let mut guard = TerminalGuard::enter()?;
    let mut input = EventStream::new();
    let mut ticker = tokio::time::interval(TICK);
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        if app.needs_redraw {
            guard.terminal.draw(|f| render(f, app))?;
            app.sync_viewport();
            app.needs_redraw = false;
        }
        if app.clear_expired_status() {
            app.needs_redraw = true;
        }

        // Apply finished loads before the next key press
        while let Ok(event) = event_rx.try_recv() {
            app.handle_feed_event(event);
        }

        tokio::select! {
            biased;

            signal = &mut shutdown => {
                match signal {
                    Ok(name) => tracing::info!(signal = name, "Shutting down"),
                    Err(e) => tracing::warn!(error = %e, "Signal handler failed, shutting down"),
                }
                break;
            }

            next = input.next() => match next {
                Some(Ok(event)) => {
                    if handle_terminal_event(app, event) {
                        break;
                    }
                }
                Some(Err(e)) => tracing::warn!(error = %e, "Terminal event stream error"),
                None => break,
            },

            Some(event) = event_rx.recv() => app.handle_feed_event(event),

            _ = ticker.tick() => on_tick(app),
        }
    }

    drop(guard);
    Ok(())
}

/// Returns true when the app should quit.
fn handle_terminal_event<A: RemoteApi>(app: &mut App<A>, event: Event) -> bool {
    match event {
        Event::Key(key) => {
            app.needs_redraw = true;
            matches!(handle_input(app, key.code, key.modifiers), Action::Quit)
        }
        Event::FocusLost | Event::FocusGained => {
            app.feed
                .set_screen_focused(matches!(event, Event::FocusGained));
            app.needs_redraw = true;
            false
        }
        Event::Resize(..) => {
            app.needs_redraw = true;
            false
        }
        _ => false,
    }
}

fn on_tick<A: RemoteApi>(app: &mut App<A>) {
    app.feed.tick(TICK);
    if app.animate_scroll() {
        app.needs_redraw = true;
    }
    // Playback position and attention pulses move every tick
    if !app.feed.items().is_empty() {
        app.needs_redraw = true;
    }
}
