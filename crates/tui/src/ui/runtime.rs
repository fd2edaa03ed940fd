//! Runtime: event loop and terminal lifecycle for the TUI.
//!
//! Responsibilities
//! - Own the terminal lifecycle (enter/leave alternate screen, raw mode).
//! - Multiplex terminal input with completed remote calls in one
//!   `tokio::select!` loop.
//! - Route keys to the root view and execute the returned `Effect`s.
//! - Tear the session down on exit so late responses are discarded.
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use fileselect_engine::SelectionSession;
use ratatui::{Terminal, prelude::*};
use std::time::Duration;
use tokio::{signal, sync::mpsc};
use tracing::{debug, info, warn};

use crate::app::{App, Effect};
use crate::cmd;
use crate::ui::components::Component;
use crate::ui::main_component::MainView;

/// Spawn a dedicated input thread that blocks on terminal input and forwards
/// `crossterm` events over a Tokio channel.
///
/// The thread exits once the receiver is dropped.
fn spawn_input_thread() -> mpsc::Receiver<Event> {
    let (sender, receiver) = mpsc::channel(500);
    let poll_interval = Duration::from_millis(50);

    std::thread::spawn(move || {
        loop {
            if sender.is_closed() {
                break;
            }
            match event::poll(poll_interval) {
                Ok(true) => match event::read() {
                    Ok(event) => {
                        if let Err(e) = sender.blocking_send(event) {
                            warn!("Failed to send event: {}", e);
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("Failed to read event: {}", e);
                        break;
                    }
                },
                Ok(false) => {}
                Err(e) => {
                    warn!("Failed to poll events: {}", e);
                    break;
                }
            }
        }
    });
    receiver
}

/// Put the terminal into raw mode and enter the alternate screen.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<std::io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore terminal settings and leave the alternate screen.
fn cleanup_terminal(terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn render(terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>, app: &mut App, main_view: &mut MainView) -> Result<()> {
    terminal.draw(|frame| main_view.render(frame, frame.area(), app))?;
    Ok(())
}

/// Translate a raw terminal event into effects.
fn handle_input_event(app: &mut App, main_view: &mut MainView, input_event: Event) -> Vec<Effect> {
    match input_event {
        Event::Key(key_event) if key_event.kind == KeyEventKind::Press => main_view.handle_key_events(app, key_event),
        _ => Vec::new(),
    }
}

/// Entry point for the TUI runtime: sets up the terminal, mounts the widget,
/// runs the event loop, and performs cleanup on exit.
pub async fn run_app(session: SelectionSession) -> Result<()> {
    let mut input_receiver = spawn_input_thread();
    let mut main_view = MainView::default();
    let mut app = App::new(session);
    let mut terminal = setup_terminal()?;

    info!(parameter_id = %app.session.machine().parameter_id(), "mounting file select widget");
    app.session.mount();
    let loop_result = event_loop(&mut terminal, &mut app, &mut main_view, &mut input_receiver).await;

    app.session.teardown();
    cleanup_terminal(&mut terminal)?;
    loop_result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut App,
    main_view: &mut MainView,
    input_receiver: &mut mpsc::Receiver<Event>,
) -> Result<()> {
    render(terminal, app, main_view)?;

    loop {
        let mut effects: Vec<Effect> = Vec::new();
        tokio::select! {
            maybe_event = input_receiver.recv() => {
                let Some(event) = maybe_event else {
                    // Input channel closed; shut down cleanly.
                    break;
                };
                if let Event::Key(key_event) = event
                    && key_event.code == KeyCode::Char('c') && key_event.modifiers.contains(KeyModifiers::CONTROL) {
                        break;
                    }
                effects.extend(handle_input_event(app, main_view, event));
            }

            Some(msg) = app.session.next_message(), if app.session.has_in_flight() => {
                debug!(?msg, "remote call completed");
                app.session.apply(msg);
            }

            _ = signal::ctrl_c() => { break; }
        }

        cmd::run_effects(app, effects);
        if app.should_quit {
            break;
        }
        render(terminal, app, main_view)?;
    }
    Ok(())
}
