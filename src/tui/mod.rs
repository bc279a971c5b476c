//! TUI module for text-filter.
//!
//! Provides the interactive terminal editor built on `ratatui` and
//! `crossterm`. The entry point is [`run_tui`], which takes over the
//! terminal, runs the event loop, and restores the terminal on exit
//! (including panics).

pub mod app;
pub mod event;
pub mod recent_overlay;
pub mod ui;

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use crate::config::AppConfig;
use app::App;
use event::{poll_crossterm_event, AppEvent};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Interval between `App::on_tick` calls.
const TICK_RATE: Duration = Duration::from_millis(100);

// ---------------------------------------------------------------------------
// Terminal setup / teardown
// ---------------------------------------------------------------------------

/// Enter raw mode on the alternate screen with mouse and paste capture.
fn setup_terminal() -> io::Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableBracketedPaste
    )?;
    Terminal::new(CrosstermBackend::new(stdout))
}

/// Undo everything `setup_terminal` switched on, writing to `out`.
fn leave_editor_screen<W: io::Write>(out: &mut W) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(
        out,
        DisableBracketedPaste,
        DisableMouseCapture,
        LeaveAlternateScreen
    )
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> io::Result<()> {
    leave_editor_screen(terminal.backend_mut())?;
    terminal.show_cursor()
}

/// Restore the terminal before the default panic output is printed, so a
/// crash does not leave the shell in raw mode. Unsaved text is lost either
/// way.
fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = leave_editor_screen(&mut io::stdout());
        previous(info);
    }));
}

// ---------------------------------------------------------------------------
// Signal handling
// ---------------------------------------------------------------------------

/// Resolve once SIGINT or SIGTERM arrives. A signal that cannot be
/// registered never resolves.
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let listen = |kind: SignalKind| async move {
        match signal(kind) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        _ = listen(SignalKind::interrupt()) => {}
        _ = listen(SignalKind::terminate()) => {}
    }
}

/// Return a flag that flips to `true` when the process receives SIGINT or
/// SIGTERM from outside (e.g. `kill -15 <pid>`).
///
/// In raw mode Ctrl+C arrives as a key event, not a signal, so this only
/// covers signals sent by other processes. The listener runs on its own
/// thread with a current-thread tokio runtime.
pub fn setup_signal_handler() -> Arc<AtomicBool> {
    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&shutdown);

    std::thread::spawn(move || {
        let Ok(rt) = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        else {
            return;
        };
        rt.block_on(wait_for_shutdown_signal());
        flag.store(true, Ordering::SeqCst);
    });

    shutdown
}

// ---------------------------------------------------------------------------
// Entry point and event loop
// ---------------------------------------------------------------------------

/// Open the startup document, hand the terminal to the editor and give it
/// back on exit, also when the loop fails.
pub fn run_tui(config: AppConfig) -> io::Result<()> {
    install_panic_hook();
    let shutdown = setup_signal_handler();

    let mut app = App::new(config);
    if let Some(path) = app.config.file.clone() {
        app.open_startup_file(path);
    }

    let mut terminal = setup_terminal()?;
    let outcome = run_event_loop(&mut terminal, &mut app, &shutdown);
    restore_terminal(&mut terminal)?;
    outcome
}

/// Redraw when dirty, wait for input until the next tick, dispatch it.
///
/// An external SIGINT/SIGTERM leaves immediately without a save prompt.
fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    shutdown: &AtomicBool,
) -> io::Result<()> {
    let mut last_tick = Instant::now();

    while !app.should_quit {
        if shutdown.load(Ordering::SeqCst) {
            app.should_quit = true;
            break;
        }

        if app.needs_redraw {
            terminal.draw(|frame| ui::draw(frame, app))?;
            app.needs_redraw = false;
        }

        let wait = TICK_RATE.saturating_sub(last_tick.elapsed());
        match poll_crossterm_event(wait) {
            Some(AppEvent::Key(key)) => app.on_key(key),
            Some(AppEvent::Paste(text)) => app.on_paste(text),
            Some(AppEvent::Mouse(mouse)) => app.on_mouse(mouse),
            Some(AppEvent::Resize(..)) => app.needs_redraw = true,
            None => {}
        }

        if last_tick.elapsed() >= TICK_RATE {
            app.on_tick();
            last_tick = Instant::now();
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
