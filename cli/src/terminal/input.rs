//! Keyboard interrupt while discovery runs: 'q' or Ctrl-C raises the stop flag.

use std::io::IsTerminal;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use tracing::debug;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub struct InputHandle {
    stop_signal: Arc<AtomicBool>,
    done: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl InputHandle {
    pub fn new(stop_signal: Arc<AtomicBool>) -> Self {
        Self {
            stop_signal,
            done: Arc::new(AtomicBool::new(false)),
            thread: None,
        }
    }

    /// Starts listening. Does nothing when stdin is not a terminal.
    pub fn start(&mut self) {
        if self.thread.is_some() || !std::io::stdin().is_terminal() {
            return;
        }
        if let Err(e) = enable_raw_mode() {
            debug!(%e, "keyboard input unavailable");
            return;
        }

        let stop_signal = self.stop_signal.clone();
        let done = self.done.clone();

        self.thread = Some(thread::spawn(move || {
            while !done.load(Ordering::Relaxed) {
                if !matches!(event::poll(POLL_INTERVAL), Ok(true)) {
                    continue;
                }
                let Ok(Event::Key(key_event)) = event::read() else {
                    continue;
                };

                let is_q = key_event.code == KeyCode::Char('q');
                let is_ctrl_c = key_event.code == KeyCode::Char('c')
                    && key_event.modifiers.contains(KeyModifiers::CONTROL);

                if (is_q || is_ctrl_c) && key_event.kind == KeyEventKind::Press {
                    stop_signal.store(true, Ordering::Relaxed);
                    break;
                }
            }
            let _ = disable_raw_mode();
        }));
    }

    pub fn stop(&mut self) {
        self.done.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for InputHandle {
    fn drop(&mut self) {
        self.stop();
        let _ = disable_raw_mode();
    }
}
