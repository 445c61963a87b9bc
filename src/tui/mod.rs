//! # TUI
//!
//! The navigation engine and its screens. This is the only module that
//! knows about ratatui and crossterm.
//!
//! ## Event Loop
//!
//! [`run`] owns the terminal and a [`Navigator`]. Terminal input and the
//! results of background commands both arrive as [`Message`]s and are fed
//! to the navigator one at a time, in arrival order. Commands returned by
//! the navigator are handed to the tokio runtime and report back through a
//! std `mpsc` channel; the loop itself never awaits anything.
//!
//! ## Redraw Strategy
//!
//! - **Loading**: draws every ~80ms so the spinner animates.
//! - **Idle**: waits up to 100ms for input, then drains background
//!   messages, and only redraws when something arrived.

pub mod action;
pub mod command;
pub mod controller;
mod event;
pub mod history;
pub mod keymap;
pub mod notification;
pub mod overlay;
pub mod screen;
pub mod screens;
pub mod selection;

use std::io::{self, stdout};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::cursor::{Hide, Show};
use crossterm::event::{
    DisableBracketedPaste, EnableBracketedPaste, KeyboardEnhancementFlags,
    PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use log::{debug, info};
use ratatui::DefaultTerminal;
use unicode_width::UnicodeWidthChar;

pub use command::{Command, Message, WorkContext};
pub use controller::{Navigator, NavigatorOptions};
pub use screen::{Screen, Title};

use crate::tui::event::{poll_event_immediate, poll_event_timeout};

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> io::Result<Self> {
        // Disambiguated escape codes make a lone Esc arrive without delay.
        // Terminals without the protocol ignore the request.
        execute!(
            stdout(),
            EnableBracketedPaste,
            Hide,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
        )?;
        info!("Terminal modes enabled (bracketed paste, hidden cursor, keyboard enhancement)");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(
            stdout(),
            PopKeyboardEnhancementFlags,
            DisableBracketedPaste,
            Show
        );
    }
}

/// Drives `navigator` until a quit message is handled.
///
/// Must be called from within a tokio runtime.
pub fn run(mut navigator: Navigator) -> io::Result<()> {
    let mut terminal = ratatui::try_init()?;
    let result = match TerminalModeGuard::new() {
        Ok(_guard) => event_loop(&mut terminal, &mut navigator),
        Err(e) => Err(e),
    };
    ratatui::restore();
    result
}

fn event_loop(terminal: &mut DefaultTerminal, navigator: &mut Navigator) -> io::Result<()> {
    let (tx, rx) = mpsc::channel();
    command::spawn(navigator.init(), &tx);

    let start_time = Instant::now();
    let mut needs_redraw = true;

    loop {
        let animating = navigator.is_loading();
        if animating {
            needs_redraw = true;
        }

        if needs_redraw {
            let spinner_frame = (start_time.elapsed().as_secs_f32() * 12.0) as usize;
            terminal.draw(|f| navigator.draw(f, spinner_frame))?;
            needs_redraw = false;
        }

        let timeout = if animating {
            Duration::from_millis(80)
        } else {
            Duration::from_millis(100)
        };

        // First event may block, the rest are drained before the next draw
        let mut next = poll_event_timeout(timeout)?;
        while let Some(msg) = next {
            needs_redraw = true;
            command::spawn(navigator.update(msg), &tx);
            if navigator.should_quit() {
                break;
            }
            next = poll_event_immediate()?;
        }

        while !navigator.should_quit() {
            let Ok(msg) = rx.try_recv() else {
                break;
            };
            needs_redraw = true;
            command::spawn(navigator.update(msg), &tx);
        }

        if navigator.should_quit() {
            debug!("Quit requested, leaving event loop");
            return Ok(());
        }
    }
}

/// Cuts `text` to at most `max_width` columns, ending in `…` when cut.
pub fn truncate(text: &str, max_width: usize) -> String {
    if unicode_width::UnicodeWidthStr::width(text) <= max_width {
        return text.to_string();
    }
    if max_width == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > max_width {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Berserk", 10), "Berserk");
        assert_eq!(truncate("Vagabond", 5), "Vaga…");
        assert_eq!(truncate("Vagabond", 0), "");
        assert_eq!(truncate("ワンピース", 5), "ワン…");
    }
}
