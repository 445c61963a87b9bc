use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyEventKind};
use log::debug;
use ratatui::layout::Size;

use crate::tui::command::Message;

/// Poll for a terminal event, blocking up to `timeout`.
pub fn poll_event_timeout(timeout: Duration) -> io::Result<Option<Message>> {
    if !event::poll(timeout)? {
        return Ok(None);
    }
    Ok(translate(event::read()?))
}

/// Poll for a terminal event without blocking.
pub fn poll_event_immediate() -> io::Result<Option<Message>> {
    poll_event_timeout(Duration::ZERO)
}

fn translate(event: Event) -> Option<Message> {
    match event {
        // Release and repeat reports only arrive with keyboard enhancement on
        Event::Key(key) if key.kind == KeyEventKind::Press => {
            debug!("Key event: {:?} with modifiers {:?}", key.code, key.modifiers);
            Some(Message::Key(key))
        }
        Event::Paste(data) => Some(Message::Paste(data)),
        Event::Resize(width, height) => Some(Message::Resize(Size::new(width, height))),
        _ => None,
    }
}
