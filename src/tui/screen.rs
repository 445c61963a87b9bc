//! # Screen Contract
//!
//! Every navigable unit of UI implements [`Screen`]. The navigator owns the
//! active screen and the suspended ones; a screen never sees the navigator
//! and only talks upward by returning [`Command`]s.
//!
//! `update` and `render` run on the loop thread and must be fast. Anything
//! slow goes into a command.

use ratatui::buffer::Buffer;
use ratatui::layout::{Rect, Size};
use ratatui::style::Color;

use crate::tui::command::{Command, Message, WorkContext};
use crate::tui::keymap::HelpSet;

/// Header title with an optional accent color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Title {
    pub text: String,
    pub color: Option<Color>,
}

impl Title {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            color: None,
        }
    }

    pub fn colored(text: impl Into<String>, color: Color) -> Self {
        Self {
            text: text.into(),
            color: Some(color),
        }
    }
}

pub trait Screen: Send {
    fn title(&self) -> Title;

    fn subtitle(&self) -> Option<String> {
        None
    }

    fn status(&self) -> Option<String> {
        None
    }

    fn help(&self) -> HelpSet;

    /// Intermediate screens still take part in back navigation but are not
    /// counted as a navigation step in the breadcrumbs.
    fn intermediate(&self) -> bool {
        false
    }

    /// Evaluated live; `false` while a sub-widget owns input.
    fn backable(&self) -> bool {
        true
    }

    /// While `true`, plain character keys go to the screen instead of the
    /// global bindings. Control chords are still global.
    fn captures_input(&self) -> bool {
        false
    }

    /// Rendered centered over a snapshot of the screen beneath.
    fn overlay(&self) -> bool {
        false
    }

    /// Size an overlay wants inside `available`. Ignored for full screens.
    fn preferred_size(&self, available: Size) -> Size {
        available
    }

    fn init(&mut self, _ctx: &WorkContext) -> Command {
        Command::None
    }

    fn update(&mut self, ctx: &WorkContext, msg: Message) -> Command;

    fn render(&mut self, area: Rect, buf: &mut Buffer);

    /// New size of the area the screen renders into.
    fn resize(&mut self, _size: Size) {}
}
