//! Yes/no dialog drawn over the screen that asked the question.
//!
//! The dialog holds the work to run on "yes" as a continuation. On
//! confirmation it goes back first and then runs the continuation with the
//! same work context, so the result lands on the screen beneath.

use ratatui::buffer::Buffer;
use ratatui::layout::{Rect, Size};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Padding, Paragraph, Widget, Wrap};

use crate::tui::command::{Command, Confirmation, Message, WorkContext};
use crate::tui::keymap::{HelpSet, KeyBinding};
use crate::tui::screen::{Screen, Title};

pub type Continuation = Box<dyn FnOnce(&WorkContext) -> Command + Send>;

const MAX_WIDTH: u16 = 50;
/// Border plus horizontal padding on each side.
const CHROME_WIDTH: u16 = 4;
/// Border, blank line and the key hint line.
const CHROME_HEIGHT: u16 = 4;

pub struct ConfirmDialog {
    title: String,
    message: String,
    continuation: Option<Continuation>,
    yes: KeyBinding,
    no: KeyBinding,
}

impl ConfirmDialog {
    pub fn new(title: impl Into<String>, message: impl Into<String>, continuation: Continuation) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            continuation: Some(continuation),
            yes: KeyBinding::new("yes", &["y", "enter"]),
            no: KeyBinding::new("no", &["n"]),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    fn accept(&mut self, ctx: &WorkContext) -> Command {
        let Some(continuation) = self.continuation.take() else {
            return Command::None;
        };
        Command::sequence([Command::back(), continuation(ctx)])
    }
}

impl Screen for ConfirmDialog {
    fn title(&self) -> Title {
        Title::new(self.title.clone())
    }

    fn help(&self) -> HelpSet {
        HelpSet::single(vec![self.yes.clone(), self.no.clone()])
    }

    fn intermediate(&self) -> bool {
        true
    }

    fn overlay(&self) -> bool {
        true
    }

    fn preferred_size(&self, available: Size) -> Size {
        let text_width = MAX_WIDTH
            .min(available.width.saturating_sub(CHROME_WIDTH))
            .max(1);
        let lines = textwrap::wrap(&self.message, text_width as usize);
        let widest = lines
            .iter()
            .map(|l| unicode_width::UnicodeWidthStr::width(l.as_ref()))
            .max()
            .unwrap_or(0) as u16;
        let width = widest.max(self.title.len() as u16 + 2).max(20) + CHROME_WIDTH;
        let height = lines.len() as u16 + CHROME_HEIGHT;
        Size::new(width.min(available.width), height.min(available.height))
    }

    fn update(&mut self, ctx: &WorkContext, msg: Message) -> Command {
        match msg {
            Message::Key(key) if self.yes.matches(&key) => {
                // Answered by the navigator so the decision is visible in the log
                Command::Message(Message::Confirm(Confirmation::Yes))
            }
            Message::Key(key) if self.no.matches(&key) => {
                Command::Message(Message::Confirm(Confirmation::No))
            }
            Message::Confirm(Confirmation::Yes) => self.accept(ctx),
            Message::Confirm(Confirmation::No) => {
                self.continuation = None;
                Command::back()
            }
            _ => Command::None,
        }
    }

    fn render(&mut self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Magenta))
            .padding(Padding::horizontal(1))
            .title(Span::styled(
                format!(" {} ", self.title),
                Style::default()
                    .fg(Color::Magenta)
                    .add_modifier(Modifier::BOLD),
            ));
        let mut lines: Vec<Line> = self
            .message
            .lines()
            .map(|l| Line::from(l.to_string()))
            .collect();
        lines.push(Line::default());
        lines.push(Line::from(vec![
            Span::styled("y", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
            Span::styled(" yes  ", Style::default().fg(Color::DarkGray)),
            Span::styled("n", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
            Span::styled(" no", Style::default().fg(Color::DarkGray)),
        ]));
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(block)
            .render(area, buf);
    }
}
