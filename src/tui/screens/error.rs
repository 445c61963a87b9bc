use log::warn;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::Line;
use ratatui::widgets::{Paragraph, Widget};

use crate::core::error::AppError;
use crate::tui::command::{Command, Message, WorkContext};
use crate::tui::keymap::{HelpSet, KeyBinding};
use crate::tui::notification::Notification;
use crate::tui::screen::{Screen, Title};

pub struct ErrorScreen {
    text: String,
    quit: KeyBinding,
    copy: KeyBinding,
}

impl ErrorScreen {
    pub fn new(err: &AppError) -> Self {
        Self {
            text: err.to_string(),
            quit: KeyBinding::new("quit", &["q"]),
            copy: KeyBinding::new("copy error", &["c"]),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    fn copy(&self, ctx: &WorkContext) -> Command {
        let text = self.text.clone();
        Command::perform(ctx, async move {
            let copied = tokio::task::spawn_blocking(move || {
                arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(text))
            })
            .await;
            let notification = match copied {
                Ok(Ok(())) => Notification::new("Copied error to clipboard"),
                Ok(Err(e)) => {
                    let err = AppError::Clipboard(e.to_string());
                    warn!("{err}");
                    Notification::new(format!("Couldn't copy: {err}"))
                }
                Err(e) => {
                    warn!("Clipboard task failed: {e}");
                    Notification::new("Couldn't copy the error")
                }
            };
            Some(Message::Notify(notification))
        })
    }
}

impl Screen for ErrorScreen {
    fn title(&self) -> Title {
        Title::colored("Error", Color::Red)
    }

    fn help(&self) -> HelpSet {
        HelpSet::single(vec![self.copy.clone(), self.quit.clone()])
    }

    fn intermediate(&self) -> bool {
        true
    }

    fn update(&mut self, ctx: &WorkContext, msg: Message) -> Command {
        match msg {
            Message::Key(key) if self.quit.matches(&key) => Command::Message(Message::Quit),
            Message::Key(key) if self.copy.matches(&key) => self.copy(ctx),
            _ => Command::None,
        }
    }

    fn render(&mut self, area: Rect, buf: &mut Buffer) {
        let width = ((area.width as f32 / 1.2) as usize).max(1);
        let lines: Vec<Line> = textwrap::wrap(&self.text, width)
            .into_iter()
            .map(|l| Line::from(l.into_owned()))
            .collect();
        Paragraph::new(lines)
            .style(Style::default().fg(Color::Red))
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientError;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    #[test]
    fn test_shows_error_text_in_red() {
        let err = AppError::Client(ClientError::NotFound("manga 42".into()));
        let mut screen = ErrorScreen::new(&err);
        assert_eq!(screen.text(), "not found: manga 42");
        assert_eq!(screen.title().color, Some(Color::Red));
        assert!(screen.intermediate());

        let area = Rect::new(0, 0, 40, 3);
        let mut buf = Buffer::empty(area);
        screen.render(area, &mut buf);
        assert_eq!(buf[(0, 0)].symbol(), "n");
        assert_eq!(buf[(0, 0)].fg, Color::Red);
    }

    #[test]
    fn test_q_quits() {
        let err = AppError::Invariant("oops".into());
        let mut screen = ErrorScreen::new(&err);
        let cmd = screen.update(
            &WorkContext::new(),
            Message::Key(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE)),
        );
        assert!(matches!(cmd, Command::Message(Message::Quit)));
    }
}
