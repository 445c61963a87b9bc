//! Single-line text prompt. Used as the home search screen and for custom
//! metadata queries.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Widget};

use crate::tui::command::{Command, Message, WorkContext};
use crate::tui::keymap::{HelpSet, KeyBinding};
use crate::tui::screen::{Screen, Title};

/// Called with the trimmed, non-empty query.
pub type OnSubmit = Box<dyn Fn(String, &WorkContext) -> Command + Send>;

pub struct PromptScreen {
    title: Title,
    subtitle: String,
    placeholder: String,
    intermediate: bool,
    input: Vec<char>,
    cursor: usize,
    submit_on_init: bool,
    on_submit: OnSubmit,
    submit: KeyBinding,
    clear: KeyBinding,
}

impl PromptScreen {
    pub fn new(title: Title, on_submit: OnSubmit) -> Self {
        Self {
            title,
            subtitle: String::new(),
            placeholder: String::new(),
            intermediate: false,
            input: Vec::new(),
            cursor: 0,
            submit_on_init: false,
            on_submit,
            submit: KeyBinding::new("confirm", &["enter"]),
            clear: KeyBinding::new("clear", &["ctrl+u"]),
        }
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = subtitle.into();
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn intermediate(mut self, intermediate: bool) -> Self {
        self.intermediate = intermediate;
        self
    }

    /// Prefills the input and submits it as soon as the screen starts.
    pub fn submitted(mut self, value: &str) -> Self {
        self.input = value.chars().collect();
        self.cursor = self.input.len();
        self.submit_on_init = true;
        self
    }

    pub fn value(&self) -> String {
        self.input.iter().collect()
    }

    fn submit(&self, ctx: &WorkContext) -> Command {
        let query = self.value().trim().to_string();
        if query.is_empty() {
            return Command::notify("Type something first");
        }
        (self.on_submit)(query, ctx)
    }

    fn insert(&mut self, text: &str) {
        for c in text.chars().filter(|c| !c.is_control()) {
            self.input.insert(self.cursor, c);
            self.cursor += 1;
        }
    }

    fn edit(&mut self, key: &KeyEvent) {
        match key.code {
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.insert(c.encode_utf8(&mut [0; 4]));
            }
            KeyCode::Backspace if self.cursor > 0 => {
                self.cursor -= 1;
                self.input.remove(self.cursor);
            }
            KeyCode::Delete if self.cursor < self.input.len() => {
                self.input.remove(self.cursor);
            }
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => self.cursor = (self.cursor + 1).min(self.input.len()),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.input.len(),
            // Only reaches us when there is nowhere to go back to
            KeyCode::Esc => {
                self.input.clear();
                self.cursor = 0;
            }
            _ => {}
        }
    }
}

impl Screen for PromptScreen {
    fn title(&self) -> Title {
        self.title.clone()
    }

    fn subtitle(&self) -> Option<String> {
        (!self.subtitle.is_empty()).then(|| self.subtitle.clone())
    }

    fn help(&self) -> HelpSet {
        HelpSet::single(vec![self.submit.clone(), self.clear.clone()])
    }

    fn intermediate(&self) -> bool {
        self.intermediate
    }

    fn captures_input(&self) -> bool {
        true
    }

    fn init(&mut self, ctx: &WorkContext) -> Command {
        if std::mem::take(&mut self.submit_on_init) {
            return self.submit(ctx);
        }
        Command::None
    }

    fn update(&mut self, ctx: &WorkContext, msg: Message) -> Command {
        match msg {
            Message::Key(key) if self.submit.matches(&key) => self.submit(ctx),
            Message::Key(key) if self.clear.matches(&key) => {
                self.input.clear();
                self.cursor = 0;
                Command::None
            }
            Message::Key(key) => {
                self.edit(&key);
                Command::None
            }
            Message::Paste(text) => {
                self.insert(&text);
                Command::None
            }
            _ => Command::None,
        }
    }

    fn render(&mut self, area: Rect, buf: &mut Buffer) {
        let prompt = Span::styled("> ", Style::default().fg(Color::Magenta));
        let line = if self.input.is_empty() {
            Line::from(vec![
                prompt,
                Span::styled("▏", Style::default().fg(Color::Magenta)),
                Span::styled(self.placeholder.clone(), Style::default().fg(Color::DarkGray)),
            ])
        } else {
            let before: String = self.input[..self.cursor].iter().collect();
            let after: String = self.input[self.cursor..].iter().collect();
            Line::from(vec![
                prompt,
                Span::raw(before),
                Span::styled("▏", Style::default().fg(Color::Magenta)),
                Span::raw(after),
            ])
        };
        Paragraph::new(line).render(area, buf);
    }
}
