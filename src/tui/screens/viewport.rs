//! Scrollable read-only text: logs, metadata, chapter info.

use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Layout, Position, Rect, Size};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, StatefulWidget, Widget};
use tui_scrollview::{ScrollView, ScrollViewState, ScrollbarVisibility};
use unicode_width::UnicodeWidthStr;

use crate::tui::command::{Command, Message, WorkContext};
use crate::tui::keymap::{HelpSet, KeyBinding};
use crate::tui::screen::{Screen, Title};
use crate::tui::truncate;

struct ViewportKeys {
    up: KeyBinding,
    down: KeyBinding,
    page_up: KeyBinding,
    page_down: KeyBinding,
    top: KeyBinding,
    bottom: KeyBinding,
    close: KeyBinding,
}

pub struct TextViewport {
    title: String,
    content: String,
    scroll: ScrollViewState,
    /// Wrapped lines for the current width.
    lines: Vec<String>,
    wrap_width: u16,
    view_height: u16,
    keys: ViewportKeys,
}

impl TextViewport {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            scroll: ScrollViewState::default(),
            lines: Vec::new(),
            wrap_width: 0,
            view_height: 0,
            keys: ViewportKeys {
                up: KeyBinding::new("up", &["up", "k"]),
                down: KeyBinding::new("down", &["down", "j"]),
                page_up: KeyBinding::new("page up", &["pgup", "b"]),
                page_down: KeyBinding::new("page down", &["pgdown", "f", "space"]),
                top: KeyBinding::new("top", &["home", "g"]),
                bottom: KeyBinding::new("bottom", &["end", "G"]),
                close: KeyBinding::new("close", &["q"]),
            },
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn offset(&self) -> u16 {
        self.scroll.offset().y
    }

    /// Wrapped line count, saturating at what a scroll offset can address.
    fn line_count(&self) -> u16 {
        u16::try_from(self.lines.len()).unwrap_or(u16::MAX)
    }

    fn max_offset(&self) -> u16 {
        self.line_count().saturating_sub(self.view_height)
    }

    /// How far through the text the bottom of the view is, 0 to 100.
    pub fn percent(&self) -> u16 {
        let max = self.max_offset();
        if max == 0 {
            return 100;
        }
        ((self.offset().min(max) as u32 * 100) / max as u32) as u16
    }

    fn rewrap(&mut self, width: u16) {
        self.wrap_width = width;
        let width = width.max(1) as usize;
        self.lines = self
            .content
            .lines()
            .flat_map(|line| {
                if line.is_empty() {
                    vec![String::new()]
                } else {
                    textwrap::wrap(line, width)
                        .into_iter()
                        .map(|l| l.into_owned())
                        .collect()
                }
            })
            .collect();
    }

    fn scroll_to(&mut self, y: u16) {
        self.scroll.set_offset(Position::new(0, y.min(self.max_offset())));
    }

    fn scroll_by(&mut self, delta: i32) {
        let target = u16::try_from((self.offset() as i32 + delta).max(0)).unwrap_or(u16::MAX);
        self.scroll_to(target);
    }

    fn header(&self, width: u16) -> Line<'static> {
        let title = truncate(&self.title, (width as usize).saturating_sub(4));
        let rule = (width as usize).saturating_sub(title.width() + 3);
        Line::from(vec![
            Span::styled(
                format!(" {title} "),
                Style::default()
                    .fg(Color::Magenta)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("{}╮", "─".repeat(rule)),
                Style::default().fg(Color::DarkGray),
            ),
        ])
    }

    fn footer(&self, width: u16) -> Line<'static> {
        let info = format!(" {:3}% ", self.percent());
        let rule = (width as usize).saturating_sub(info.width() + 1);
        Line::from(vec![
            Span::styled(
                format!("╰{}", "─".repeat(rule)),
                Style::default().fg(Color::DarkGray),
            ),
            Span::styled(info, Style::default().fg(Color::Gray)),
        ])
    }
}

impl Screen for TextViewport {
    fn title(&self) -> Title {
        Title::new(self.title.clone())
    }

    fn help(&self) -> HelpSet {
        let k = &self.keys;
        HelpSet::new(
            vec![k.up.clone(), k.down.clone(), k.close.clone()],
            vec![
                vec![k.up.clone(), k.down.clone(), k.page_up.clone(), k.page_down.clone()],
                vec![k.top.clone(), k.bottom.clone(), k.close.clone()],
            ],
        )
    }

    fn intermediate(&self) -> bool {
        true
    }

    fn update(&mut self, _ctx: &WorkContext, msg: Message) -> Command {
        let Message::Key(key) = msg else {
            return Command::None;
        };
        let page = self.view_height.max(1) as i32;
        if self.keys.up.matches(&key) {
            self.scroll_by(-1);
        } else if self.keys.down.matches(&key) {
            self.scroll_by(1);
        } else if self.keys.page_up.matches(&key) {
            self.scroll_by(-page);
        } else if self.keys.page_down.matches(&key) {
            self.scroll_by(page);
        } else if self.keys.top.matches(&key) {
            self.scroll_to(0);
        } else if self.keys.bottom.matches(&key) {
            self.scroll_to(self.max_offset());
        } else if self.keys.close.matches(&key) {
            return Command::back();
        }
        Command::None
    }

    fn resize(&mut self, size: Size) {
        // One column for the scrollbar, header and footer take a line each
        self.rewrap(size.width.saturating_sub(1));
        self.view_height = size.height.saturating_sub(2);
        self.scroll_to(self.offset());
    }

    fn render(&mut self, area: Rect, buf: &mut Buffer) {
        let [header, body, footer] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(1),
        ])
        .areas(area);

        let content_width = body.width.saturating_sub(1);
        if content_width != self.wrap_width {
            self.rewrap(content_width);
        }
        self.view_height = body.height;

        Paragraph::new(self.header(area.width)).render(header, buf);

        let height = self.line_count().max(1);
        let mut scroll_view = ScrollView::new(Size::new(content_width, height))
            .vertical_scrollbar_visibility(ScrollbarVisibility::Automatic)
            .horizontal_scrollbar_visibility(ScrollbarVisibility::Never);
        let text: Vec<Line> = self.lines.iter().map(|l| Line::from(l.clone())).collect();
        scroll_view.render_widget(
            Paragraph::new(text),
            Rect::new(0, 0, content_width, height),
        );
        scroll_view.render(body, buf, &mut self.scroll);

        Paragraph::new(self.footer(area.width)).render(footer, buf);
    }
}
