//! Picks the download and read formats for the rest of the session.

use ratatui::buffer::Buffer;
use ratatui::layout::{Rect, Size};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;
use ratatui::widgets::{Block, BorderType, Borders, Padding, Widget};

use crate::client::Format;
use crate::core::options::SharedOptions;
use crate::tui::command::{Command, Message, WorkContext};
use crate::tui::keymap::{HelpSet, KeyBinding, KeyMap};
use crate::tui::screen::{Screen, Title};
use crate::tui::screens::list::{ListEntry, ListView};

const WIDTH: u16 = 40;

struct FormatItem {
    format: Format,
    options: SharedOptions,
}

impl ListEntry for FormatItem {
    fn title(&self) -> String {
        let options = self.options.get();
        let mut title = self.format.name().to_string();
        let extension = self.format.extension();
        if !extension.is_empty() {
            title.push(' ');
            title.push_str(extension);
        }
        if options.download_format == self.format {
            title.push_str(" · down");
        }
        if options.read_format == self.format {
            title.push_str(" · read");
        }
        title
    }

    fn marked(&self) -> bool {
        let options = self.options.get();
        options.download_format == self.format || options.read_format == self.format
    }
}

pub struct FormatPicker {
    list: ListView<FormatItem>,
    options: SharedOptions,
    download: KeyBinding,
    read: KeyBinding,
    close: KeyBinding,
}

impl FormatPicker {
    pub fn new(options: SharedOptions) -> Self {
        let items = Format::ALL
            .into_iter()
            .map(|format| FormatItem {
                format,
                options: options.clone(),
            })
            .collect();
        Self {
            list: ListView::new(items, "format", "formats").with_item_height(1),
            options,
            download: KeyBinding::new("set download format", &["enter"]),
            read: KeyBinding::new("set read format", &["r"]),
            close: KeyBinding::new("close", &["q"]),
        }
    }

    fn hovered(&self) -> Option<Format> {
        self.list.hovered().map(|item| item.format)
    }
}

impl Screen for FormatPicker {
    fn title(&self) -> Title {
        Title::new("Formats")
    }

    fn status(&self) -> Option<String> {
        self.list.status()
    }

    fn help(&self) -> HelpSet {
        HelpSet::single(vec![
            self.download.clone(),
            self.read.clone(),
            self.close.clone(),
        ])
        .merge(self.list.help())
    }

    fn intermediate(&self) -> bool {
        true
    }

    fn overlay(&self) -> bool {
        true
    }

    fn backable(&self) -> bool {
        self.list.backable()
    }

    fn captures_input(&self) -> bool {
        self.list.filtering()
    }

    fn preferred_size(&self, available: Size) -> Size {
        // Every format on one page, plus the border
        let rows = Format::ALL.len() as u16 * 2 - 1;
        Size::new(WIDTH.min(available.width), (rows + 2).min(available.height))
    }

    fn update(&mut self, _ctx: &WorkContext, msg: Message) -> Command {
        match msg {
            Message::Paste(text) => {
                self.list.handle_paste(&text);
                Command::None
            }
            Message::Key(key) => {
                if let Some(cmd) = self.list.handle_key(&key) {
                    return cmd;
                }
                if self.close.matches(&key) {
                    return Command::back();
                }
                let Some(format) = self.hovered() else {
                    return Command::None;
                };
                if self.download.matches(&key) {
                    self.options.update(|o| o.download_format = format);
                    Command::notify(format!("Downloading as {format}"))
                } else if self.read.matches(&key) {
                    self.options.update(|o| o.read_format = format);
                    Command::notify(format!("Reading as {format}"))
                } else {
                    Command::None
                }
            }
            _ => Command::None,
        }
    }

    fn resize(&mut self, size: Size) {
        // Border on every side, padding left and right
        self.list.resize(Size::new(
            size.width.saturating_sub(4),
            size.height.saturating_sub(2),
        ));
    }

    fn render(&mut self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Magenta))
            .padding(Padding::horizontal(1))
            .title(Span::styled(
                " Formats ",
                Style::default()
                    .fg(Color::Magenta)
                    .add_modifier(Modifier::BOLD),
            ));
        let inner = block.inner(area);
        block.render(area, buf);
        self.list.render(inner, buf);
    }
}
