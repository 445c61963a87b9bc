//! # List Wrapper
//!
//! Filterable, reversible, paged list shared by every list screen. The
//! wrapper owns cursor, page, filter and reverse state. Screens embed it and
//! give it keys before handling their own.
//!
//! Filtering is a sub-mode: while the user is typing a filter the list
//! captures every key and the screen is not backable, and an applied filter
//! keeps it non-backable until cleared with `esc`.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::buffer::Buffer;
use ratatui::layout::{Rect, Size};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Widget};

use crate::tui::command::Command;
use crate::tui::keymap::{HelpSet, KeyBinding, KeyMap};
use crate::tui::truncate;

/// An item the list can display and filter.
pub trait ListEntry {
    fn title(&self) -> String;

    fn description(&self) -> Option<String> {
        None
    }

    fn filter_value(&self) -> String {
        self.title()
    }

    /// Highlighted regardless of the cursor (e.g. toggled for a bulk action).
    fn marked(&self) -> bool {
        false
    }
}

/// `1 chapter`, `3 chapters`.
pub fn quantify(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {plural}")
    }
}

struct ListKeys {
    up: KeyBinding,
    down: KeyBinding,
    prev_page: KeyBinding,
    next_page: KeyBinding,
    top: KeyBinding,
    bottom: KeyBinding,
    filter: KeyBinding,
    clear_filter: KeyBinding,
    apply_filter: KeyBinding,
    cancel_filter: KeyBinding,
    reverse: KeyBinding,
}

impl ListKeys {
    fn new() -> Self {
        Self {
            up: KeyBinding::new("up", &["up", "k"]),
            down: KeyBinding::new("down", &["down", "j"]),
            prev_page: KeyBinding::new("prev page", &["left", "h", "pgup"]),
            next_page: KeyBinding::new("next page", &["right", "l", "pgdown"]),
            top: KeyBinding::new("go to start", &["home"]),
            bottom: KeyBinding::new("go to end", &["end"]),
            filter: KeyBinding::new("filter", &["/"]),
            clear_filter: KeyBinding::new("clear filter", &["esc"]),
            apply_filter: KeyBinding::new("apply filter", &["enter"]),
            cancel_filter: KeyBinding::new("cancel", &["esc"]),
            reverse: KeyBinding::new("reverse", &["R"]),
        }
    }
}

pub struct ListView<T> {
    items: Vec<T>,
    /// Indices into `items` that pass the filter, in display order.
    visible: Vec<usize>,
    cursor: usize,
    per_page: usize,
    item_height: u16,
    filter: String,
    filtering: bool,
    keys: ListKeys,
    singular: &'static str,
    plural: &'static str,
}

impl<T: ListEntry> ListView<T> {
    pub fn new(items: Vec<T>, singular: &'static str, plural: &'static str) -> Self {
        let mut list = Self {
            visible: (0..items.len()).collect(),
            items,
            cursor: 0,
            per_page: 1,
            item_height: 2,
            filter: String::new(),
            filtering: false,
            keys: ListKeys::new(),
            singular,
            plural,
        };
        list.update_keys();
        list
    }

    /// Lines per item, clamped to at least 1. With 1 the description is hidden.
    pub fn with_item_height(mut self, height: u16) -> Self {
        self.set_item_height(height);
        self
    }

    pub fn set_item_height(&mut self, height: u16) {
        self.item_height = height.max(1);
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut [T] {
        &mut self.items
    }

    /// Replaces the items, resetting cursor and filter.
    pub fn set_items(&mut self, items: Vec<T>) {
        self.items = items;
        self.filter.clear();
        self.filtering = false;
        self.refilter();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn visible_len(&self) -> usize {
        self.visible.len()
    }

    /// Index into `items()` of the item under the cursor.
    pub fn hovered_index(&self) -> Option<usize> {
        self.visible.get(self.cursor).copied()
    }

    pub fn hovered(&self) -> Option<&T> {
        self.hovered_index().and_then(|i| self.items.get(i))
    }

    pub fn hovered_mut(&mut self) -> Option<&mut T> {
        self.hovered_index().and_then(|i| self.items.get_mut(i))
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn filtering(&self) -> bool {
        self.filtering
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn backable(&self) -> bool {
        !self.filtering && self.filter.is_empty()
    }

    pub fn page(&self) -> usize {
        self.cursor / self.per_page
    }

    pub fn pages(&self) -> usize {
        self.visible.len().div_ceil(self.per_page).max(1)
    }

    pub fn subtitle(&self) -> String {
        quantify(self.visible.len(), self.singular, self.plural)
    }

    /// Page indicator and the active filter, if any.
    pub fn status(&self) -> Option<String> {
        let page = (!self.items.is_empty())
            .then(|| format!("{}/{}", self.page() + 1, self.pages()));
        let filter = if self.filtering {
            Some(format!("/{}▏", self.filter))
        } else if !self.filter.is_empty() {
            Some(format!("/{}", self.filter))
        } else {
            None
        };
        match (page, filter) {
            (Some(page), Some(filter)) => Some(format!("{page} {filter}")),
            (page, filter) => page.or(filter),
        }
    }

    pub fn resize(&mut self, size: Size) {
        let rows = self.item_height as usize + 1;
        // The last item on a page needs no spacing line
        self.per_page = ((size.height as usize + 1) / rows).max(1);
    }

    fn refilter(&mut self) {
        let needle = self.filter.to_lowercase();
        self.visible = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| {
                needle.is_empty() || item.filter_value().to_lowercase().contains(&needle)
            })
            .map(|(i, _)| i)
            .collect();
        self.cursor = 0;
        self.update_keys();
    }

    fn update_keys(&mut self) {
        let has_items = !self.items.is_empty();
        self.keys.reverse.set_enabled(has_items && !self.filtering);
        self.keys.filter.set_enabled(has_items && !self.filtering);
        self.keys.clear_filter.set_enabled(!self.filtering && !self.filter.is_empty());
        self.keys.apply_filter.set_enabled(self.filtering);
        self.keys.cancel_filter.set_enabled(self.filtering);
        for key in [
            &mut self.keys.up,
            &mut self.keys.down,
            &mut self.keys.prev_page,
            &mut self.keys.next_page,
            &mut self.keys.top,
            &mut self.keys.bottom,
        ] {
            key.set_enabled(has_items);
        }
    }

    fn move_to(&mut self, cursor: usize) {
        self.cursor = cursor.min(self.visible.len().saturating_sub(1));
    }

    fn reverse(&mut self) {
        let hovered = self.hovered_index().map(|i| self.items.len() - 1 - i);
        self.items.reverse();
        self.refilter();
        if let Some(target) = hovered
            && let Some(pos) = self.visible.iter().position(|&i| i == target)
        {
            self.cursor = pos;
        }
    }

    /// Text pasted while filtering goes into the filter.
    pub fn handle_paste(&mut self, text: &str) -> bool {
        if !self.filtering {
            return false;
        }
        self.filter.extend(text.chars().filter(|c| !c.is_control()));
        self.refilter();
        true
    }

    /// Handles list keys. `None` means the key is not a list key and the
    /// owning screen may handle it.
    pub fn handle_key(&mut self, key: &KeyEvent) -> Option<Command> {
        if self.filtering {
            match key.code {
                KeyCode::Enter => {
                    self.filtering = false;
                    self.update_keys();
                }
                KeyCode::Esc => {
                    self.filtering = false;
                    self.filter.clear();
                    self.refilter();
                }
                KeyCode::Backspace => {
                    self.filter.pop();
                    self.refilter();
                }
                KeyCode::Up => self.move_to(self.cursor.saturating_sub(1)),
                KeyCode::Down => self.move_to(self.cursor + 1),
                KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                    self.filter.push(c);
                    self.refilter();
                }
                _ => {}
            }
            return Some(Command::None);
        }

        if self.keys.filter.matches(key) {
            self.filtering = true;
            self.update_keys();
        } else if self.keys.clear_filter.matches(key) {
            self.filter.clear();
            self.refilter();
        } else if self.keys.up.matches(key) {
            self.move_to(self.cursor.saturating_sub(1));
        } else if self.keys.down.matches(key) {
            self.move_to(self.cursor + 1);
        } else if self.keys.prev_page.matches(key) {
            self.move_to(self.cursor.saturating_sub(self.per_page));
        } else if self.keys.next_page.matches(key) {
            // Land on the first item of the next page, if there is one
            let next = (self.page() + 1) * self.per_page;
            if next < self.visible.len() {
                self.move_to(next);
            }
        } else if self.keys.top.matches(key) {
            self.move_to(0);
        } else if self.keys.bottom.matches(key) {
            self.move_to(self.visible.len().saturating_sub(1));
        } else if self.keys.reverse.matches(key) {
            self.reverse();
            return Some(Command::notify("Reversed"));
        } else {
            return None;
        }
        Some(Command::None)
    }

    pub fn render(&self, area: Rect, buf: &mut Buffer) {
        if self.items.is_empty() || self.visible.is_empty() {
            let text = if self.items.is_empty() {
                format!("No {}.", self.plural)
            } else {
                "Nothing matched the filter.".to_string()
            };
            Paragraph::new(text)
                .style(Style::default().fg(Color::DarkGray))
                .render(area, buf);
            return;
        }

        let width = area.width.saturating_sub(2) as usize;
        let start = self.page() * self.per_page;
        let end = (start + self.per_page).min(self.visible.len());
        let mut lines = Vec::new();
        for (pos, &index) in self.visible[start..end].iter().enumerate() {
            let item = &self.items[index];
            let hovered = start + pos == self.cursor;
            let (bar, title_style, desc_style) = if hovered {
                (
                    Span::styled("│ ", Style::default().fg(Color::Magenta)),
                    Style::default()
                        .fg(Color::Magenta)
                        .add_modifier(Modifier::BOLD),
                    Style::default().fg(Color::Magenta),
                )
            } else if item.marked() {
                (
                    Span::raw("  "),
                    Style::default().fg(Color::Yellow),
                    Style::default().fg(Color::DarkGray),
                )
            } else {
                (
                    Span::raw("  "),
                    Style::default().fg(Color::White),
                    Style::default().fg(Color::DarkGray),
                )
            };

            if pos > 0 {
                lines.push(Line::default());
            }
            lines.push(Line::from(vec![
                bar.clone(),
                Span::styled(truncate(&item.title(), width), title_style),
            ]));
            if self.item_height > 1 {
                let desc = item.description().unwrap_or_default();
                lines.push(Line::from(vec![
                    bar.clone(),
                    Span::styled(truncate(&desc, width), desc_style),
                ]));
                for _ in 2..self.item_height {
                    lines.push(Line::from(bar.clone()));
                }
            }
        }
        Paragraph::new(lines).render(area, buf);
    }
}

impl<T> KeyMap for ListView<T> {
    fn help(&self) -> HelpSet {
        let k = &self.keys;
        HelpSet::new(
            vec![
                k.up.clone(),
                k.down.clone(),
                k.filter.clone(),
                k.clear_filter.clone(),
                k.apply_filter.clone(),
                k.cancel_filter.clone(),
            ],
            vec![
                vec![
                    k.up.clone(),
                    k.down.clone(),
                    k.prev_page.clone(),
                    k.next_page.clone(),
                    k.top.clone(),
                    k.bottom.clone(),
                ],
                vec![
                    k.filter.clone(),
                    k.clear_filter.clone(),
                    k.apply_filter.clone(),
                    k.cancel_filter.clone(),
                    k.reverse.clone(),
                ],
            ],
        )
    }
}
