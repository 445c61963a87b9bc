//! # Key Bindings
//!
//! Declarative key → action bindings. Every screen owns a small keymap
//! struct of [`KeyBinding`]s and exposes it as a [`HelpSet`]; help sets
//! merge, so the footer can show the screen's keys next to the global ones.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use log::warn;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

/// A single physical key chord, e.g. `ctrl+c` or `R`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    code: KeyCode,
    modifiers: KeyModifiers,
}

impl KeyPress {
    /// Parse a chord description such as `"ctrl+l"`, `"pgdown"` or `"?"`.
    pub fn parse(spec: &str) -> Option<Self> {
        let (modifiers, key) = match spec.rsplit_once('+') {
            // "+" on its own is a key, not a separator
            Some((prefix, key)) if !key.is_empty() => {
                let mut modifiers = KeyModifiers::NONE;
                for part in prefix.split('+') {
                    modifiers |= match part {
                        "ctrl" => KeyModifiers::CONTROL,
                        "alt" => KeyModifiers::ALT,
                        "shift" => KeyModifiers::SHIFT,
                        _ => return None,
                    };
                }
                (modifiers, key)
            }
            _ => (KeyModifiers::NONE, spec),
        };

        let code = match key {
            "esc" => KeyCode::Esc,
            "enter" => KeyCode::Enter,
            "space" => KeyCode::Char(' '),
            "tab" if modifiers.contains(KeyModifiers::SHIFT) => KeyCode::BackTab,
            "tab" => KeyCode::Tab,
            "backspace" => KeyCode::Backspace,
            "delete" => KeyCode::Delete,
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "left" => KeyCode::Left,
            "right" => KeyCode::Right,
            "pgup" => KeyCode::PageUp,
            "pgdown" => KeyCode::PageDown,
            "home" => KeyCode::Home,
            "end" => KeyCode::End,
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => KeyCode::Char(c),
                    _ => return None,
                }
            }
        };
        Some(Self { code, modifiers })
    }

    pub fn matches(&self, event: &KeyEvent) -> bool {
        if self.code != event.code {
            return false;
        }
        match self.code {
            // Shift is already encoded in the character itself
            KeyCode::Char(_) | KeyCode::BackTab => {
                event.modifiers.difference(KeyModifiers::SHIFT)
                    == self.modifiers.difference(KeyModifiers::SHIFT)
            }
            _ => event.modifiers == self.modifiers,
        }
    }
}

/// A named action bound to one or more key chords.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBinding {
    keys: Vec<KeyPress>,
    help_key: String,
    help: &'static str,
    enabled: bool,
}

impl KeyBinding {
    /// `help` is the short description shown in the footer; `keys` are chord
    /// descriptions understood by [`KeyPress::parse`].
    pub fn new(help: &'static str, keys: &[&str]) -> Self {
        let parsed = keys
            .iter()
            .filter_map(|spec| {
                let key = KeyPress::parse(spec);
                if key.is_none() {
                    warn!("Ignoring unparsable key binding {spec:?} for {help:?}");
                }
                key
            })
            .collect();
        Self {
            keys: parsed,
            help_key: keys
                .iter()
                .map(|k| display_key(k))
                .collect::<Vec<_>>()
                .join("/"),
            help,
            enabled: true,
        }
    }

    pub fn matches(&self, event: &KeyEvent) -> bool {
        self.enabled && self.keys.iter().any(|k| k.matches(event))
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn help_key(&self) -> &str {
        &self.help_key
    }

    pub fn help(&self) -> &str {
        self.help
    }
}

fn display_key(spec: &str) -> &str {
    match spec {
        "up" => "↑",
        "down" => "↓",
        "left" => "←",
        "right" => "→",
        other => other,
    }
}

/// Anything that can describe its bindings for the help footer.
pub trait KeyMap {
    fn help(&self) -> HelpSet;
}

/// Bindings grouped for display: a short one-line form and full columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HelpSet {
    short: Vec<KeyBinding>,
    full: Vec<Vec<KeyBinding>>,
}

const SEPARATOR: &str = " • ";
const ELLIPSIS: &str = " …";
const COLUMN_GAP: usize = 4;

impl HelpSet {
    pub fn new(short: Vec<KeyBinding>, full: Vec<Vec<KeyBinding>>) -> Self {
        Self { short, full }
    }

    /// Same bindings in both forms, as a single full-help column.
    pub fn single(bindings: Vec<KeyBinding>) -> Self {
        Self {
            short: bindings.clone(),
            full: vec![bindings],
        }
    }

    /// Appends `other` after `self`, in both forms.
    pub fn merge(mut self, other: HelpSet) -> Self {
        self.short.extend(other.short);
        self.full.extend(other.full);
        self
    }

    pub fn short(&self) -> impl Iterator<Item = &KeyBinding> {
        self.short.iter().filter(|b| b.enabled())
    }

    /// Columns of enabled bindings; empty columns are dropped.
    pub fn full(&self) -> Vec<Vec<&KeyBinding>> {
        self.full
            .iter()
            .map(|group| group.iter().filter(|b| b.enabled()).collect::<Vec<_>>())
            .filter(|group| !group.is_empty())
            .collect()
    }

    /// One line of `key desc • key desc`, cut with an ellipsis at `width`.
    pub fn short_line(&self, width: u16) -> Line<'static> {
        let width = width as usize;
        let mut spans = Vec::new();
        let mut used = 0;
        for (i, binding) in self.short().enumerate() {
            let sep = if i == 0 { "" } else { SEPARATOR };
            let item_width =
                sep.width() + binding.help_key().width() + 1 + binding.help().width();
            if used + item_width > width {
                if used + ELLIPSIS.width() <= width {
                    spans.push(Span::styled(ELLIPSIS, separator_style()));
                }
                break;
            }
            if !sep.is_empty() {
                spans.push(Span::styled(sep, separator_style()));
            }
            spans.push(Span::styled(binding.help_key().to_string(), key_style()));
            spans.push(Span::raw(" "));
            spans.push(Span::styled(binding.help().to_string(), desc_style()));
            used += item_width;
        }
        Line::from(spans)
    }

    /// Full help laid out as columns, one line per row.
    pub fn full_lines(&self) -> Vec<Line<'static>> {
        let columns = self.full();
        let rows = columns.iter().map(Vec::len).max().unwrap_or(0);
        let widths: Vec<(usize, usize)> = columns
            .iter()
            .map(|col| {
                let key = col.iter().map(|b| b.help_key().width()).max().unwrap_or(0);
                let desc = col.iter().map(|b| b.help().width()).max().unwrap_or(0);
                (key, desc)
            })
            .collect();

        (0..rows)
            .map(|row| {
                let mut spans = Vec::new();
                for (col, (key_w, desc_w)) in columns.iter().zip(&widths) {
                    if !spans.is_empty() {
                        spans.push(Span::raw(" ".repeat(COLUMN_GAP)));
                    }
                    match col.get(row) {
                        Some(binding) => {
                            spans.push(Span::styled(
                                pad(binding.help_key(), *key_w),
                                key_style(),
                            ));
                            spans.push(Span::raw(" "));
                            spans.push(Span::styled(pad(binding.help(), *desc_w), desc_style()));
                        }
                        None => spans.push(Span::raw(" ".repeat(key_w + 1 + desc_w))),
                    }
                }
                Line::from(spans)
            })
            .collect()
    }

    /// Number of footer lines needed in the given mode.
    pub fn height(&self, full: bool) -> u16 {
        if full {
            self.full().iter().map(Vec::len).max().unwrap_or(0).max(1) as u16
        } else {
            1
        }
    }
}

impl KeyMap for HelpSet {
    fn help(&self) -> HelpSet {
        self.clone()
    }
}

fn pad(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(text.width());
    format!("{text}{}", " ".repeat(fill))
}

fn key_style() -> Style {
    Style::default().fg(Color::Gray)
}

fn desc_style() -> Style {
    Style::default().fg(Color::DarkGray)
}

fn separator_style() -> Style {
    Style::default().fg(Color::DarkGray)
}
