//! # Navigator
//!
//! The root of the UI. Owns the active screen, the stack of suspended
//! screens, the work context, the terminal size and the header/footer
//! chrome. Every message goes through [`Navigator::update`]: global concerns
//! (resize, quit, notifications, navigation, errors) are handled here and
//! everything else is forwarded to the active screen.
//!
//! ## Navigation
//!
//! - **Forward** (`Navigate`): the active screen is pushed and the new screen
//!   is sized and initialised. A durable screen gets a fresh work context and
//!   the old one is cancelled. Intermediate screens and overlays share the
//!   current context, so work started beneath them keeps running. Overlays
//!   keep a snapshot of the screen they were opened over.
//! - **Back**: dropped while the active screen is not backable. Otherwise
//!   pops and delivers `Restored`. Leaving a durable screen cancels its work;
//!   leaving an intermediate one does not, so a dialog can hand work to the
//!   screen beneath it.
//! - **Home**: pops everything, cancels the work context and restores the
//!   bottom screen. The key is dropped while the active screen is not
//!   backable.
//!
//! Errors from any command land here and are turned into a forward
//! navigation to the error screen. The history stays intact beneath it.

use std::time::Duration;

use log::{debug, error, info};
use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Layout, Margin, Rect, Size};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Widget};

use crossterm::event::KeyEvent;

use crate::core::error::AppError;
use crate::core::logbook::Logbook;
use crate::tui::command::{BackTarget, Command, Message, WorkContext};
use crate::tui::history::History;
use crate::tui::keymap::{HelpSet, KeyBinding, KeyMap};
use crate::tui::notification::{DEFAULT_DURATION, Notifier};
use crate::tui::overlay;
use crate::tui::screen::Screen;
use crate::tui::truncate;

/// Builds the screen shown for an error.
pub type ErrorScreenFactory = Box<dyn Fn(&AppError) -> Box<dyn Screen> + Send>;
/// Builds a read-only text screen from a title and its content.
pub type TextScreenFactory = Box<dyn Fn(String, String) -> Box<dyn Screen> + Send>;

/// Size used when the terminal cannot report one.
pub const FALLBACK_SIZE: Size = Size {
    width: 80,
    height: 40,
};

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const BREADCRUMB_SEPARATOR: &str = " > ";

#[derive(Debug, Clone)]
pub struct NavigatorOptions {
    pub notification_duration: Duration,
    pub show_breadcrumbs: bool,
}

impl Default for NavigatorOptions {
    fn default() -> Self {
        Self {
            notification_duration: DEFAULT_DURATION,
            show_breadcrumbs: true,
        }
    }
}

struct GlobalKeys {
    back: KeyBinding,
    quit: KeyBinding,
    help: KeyBinding,
    log: KeyBinding,
    home: KeyBinding,
}

impl GlobalKeys {
    fn new() -> Self {
        Self {
            back: KeyBinding::new("back", &["esc"]),
            quit: KeyBinding::new("quit", &["ctrl+c"]),
            help: KeyBinding::new("help", &["?"]),
            log: KeyBinding::new("logs", &["ctrl+l"]),
            home: KeyBinding::new("home", &["ctrl+b"]),
        }
    }
}

impl KeyMap for GlobalKeys {
    fn help(&self) -> HelpSet {
        HelpSet::new(
            vec![self.back.clone(), self.quit.clone(), self.help.clone()],
            vec![
                vec![self.back.clone(), self.home.clone()],
                vec![self.help.clone(), self.log.clone(), self.quit.clone()],
            ],
        )
    }
}

/// A screen plus, for overlays, the frozen frame it is drawn over.
struct Entry {
    screen: Box<dyn Screen>,
    backdrop: Option<Buffer>,
}

impl Entry {
    fn new(screen: Box<dyn Screen>) -> Self {
        Self {
            screen,
            backdrop: None,
        }
    }

    fn render(&mut self, area: Rect, buf: &mut Buffer) {
        if self.screen.overlay() {
            overlay::compose(self.backdrop.as_ref(), self.screen.as_mut(), area, buf);
        } else {
            self.screen.render(area, buf);
        }
    }

    fn snapshot(&mut self, area: Rect) -> Buffer {
        let mut buf = Buffer::empty(area);
        self.render(area, &mut buf);
        buf
    }
}

struct Areas {
    header: Rect,
    body: Rect,
    footer: Rect,
}

pub struct Navigator {
    active: Entry,
    history: History<Entry>,
    ctx: WorkContext,
    size: Size,
    /// Last size handed to the active screen's `resize`.
    screen_size: Option<Size>,
    notifier: Notifier,
    loading: Option<String>,
    show_full_help: bool,
    keys: GlobalKeys,
    error_screen: ErrorScreenFactory,
    text_screen: TextScreenFactory,
    logbook: Option<Logbook>,
    options: NavigatorOptions,
    quit: bool,
}

impl Navigator {
    pub fn new(
        initial: Box<dyn Screen>,
        error_screen: ErrorScreenFactory,
        text_screen: TextScreenFactory,
    ) -> Self {
        let size = match crossterm::terminal::size() {
            Ok((width, height)) if width > 0 && height > 0 => Size::new(width, height),
            Ok(_) | Err(_) => {
                debug!("Terminal size unavailable, using {FALLBACK_SIZE:?}");
                FALLBACK_SIZE
            }
        };
        Self {
            active: Entry::new(initial),
            history: History::new(),
            ctx: WorkContext::new(),
            size,
            screen_size: None,
            notifier: Notifier::default(),
            loading: None,
            show_full_help: false,
            keys: GlobalKeys::new(),
            error_screen,
            text_screen,
            logbook: None,
            options: NavigatorOptions::default(),
            quit: false,
        }
    }

    pub fn with_options(mut self, options: NavigatorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_logbook(mut self, logbook: Logbook) -> Self {
        self.logbook = Some(logbook);
        self
    }

    pub fn with_size(mut self, size: Size) -> Self {
        self.size = size;
        self.screen_size = None;
        self
    }

    /// Sizes the initial screen and returns its startup command.
    pub fn init(&mut self) -> Command {
        self.sync_screen_size();
        self.active.screen.init(&self.ctx)
    }

    pub fn update(&mut self, msg: Message) -> Command {
        debug!("Navigator received: {msg:?}");
        match msg {
            Message::Quit => {
                self.quit = true;
                Command::None
            }
            Message::Resize(size) => {
                self.apply_resize(size);
                Command::None
            }
            Message::Key(key) => self.handle_key(key),
            Message::Notify(notification) => self
                .notifier
                .show(notification, self.options.notification_duration),
            Message::NotificationExpired(generation) => {
                if !self.notifier.expire(generation) {
                    debug!("Ignoring stale notification expiry {generation}");
                }
                Command::None
            }
            Message::Loading(text) => {
                self.loading = Some(text);
                Command::None
            }
            Message::Loaded => {
                self.loading = None;
                Command::None
            }
            Message::Navigate(screen) => self.push(screen),
            Message::Back(target) => self.back(target),
            Message::Home => self.home(),
            Message::ShowViewport { title, content } => {
                let screen = (self.text_screen)(title, content);
                self.push(screen)
            }
            Message::ShowLog => {
                let content = match &self.logbook {
                    Some(logbook) if !logbook.is_empty() => logbook.contents(),
                    _ => "No log lines yet.".to_string(),
                };
                let screen = (self.text_screen)("Logs".to_string(), content);
                self.push(screen)
            }
            Message::Error(err) => {
                if err.is_cancellation() {
                    debug!("Swallowing cancellation");
                    return Command::None;
                }
                error!("Showing error screen: {err}");
                self.loading = None;
                let screen = (self.error_screen)(&err);
                self.push(screen)
            }
            other => self.active.screen.update(&self.ctx, other),
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Command {
        if self.keys.quit.matches(&key) {
            self.quit = true;
            return Command::None;
        }
        if self.keys.log.matches(&key) {
            return self.update(Message::ShowLog);
        }
        if self.keys.home.matches(&key) && self.active.screen.backable() {
            return self.home();
        }
        if self.keys.back.matches(&key) && self.can_go_back() {
            return self.back(BackTarget::Steps(1));
        }
        if !self.active.screen.captures_input() && self.keys.help.matches(&key) {
            self.show_full_help = !self.show_full_help;
            self.sync_screen_size();
            return Command::None;
        }
        self.active.screen.update(&self.ctx, Message::Key(key))
    }

    fn can_go_back(&self) -> bool {
        self.active.screen.backable() && !self.history.is_empty()
    }

    fn renew_context(&mut self) {
        self.ctx.cancel();
        self.ctx = WorkContext::new();
    }

    fn push(&mut self, screen: Box<dyn Screen>) -> Command {
        let backdrop = if screen.overlay() {
            let body = self.areas(self.frame_area(), self.active.screen.as_ref()).body;
            Some(self.active.snapshot(body))
        } else {
            None
        };
        let durable = !screen.intermediate() && !screen.overlay();
        let previous = std::mem::replace(&mut self.active, Entry { screen, backdrop });
        self.history.push(previous);
        if durable {
            self.renew_context();
        }
        self.screen_size = None;
        self.sync_screen_size();
        info!(
            "Navigated to {:?} (depth {})",
            self.active.screen.title().text,
            self.history.len()
        );
        self.active.screen.init(&self.ctx)
    }

    fn back(&mut self, target: BackTarget) -> Command {
        if !self.active.screen.backable() {
            debug!(
                "Back ignored: {:?} is not backable",
                self.active.screen.title().text
            );
            return Command::None;
        }
        if self.history.is_empty() || target == BackTarget::Steps(0) {
            debug!("Back ignored: already at home");
            return Command::None;
        }
        let leaving_durable =
            !self.active.screen.intermediate() && !self.active.screen.overlay();
        match target {
            BackTarget::Steps(steps) => {
                for _ in 0..steps {
                    let Some(entry) = self.history.pop() else {
                        break;
                    };
                    self.active = entry;
                }
            }
            BackTarget::Durable => {
                while let Some(entry) = self.history.pop() {
                    self.active = entry;
                    if !self.active.screen.intermediate() {
                        break;
                    }
                }
            }
        }
        if leaving_durable {
            self.renew_context();
        }
        self.restore()
    }

    fn home(&mut self) -> Command {
        let Some(bottom) = self.history.clear() else {
            debug!("Home ignored: already at home");
            return Command::None;
        };
        self.active = bottom;
        self.renew_context();
        self.restore()
    }

    fn restore(&mut self) -> Command {
        self.screen_size = None;
        self.sync_screen_size();
        self.refresh_backdrop();
        info!(
            "Restored {:?} (depth {})",
            self.active.screen.title().text,
            self.history.len()
        );
        self.active.screen.update(&self.ctx, Message::Restored)
    }

    fn apply_resize(&mut self, size: Size) {
        if size == self.size {
            return;
        }
        debug!("Resize to {}x{}", size.width, size.height);
        self.size = size;
        self.screen_size = None;
        self.sync_screen_size();
        self.refresh_backdrop();
    }

    /// Re-renders the frame beneath an active overlay at the current size.
    fn refresh_backdrop(&mut self) {
        if !self.active.screen.overlay() {
            return;
        }
        let area = self.frame_area();
        let show_breadcrumbs = self.options.show_breadcrumbs;
        let full_help = self.show_full_help;
        let global = self.global_help();
        let Some(beneath) = self.history.pop() else {
            return;
        };
        let mut beneath = beneath;
        let body = layout(
            area,
            beneath.screen.as_ref(),
            &global,
            show_breadcrumbs,
            full_help,
        )
        .body;
        beneath.screen.resize(body.as_size());
        self.active.backdrop = Some(beneath.snapshot(body));
        self.history.push(beneath);
    }

    /// Calls `resize` on the active screen when its area changed.
    fn sync_screen_size(&mut self) {
        let body = self.areas(self.frame_area(), self.active.screen.as_ref()).body;
        let target = if self.active.screen.overlay() {
            overlay::modal_area(self.active.screen.as_ref(), body).as_size()
        } else {
            body.as_size()
        };
        if self.screen_size != Some(target) {
            self.active.screen.resize(target);
            self.screen_size = Some(target);
        }
    }

    fn frame_area(&self) -> Rect {
        Rect::new(0, 0, self.size.width, self.size.height)
    }

    fn global_help(&self) -> HelpSet {
        let mut keys = GlobalKeys::new();
        keys.back.set_enabled(self.can_go_back());
        keys.home
            .set_enabled(!self.history.is_empty() && self.active.screen.backable());
        keys.help()
    }

    fn areas(&self, area: Rect, screen: &dyn Screen) -> Areas {
        layout(
            area,
            screen,
            &self.global_help(),
            self.options.show_breadcrumbs,
            self.show_full_help,
        )
    }

    /// Titles of the durable screens in the stack plus the active one.
    pub fn breadcrumbs(&self) -> Vec<String> {
        self.history
            .iter()
            .map(|entry| entry.screen.as_ref())
            .chain(std::iter::once(self.active.screen.as_ref()))
            .filter(|screen| !screen.intermediate())
            .map(|screen| screen.title().text)
            .collect()
    }

    pub fn draw(&mut self, frame: &mut Frame, spinner_frame: usize) {
        let area = frame.area();
        self.render(area, frame.buffer_mut(), spinner_frame);
    }

    pub fn render(&mut self, area: Rect, buf: &mut Buffer, spinner_frame: usize) {
        self.apply_resize(area.as_size());
        // Header or footer height may have changed since the last frame
        self.sync_screen_size();

        let areas = self.areas(area, self.active.screen.as_ref());
        self.render_header(areas.header, buf, spinner_frame);
        self.active.render(areas.body, buf);
        self.render_footer(areas.footer, buf);
    }

    fn render_header(&self, area: Rect, buf: &mut Buffer, spinner_frame: usize) {
        let screen = self.active.screen.as_ref();
        let title = screen.title();
        let title_style = Style::default()
            .fg(Color::White)
            .bg(title.color.unwrap_or(Color::Magenta))
            .add_modifier(Modifier::BOLD);
        let max_title = (area.width / 2) as usize;
        let mut spans = vec![Span::styled(
            format!(" {} ", truncate(&title.text, max_title.saturating_sub(2))),
            title_style,
        )];
        if let Some(status) = screen.status() {
            spans.push(Span::raw(" "));
            spans.push(Span::styled(status, Style::default().fg(Color::Gray)));
        }
        if let Some(loading) = &self.loading {
            let frame = SPINNER[spinner_frame % SPINNER.len()];
            spans.push(Span::styled(
                format!(" {frame} {loading}"),
                Style::default().fg(Color::Cyan),
            ));
        }
        if let Some(text) = self.notifier.current() {
            spans.push(Span::styled(
                format!(" {text}"),
                Style::default().fg(Color::Yellow),
            ));
        }

        let mut lines = vec![Line::from(spans)];
        if self.options.show_breadcrumbs {
            lines.push(Line::styled(
                self.breadcrumbs().join(BREADCRUMB_SEPARATOR),
                Style::default().fg(Color::DarkGray),
            ));
        }
        if let Some(subtitle) = screen.subtitle() {
            lines.push(Line::default());
            lines.push(Line::styled(subtitle, Style::default().fg(Color::Gray)));
        }
        Paragraph::new(lines).render(area.inner(Margin::new(1, 0)), buf);
    }

    fn render_footer(&self, area: Rect, buf: &mut Buffer) {
        let help = self.active.screen.help().merge(self.global_help());
        let inner = area.inner(Margin::new(1, 0));
        let [_, help_area] =
            Layout::vertical([Constraint::Length(1), Constraint::Fill(1)]).areas(inner);
        let lines = if self.show_full_help {
            help.full_lines()
        } else {
            vec![help.short_line(help_area.width)]
        };
        Paragraph::new(lines).render(help_area, buf);
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_some()
    }

    pub fn loading(&self) -> Option<&str> {
        self.loading.as_deref()
    }

    pub fn notification(&self) -> Option<&str> {
        self.notifier.current()
    }

    pub fn active(&self) -> &dyn Screen {
        self.active.screen.as_ref()
    }

    /// Number of suspended screens.
    pub fn depth(&self) -> usize {
        self.history.len()
    }

    /// Depth counting only durable screens.
    pub fn durable_depth(&self) -> usize {
        self.history.durable_len(|entry| entry.screen.intermediate())
    }

    pub fn context(&self) -> &WorkContext {
        &self.ctx
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn show_full_help(&self) -> bool {
        self.show_full_help
    }
}

fn layout(
    area: Rect,
    screen: &dyn Screen,
    global: &HelpSet,
    show_breadcrumbs: bool,
    full_help: bool,
) -> Areas {
    let mut header = 1;
    if show_breadcrumbs {
        header += 1;
    }
    if screen.subtitle().is_some() {
        header += 2;
    }
    // One blank line below the header and above the footer
    let header = header + 1;
    let footer = 1 + screen.help().merge(global.clone()).height(full_help);

    let [header, body, footer] = Layout::vertical([
        Constraint::Length(header),
        Constraint::Fill(1),
        Constraint::Length(footer),
    ])
    .areas(area);
    Areas {
        header,
        body: body.inner(Margin::new(1, 0)),
        footer,
    }
}
