//! # Chapter List
//!
//! The screen where things actually happen: downloading, reading and
//! opening chapters. Long-running actions go through the screen's
//! [`ActionSlot`] so only one of them runs at a time.
//!
//! ## Downloaded indicators
//!
//! Every item knows which formats of its chapter are already on disk and,
//! if the read format is among them, where. The indicators are looked up in
//! the background on init, whenever the screen is restored (the format
//! picker or a download may have changed them) and after each download.
//!
//! ## Keys
//!
//! | key      | action                                            |
//! |----------|---------------------------------------------------|
//! | `space`  | toggle selection                                  |
//! | `ctrl+a` | select all                                        |
//! | `u`      | clear selection                                   |
//! | `d`      | download hovered/selected (asks first)            |
//! | `r`      | read, downloading first if needed (asks first)    |
//! | `f`      | format picker                                     |
//! | `o`      | open the chapter URL                              |
//! | `n v g t`| toggle number, volume number, group, date         |

use std::path::PathBuf;
use std::sync::Arc;

use crossterm::event::KeyEvent;
use log::{debug, info, warn};
use ratatui::buffer::Buffer;
use ratatui::layout::{Rect, Size};

use crate::client::{
    Chapter, ClientError, DownloadOptions, DownloadedFormats, Manga, MangaClient, Volume,
    format_number,
};
use crate::core::options::{Options, SharedOptions};
use crate::tui::action::{ActionGuard, ActionSlot};
use crate::tui::command::{Command, Message, WorkContext};
use crate::tui::keymap::{HelpSet, KeyBinding, KeyMap};
use crate::tui::notification::Notification;
use crate::tui::screen::{Screen, Title};
use crate::tui::screens::confirm::ConfirmDialog;
use crate::tui::screens::format_picker::FormatPicker;
use crate::tui::screens::list::{ListEntry, ListView, quantify};
use crate::tui::screens::{MetaLine, Services, anilist, show_metadata};
use crate::tui::selection::{Selectable, SelectionSet};

struct ChapterItem {
    chapter: Chapter,
    selected: bool,
    downloaded: DownloadedFormats,
    /// Existing file in the read format, if any.
    read_path: Option<PathBuf>,
    options: SharedOptions,
}

impl ChapterItem {
    fn new(chapter: Chapter, options: SharedOptions) -> Self {
        Self {
            chapter,
            selected: false,
            downloaded: DownloadedFormats::new(),
            read_path: None,
            options,
        }
    }
}

impl ListEntry for ChapterItem {
    fn title(&self) -> String {
        let options = self.options.get();
        let display = options.chapter;
        let mut title = String::new();
        if self.selected {
            title.push_str("● ");
        }
        if display.show_volume_number {
            title.push_str(&format!("Vol. {} ", self.chapter.volume));
        }
        if display.show_number {
            title.push_str(&format!("[{}] ", format_number(self.chapter.number)));
        }
        title.push_str(&self.chapter.title);
        if self.downloaded.contains_key(&options.download_format) {
            title.push_str(" ✓");
        }
        title
    }

    fn description(&self) -> Option<String> {
        let display = self.options.get().chapter;
        let mut parts = Vec::new();
        if display.show_group
            && let Some(group) = &self.chapter.group
        {
            parts.push(group.clone());
        }
        if display.show_date
            && let Some(date) = self.chapter.date
        {
            parts.push(date.format("%Y-%m-%d").to_string());
        }
        Some(parts.join(" · "))
    }

    fn filter_value(&self) -> String {
        format!("{} {}", format_number(self.chapter.number), self.chapter.title)
    }

    fn marked(&self) -> bool {
        self.selected
    }
}

impl Selectable for ChapterItem {
    type Key = String;

    fn key(&self) -> String {
        self.chapter.id.clone()
    }

    fn is_selected(&self) -> bool {
        self.selected
    }

    fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }
}

/// Result of a background indicator lookup.
struct Indicators(Vec<Indicator>);

struct Indicator {
    chapter_id: String,
    downloaded: DownloadedFormats,
    read_path: Option<PathBuf>,
}

async fn lookup_indicators(
    client: &dyn MangaClient,
    chapters: &[Chapter],
    options: &Options,
) -> Indicators {
    let library = options.download_path.clone();
    let reading = options.read_download_options().directory;
    let mut found = Vec::with_capacity(chapters.len());
    for chapter in chapters {
        let downloaded = match client.downloaded_formats(chapter, &library).await {
            Ok(formats) => formats,
            Err(e) => {
                warn!("Checking downloads of {:?} failed: {e}", chapter.title);
                DownloadedFormats::new()
            }
        };
        let mut read_path = downloaded.get(&options.read_format).cloned();
        if read_path.is_none() && reading != library {
            read_path = client
                .downloaded_formats(chapter, &reading)
                .await
                .ok()
                .and_then(|mut formats| formats.remove(&options.read_format));
        }
        found.push(Indicator {
            chapter_id: chapter.id.clone(),
            downloaded,
            read_path,
        });
    }
    Indicators(found)
}

/// Looks up the downloaded indicators of `chapters` in the background.
fn refresh_indicators(services: &Services, chapters: Vec<Chapter>, ctx: &WorkContext) -> Command {
    if chapters.is_empty() {
        return Command::None;
    }
    let client = Arc::clone(&services.client);
    let options = services.options.get();
    Command::perform(ctx, async move {
        let indicators = lookup_indicators(client.as_ref(), &chapters, &options).await;
        Some(Message::custom(indicators))
    })
}

/// Downloads `chapter`, then opens it when `read_after` is set.
fn download_one(
    services: &Services,
    chapter: Chapter,
    options: DownloadOptions,
    read_after: bool,
    guard: ActionGuard,
    ctx: &WorkContext,
) -> Command {
    let client = Arc::clone(&services.client);
    let read_options = services.options.get().read_options();
    let title = chapter.title.clone();
    let work = Command::attempt(
        ctx,
        async move {
            let _guard = guard;
            let path = client.download_chapter(&chapter, &options).await?;
            info!("Downloaded {:?} to {}", chapter.title, path.display());
            if read_after {
                client.read_chapter(&chapter, &path, &read_options).await?;
                return Ok(None);
            }
            Ok::<_, ClientError>(Some(chapter.title))
        },
        |downloaded| {
            downloaded.map(|title| {
                Message::Notify(Notification::new(format!("Downloaded {title:?}")))
            })
        },
    );
    Command::sequence([
        Command::loading(format!("Downloading {title:?}")),
        work,
        Command::loaded(),
    ])
}

fn download_many(
    services: &Services,
    chapters: Vec<Chapter>,
    options: DownloadOptions,
    guard: ActionGuard,
    ctx: &WorkContext,
) -> Command {
    let client = Arc::clone(&services.client);
    let total = chapters.len();
    let work = Command::attempt(
        ctx,
        async move {
            let _guard = guard;
            for chapter in &chapters {
                let path = client.download_chapter(chapter, &options).await?;
                info!("Downloaded {:?} to {}", chapter.title, path.display());
            }
            Ok::<_, ClientError>(chapters.len())
        },
        |count| {
            Some(Message::Notify(Notification::new(format!(
                "Downloaded {}",
                quantify(count, "chapter", "chapters")
            ))))
        },
    );
    Command::sequence([
        Command::loading(format!(
            "Downloading {}",
            quantify(total, "chapter", "chapters")
        )),
        work,
        Command::loaded(),
    ])
}

struct ChapterKeys {
    toggle: KeyBinding,
    select_all: KeyBinding,
    clear: KeyBinding,
    download: KeyBinding,
    read: KeyBinding,
    formats: KeyBinding,
    open_url: KeyBinding,
    anilist: KeyBinding,
    metadata: KeyBinding,
    info: KeyBinding,
    toggle_number: KeyBinding,
    toggle_volume: KeyBinding,
    toggle_group: KeyBinding,
    toggle_date: KeyBinding,
}

impl ChapterKeys {
    fn new() -> Self {
        Self {
            toggle: KeyBinding::new("select", &["space"]),
            select_all: KeyBinding::new("select all", &["ctrl+a"]),
            clear: KeyBinding::new("clear selection", &["u"]),
            download: KeyBinding::new("download", &["d"]),
            read: KeyBinding::new("read", &["r"]),
            formats: KeyBinding::new("formats", &["f"]),
            open_url: KeyBinding::new("open url", &["o"]),
            anilist: KeyBinding::new("anilist", &["a"]),
            metadata: KeyBinding::new("metadata", &["m"]),
            info: KeyBinding::new("info", &["i"]),
            toggle_number: KeyBinding::new("chapter number", &["n"]),
            toggle_volume: KeyBinding::new("volume number", &["v"]),
            toggle_group: KeyBinding::new("group", &["g"]),
            toggle_date: KeyBinding::new("date", &["t"]),
        }
    }
}

/// Chapters of a volume, or of a whole manga when `volume` is `None`.
pub struct ChapterList {
    services: Services,
    manga: Manga,
    volume: Option<Volume>,
    list: ListView<ChapterItem>,
    selection: SelectionSet<String>,
    meta: MetaLine,
    actions: ActionSlot,
    size: Size,
    keys: ChapterKeys,
}

impl ChapterList {
    pub fn new(
        services: Services,
        manga: Manga,
        volume: Option<Volume>,
        chapters: Vec<Chapter>,
    ) -> Self {
        let items = chapters
            .into_iter()
            .map(|chapter| ChapterItem::new(chapter, services.options.clone()))
            .collect();
        let mut screen = Self {
            meta: MetaLine::new(&manga),
            services,
            manga,
            volume,
            list: ListView::new(items, "chapter", "chapters"),
            selection: SelectionSet::new(),
            actions: ActionSlot::new(),
            size: Size::default(),
            keys: ChapterKeys::new(),
        };
        screen.apply_item_height();
        screen
    }

    pub fn selected_len(&self) -> usize {
        self.selection.len()
    }

    fn chapters(&self) -> Vec<Chapter> {
        self.list.items().iter().map(|item| item.chapter.clone()).collect()
    }

    fn refresh(&self, ctx: &WorkContext) -> Command {
        refresh_indicators(&self.services, self.chapters(), ctx)
    }

    fn apply_indicators(&mut self, indicators: Indicators) {
        for indicator in indicators.0 {
            if let Some(item) = self
                .list
                .items_mut()
                .iter_mut()
                .find(|item| item.chapter.id == indicator.chapter_id)
            {
                item.downloaded = indicator.downloaded;
                item.read_path = indicator.read_path;
            } else {
                // The list may have changed while the lookup ran
                debug!("Dropping indicator for unknown chapter {}", indicator.chapter_id);
            }
        }
    }

    /// Description lines are only worth showing with group or date on.
    fn apply_item_height(&mut self) {
        let display = self.services.options.get().chapter;
        let height = if display.show_group || display.show_date { 2 } else { 1 };
        self.list.set_item_height(height);
        self.list.resize(self.size);
    }

    /// The single selected item, or the hovered one when nothing is selected.
    fn target(&self) -> Option<&ChapterItem> {
        match self.selection.len() {
            0 => self.list.hovered(),
            1 => self
                .list
                .items()
                .iter()
                .find(|item| self.selection.contains(&item.key())),
            _ => None,
        }
    }

    fn blocked(&self, action: &str) -> Option<Command> {
        self.actions
            .running()
            .map(|current| Command::notify(format!("Can't {action} right now, {current} is running")))
    }

    fn download(&self) -> Command {
        if let Some(blocked) = self.blocked("download") {
            return blocked;
        }
        let options = self.services.options.get().download_options();

        if self.selection.len() > 1 {
            let mut chapters: Vec<Chapter> = self
                .list
                .items()
                .iter()
                .filter(|item| self.selection.contains(&item.key()))
                .filter(|item| !item.downloaded.contains_key(&options.format))
                .map(|item| item.chapter.clone())
                .collect();
            if chapters.is_empty() {
                return Command::notify(format!(
                    "Selected chapters already downloaded in {} format",
                    options.format
                ));
            }
            chapters.sort_by(|a, b| a.number.total_cmp(&b.number));
            let message = format!(
                "Download {}?",
                quantify(self.selection.len(), "chapter", "chapters")
            );
            let services = self.services.clone();
            let actions = self.actions.clone();
            let all = self.chapters();
            return Command::navigate(ConfirmDialog::new(
                "Download",
                message,
                Box::new(move |ctx: &WorkContext| {
                    actions.run("download", |guard| {
                        Command::sequence([
                            download_many(&services, chapters, options, guard, ctx),
                            refresh_indicators(&services, all, ctx),
                        ])
                    })
                }),
            ));
        }

        let Some(item) = self.target() else {
            return Command::None;
        };
        let chapter = item.chapter.clone();
        if item.downloaded.contains_key(&options.format) {
            return Command::notify(format!(
                "Chapter {:?} already downloaded in {} format",
                chapter.title, options.format
            ));
        }
        let message = format!(
            "Download chapter {} ({:?})?",
            format_number(chapter.number),
            chapter.title
        );
        self.confirm_download(message, chapter, options, false)
    }

    fn read(&self, ctx: &WorkContext) -> Command {
        if let Some(blocked) = self.blocked("read") {
            return blocked;
        }
        if self.selection.len() > 1 {
            return Command::notify("Can't open for reading more than 1 chapter");
        }
        let Some(item) = self.target() else {
            return Command::None;
        };
        let chapter = item.chapter.clone();

        if let Some(path) = item.read_path.clone() {
            debug!("Read format already downloaded at {}", path.display());
            let client = Arc::clone(&self.services.client);
            let read_options = self.services.options.get().read_options();
            let title = chapter.title.clone();
            return self.actions.run("read", |guard| {
                Command::sequence([
                    Command::loading(format!("Opening {title:?} for reading")),
                    Command::attempt(
                        ctx,
                        async move {
                            let _guard = guard;
                            client.read_chapter(&chapter, &path, &read_options).await
                        },
                        |()| None,
                    ),
                    Command::loaded(),
                ])
            });
        }

        let message = format!(
            "Download chapter {} ({:?}) for reading?",
            format_number(chapter.number),
            chapter.title
        );
        let options = self.services.options.get().read_download_options();
        self.confirm_download(message, chapter, options, true)
    }

    fn confirm_download(
        &self,
        message: String,
        chapter: Chapter,
        options: DownloadOptions,
        read_after: bool,
    ) -> Command {
        let services = self.services.clone();
        let actions = self.actions.clone();
        let all = self.chapters();
        Command::navigate(ConfirmDialog::new(
            "Download",
            message,
            Box::new(move |ctx: &WorkContext| {
                actions.run("download", |guard| {
                    Command::sequence([
                        download_one(&services, chapter, options, read_after, guard, ctx),
                        refresh_indicators(&services, all, ctx),
                    ])
                })
            }),
        ))
    }

    fn open_url(&self, ctx: &WorkContext) -> Command {
        let Some(chapter) = self.list.hovered().map(|item| item.chapter.clone()) else {
            return Command::None;
        };
        let client = Arc::clone(&self.services.client);
        self.actions.run("open", |guard| {
            let label = format!("Opening URL {} for chapter {:?}", chapter.url, chapter.title);
            Command::sequence([
                Command::loading(label),
                Command::attempt(
                    ctx,
                    async move {
                        let _guard = guard;
                        client.open_url(&chapter.url).await
                    },
                    |()| None,
                ),
                Command::loaded(),
            ])
        })
    }

    fn toggle_display(&mut self, change: impl FnOnce(&mut Options)) {
        self.services.options.update(change);
        self.apply_item_height();
    }

    fn handle_key(&mut self, ctx: &WorkContext, key: &KeyEvent) -> Command {
        if let Some(cmd) = self.list.handle_key(key) {
            return cmd;
        }
        if self.keys.toggle.matches(key) {
            if let Some(item) = self.list.hovered_mut() {
                self.selection.toggle(item);
            }
        } else if self.keys.select_all.matches(key) {
            self.selection.select_all(self.list.items_mut());
        } else if self.keys.clear.matches(key) {
            self.selection.clear(self.list.items_mut());
        } else if self.keys.download.matches(key) {
            return self.download();
        } else if self.keys.read.matches(key) {
            return self.read(ctx);
        } else if self.keys.formats.matches(key) {
            return Command::navigate(FormatPicker::new(self.services.options.clone()));
        } else if self.keys.open_url.matches(key) {
            return self.open_url(ctx);
        } else if self.keys.anilist.matches(key) {
            return anilist::search(self.services.clone(), self.manga.clone(), ctx);
        } else if self.keys.metadata.matches(key) {
            return show_metadata(&self.manga);
        } else if self.keys.info.matches(key) {
            self.meta.toggle();
        } else if self.keys.toggle_number.matches(key) {
            self.toggle_display(|o| o.chapter.show_number = !o.chapter.show_number);
        } else if self.keys.toggle_volume.matches(key) {
            self.toggle_display(|o| o.chapter.show_volume_number = !o.chapter.show_volume_number);
        } else if self.keys.toggle_group.matches(key) {
            self.toggle_display(|o| o.chapter.show_group = !o.chapter.show_group);
        } else if self.keys.toggle_date.matches(key) {
            self.toggle_display(|o| o.chapter.show_date = !o.chapter.show_date);
        }
        Command::None
    }
}

impl Screen for ChapterList {
    fn title(&self) -> Title {
        match &self.volume {
            Some(volume) => Title::new(format!("Volume {volume}")),
            None => Title::new(self.manga.title.clone()),
        }
    }

    fn subtitle(&self) -> Option<String> {
        let options = self.services.options.get();
        let mut subtitle = self.list.subtitle();
        if !self.selection.is_empty() {
            subtitle.push_str(&format!(" · {} selected", self.selection.len()));
        }
        subtitle.push_str(&format!(
            " · download {} · read {}",
            options.download_format, options.read_format
        ));
        Some(subtitle)
    }

    fn status(&self) -> Option<String> {
        self.meta.with(self.list.status())
    }

    fn help(&self) -> HelpSet {
        let k = &self.keys;
        let usable = !self.list.is_empty() && !self.list.filtering();
        let mut actions = vec![
            k.toggle.clone(),
            k.read.clone(),
            k.download.clone(),
            k.formats.clone(),
            k.open_url.clone(),
        ];
        let mut selection = vec![k.select_all.clone(), k.clear.clone()];
        let mut meta = vec![k.anilist.clone(), k.metadata.clone(), k.info.clone()];
        let mut display = vec![
            k.toggle_number.clone(),
            k.toggle_volume.clone(),
            k.toggle_group.clone(),
            k.toggle_date.clone(),
        ];
        for binding in actions
            .iter_mut()
            .chain(&mut selection)
            .chain(&mut meta)
            .chain(&mut display)
        {
            binding.set_enabled(usable);
        }
        if self.selection.is_empty() {
            selection[1].set_enabled(false);
        }
        HelpSet::new(actions.clone(), vec![actions, selection, meta, display])
            .merge(self.list.help())
    }

    fn backable(&self) -> bool {
        self.list.backable()
    }

    fn captures_input(&self) -> bool {
        self.list.filtering()
    }

    fn init(&mut self, ctx: &WorkContext) -> Command {
        self.refresh(ctx)
    }

    fn update(&mut self, ctx: &WorkContext, msg: Message) -> Command {
        match msg {
            Message::Key(key) => self.handle_key(ctx, &key),
            Message::Paste(text) => {
                self.list.handle_paste(&text);
                Command::None
            }
            Message::Restored => {
                self.meta.refresh(&self.manga);
                self.apply_item_height();
                self.refresh(ctx)
            }
            Message::Custom(payload) => {
                match payload.downcast::<Indicators>() {
                    Ok(indicators) => self.apply_indicators(*indicators),
                    Err(_) => debug!("Chapter list ignoring unknown payload"),
                }
                Command::None
            }
            _ => Command::None,
        }
    }

    fn resize(&mut self, size: Size) {
        self.size = size;
        self.list.resize(size);
    }

    fn render(&mut self, area: Rect, buf: &mut Buffer) {
        self.list.render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Format;
    use crate::test_support::{FakeClient, services};
    use crate::tui::command::{BackTarget, Confirmation, execute};
    use crossterm::event::{KeyCode, KeyModifiers};
    use std::sync::mpsc;

    fn press(code: KeyCode) -> Message {
        Message::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    async fn run(cmd: Command) -> Vec<Message> {
        let (tx, rx) = mpsc::channel();
        execute(cmd, tx).await;
        rx.try_iter().collect()
    }

    fn notifications(msgs: &[Message]) -> Vec<String> {
        msgs.iter()
            .filter_map(|m| match m {
                Message::Notify(n) => Some(n.text.clone()),
                _ => None,
            })
            .collect()
    }

    fn berserk(client: &FakeClient) -> ChapterList {
        let manga = client.mangas[1].clone();
        let volume = client.volumes_of(&manga).remove(0);
        let chapters = client.chapters_of(&volume);
        let mut screen =
            ChapterList::new(services(Arc::new(client.clone())), manga, Some(volume), chapters);
        screen.resize(Size::new(60, 20));
        screen
    }

    /// Feeds the messages of `cmd` back into the screen, like the loop would.
    async fn settle(screen: &mut ChapterList, ctx: &WorkContext, cmd: Command) -> Vec<Message> {
        let msgs = run(cmd).await;
        let mut rest = Vec::new();
        for msg in msgs {
            match msg {
                Message::Custom(_) => {
                    screen.update(ctx, msg);
                }
                other => rest.push(other),
            }
        }
        rest
    }

    #[tokio::test]
    async fn test_single_download_confirms_and_marks_item() {
        let client = FakeClient::library();
        let mut screen = berserk(&client);
        let ctx = WorkContext::new();
        assert_eq!(screen.title().text, "Volume 1");

        let Command::Message(Message::Navigate(mut dialog)) = screen.update(&ctx, press(KeyCode::Char('d')))
        else {
            panic!("expected a confirmation dialog");
        };
        let cmd = dialog.update(&ctx, Message::Confirm(Confirmation::Yes));
        let msgs = settle(&mut screen, &ctx, cmd).await;

        assert!(matches!(msgs[0], Message::Back(BackTarget::Steps(1))));
        assert_eq!(notifications(&msgs), ["Downloaded \"The Black Swordsman\""]);
        assert_eq!(client.downloads().len(), 1);
        assert!(screen.list.items()[0].downloaded.contains_key(&Format::Pdf));
        assert!(screen.list.items()[0].title().ends_with('✓'));

        // Second attempt is refused without a dialog
        let again = screen.update(&ctx, press(KeyCode::Char('d')));
        assert!(matches!(again, Command::Message(Message::Notify(n)) if n.text.contains("already downloaded")));
    }

    #[tokio::test]
    async fn test_bulk_download_asks_with_count() {
        let client = FakeClient::library();
        let mut screen = berserk(&client);
        let ctx = WorkContext::new();
        screen.update(&ctx, press(KeyCode::Char(' ')));
        screen.update(&ctx, press(KeyCode::Down));
        screen.update(&ctx, press(KeyCode::Down));
        screen.update(&ctx, press(KeyCode::Char(' ')));
        assert_eq!(screen.selected_len(), 2);

        let Command::Message(Message::Navigate(mut dialog)) = screen.update(&ctx, press(KeyCode::Char('d')))
        else {
            panic!("expected a confirmation dialog");
        };
        let cmd = dialog.update(&ctx, Message::Confirm(Confirmation::Yes));
        let msgs = settle(&mut screen, &ctx, cmd).await;
        assert_eq!(notifications(&msgs), ["Downloaded 2 chapters"]);
        assert_eq!(client.downloads().len(), 2);
        // Selection survives the download
        assert_eq!(screen.selected_len(), 2);
    }

    #[tokio::test]
    async fn test_read_reuses_existing_file() {
        let client = FakeClient::library();
        let mut screen = berserk(&client);
        let ctx = WorkContext::new();
        let first = screen.list.items()[0].chapter.clone();
        client.mark_downloaded(&first, Format::Pdf);

        let init = screen.init(&ctx);
        settle(&mut screen, &ctx, init).await;
        assert!(screen.list.items()[0].read_path.is_some());

        let read = screen.update(&ctx, press(KeyCode::Char('r')));
        let msgs = settle(&mut screen, &ctx, read).await;
        assert!(matches!(msgs.last(), Some(Message::Loaded)));
        assert_eq!(client.reads(), [first.id]);
        assert_eq!(screen.actions.running(), None);
    }

    #[test]
    fn test_read_refuses_more_than_one_chapter() {
        let client = FakeClient::library();
        let mut screen = berserk(&client);
        let ctx = WorkContext::new();
        screen.update(&ctx, Message::Key(KeyEvent::new(KeyCode::Char('a'), KeyModifiers::CONTROL)));
        let cmd = screen.update(&ctx, press(KeyCode::Char('r')));
        assert!(matches!(cmd, Command::Message(Message::Notify(n)) if n.text == "Can't open for reading more than 1 chapter"));
    }

    #[test]
    fn test_running_action_blocks_others() {
        let client = FakeClient::library();
        let mut screen = berserk(&client);
        let _guard = screen.actions.try_begin("download").unwrap();
        let cmd = screen.update(&WorkContext::new(), press(KeyCode::Char('r')));
        assert!(matches!(cmd, Command::Message(Message::Notify(n)) if n.text == "Can't read right now, download is running"));
    }

    #[test]
    fn test_display_toggles_change_titles_and_height() {
        let client = FakeClient::library();
        let mut screen = berserk(&client);
        let ctx = WorkContext::new();
        assert_eq!(screen.list.items()[0].title(), "[1] The Black Swordsman");

        screen.update(&ctx, press(KeyCode::Char('n')));
        assert_eq!(screen.list.items()[0].title(), "The Black Swordsman");

        screen.update(&ctx, press(KeyCode::Char('g')));
        assert_eq!(
            screen.list.items()[0].description().as_deref(),
            Some("Studio Gaga")
        );
        // Two-line items: 20 rows fit 7 of them with spacing
        assert_eq!(screen.list.pages(), 1);
    }

    #[test]
    fn test_subtitle_lists_selection_and_formats() {
        let client = FakeClient::library();
        let mut screen = berserk(&client);
        screen.update(&WorkContext::new(), press(KeyCode::Char(' ')));
        assert_eq!(
            screen.subtitle().as_deref(),
            Some("5 chapters · 1 selected · download pdf · read pdf")
        );
    }
}
