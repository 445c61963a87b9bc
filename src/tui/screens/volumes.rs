use std::sync::Arc;

use log::info;
use ratatui::buffer::Buffer;
use ratatui::layout::{Rect, Size};

use crate::client::{ClientError, Manga, Volume};
use crate::tui::action::ActionSlot;
use crate::tui::command::{Command, Message, WorkContext};
use crate::tui::keymap::{HelpSet, KeyBinding, KeyMap};
use crate::tui::notification::Notification;
use crate::tui::screen::{Screen, Title};
use crate::tui::screens::chapters::ChapterList;
use crate::tui::screens::confirm::ConfirmDialog;
use crate::tui::screens::list::{ListEntry, ListView, quantify};
use crate::tui::screens::{MetaLine, Services, anilist, show_metadata};
use crate::tui::selection::{Selectable, SelectionSet};

struct VolumeItem {
    volume: Volume,
    selected: bool,
}

impl ListEntry for VolumeItem {
    fn title(&self) -> String {
        let mark = if self.selected { "● " } else { "" };
        format!("{mark}Volume {}", self.volume)
    }

    fn description(&self) -> Option<String> {
        Some(self.volume.manga.title.clone())
    }

    fn marked(&self) -> bool {
        self.selected
    }
}

impl Selectable for VolumeItem {
    type Key = u32;

    fn key(&self) -> u32 {
        self.volume.number.to_bits()
    }

    fn is_selected(&self) -> bool {
        self.selected
    }

    fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }
}

struct VolumeKeys {
    confirm: KeyBinding,
    toggle: KeyBinding,
    select_all: KeyBinding,
    clear: KeyBinding,
    download: KeyBinding,
    anilist: KeyBinding,
    metadata: KeyBinding,
    info: KeyBinding,
}

/// Volumes of one manga.
pub struct VolumeList {
    services: Services,
    manga: Manga,
    list: ListView<VolumeItem>,
    selection: SelectionSet<u32>,
    meta: MetaLine,
    actions: ActionSlot,
    keys: VolumeKeys,
}

impl VolumeList {
    pub fn new(services: Services, manga: Manga, volumes: Vec<Volume>) -> Self {
        let items = volumes
            .into_iter()
            .map(|volume| VolumeItem {
                volume,
                selected: false,
            })
            .collect();
        Self {
            meta: MetaLine::new(&manga),
            services,
            manga,
            list: ListView::new(items, "volume", "volumes"),
            selection: SelectionSet::new(),
            actions: ActionSlot::new(),
            keys: VolumeKeys {
                confirm: KeyBinding::new("confirm", &["enter"]),
                toggle: KeyBinding::new("select", &["space"]),
                select_all: KeyBinding::new("select all", &["ctrl+a"]),
                clear: KeyBinding::new("clear selection", &["u"]),
                download: KeyBinding::new("download", &["d"]),
                anilist: KeyBinding::new("anilist", &["a"]),
                metadata: KeyBinding::new("metadata", &["m"]),
                info: KeyBinding::new("info", &["i"]),
            },
        }
    }

    pub fn selected_len(&self) -> usize {
        self.selection.len()
    }

    fn open(&self, ctx: &WorkContext) -> Command {
        let Some(volume) = self.list.hovered().map(|item| item.volume.clone()) else {
            return Command::None;
        };
        let client = Arc::clone(&self.services.client);
        let services = self.services.clone();
        let manga = self.manga.clone();
        self.actions.run("open", |guard| {
            let label = format!("Getting chapters for volume {volume}");
            Command::sequence([
                Command::loading(label),
                Command::attempt(
                    ctx,
                    async move {
                        let _guard = guard;
                        let chapters = client.volume_chapters(&volume).await?;
                        Ok::<_, ClientError>((volume, chapters))
                    },
                    move |(volume, chapters)| {
                        Some(Message::Navigate(Box::new(ChapterList::new(
                            services,
                            manga,
                            Some(volume),
                            chapters,
                        ))))
                    },
                ),
                Command::loaded(),
            ])
        })
    }

    /// Selected volumes in list order, or the hovered one.
    fn targets(&self) -> Vec<Volume> {
        if self.selection.is_empty() {
            return self
                .list
                .hovered()
                .map(|item| vec![item.volume.clone()])
                .unwrap_or_default();
        }
        self.list
            .items()
            .iter()
            .filter(|item| self.selection.contains(&item.key()))
            .map(|item| item.volume.clone())
            .collect()
    }

    fn download(&self) -> Command {
        if let Some(current) = self.actions.running() {
            return Command::notify(format!("Can't download right now, {current} is running"));
        }
        let volumes = self.targets();
        let message = match volumes.as_slice() {
            [] => return Command::None,
            [volume] => format!("Download volume {volume}?"),
            many => format!("Download {}?", quantify(many.len(), "volume", "volumes")),
        };
        let services = self.services.clone();
        let actions = self.actions.clone();
        let dialog = ConfirmDialog::new(
            "Download",
            message,
            Box::new(move |ctx: &WorkContext| {
                actions.run("download", |guard| {
                    let client = Arc::clone(&services.client);
                    let options = services.options.get().download_options();
                    let count = volumes.len();
                    Command::sequence([
                        Command::loading(format!(
                            "Downloading {}",
                            quantify(count, "volume", "volumes")
                        )),
                        Command::attempt(
                            ctx,
                            async move {
                                let _guard = guard;
                                let mut downloaded = 0;
                                for volume in &volumes {
                                    for chapter in client.volume_chapters(volume).await? {
                                        let path = client.download_chapter(&chapter, &options).await?;
                                        info!("Downloaded {:?} to {}", chapter.title, path.display());
                                        downloaded += 1;
                                    }
                                }
                                Ok::<_, ClientError>(downloaded)
                            },
                            |downloaded| {
                                Some(Message::Notify(Notification::new(format!(
                                    "Downloaded {}",
                                    quantify(downloaded, "chapter", "chapters")
                                ))))
                            },
                        ),
                        Command::loaded(),
                    ])
                })
            }),
        );
        Command::navigate(dialog)
    }

    fn handle_key(&mut self, ctx: &WorkContext, key: &crossterm::event::KeyEvent) -> Command {
        if let Some(cmd) = self.list.handle_key(key) {
            return cmd;
        }
        let k = &self.keys;
        if k.confirm.matches(key) {
            self.open(ctx)
        } else if k.toggle.matches(key) {
            if let Some(item) = self.list.hovered_mut() {
                self.selection.toggle(item);
            }
            Command::None
        } else if k.select_all.matches(key) {
            self.selection.select_all(self.list.items_mut());
            Command::None
        } else if k.clear.matches(key) {
            self.selection.clear(self.list.items_mut());
            Command::None
        } else if k.download.matches(key) {
            self.download()
        } else if k.anilist.matches(key) {
            anilist::search(self.services.clone(), self.manga.clone(), ctx)
        } else if k.metadata.matches(key) {
            show_metadata(&self.manga)
        } else if k.info.matches(key) {
            self.meta.toggle();
            Command::None
        } else {
            Command::None
        }
    }
}

impl Screen for VolumeList {
    fn title(&self) -> Title {
        Title::new(self.manga.title.clone())
    }

    fn subtitle(&self) -> Option<String> {
        let mut subtitle = self.list.subtitle();
        if !self.selection.is_empty() {
            subtitle.push_str(&format!(" · {} selected", self.selection.len()));
        }
        Some(subtitle)
    }

    fn status(&self) -> Option<String> {
        self.meta.with(self.list.status())
    }

    fn help(&self) -> HelpSet {
        let k = &self.keys;
        let has_items = !self.list.is_empty() && !self.list.filtering();
        let mut bindings = vec![
            k.confirm.clone(),
            k.toggle.clone(),
            k.select_all.clone(),
            k.clear.clone(),
            k.download.clone(),
        ];
        for binding in &mut bindings {
            binding.set_enabled(has_items);
        }
        if self.selection.is_empty() {
            bindings[3].set_enabled(false);
        }
        let mut meta = vec![k.anilist.clone(), k.metadata.clone(), k.info.clone()];
        for binding in &mut meta {
            binding.set_enabled(!self.list.filtering());
        }
        HelpSet::new(bindings.clone(), vec![bindings, meta]).merge(self.list.help())
    }

    fn backable(&self) -> bool {
        self.list.backable()
    }

    fn captures_input(&self) -> bool {
        self.list.filtering()
    }

    fn update(&mut self, ctx: &WorkContext, msg: Message) -> Command {
        match msg {
            Message::Key(key) => self.handle_key(ctx, &key),
            Message::Paste(text) => {
                self.list.handle_paste(&text);
                Command::None
            }
            Message::Restored => {
                // Metadata may have been attached from the anilist screen
                self.meta.refresh(&self.manga);
                Command::None
            }
            _ => Command::None,
        }
    }

    fn resize(&mut self, size: Size) {
        self.list.resize(size);
    }

    fn render(&mut self, area: Rect, buf: &mut Buffer) {
        self.list.render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeClient, services};
    use crate::tui::command::execute;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use std::sync::mpsc;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> Message {
        Message::Key(KeyEvent::new(code, modifiers))
    }

    fn one_piece(client: &FakeClient) -> VolumeList {
        let manga = client.mangas[0].clone();
        let volumes = client.volumes_of(&manga);
        let mut screen = VolumeList::new(services(Arc::new(client.clone())), manga, volumes);
        screen.resize(Size::new(60, 20));
        screen
    }

    #[test]
    fn test_selection_keys() {
        let client = FakeClient::library();
        let mut screen = one_piece(&client);
        let ctx = WorkContext::new();

        screen.update(&ctx, press(KeyCode::Char(' '), KeyModifiers::NONE));
        assert_eq!(screen.selected_len(), 1);
        assert!(screen.subtitle().unwrap().ends_with("1 selected"));

        screen.update(&ctx, press(KeyCode::Char('a'), KeyModifiers::CONTROL));
        assert_eq!(screen.selected_len(), 3);
        assert!(screen.list.items().iter().all(|i| i.selected));

        screen.update(&ctx, press(KeyCode::Char('u'), KeyModifiers::NONE));
        assert_eq!(screen.selected_len(), 0);
        assert!(screen.list.items().iter().all(|i| !i.selected));
    }

    #[tokio::test]
    async fn test_bulk_download_asks_then_downloads_every_chapter() {
        let client = FakeClient::library();
        let mut screen = one_piece(&client);
        let ctx = WorkContext::new();
        screen.update(&ctx, press(KeyCode::Char('a'), KeyModifiers::CONTROL));

        let Command::Message(Message::Navigate(mut dialog)) =
            screen.update(&ctx, press(KeyCode::Char('d'), KeyModifiers::NONE))
        else {
            panic!("expected a confirmation dialog");
        };
        assert_eq!(dialog.title().text, "Download");

        let yes = dialog.update(&ctx, Message::Confirm(crate::tui::command::Confirmation::Yes));
        let (tx, rx) = mpsc::channel();
        execute(yes, tx).await;
        let texts: Vec<String> = rx
            .try_iter()
            .filter_map(|m| match m {
                Message::Notify(n) => Some(n.text),
                _ => None,
            })
            .collect();
        assert_eq!(texts, ["Downloaded 6 chapters"]);
        assert_eq!(client.downloads().len(), 6);
    }

    #[test]
    fn test_restored_picks_up_new_metadata() {
        let client = FakeClient::library();
        let mut screen = one_piece(&client);
        assert!(screen.status().unwrap().starts_with("No metadata"));
        screen.manga.metadata.set(crate::client::Metadata {
            id: 1,
            title: "ONE PIECE".into(),
            ..Default::default()
        });
        screen.update(&WorkContext::new(), Message::Restored);
        assert!(screen.status().unwrap().starts_with("ONE PIECE"));
    }
}
