use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info};
use ratatui::buffer::Buffer;
use ratatui::layout::{Rect, Size};

use crate::client::{Chapter, ClientError, Manga, MangaClient, Volume};
use crate::tui::action::ActionSlot;
use crate::tui::command::{Command, Message, WorkContext};
use crate::tui::keymap::{HelpSet, KeyBinding, KeyMap};
use crate::tui::screen::{Screen, Title};
use crate::tui::screens::Services;
use crate::tui::screens::chapters::ChapterList;
use crate::tui::screens::list::{ListEntry, ListView};
use crate::tui::screens::volumes::VolumeList;

struct MangaItem(Manga);

impl ListEntry for MangaItem {
    fn title(&self) -> String {
        self.0.title.clone()
    }

    fn description(&self) -> Option<String> {
        Some(match self.0.metadata.get() {
            Some(metadata) => metadata.summary(),
            None => self.0.url.clone(),
        })
    }
}

/// What opening a manga led to.
enum Opened {
    Volumes(Vec<Volume>),
    /// The only volume, already expanded.
    Chapters(Volume, Vec<Chapter>),
}

/// Search results for one query.
pub struct MangaResults {
    services: Services,
    query: String,
    list: ListView<MangaItem>,
    actions: ActionSlot,
    confirm: KeyBinding,
}

impl MangaResults {
    pub fn new(services: Services, query: String, mangas: Vec<Manga>) -> Self {
        let items = mangas.into_iter().map(MangaItem).collect();
        Self {
            services,
            query,
            list: ListView::new(items, "manga", "mangas"),
            actions: ActionSlot::new(),
            confirm: KeyBinding::new("confirm", &["enter"]),
        }
    }

    pub fn mangas(&self) -> impl Iterator<Item = &Manga> {
        self.list.items().iter().map(|item| &item.0)
    }

    pub fn hovered(&self) -> Option<&Manga> {
        self.list.hovered().map(|item| &item.0)
    }

    pub fn cursor(&self) -> usize {
        self.list.cursor()
    }

    pub fn page(&self) -> usize {
        self.list.page()
    }

    fn open(&self, ctx: &WorkContext) -> Command {
        let Some(manga) = self.hovered().cloned() else {
            return Command::None;
        };
        let client = Arc::clone(&self.services.client);
        let services = self.services.clone();
        let expand = self.services.options.get().expand_single_volume;
        self.actions.run("open", |guard| {
            // Set when the lookup fails so the volumes are not fetched on top of
            // the error screen.
            let failed = Arc::new(AtomicBool::new(false));
            let lookup = {
                let client = Arc::clone(&client);
                let manga = manga.clone();
                let failed = Arc::clone(&failed);
                Command::attempt(
                    ctx,
                    async move {
                        let attached = attach_best_metadata(client.as_ref(), &manga).await;
                        if attached.is_err() {
                            failed.store(true, Ordering::SeqCst);
                        }
                        attached
                    },
                    |()| None,
                )
            };
            let title = manga.title.clone();
            let fetch = Command::attempt(
                ctx,
                async move {
                    let _guard = guard;
                    if failed.load(Ordering::SeqCst) {
                        debug!("Skipping volumes of {:?}: metadata lookup failed", manga.title);
                        return Err(ClientError::Cancelled);
                    }
                    let mut volumes = client.manga_volumes(&manga).await?;
                    if volumes.len() != 1 || !expand {
                        return Ok((manga, Opened::Volumes(volumes)));
                    }
                    let volume = volumes.remove(0);
                    let chapters = client.volume_chapters(&volume).await?;
                    Ok::<_, ClientError>((manga, Opened::Chapters(volume, chapters)))
                },
                move |(manga, opened)| {
                    let screen: Box<dyn Screen> = match opened {
                        Opened::Volumes(volumes) => {
                            Box::new(VolumeList::new(services, manga, volumes))
                        }
                        Opened::Chapters(volume, chapters) => {
                            Box::new(ChapterList::new(services, manga, Some(volume), chapters))
                        }
                    };
                    Some(Message::Navigate(screen))
                },
            );
            Command::sequence([
                Command::loading(format!("Finding Anilist for {title:?}")),
                lookup,
                Command::loading(format!("Getting volumes for {title:?}")),
                fetch,
                Command::loaded(),
            ])
        })
    }
}

/// Attaches the closest metadata candidate unless `manga` already has
/// metadata. Finding no candidate is not an error.
pub async fn attach_best_metadata(
    client: &dyn MangaClient,
    manga: &Manga,
) -> Result<(), ClientError> {
    if manga.metadata.get().is_some() {
        return Ok(());
    }
    let candidates = client.search_metadata(&manga.title).await?;
    let wanted = manga.title.to_lowercase();
    let best = candidates
        .iter()
        .position(|c| c.title.to_lowercase() == wanted)
        .unwrap_or(0);
    let Some(metadata) = candidates.into_iter().nth(best) else {
        info!("Couldn't find metadata for {:?}", manga.title);
        return Ok(());
    };
    let found = metadata.summary();
    client.attach_metadata(manga, metadata).await?;
    info!("Attached metadata {found:?} to {:?}", manga.title);
    Ok(())
}

impl Screen for MangaResults {
    fn title(&self) -> Title {
        Title::new(format!("Search {:?}", self.query))
    }

    fn subtitle(&self) -> Option<String> {
        Some(self.list.subtitle())
    }

    fn status(&self) -> Option<String> {
        self.list.status()
    }

    fn help(&self) -> HelpSet {
        let mut confirm = self.confirm.clone();
        confirm.set_enabled(!self.list.filtering() && self.hovered().is_some());
        HelpSet::single(vec![confirm]).merge(self.list.help())
    }

    fn backable(&self) -> bool {
        self.list.backable()
    }

    fn captures_input(&self) -> bool {
        self.list.filtering()
    }

    fn update(&mut self, ctx: &WorkContext, msg: Message) -> Command {
        match msg {
            Message::Paste(text) => {
                self.list.handle_paste(&text);
                Command::None
            }
            Message::Key(key) => {
                if let Some(cmd) = self.list.handle_key(&key) {
                    return cmd;
                }
                if self.confirm.matches(&key) {
                    return self.open(ctx);
                }
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
