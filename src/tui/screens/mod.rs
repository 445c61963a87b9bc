//! # Screens
//!
//! Every concrete screen, plus the pieces they share: the [`Services`]
//! bundle handed from screen to screen and the metadata status line.
//!
//! The flow is `prompt` (home search) -> [`mangas::MangaResults`] ->
//! [`volumes::VolumeList`] -> [`chapters::ChapterList`]. The dialogs,
//! pickers and viewers are intermediate screens pushed on top.

pub mod anilist;
pub mod chapters;
pub mod confirm;
pub mod error;
pub mod format_picker;
pub mod list;
pub mod mangas;
pub mod prompt;
pub mod viewport;
pub mod volumes;

use std::sync::Arc;

use crate::client::{Manga, MangaClient};
use crate::core::options::SharedOptions;
use crate::tui::command::{Command, Message, WorkContext};
use crate::tui::controller::{ErrorScreenFactory, TextScreenFactory};
use crate::tui::notification::Notification;
use crate::tui::screen::{Screen, Title};
use crate::tui::truncate;

use error::ErrorScreen;
use mangas::MangaResults;
use prompt::PromptScreen;
use viewport::TextViewport;

/// What every screen needs to do its work.
#[derive(Clone)]
pub struct Services {
    pub client: Arc<dyn MangaClient>,
    pub options: SharedOptions,
}

impl Services {
    pub fn new(client: Arc<dyn MangaClient>, options: SharedOptions) -> Self {
        Self { client, options }
    }
}

/// The manga search prompt. With a `query` it searches right away.
pub fn home(services: Services, query: Option<&str>) -> PromptScreen {
    let prompt = PromptScreen::new(
        Title::new("Mangal"),
        Box::new(move |query, ctx| search_mangas(services.clone(), query, ctx)),
    )
    .with_subtitle("Search for a manga")
    .with_placeholder("Manga title...");
    match query {
        Some(query) => prompt.submitted(query),
        None => prompt,
    }
}

fn search_mangas(services: Services, query: String, ctx: &WorkContext) -> Command {
    let client = Arc::clone(&services.client);
    let needle = query.clone();
    Command::sequence([
        Command::loading(format!("Searching for {query:?}")),
        Command::attempt(
            ctx,
            async move { client.search_mangas(&needle).await },
            move |mangas| {
                if mangas.is_empty() {
                    return Some(Message::Notify(Notification::new(format!(
                        "No mangas found for {query:?}"
                    ))));
                }
                Some(Message::Navigate(Box::new(MangaResults::new(
                    services, query, mangas,
                ))))
            },
        ),
        Command::loaded(),
    ])
}

pub fn error_screen_factory() -> ErrorScreenFactory {
    Box::new(|err| Box::new(ErrorScreen::new(err)) as Box<dyn Screen>)
}

pub fn text_screen_factory() -> TextScreenFactory {
    Box::new(|title, content| Box::new(TextViewport::new(title, content)) as Box<dyn Screen>)
}

/// Opens the attached metadata of `manga` in a viewport.
pub fn show_metadata(manga: &Manga) -> Command {
    match manga.metadata.get() {
        Some(metadata) => Command::Message(Message::ShowViewport {
            title: "Metadata".to_string(),
            content: metadata.describe(),
        }),
        None => Command::notify(format!("No metadata for {:?}", manga.title)),
    }
}

/// Metadata summary shown in a list screen's status.
#[derive(Debug, Clone, Default)]
pub struct MetaLine {
    summary: Option<String>,
    genres: Vec<String>,
    pub show_full: bool,
}

const FULL_GENRES: usize = 3;

impl MetaLine {
    pub fn new(manga: &Manga) -> Self {
        let mut line = Self::default();
        line.refresh(manga);
        line
    }

    /// Picks up metadata attached since the line was built.
    pub fn refresh(&mut self, manga: &Manga) {
        let metadata = manga.metadata.get();
        self.summary = metadata.as_ref().map(|m| m.summary());
        self.genres = metadata.map(|m| m.genres).unwrap_or_default();
    }

    pub fn toggle(&mut self) {
        self.show_full = !self.show_full;
    }

    pub fn render(&self) -> String {
        let Some(summary) = &self.summary else {
            return "No metadata".to_string();
        };
        if !self.show_full || self.genres.is_empty() {
            return truncate(summary, 30);
        }
        let genres: Vec<&str> = self
            .genres
            .iter()
            .take(FULL_GENRES)
            .map(String::as_str)
            .collect();
        format!("{summary} · {}", genres.join(", "))
    }

    /// Joins the metadata line with a list status.
    pub fn with(&self, status: Option<String>) -> Option<String> {
        Some(match status {
            Some(status) => format!("{} {status}", self.render()),
            None => self.render(),
        })
    }
}
