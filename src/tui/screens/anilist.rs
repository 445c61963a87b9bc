//! Metadata candidates for one manga.
//!
//! Reached from the volume and chapter lists. Picking a candidate attaches
//! it to the manga and returns to the closest durable screen, skipping any
//! search prompts opened on the way.

use std::sync::Arc;

use log::info;
use ratatui::buffer::Buffer;
use ratatui::layout::{Rect, Size};

use crate::client::{ClientError, Manga, Metadata};
use crate::tui::command::{BackTarget, Command, Message, WorkContext};
use crate::tui::keymap::{HelpSet, KeyBinding, KeyMap};
use crate::tui::notification::Notification;
use crate::tui::screen::{Screen, Title};
use crate::tui::screens::Services;
use crate::tui::screens::list::{ListEntry, ListView};
use crate::tui::screens::prompt::PromptScreen;

struct Candidate(Metadata);

impl ListEntry for Candidate {
    fn title(&self) -> String {
        self.0.title.clone()
    }

    fn description(&self) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(year) = self.0.year {
            parts.push(year.to_string());
        }
        if let Some(status) = &self.0.status {
            parts.push(status.clone());
        }
        if !self.0.genres.is_empty() {
            parts.push(self.0.genres.join(", "));
        }
        Some(parts.join(" · "))
    }
}

/// Searches metadata for `query` and opens the candidates for `manga`.
pub fn search_with(services: Services, manga: Manga, query: String, ctx: &WorkContext) -> Command {
    let client = Arc::clone(&services.client);
    let needle = query.clone();
    Command::sequence([
        Command::loading(format!("Searching {query:?} on Anilist")),
        Command::attempt(
            ctx,
            async move { client.search_metadata(&needle).await },
            move |candidates| {
                if candidates.is_empty() {
                    return Some(Message::Notify(Notification::new(format!(
                        "No Anilist results for {query:?}"
                    ))));
                }
                Some(Message::Navigate(Box::new(AnilistSearch::new(
                    services, manga, candidates,
                ))))
            },
        ),
        Command::loaded(),
    ])
}

/// Searches metadata by the manga's own title.
pub fn search(services: Services, manga: Manga, ctx: &WorkContext) -> Command {
    let query = manga.title.clone();
    search_with(services, manga, query, ctx)
}

pub struct AnilistSearch {
    services: Services,
    manga: Manga,
    list: ListView<Candidate>,
    confirm: KeyBinding,
    search: KeyBinding,
    metadata: KeyBinding,
}

impl AnilistSearch {
    pub fn new(services: Services, manga: Manga, candidates: Vec<Metadata>) -> Self {
        Self {
            services,
            manga,
            list: ListView::new(
                candidates.into_iter().map(Candidate).collect(),
                "manga",
                "mangas",
            ),
            confirm: KeyBinding::new("confirm", &["enter"]),
            search: KeyBinding::new("search", &["s"]),
            metadata: KeyBinding::new("metadata", &["m"]),
        }
    }

    fn attach(&self, ctx: &WorkContext) -> Command {
        let Some(metadata) = self.list.hovered().map(|c| c.0.clone()) else {
            return Command::None;
        };
        let client = Arc::clone(&self.services.client);
        let manga = self.manga.clone();
        Command::attempt(
            ctx,
            async move {
                let summary = metadata.summary();
                client.attach_metadata(&manga, metadata).await?;
                info!("Attached {summary:?} to {:?}", manga.title);
                Ok::<_, ClientError>(())
            },
            |()| Some(Message::Back(BackTarget::Durable)),
        )
    }

    fn custom_search(&self) -> Command {
        let services = self.services.clone();
        let manga = self.manga.clone();
        let prompt = PromptScreen::new(
            Title::new("Search Anilist"),
            Box::new(move |query, ctx| search_with(services.clone(), manga.clone(), query, ctx)),
        )
        .with_subtitle("Search Anilist manga")
        .with_placeholder("Anilist manga title...")
        .intermediate(true);
        Command::navigate(prompt)
    }

    fn show_hovered(&self) -> Command {
        match self.list.hovered() {
            Some(candidate) => Command::Message(Message::ShowViewport {
                title: candidate.0.title.clone(),
                content: candidate.0.describe(),
            }),
            None => Command::None,
        }
    }
}

impl Screen for AnilistSearch {
    fn title(&self) -> Title {
        Title::new("Anilist Mangas")
    }

    fn subtitle(&self) -> Option<String> {
        Some(self.list.subtitle())
    }

    fn status(&self) -> Option<String> {
        self.list.status()
    }

    fn help(&self) -> HelpSet {
        let mut keys = vec![self.confirm.clone(), self.search.clone(), self.metadata.clone()];
        let has_items = !self.list.is_empty();
        keys[0].set_enabled(has_items);
        keys[2].set_enabled(has_items);
        HelpSet::single(keys).merge(self.list.help())
    }

    fn intermediate(&self) -> bool {
        true
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
                    cmd
                } else if self.confirm.matches(&key) {
                    self.attach(ctx)
                } else if self.search.matches(&key) {
                    self.custom_search()
                } else if self.metadata.matches(&key) {
                    self.show_hovered()
                } else {
                    Command::None
                }
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

    fn key(code: KeyCode) -> Message {
        Message::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    async fn run(cmd: Command) -> Vec<Message> {
        let (tx, rx) = mpsc::channel();
        execute(cmd, tx).await;
        rx.try_iter().collect()
    }

    #[tokio::test]
    async fn test_enter_attaches_and_goes_back_to_durable_screen() {
        let client = FakeClient::library();
        let manga = client.mangas[0].clone();
        let candidates = client.search_metadata_blocking("one piece");
        let mut screen =
            AnilistSearch::new(services(Arc::new(client.clone())), manga.clone(), candidates);
        screen.resize(Size::new(60, 20));

        let msgs = run(screen.update(&WorkContext::new(), key(KeyCode::Enter))).await;
        assert!(matches!(msgs.as_slice(), [Message::Back(BackTarget::Durable)]));
        assert_eq!(manga.metadata.get().map(|m| m.title), Some("ONE PIECE".into()));
    }

    #[tokio::test]
    async fn test_search_without_results_notifies() {
        let client = FakeClient::library();
        let manga = client.mangas[0].clone();
        let msgs = run(search_with(
            services(Arc::new(client)),
            manga,
            "nothing like this".into(),
            &WorkContext::new(),
        ))
        .await;
        assert!(msgs.iter().any(
            |m| matches!(m, Message::Notify(n) if n.text == "No Anilist results for \"nothing like this\"")
        ));
        assert!(matches!(msgs.last(), Some(Message::Loaded)));
    }

    #[tokio::test]
    async fn test_failed_attach_is_an_error() {
        let client = FakeClient::library();
        client.fail_with(|| ClientError::Other("anilist down".into()));
        let manga = client.mangas[0].clone();
        let candidates = vec![Metadata {
            id: 1,
            title: "ONE PIECE".into(),
            ..Default::default()
        }];
        let mut screen = AnilistSearch::new(services(Arc::new(client)), manga, candidates);
        screen.resize(Size::new(60, 20));
        let msgs = run(screen.update(&WorkContext::new(), key(KeyCode::Enter))).await;
        assert!(matches!(msgs.as_slice(), [Message::Error(_)]));
    }

    #[test]
    fn test_s_opens_an_intermediate_prompt() {
        let client = FakeClient::library();
        let manga = client.mangas[0].clone();
        let mut screen = AnilistSearch::new(services(Arc::new(client)), manga, Vec::new());
        match screen.update(&WorkContext::new(), key(KeyCode::Char('s'))) {
            Command::Message(Message::Navigate(prompt)) => {
                assert_eq!(prompt.title().text, "Search Anilist");
                assert!(prompt.intermediate());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
