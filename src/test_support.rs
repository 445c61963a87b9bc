//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::client::{
    Chapter, ClientError, DownloadOptions, DownloadedFormats, Format, Manga, MangaClient,
    Metadata, ReadOptions, Volume,
};
use crate::core::config::{CliOverrides, MangalConfig, resolve};
use crate::core::options::{Options, SharedOptions};
use crate::tui::screens::Services;

type Failure = Arc<dyn Fn() -> ClientError + Send + Sync>;

#[derive(Default)]
struct Recorded {
    downloads: Vec<(String, Format)>,
    reads: Vec<String>,
    opened: Vec<String>,
    on_disk: HashMap<String, DownloadedFormats>,
}

/// In-memory client over a fixed library:
///
/// - `One Piece`: 3 volumes of 2 chapters
/// - `Berserk`: volume 1 with 5 chapters, volume 2 with 1
/// - `Vagabond`: a single volume of 3 chapters
#[derive(Clone)]
pub struct FakeClient {
    pub mangas: Vec<Manga>,
    chapters: Vec<(String, f32, Vec<&'static str>)>,
    metadata: Vec<Metadata>,
    recorded: Arc<Mutex<Recorded>>,
    failure: Arc<Mutex<Option<Failure>>>,
}

const BERSERK_V1: [&str; 5] = [
    "The Black Swordsman",
    "The Brand",
    "The Guardians of Desire",
    "The Golden Age",
    "Assassination",
];

impl FakeClient {
    pub fn library() -> Self {
        let mangas = vec![
            Manga::new("op", "One Piece", "https://example.org/op"),
            Manga::new("berserk", "Berserk", "https://example.org/berserk"),
            Manga::new("vagabond", "Vagabond", "https://example.org/vagabond"),
        ];
        let chapters = vec![
            ("op".to_string(), 1.0, vec!["Romance Dawn", "They Call Him Straw Hat"]),
            ("op".to_string(), 2.0, vec!["Buggy the Clown", "Versus"]),
            ("op".to_string(), 3.0, vec!["Kaya", "Captain Kuro"]),
            ("berserk".to_string(), 1.0, BERSERK_V1.to_vec()),
            ("berserk".to_string(), 2.0, vec!["Lost Children"]),
            ("vagabond".to_string(), 1.0, vec!["Takezo", "Osugi", "Kojiro"]),
        ];
        let metadata = vec![
            Metadata {
                id: 30013,
                title: "ONE PIECE".to_string(),
                source: "anilist".to_string(),
                year: Some(1997),
                genres: vec!["Action".to_string(), "Adventure".to_string()],
                ..Default::default()
            },
            Metadata {
                id: 30002,
                title: "Berserk".to_string(),
                source: "anilist".to_string(),
                year: Some(1989),
                ..Default::default()
            },
        ];
        Self {
            mangas,
            chapters,
            metadata,
            recorded: Arc::default(),
            failure: Arc::default(),
        }
    }

    /// Makes every later call fail with the given error.
    pub fn fail_with(&self, failure: impl Fn() -> ClientError + Send + Sync + 'static) {
        *self.failure.lock().unwrap() = Some(Arc::new(failure));
    }

    fn check(&self) -> Result<(), ClientError> {
        match self.failure.lock().unwrap().as_ref() {
            Some(failure) => Err(failure()),
            None => Ok(()),
        }
    }

    pub fn volumes_of(&self, manga: &Manga) -> Vec<Volume> {
        self.chapters
            .iter()
            .filter(|(id, _, _)| *id == manga.id)
            .map(|(_, number, _)| Volume {
                manga: manga.clone(),
                number: *number,
            })
            .collect()
    }

    pub fn chapters_of(&self, volume: &Volume) -> Vec<Chapter> {
        let Some((_, _, titles)) = self
            .chapters
            .iter()
            .find(|(id, number, _)| *id == volume.manga.id && *number == volume.number)
        else {
            return Vec::new();
        };
        titles
            .iter()
            .enumerate()
            .map(|(i, title)| Chapter {
                id: format!("{}-{}-{}", volume.manga.id, volume.number, i + 1),
                volume: volume.clone(),
                number: (i + 1) as f32,
                title: title.to_string(),
                url: format!("{}/{}", volume.manga.url, i + 1),
                date: None,
                group: Some("Studio Gaga".to_string()),
            })
            .collect()
    }

    pub fn search_metadata_blocking(&self, query: &str) -> Vec<Metadata> {
        let query = query.to_lowercase();
        self.metadata
            .iter()
            .filter(|m| m.title.to_lowercase().contains(&query))
            .cloned()
            .collect()
    }

    pub fn mark_downloaded(&self, chapter: &Chapter, format: Format) {
        self.recorded
            .lock()
            .unwrap()
            .on_disk
            .entry(chapter.id.clone())
            .or_default()
            .insert(format, PathBuf::from(format!("/library/{}{}", chapter.id, format.extension())));
    }

    pub fn downloads(&self) -> Vec<(String, Format)> {
        self.recorded.lock().unwrap().downloads.clone()
    }

    pub fn reads(&self) -> Vec<String> {
        self.recorded.lock().unwrap().reads.clone()
    }

    pub fn opened(&self) -> Vec<String> {
        self.recorded.lock().unwrap().opened.clone()
    }
}

#[async_trait]
impl MangaClient for FakeClient {
    fn name(&self) -> &str {
        "fake"
    }

    async fn search_mangas(&self, query: &str) -> Result<Vec<Manga>, ClientError> {
        self.check()?;
        let query = query.to_lowercase();
        Ok(self
            .mangas
            .iter()
            .filter(|m| m.title.to_lowercase().contains(&query))
            .cloned()
            .collect())
    }

    async fn manga_volumes(&self, manga: &Manga) -> Result<Vec<Volume>, ClientError> {
        self.check()?;
        Ok(self.volumes_of(manga))
    }

    async fn volume_chapters(&self, volume: &Volume) -> Result<Vec<Chapter>, ClientError> {
        self.check()?;
        Ok(self.chapters_of(volume))
    }

    async fn download_chapter(
        &self,
        chapter: &Chapter,
        options: &DownloadOptions,
    ) -> Result<PathBuf, ClientError> {
        self.check()?;
        self.mark_downloaded(chapter, options.format);
        self.recorded
            .lock()
            .unwrap()
            .downloads
            .push((chapter.id.clone(), options.format));
        Ok(PathBuf::from(format!(
            "/library/{}{}",
            chapter.id,
            options.format.extension()
        )))
    }

    async fn read_chapter(
        &self,
        chapter: &Chapter,
        _path: &Path,
        _options: &ReadOptions,
    ) -> Result<(), ClientError> {
        self.check()?;
        self.recorded.lock().unwrap().reads.push(chapter.id.clone());
        Ok(())
    }

    async fn open_url(&self, url: &str) -> Result<(), ClientError> {
        self.check()?;
        self.recorded.lock().unwrap().opened.push(url.to_string());
        Ok(())
    }

    async fn downloaded_formats(
        &self,
        chapter: &Chapter,
        _directory: &Path,
    ) -> Result<DownloadedFormats, ClientError> {
        self.check()?;
        Ok(self
            .recorded
            .lock()
            .unwrap()
            .on_disk
            .get(&chapter.id)
            .cloned()
            .unwrap_or_default())
    }

    async fn search_metadata(&self, query: &str) -> Result<Vec<Metadata>, ClientError> {
        self.check()?;
        Ok(self.search_metadata_blocking(query))
    }

    async fn attach_metadata(&self, manga: &Manga, metadata: Metadata) -> Result<(), ClientError> {
        self.check()?;
        manga.metadata.set(metadata);
        Ok(())
    }
}

/// Default session options, as if no config file existed.
pub fn options() -> SharedOptions {
    SharedOptions::new(Options::from(&resolve(
        &MangalConfig::default(),
        &CliOverrides::default(),
    )))
}

pub fn services(client: Arc<dyn MangaClient>) -> Services {
    Services::new(client, options())
}
