//! Offline catalog client.
//!
//! Serves mangas, volumes and chapters from a JSON document. Every chapter
//! lists pre-packaged files per format; "downloading" copies the file for the
//! requested format into the download directory using the usual
//! `<manga>/<volume>/<chapter>.<ext>` layout.
//!
//! ```json
//! {
//!   "name": "local",
//!   "mangas": [{
//!     "id": "op", "title": "One Piece", "url": "https://example.org/op",
//!     "volumes": [{ "number": 1, "chapters": [{
//!       "id": "op-1", "number": 1, "title": "Romance Dawn",
//!       "date": "1997-07-22", "group": "scans",
//!       "files": { "cbz": "op/1.cbz" }
//!     }]}]
//!   }],
//!   "metadata": [{ "id": 30013, "title": "ONE PIECE", "source": "anilist" }]
//! }
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, info};
use serde::Deserialize;

use super::{
    Chapter, ClientError, DownloadOptions, DownloadedFormats, Format, Manga, MangaClient,
    Metadata, ReadOptions, Volume, format_number,
};

#[derive(Deserialize, Debug)]
struct CatalogFile {
    #[serde(default = "default_name")]
    name: String,
    #[serde(default)]
    mangas: Vec<CatalogManga>,
    #[serde(default)]
    metadata: Vec<Metadata>,
}

fn default_name() -> String {
    "catalog".to_string()
}

#[derive(Deserialize, Debug)]
struct CatalogManga {
    id: String,
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    volumes: Vec<CatalogVolume>,
}

#[derive(Deserialize, Debug)]
struct CatalogVolume {
    number: f32,
    #[serde(default)]
    chapters: Vec<CatalogChapter>,
}

#[derive(Deserialize, Debug)]
struct CatalogChapter {
    id: String,
    number: f32,
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    date: Option<NaiveDate>,
    #[serde(default)]
    group: Option<String>,
    #[serde(default)]
    files: HashMap<Format, PathBuf>,
}

struct Entry {
    manga: Manga,
    volumes: Vec<CatalogVolume>,
}

pub struct CatalogClient {
    name: String,
    root: PathBuf,
    entries: Vec<Entry>,
    metadata: Vec<Metadata>,
    reader: Option<String>,
}

impl CatalogClient {
    /// Load a catalog from a JSON file. Relative chapter file paths are
    /// resolved against the catalog's directory.
    pub fn load(path: &Path) -> Result<Self, ClientError> {
        let contents = std::fs::read_to_string(path)?;
        let root = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let client = Self::from_json(&contents, root)?;
        info!(
            "Loaded catalog {:?} with {} mangas from {}",
            client.name,
            client.entries.len(),
            path.display()
        );
        Ok(client)
    }

    pub fn from_json(contents: &str, root: PathBuf) -> Result<Self, ClientError> {
        let file: CatalogFile =
            serde_json::from_str(contents).map_err(|e| ClientError::Parse(e.to_string()))?;
        let entries = file
            .mangas
            .into_iter()
            .map(|m| Entry {
                manga: Manga::new(m.id, m.title, m.url),
                volumes: m.volumes,
            })
            .collect();
        Ok(Self {
            name: file.name,
            root,
            entries,
            metadata: file.metadata,
            reader: None,
        })
    }

    /// Program used to open files and URLs when the read options don't name one.
    pub fn with_reader(mut self, reader: Option<String>) -> Self {
        self.reader = reader;
        self
    }

    fn entry(&self, manga: &Manga) -> Result<&Entry, ClientError> {
        self.entries
            .iter()
            .find(|e| e.manga.id == manga.id)
            .ok_or_else(|| ClientError::NotFound(format!("manga {:?}", manga.title)))
    }

    fn catalog_chapter(&self, chapter: &Chapter) -> Result<&CatalogChapter, ClientError> {
        self.entry(chapter.manga())?
            .volumes
            .iter()
            .flat_map(|v| v.chapters.iter())
            .find(|c| c.id == chapter.id)
            .ok_or_else(|| ClientError::NotFound(format!("chapter {:?}", chapter.title)))
    }

    async fn open_with(&self, program: Option<&str>, target: &str) -> Result<(), ClientError> {
        let program = program
            .or(self.reader.as_deref())
            .unwrap_or(default_opener());
        debug!("Opening {target:?} with {program:?}");
        let status = tokio::process::Command::new(program)
            .arg(target)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .await?;
        if status.success() {
            Ok(())
        } else {
            Err(ClientError::Other(format!(
                "{program} exited with {status} while opening {target}"
            )))
        }
    }
}

fn default_opener() -> &'static str {
    if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    }
}

/// Replaces characters that are unsafe in file names and collapses runs of `_`.
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '\\' | '/' | '<' | '>' | ':' | '"' | '|' | '?' | '*' => '_',
            c if c.is_whitespace() => '_',
            c => c,
        })
        .collect();
    let mut collapsed = String::with_capacity(replaced.len());
    for c in replaced.chars() {
        if c == '_' && collapsed.ends_with('_') {
            continue;
        }
        collapsed.push(c);
    }
    collapsed.trim_matches(|c| c == '_' || c == '.').to_string()
}

/// Destination of a chapter for the given format under `directory`.
pub fn chapter_path(chapter: &Chapter, format: Format, directory: &Path) -> PathBuf {
    let manga_dir = sanitize_filename(&chapter.manga().title);
    let volume_dir = sanitize_filename(&format!("Vol. {}", chapter.volume));
    let file = sanitize_filename(&format!(
        "[{:0>4}] {}",
        format_number(chapter.number),
        chapter.title
    ));
    directory
        .join(manga_dir)
        .join(volume_dir)
        .join(format!("{file}{}", format.extension()))
}

async fn copy_recursive(from: &Path, to: &Path) -> Result<(), ClientError> {
    if tokio::fs::metadata(from).await?.is_dir() {
        tokio::fs::create_dir_all(to).await?;
        let mut entries = tokio::fs::read_dir(from).await?;
        while let Some(entry) = entries.next_entry().await? {
            Box::pin(copy_recursive(&entry.path(), &to.join(entry.file_name()))).await?;
        }
    } else {
        if let Some(parent) = to.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(from, to).await?;
    }
    Ok(())
}

fn matches_query(title: &str, query: &str) -> bool {
    title.to_lowercase().contains(&query.trim().to_lowercase())
}

#[async_trait]
impl MangaClient for CatalogClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search_mangas(&self, query: &str) -> Result<Vec<Manga>, ClientError> {
        Ok(self
            .entries
            .iter()
            .filter(|e| matches_query(&e.manga.title, query))
            .map(|e| e.manga.clone())
            .collect())
    }

    async fn manga_volumes(&self, manga: &Manga) -> Result<Vec<Volume>, ClientError> {
        Ok(self
            .entry(manga)?
            .volumes
            .iter()
            .map(|v| Volume {
                manga: manga.clone(),
                number: v.number,
            })
            .collect())
    }

    async fn volume_chapters(&self, volume: &Volume) -> Result<Vec<Chapter>, ClientError> {
        let entry = self.entry(&volume.manga)?;
        let catalog_volume = entry
            .volumes
            .iter()
            .find(|v| v.number == volume.number)
            .ok_or_else(|| ClientError::NotFound(format!("volume {volume}")))?;
        Ok(catalog_volume
            .chapters
            .iter()
            .map(|c| Chapter {
                id: c.id.clone(),
                volume: volume.clone(),
                number: c.number,
                title: c.title.clone(),
                url: c.url.clone(),
                date: c.date,
                group: c.group.clone(),
            })
            .collect())
    }

    async fn download_chapter(
        &self,
        chapter: &Chapter,
        options: &DownloadOptions,
    ) -> Result<PathBuf, ClientError> {
        let source = self
            .catalog_chapter(chapter)?
            .files
            .get(&options.format)
            .map(|p| self.root.join(p))
            .ok_or_else(|| {
                ClientError::Unavailable(format!(
                    "chapter {:?} is not offered as {}",
                    chapter.title, options.format
                ))
            })?;
        let destination = chapter_path(chapter, options.format, &options.directory);

        if options.skip_if_exists && tokio::fs::try_exists(&destination).await? {
            debug!("Skipping existing {}", destination.display());
            return Ok(destination);
        }

        copy_recursive(&source, &destination).await?;
        info!(
            "Copied {} to {}",
            source.display(),
            destination.display()
        );
        Ok(destination)
    }

    async fn read_chapter(
        &self,
        _chapter: &Chapter,
        path: &Path,
        options: &ReadOptions,
    ) -> Result<(), ClientError> {
        self.open_with(options.reader.as_deref(), &path.to_string_lossy())
            .await
    }

    async fn open_url(&self, url: &str) -> Result<(), ClientError> {
        if url.is_empty() {
            return Err(ClientError::Unavailable("no URL".to_string()));
        }
        self.open_with(None, url).await
    }

    async fn downloaded_formats(
        &self,
        chapter: &Chapter,
        directory: &Path,
    ) -> Result<DownloadedFormats, ClientError> {
        let mut found = DownloadedFormats::new();
        for format in Format::ALL {
            let path = chapter_path(chapter, format, directory);
            if tokio::fs::try_exists(&path).await? {
                found.insert(format, path);
            }
        }
        Ok(found)
    }

    async fn search_metadata(&self, query: &str) -> Result<Vec<Metadata>, ClientError> {
        Ok(self
            .metadata
            .iter()
            .filter(|m| matches_query(&m.title, query) || matches_query(query, &m.title))
            .cloned()
            .collect())
    }

    async fn attach_metadata(&self, manga: &Manga, metadata: Metadata) -> Result<(), ClientError> {
        // The stored entity shares its slot with every clone handed out.
        self.entry(manga)?.manga.metadata.set(metadata);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"{
        "name": "local",
        "mangas": [
            {
                "id": "op", "title": "One Piece", "url": "https://example.org/op",
                "volumes": [{ "number": 1, "chapters": [
                    { "id": "op-1", "number": 1, "title": "Romance Dawn",
                      "date": "1997-07-22", "files": { "cbz": "op-1.cbz" } },
                    { "id": "op-2", "number": 2, "title": "They Call Him Straw Hat Luffy" }
                ]}]
            },
            { "id": "ber", "title": "Berserk" }
        ],
        "metadata": [
            { "id": 30013, "title": "ONE PIECE", "source": "anilist" },
            { "id": 30002, "title": "Berserk", "source": "anilist" }
        ]
    }"#;

    fn client(root: &Path) -> CatalogClient {
        CatalogClient::from_json(CATALOG, root.to_path_buf()).unwrap()
    }

    async fn first_chapter(client: &CatalogClient) -> Chapter {
        let manga = client.search_mangas("one").await.unwrap().remove(0);
        let volume = client.manga_volumes(&manga).await.unwrap().remove(0);
        client.volume_chapters(&volume).await.unwrap().remove(0)
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("One Piece: Vol 1?"), "One_Piece_Vol_1");
        assert_eq!(sanitize_filename("..a//b.."), "a_b");
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive() {
        let client = client(Path::new("."));
        let found = client.search_mangas("ONE piece").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "One Piece");
        assert!(client.search_mangas("naruto").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_chapters_carry_their_volume() {
        let client = client(Path::new("."));
        let chapter = first_chapter(&client).await;
        assert_eq!(chapter.volume.number, 1.0);
        assert_eq!(chapter.manga().id, "op");
        assert_eq!(chapter.date, NaiveDate::from_ymd_opt(1997, 7, 22));
    }

    #[tokio::test]
    async fn test_download_copies_file_and_reports_downloaded_format() {
        let source_dir = tempfile::tempdir().unwrap();
        let download_dir = tempfile::tempdir().unwrap();
        std::fs::write(source_dir.path().join("op-1.cbz"), b"pages").unwrap();

        let client = client(source_dir.path());
        let chapter = first_chapter(&client).await;
        let options = DownloadOptions {
            format: Format::Cbz,
            directory: download_dir.path().to_path_buf(),
            skip_if_exists: false,
        };

        let path = client.download_chapter(&chapter, &options).await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"pages");
        assert!(path.ends_with("One_Piece/Vol._1/[0001]_Romance_Dawn.cbz"));

        let formats = client
            .downloaded_formats(&chapter, download_dir.path())
            .await
            .unwrap();
        assert_eq!(formats.get(&Format::Cbz), Some(&path));
        assert!(!formats.contains_key(&Format::Pdf));
    }

    #[tokio::test]
    async fn test_download_of_missing_format_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let client = client(dir.path());
        let chapter = first_chapter(&client).await;
        let options = DownloadOptions {
            format: Format::Pdf,
            directory: dir.path().to_path_buf(),
            skip_if_exists: true,
        };
        let err = client.download_chapter(&chapter, &options).await.unwrap_err();
        assert!(matches!(err, ClientError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_attach_metadata_is_visible_on_searched_clones() {
        let client = client(Path::new("."));
        let manga = client.search_mangas("berserk").await.unwrap().remove(0);
        let candidate = client.search_metadata("berserk").await.unwrap().remove(0);
        client.attach_metadata(&manga, candidate).await.unwrap();

        let again = client.search_mangas("berserk").await.unwrap().remove(0);
        assert_eq!(again.metadata.get().map(|m| m.id), Some(30002));
    }

    #[test]
    fn test_malformed_catalog_is_a_parse_error() {
        let result = CatalogClient::from_json("{ not json", PathBuf::new());
        assert!(matches!(result, Err(ClientError::Parse(_))));
    }
}
