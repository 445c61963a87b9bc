use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Output format of a downloaded chapter.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Pdf,
    Cbz,
    Epub,
    Images,
    Tar,
    #[serde(rename = "tar.gz")]
    TarGz,
    Zip,
}

impl Format {
    pub const ALL: [Format; 7] = [
        Format::Pdf,
        Format::Cbz,
        Format::Epub,
        Format::Images,
        Format::Tar,
        Format::TarGz,
        Format::Zip,
    ];

    /// File extension including the dot. Empty for `Images`, which is a directory.
    pub fn extension(&self) -> &'static str {
        match self {
            Format::Pdf => ".pdf",
            Format::Cbz => ".cbz",
            Format::Epub => ".epub",
            Format::Images => "",
            Format::Tar => ".tar",
            Format::TarGz => ".tar.gz",
            Format::Zip => ".zip",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Format::Pdf => "pdf",
            Format::Cbz => "cbz",
            Format::Epub => "epub",
            Format::Images => "images",
            Format::Tar => "tar",
            Format::TarGz => "tar.gz",
            Format::Zip => "zip",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        Format::ALL
            .into_iter()
            .find(|format| format.name() == lowered)
            .ok_or_else(|| format!("unknown format {s:?}"))
    }
}

/// Metadata candidate returned by the metadata collaborator (Anilist-like).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Metadata {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub year: Option<u32>,
    #[serde(default)]
    pub chapters: Option<u32>,
    #[serde(default)]
    pub url: Option<String>,
}

impl Metadata {
    /// One-line summary used in status lines.
    pub fn summary(&self) -> String {
        match self.year {
            Some(year) => format!("{} ({year})", self.title),
            None => self.title.clone(),
        }
    }

    /// Multi-line description shown in the metadata viewport.
    pub fn describe(&self) -> String {
        let mut lines = vec![format!("Title: {}", self.title)];
        if !self.source.is_empty() {
            lines.push(format!("Source: {} #{}", self.source, self.id));
        }
        if let Some(year) = self.year {
            lines.push(format!("Year: {year}"));
        }
        if let Some(status) = &self.status {
            lines.push(format!("Status: {status}"));
        }
        if let Some(chapters) = self.chapters {
            lines.push(format!("Chapters: {chapters}"));
        }
        if !self.genres.is_empty() {
            lines.push(format!("Genres: {}", self.genres.join(", ")));
        }
        if let Some(url) = &self.url {
            lines.push(format!("URL: {url}"));
        }
        if let Some(description) = &self.description {
            lines.push(String::new());
            lines.push(description.clone());
        }
        lines.join("\n")
    }
}

/// Shared, attachable metadata of a manga entity.
///
/// Cloning a `Manga` shares the slot, so metadata attached by one screen is
/// visible to every screen holding the same manga.
#[derive(Debug, Clone, Default)]
pub struct MetadataSlot(Arc<RwLock<Option<Metadata>>>);

impl MetadataSlot {
    pub fn get(&self) -> Option<Metadata> {
        self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn set(&self, metadata: Metadata) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = Some(metadata);
    }
}

#[derive(Debug, Clone)]
pub struct Manga {
    pub id: String,
    pub title: String,
    pub url: String,
    pub metadata: MetadataSlot,
}

impl Manga {
    pub fn new(id: impl Into<String>, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            url: url.into(),
            metadata: MetadataSlot::default(),
        }
    }
}

impl fmt::Display for Manga {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

#[derive(Debug, Clone)]
pub struct Volume {
    pub manga: Manga,
    pub number: f32,
}

impl fmt::Display for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_number(self.number))
    }
}

#[derive(Debug, Clone)]
pub struct Chapter {
    pub id: String,
    pub volume: Volume,
    pub number: f32,
    pub title: String,
    pub url: String,
    pub date: Option<NaiveDate>,
    pub group: Option<String>,
}

impl Chapter {
    pub fn manga(&self) -> &Manga {
        &self.volume.manga
    }
}

impl fmt::Display for Chapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

/// Formats a chapter or volume number without a trailing `.0`.
pub fn format_number(number: f32) -> String {
    if number.fract() == 0.0 {
        format!("{}", number as i64)
    } else {
        format!("{number}")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DownloadOptions {
    pub format: Format,
    pub directory: PathBuf,
    pub skip_if_exists: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReadOptions {
    /// External program used to open the file. `None` uses the platform opener.
    pub reader: Option<String>,
}

/// Formats of a chapter already present on disk, with their paths.
pub type DownloadedFormats = HashMap<Format, PathBuf>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parses_names_case_insensitively() {
        assert_eq!("CBZ".parse::<Format>(), Ok(Format::Cbz));
        assert_eq!("tar.gz".parse::<Format>(), Ok(Format::TarGz));
        assert!("mobi".parse::<Format>().is_err());
    }

    #[test]
    fn test_format_serde_names_match_display() {
        for format in Format::ALL {
            let json = serde_json::to_string(&format).unwrap();
            assert_eq!(json, format!("\"{}\"", format.name()));
        }
    }

    #[test]
    fn test_metadata_slot_is_shared_between_clones() {
        let manga = Manga::new("1", "One Piece", "https://example.org/op");
        let clone = manga.clone();
        clone.metadata.set(Metadata {
            id: 30013,
            title: "ONE PIECE".to_string(),
            ..Default::default()
        });
        assert_eq!(manga.metadata.get().map(|m| m.id), Some(30013));
    }

    #[test]
    fn test_format_number_drops_integral_fraction() {
        assert_eq!(format_number(12.0), "12");
        assert_eq!(format_number(12.5), "12.5");
    }

    #[test]
    fn test_metadata_describe_lists_known_fields() {
        let metadata = Metadata {
            id: 1,
            title: "Berserk".to_string(),
            source: "anilist".to_string(),
            genres: vec!["Action".to_string(), "Drama".to_string()],
            year: Some(1989),
            ..Default::default()
        };
        let text = metadata.describe();
        assert!(text.contains("Title: Berserk"));
        assert!(text.contains("Genres: Action, Drama"));
        assert_eq!(metadata.summary(), "Berserk (1989)");
    }
}
