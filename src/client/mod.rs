//! # Client Collaborator
//!
//! The contract between the screens and whatever actually searches,
//! downloads and resolves metadata. Screens only ever call these methods
//! from inside commands, never from `update`.

pub mod catalog;
pub mod types;

use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

pub use catalog::CatalogClient;
pub use types::{
    Chapter, DownloadOptions, DownloadedFormats, Format, Manga, Metadata, MetadataSlot,
    ReadOptions, Volume, format_number,
};

/// Errors returned by a client.
#[derive(Debug)]
pub enum ClientError {
    /// The surrounding work was cancelled. Not a failure.
    Cancelled,
    /// The requested entity does not exist.
    NotFound(String),
    /// The entity exists but cannot be served (e.g. format not offered).
    Unavailable(String),
    Io(std::io::Error),
    Parse(String),
    Other(String),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Cancelled => write!(f, "cancelled"),
            ClientError::NotFound(what) => write!(f, "not found: {what}"),
            ClientError::Unavailable(what) => write!(f, "unavailable: {what}"),
            ClientError::Io(e) => write!(f, "I/O error: {e}"),
            ClientError::Parse(msg) => write!(f, "parse error: {msg}"),
            ClientError::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<std::io::Error> for ClientError {
    fn from(e: std::io::Error) -> Self {
        ClientError::Io(e)
    }
}

#[async_trait]
pub trait MangaClient: Send + Sync {
    /// Human readable name of the backing provider.
    fn name(&self) -> &str;

    async fn search_mangas(&self, query: &str) -> Result<Vec<Manga>, ClientError>;

    async fn manga_volumes(&self, manga: &Manga) -> Result<Vec<Volume>, ClientError>;

    async fn volume_chapters(&self, volume: &Volume) -> Result<Vec<Chapter>, ClientError>;

    /// Downloads the chapter and returns the path of the produced artifact.
    async fn download_chapter(
        &self,
        chapter: &Chapter,
        options: &DownloadOptions,
    ) -> Result<PathBuf, ClientError>;

    /// Opens an already downloaded chapter for reading.
    async fn read_chapter(
        &self,
        chapter: &Chapter,
        path: &Path,
        options: &ReadOptions,
    ) -> Result<(), ClientError>;

    async fn open_url(&self, url: &str) -> Result<(), ClientError>;

    /// Formats of `chapter` already present under `directory`.
    async fn downloaded_formats(
        &self,
        chapter: &Chapter,
        directory: &Path,
    ) -> Result<DownloadedFormats, ClientError>;

    /// Metadata candidates matching a title.
    async fn search_metadata(&self, query: &str) -> Result<Vec<Metadata>, ClientError>;

    /// Attaches metadata to the manga entity.
    async fn attach_metadata(&self, manga: &Manga, metadata: Metadata) -> Result<(), ClientError>;
}
