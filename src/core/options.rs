//! Session-wide runtime options.
//!
//! A copy of the configuration subset that screens read while running.
//! The format picker and the chapter display toggles change it in memory
//! on the loop thread; it is never written back to the config file.

use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

use crate::client::{DownloadOptions, Format, ReadOptions};
use crate::core::config::{ChapterDisplay, ResolvedConfig};

#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    pub download_format: Format,
    pub read_format: Format,
    pub download_path: PathBuf,
    pub skip_if_exists: bool,
    pub download_on_read: bool,
    pub reader: Option<String>,
    pub expand_single_volume: bool,
    pub chapter: ChapterDisplay,
}

impl Options {
    pub fn download_options(&self) -> DownloadOptions {
        DownloadOptions {
            format: self.download_format,
            directory: self.download_path.clone(),
            skip_if_exists: self.skip_if_exists,
        }
    }

    /// Download options used before opening a chapter for reading.
    ///
    /// Unless `download_on_read` is set, the file goes to a temporary
    /// directory instead of the library.
    pub fn read_download_options(&self) -> DownloadOptions {
        let directory = if self.download_on_read {
            self.download_path.clone()
        } else {
            std::env::temp_dir().join("mangal")
        };
        DownloadOptions {
            format: self.read_format,
            directory,
            skip_if_exists: true,
        }
    }

    pub fn read_options(&self) -> ReadOptions {
        ReadOptions {
            reader: self.reader.clone(),
        }
    }
}

impl From<&ResolvedConfig> for Options {
    fn from(config: &ResolvedConfig) -> Self {
        Self {
            download_format: config.download_format,
            read_format: config.read_format,
            download_path: config.download_path.clone(),
            skip_if_exists: config.skip_if_exists,
            download_on_read: config.download_on_read,
            reader: config.reader.clone(),
            expand_single_volume: config.expand_single_volume,
            chapter: config.chapter,
        }
    }
}

/// Cheaply clonable handle to the session options.
#[derive(Debug, Clone)]
pub struct SharedOptions(Arc<RwLock<Options>>);

impl SharedOptions {
    pub fn new(options: Options) -> Self {
        Self(Arc::new(RwLock::new(options)))
    }

    /// Snapshot of the current options.
    pub fn get(&self) -> Options {
        self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn update(&self, change: impl FnOnce(&mut Options)) {
        change(&mut self.0.write().unwrap_or_else(PoisonError::into_inner));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{CliOverrides, MangalConfig, resolve};

    fn options() -> Options {
        Options::from(&resolve(&MangalConfig::default(), &CliOverrides::default()))
    }

    #[test]
    fn test_update_is_visible_through_clones() {
        let shared = SharedOptions::new(options());
        let clone = shared.clone();
        clone.update(|o| o.download_format = Format::Zip);
        assert_eq!(shared.get().download_format, Format::Zip);
    }

    #[test]
    fn test_read_download_goes_to_temp_dir_unless_download_on_read() {
        let mut opts = options();
        opts.download_path = PathBuf::from("/library");
        opts.read_format = Format::Epub;

        let temp = opts.read_download_options();
        assert_eq!(temp.format, Format::Epub);
        assert!(temp.directory.starts_with(std::env::temp_dir()));

        opts.download_on_read = true;
        assert_eq!(
            opts.read_download_options().directory,
            PathBuf::from("/library")
        );
    }
}
