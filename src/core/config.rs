//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `<config dir>/mangal/mangal.toml`. If missing on first
//! run, a commented-out default is generated so users can discover all options.
//! The TUI only ever reads configuration; nothing here is written back.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::client::Format;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct MangalConfig {
    #[serde(default)]
    pub download: DownloadConfig,
    #[serde(default)]
    pub read: ReadConfig,
    #[serde(default)]
    pub tui: TuiConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct DownloadConfig {
    pub format: Option<Format>,
    pub path: Option<PathBuf>,
    pub skip_if_exists: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ReadConfig {
    pub format: Option<Format>,
    pub download_on_read: Option<bool>,
    pub reader: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct TuiConfig {
    pub expand_single_volume: Option<bool>,
    pub show_breadcrumbs: Option<bool>,
    pub notification_ms: Option<u64>,
    #[serde(default)]
    pub chapter: ChapterConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ChapterConfig {
    pub show_number: Option<bool>,
    pub show_volume_number: Option<bool>,
    pub show_date: Option<bool>,
    pub show_group: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct CatalogConfig {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct LogConfig {
    pub file: Option<PathBuf>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_DOWNLOAD_FORMAT: Format = Format::Pdf;
pub const DEFAULT_READ_FORMAT: Format = Format::Pdf;
pub const DEFAULT_NOTIFICATION_MS: u64 = 1000;
pub const DEFAULT_CATALOG_FILE: &str = "catalog.json";
pub const DEFAULT_LOG_FILE: &str = "mangal.log";

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub download_format: Format,
    pub download_path: PathBuf,
    pub skip_if_exists: bool,
    pub read_format: Format,
    pub download_on_read: bool,
    pub reader: Option<String>,
    pub expand_single_volume: bool,
    pub show_breadcrumbs: bool,
    pub notification_ms: u64,
    pub chapter: ChapterDisplay,
    pub catalog_path: PathBuf,
    pub log_file: PathBuf,
}

/// Which optional parts of a chapter row are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChapterDisplay {
    pub show_number: bool,
    pub show_volume_number: bool,
    pub show_date: bool,
    pub show_group: bool,
}

impl Default for ChapterDisplay {
    fn default() -> Self {
        Self {
            show_number: true,
            show_volume_number: false,
            show_date: false,
            show_group: false,
        }
    }
}

/// Values given on the command line; `None` means "not specified".
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub catalog: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `<config dir>/mangal/mangal.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("mangal").join("mangal.toml"))
}

/// Returns `<data dir>/mangal`, where the catalog and log live by default.
pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("mangal"))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Load config from the given path, or the default location.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `MangalConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config(path: Option<&Path>) -> Result<MangalConfig, ConfigError> {
    let path = match path.map(Path::to_path_buf).or_else(config_path) {
        Some(p) => p,
        None => {
            warn!("Could not determine config directory, using default config");
            return Ok(MangalConfig::default());
        }
    };

    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(&path);
        return Ok(MangalConfig::default());
    }

    let contents = fs::read_to_string(&path).map_err(ConfigError::Io)?;
    let config = parse_config(&contents)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

pub fn parse_config(contents: &str) -> Result<MangalConfig, ConfigError> {
    toml::from_str(contents).map_err(ConfigError::Parse)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    let default_content = r#"# Mangal TUI Configuration
# All settings are optional; defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [download]
# format = "pdf"                  # pdf, cbz, epub, images, tar, tar.gz, zip
# path = "~/Downloads/mangal"
# skip_if_exists = true

# [read]
# format = "pdf"
# download_on_read = false        # false: files opened for reading go to a temp dir
# reader = "zathura"              # defaults to xdg-open / open

# [tui]
# expand_single_volume = true
# show_breadcrumbs = true
# notification_ms = 1000

# [tui.chapter]
# show_number = true
# show_volume_number = false
# show_date = false
# show_group = false

# [catalog]
# path = "catalog.json"

# [log]
# file = "mangal.log"
"#;

    if let Some(parent) = path.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        warn!("Failed to create config directory: {}", e);
        return;
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

fn env_format(name: &str) -> Option<Format> {
    let value = std::env::var(name).ok()?;
    match value.parse() {
        Ok(format) => Some(format),
        Err(e) => {
            warn!("Ignoring {name}: {e}");
            None
        }
    }
}

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
pub fn resolve(config: &MangalConfig, cli: &CliOverrides) -> ResolvedConfig {
    // Formats: env → config → default
    let download_format = env_format("MANGAL_DOWNLOAD_FORMAT")
        .or(config.download.format)
        .unwrap_or(DEFAULT_DOWNLOAD_FORMAT);
    let read_format = env_format("MANGAL_READ_FORMAT")
        .or(config.read.format)
        .unwrap_or(DEFAULT_READ_FORMAT);

    // Download path: env → config → ~/Downloads/mangal
    let download_path = std::env::var("MANGAL_DOWNLOAD_PATH")
        .ok()
        .map(PathBuf::from)
        .or_else(|| config.download.path.clone())
        .or_else(|| dirs::download_dir().map(|d| d.join("mangal")))
        .unwrap_or_else(|| data_dir().join("downloads"));

    // Catalog: CLI → env → config → data dir
    let catalog_path = cli
        .catalog
        .clone()
        .or_else(|| std::env::var("MANGAL_CATALOG").ok().map(PathBuf::from))
        .or_else(|| config.catalog.path.clone())
        .unwrap_or_else(|| data_dir().join(DEFAULT_CATALOG_FILE));

    // Log file: CLI → config → data dir
    let log_file = cli
        .log_file
        .clone()
        .or_else(|| config.log.file.clone())
        .unwrap_or_else(|| data_dir().join(DEFAULT_LOG_FILE));

    let defaults = ChapterDisplay::default();
    let chapter = ChapterDisplay {
        show_number: config.tui.chapter.show_number.unwrap_or(defaults.show_number),
        show_volume_number: config
            .tui
            .chapter
            .show_volume_number
            .unwrap_or(defaults.show_volume_number),
        show_date: config.tui.chapter.show_date.unwrap_or(defaults.show_date),
        show_group: config.tui.chapter.show_group.unwrap_or(defaults.show_group),
    };

    ResolvedConfig {
        download_format,
        download_path,
        skip_if_exists: config.download.skip_if_exists.unwrap_or(true),
        read_format,
        download_on_read: config.read.download_on_read.unwrap_or(false),
        reader: config.read.reader.clone(),
        expand_single_volume: config.tui.expand_single_volume.unwrap_or(true),
        show_breadcrumbs: config.tui.show_breadcrumbs.unwrap_or(true),
        notification_ms: config
            .tui
            .notification_ms
            .unwrap_or(DEFAULT_NOTIFICATION_MS),
        chapter,
        catalog_path,
        log_file,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_parses() {
        let config = MangalConfig::default();
        assert!(config.download.format.is_none());
        assert!(config.tui.chapter.show_date.is_none());
    }

    #[test]
    fn test_resolve_uses_defaults_when_empty() {
        let config = MangalConfig::default();
        let resolved = resolve(&config, &CliOverrides::default());
        assert_eq!(resolved.notification_ms, DEFAULT_NOTIFICATION_MS);
        assert!(resolved.expand_single_volume);
        assert!(!resolved.download_on_read);
        assert_eq!(resolved.chapter, ChapterDisplay::default());
        assert!(resolved.log_file.ends_with(DEFAULT_LOG_FILE));
    }

    #[test]
    fn test_resolve_config_values_override_defaults() {
        let config = parse_config(
            r#"
[download]
format = "cbz"
path = "/tmp/manga"

[read]
format = "epub"
download_on_read = true
reader = "zathura"

[tui]
expand_single_volume = false
notification_ms = 2500

[tui.chapter]
show_date = true
show_group = true
"#,
        )
        .unwrap();
        let resolved = resolve(&config, &CliOverrides::default());
        assert_eq!(resolved.read_format, Format::Epub);
        assert!(resolved.download_on_read);
        assert_eq!(resolved.reader.as_deref(), Some("zathura"));
        assert!(!resolved.expand_single_volume);
        assert_eq!(resolved.notification_ms, 2500);
        assert!(resolved.chapter.show_date);
        assert!(resolved.chapter.show_group);
        assert!(resolved.chapter.show_number);
    }

    #[test]
    fn test_resolve_cli_catalog_wins() {
        let config = parse_config(
            r#"
[catalog]
path = "/etc/mangal/catalog.json"
"#,
        )
        .unwrap();
        let cli = CliOverrides {
            catalog: Some(PathBuf::from("/home/me/catalog.json")),
            log_file: None,
        };
        let resolved = resolve(&config, &cli);
        assert_eq!(resolved.catalog_path, PathBuf::from("/home/me/catalog.json"));
    }

    #[test]
    fn test_sparse_toml_parses() {
        let config = parse_config(
            r#"
[tui]
show_breadcrumbs = false
"#,
        )
        .unwrap();
        assert_eq!(config.tui.show_breadcrumbs, Some(false));
        assert!(config.download.path.is_none());
        assert!(config.tui.chapter.show_number.is_none());
    }

    #[test]
    fn test_unknown_format_is_a_parse_error() {
        let result = parse_config(
            r#"
[download]
format = "mobi"
"#,
        );
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
