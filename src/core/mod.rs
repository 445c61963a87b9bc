//! # Core
//!
//! UI-agnostic pieces shared by the client and the TUI: configuration,
//! session options, the in-memory logbook and the application error type.
//! Nothing in here knows about ratatui or crossterm.
//!
//! ## Modules
//!
//! - [`config`]: sparse TOML config and its resolution into concrete values
//! - [`options`]: session-wide runtime options derived from the config
//! - [`logbook`]: recent log lines for the log viewer
//! - [`error`]: the `AppError` shown on the error screen

pub mod config;
pub mod error;
pub mod logbook;
pub mod options;
