use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use log::{error, info};
use simplelog::{CombinedLogger, ConfigBuilder, LevelFilter, SharedLogger, WriteLogger};

use mangal_tui::client::CatalogClient;
use mangal_tui::core::config::{self, CliOverrides, ResolvedConfig};
use mangal_tui::core::error::AppError;
use mangal_tui::core::logbook::Logbook;
use mangal_tui::core::options::{Options, SharedOptions};
use mangal_tui::tui::screens::{Services, error_screen_factory, home, text_screen_factory};
use mangal_tui::tui::{self, Navigator, NavigatorOptions};

#[derive(Parser)]
#[command(name = "mangal", about = "Browse, download and read manga from the terminal")]
struct Args {
    /// Search for this title right away
    query: Option<String>,

    /// Catalog file to browse
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Config file to use instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,

    /// Where to write the log
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn init_logging(path: &Path, logbook: &Logbook) {
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![Box::new(logbook.clone())];
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    match File::create(path) {
        Ok(file) => loggers.push(WriteLogger::new(LevelFilter::Debug, log_config, file)),
        Err(e) => eprintln!("Can't write log to {}: {e}", path.display()),
    }
    let _ = CombinedLogger::init(loggers);
}

fn navigator(
    resolved: &ResolvedConfig,
    query: Option<&str>,
    logbook: Logbook,
) -> Result<Navigator, AppError> {
    let client =
        CatalogClient::load(&resolved.catalog_path)?.with_reader(resolved.reader.clone());
    let services = Services::new(
        Arc::new(client),
        SharedOptions::new(Options::from(resolved)),
    );
    Ok(Navigator::new(
        Box::new(home(services, query)),
        error_screen_factory(),
        text_screen_factory(),
    )
    .with_options(NavigatorOptions {
        notification_duration: Duration::from_millis(resolved.notification_ms),
        show_breadcrumbs: resolved.show_breadcrumbs,
    })
    .with_logbook(logbook))
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    dotenv::dotenv().ok();

    let file_config = match config::load_config(args.config.as_deref()) {
        Ok(file_config) => file_config,
        Err(e) => {
            eprintln!("mangal: {e}");
            return ExitCode::FAILURE;
        }
    };
    let resolved = config::resolve(
        &file_config,
        &CliOverrides {
            catalog: args.catalog,
            log_file: args.log_file,
        },
    );

    let logbook = Logbook::default();
    init_logging(&resolved.log_file, &logbook);
    info!("Mangal starting with catalog {}", resolved.catalog_path.display());

    let navigator = match navigator(&resolved, args.query.as_deref(), logbook) {
        Ok(navigator) => navigator,
        Err(e) => {
            error!("Startup failed: {e}");
            eprintln!("mangal: {e}");
            return ExitCode::FAILURE;
        }
    };

    match tui::run(navigator) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Terminal error: {e}");
            eprintln!("mangal: {e}");
            ExitCode::FAILURE
        }
    }
}
