//! Color key viewer
//!
//! Makes a chosen color of a raster image transparent within a tolerance
//! band and keeps a catalog of keyed images grouped by name.
//!
//! # Architecture
//! - `chroma-key`: the pure pixel transform
//! - `sqldb`: the SQLite catalog
//! - `logic`: the navigation session and the sinks it talks to
//! - `config` / `cli`: configuration file and command line
//! - Terminal front-end: stdin prompts plus a PNG preview file

#[macro_use]
extern crate derivative;

pub mod cli;
pub mod config;
pub mod db;
pub mod logic;

use anyhow::Result;
use cli::{Cli, StartCommand};
use logic::{Mode, NavigationSession, command, terminal};

/// Initializes the logger
///
/// Sets up a custom logger format with timestamp, log level, file name, line number,
/// and log message. Uses local time format for timestamps.
pub fn init_logger() {
    use std::io::Write;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .filter_module("sqlx", log::LevelFilter::Warn)
        .format(|buf, record| {
            let style = buf.default_level_style(record.level());
            let ts = chrono::Local::now().format("%H:%M:%S");

            writeln!(
                buf,
                "[{} {style}{}{style:#} {} {}] {}",
                ts,
                record.level(),
                record
                    .file()
                    .unwrap_or("None")
                    .split('/')
                    .next_back()
                    .unwrap_or("None"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .init();
}

/// Entry point of the terminal application
///
/// # Tasks
/// - Loads configuration
/// - Opens the catalog
/// - Loads the first image or group
/// - Runs the command loop until `quit` or end of input
pub async fn cli_main(cli: Cli) -> Result<()> {
    log::debug!("start...");

    config::init()?;
    let conf = config::all();

    let db_path = cli.db.unwrap_or(conf.db_path);
    let preview_path = cli.preview.unwrap_or(conf.preview_path);
    let store = db::init(&db_path).await?;

    if cli.command == Some(StartCommand::Groups) {
        for group in store.list_groups().await? {
            println!("{group}");
        }
        return Ok(());
    }

    let mut session = NavigationSession::new(
        store,
        terminal::PreviewDisplay::new(&preview_path),
        terminal::TerminalDecisions::stdio(),
        conf.preference.key_config(),
    );

    match cli.command {
        Some(StartCommand::Open { file }) => {
            let result = session.load_single_file(file);
            session.report(result);
        }
        Some(StartCommand::Group { name }) => {
            let result = session.load_group(&name).await;
            session.report(result);
        }
        Some(StartCommand::Groups) | None => session.open().await,
    }

    if session.mode() == Mode::Idle {
        log::info!("nothing loaded, exit...");
        return Ok(());
    }

    log::info!("preview: {}", preview_path.display());
    command::run(&mut session).await;

    log::debug!("exit...");
    Ok(())
}
