mod api;
mod app;
mod application;
mod cli;
mod domain;
mod ui;
mod utils;

use std::process::ExitCode;

use clap::Parser;
use iced::{window, Size};

use crate::api::ApiClient;
use crate::application::DownloadRunner;
use crate::domain::Catalog;

fn main() -> ExitCode {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("installer_downloader=info"),
    )
    .init();

    let cli = cli::Cli::parse();
    let config = cli.config();
    let catalog = match Catalog::builtin() {
        Ok(catalog) => catalog,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    if cli.list {
        return cli::print_catalog(&catalog, cli.json);
    }

    let runner = match ApiClient::new(config.clone()) {
        Ok(client) => DownloadRunner::new(client),
        Err(e) => {
            log::error!("Failed to build HTTP client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if cli.headless {
        return cli::run_headless(&cli, &runner, &catalog, &config);
    }

    let result = iced::application(
        move || app::DownloaderApp::new(catalog.clone(), runner.clone(), config.clone()),
        app::update,
        app::view,
    )
    .title(ui::WINDOW_TITLE)
    .window(window::Settings {
        size: Size::new(640.0, 720.0),
        ..Default::default()
    })
    .run();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("GUI error: {}", e);
            ExitCode::FAILURE
        }
    }
}
