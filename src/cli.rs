use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;

use crate::api::DownloaderConfig;
use crate::application::DownloadRunner;
use crate::domain::{AppError, BatchSummary, Catalog, TaskStatus};
use crate::utils::human_size;

#[derive(Parser, Debug)]
#[command(name = "installer-downloader")]
#[command(about = "Download installers from a built-in catalog")]
#[command(version)]
pub struct Cli {
    /// Download without opening a window
    #[arg(long)]
    pub headless: bool,

    /// Print the catalog and exit
    #[arg(long)]
    pub list: bool,

    /// Print the catalog as JSON
    #[arg(long, requires = "list")]
    pub json: bool,

    /// Program to download (repeatable)
    #[arg(short, long = "select", value_name = "NAME")]
    pub select: Vec<String>,

    /// Download every program in the catalog
    #[arg(long, conflicts_with = "select")]
    pub all: bool,

    /// Destination folder
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Bytes written per chunk
    #[arg(long, value_name = "BYTES")]
    pub chunk_size: Option<usize>,

    /// Seconds allowed for the size probe
    #[arg(long, value_name = "SECS")]
    pub probe_timeout: Option<u64>,

    /// Seconds allowed to connect and between body reads
    #[arg(long, value_name = "SECS")]
    pub transfer_timeout: Option<u64>,
}

impl Cli {
    pub fn config(&self) -> DownloaderConfig {
        let mut config = DownloaderConfig::default();
        if let Some(output) = &self.output {
            config.output_dir = output.clone();
        }
        if let Some(chunk_size) = self.chunk_size {
            config.chunk_size = chunk_size.max(1);
        }
        if let Some(secs) = self.probe_timeout {
            config.probe_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = self.transfer_timeout {
            config.transfer_timeout = Duration::from_secs(secs);
        }
        config
    }

    pub fn selection(&self, catalog: &Catalog) -> Vec<String> {
        if self.all {
            catalog
                .entries()
                .iter()
                .map(|entry| entry.name.clone())
                .collect()
        } else {
            self.select.clone()
        }
    }
}

pub fn print_catalog(catalog: &Catalog, json: bool) -> ExitCode {
    if json {
        return match serde_json::to_string_pretty(catalog.entries()) {
            Ok(out) => {
                println!("{out}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                log::error!("Failed to serialize catalog: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    for entry in catalog.entries() {
        println!("{:<28} {}", entry.name, entry.url);
    }
    ExitCode::SUCCESS
}

/// Runs one batch on the current thread's runtime.
pub async fn download(
    runner: &DownloadRunner,
    catalog: &Catalog,
    selected: &[String],
    config: &DownloaderConfig,
) -> Result<BatchSummary, AppError> {
    let mut tasks = runner
        .prepare_batch(catalog, selected, &config.output_dir)
        .await?;
    let mut last_percent: HashMap<String, u64> = HashMap::new();

    let summary = runner
        .run_batch(
            &mut tasks,
            |name, bytes_written, expected_size| {
                let percent = bytes_written * 100 / expected_size.max(1);
                if last_percent.insert(name.to_string(), percent) != Some(percent) {
                    println!(
                        "{name}: {percent:>3}% ({} / {})",
                        human_size(bytes_written),
                        human_size(expected_size)
                    );
                }
            },
            |name, status| match status {
                TaskStatus::Done => println!("{name} (Done ✔)"),
                TaskStatus::Failed => println!("{name} (Failed ❌)"),
                TaskStatus::Pending | TaskStatus::InProgress => {}
            },
        )
        .await;

    Ok(summary)
}

pub fn run_headless(
    cli: &Cli,
    runner: &DownloadRunner,
    catalog: &Catalog,
    config: &DownloaderConfig,
) -> ExitCode {
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            log::error!("Failed to start async runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let selected = cli.selection(catalog);
    match runtime.block_on(download(runner, catalog, &selected, config)) {
        Ok(summary) => {
            println!(
                "Finished: {} downloaded, {} failed",
                summary.done, summary.failed
            );
            if summary.failed == 0 {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiClient;

    #[test]
    fn test_config_overrides() {
        let cli = Cli::parse_from([
            "installer-downloader",
            "--headless",
            "-o",
            "/tmp/out",
            "--chunk-size",
            "4096",
            "--probe-timeout",
            "3",
        ]);
        let config = cli.config();
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.chunk_size, 4096);
        assert_eq!(config.probe_timeout, Duration::from_secs(3));
        assert_eq!(config.transfer_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_defaults() {
        let config = Cli::parse_from(["installer-downloader"]).config();
        assert_eq!(config.chunk_size, 128 * 1024);
        assert_eq!(config.output_dir, PathBuf::from("downloads"));
    }

    #[test]
    fn test_selection() {
        let catalog = Catalog::builtin().unwrap();
        let cli = Cli::parse_from(["installer-downloader", "--all"]);
        assert_eq!(cli.selection(&catalog).len(), catalog.entries().len());

        let cli = Cli::parse_from(["installer-downloader", "-s", "GIMP", "--select", "CPU-Z"]);
        assert_eq!(cli.selection(&catalog), vec!["GIMP", "CPU-Z"]);

        assert!(Cli::try_parse_from(["installer-downloader", "--all", "-s", "GIMP"]).is_err());
        assert!(Cli::try_parse_from(["installer-downloader", "--json"]).is_err());
    }

    #[tokio::test]
    async fn test_download_requires_selection() {
        let dir = tempfile::tempdir().unwrap();
        let config = DownloaderConfig {
            output_dir: dir.path().join("out"),
            ..Default::default()
        };
        let runner = DownloadRunner::new(ApiClient::new(config.clone()).unwrap());

        let result = download(&runner, &Catalog::builtin().unwrap(), &[], &config).await;

        assert_eq!(result, Err(AppError::NoSelection));
        assert!(!config.output_dir.exists());
    }

    #[tokio::test]
    async fn test_download_writes_into_output_dir() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("HEAD", "/tool.exe")
            .with_header("content-length", "64")
            .create_async()
            .await;
        server
            .mock("GET", "/tool.exe")
            .with_body(vec![2u8; 64])
            .create_async()
            .await;

        let catalog = Catalog::new(vec![crate::domain::CatalogEntry::new(
            "Tool",
            format!("{}/tool.exe", server.url()),
        )])
        .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let config = DownloaderConfig {
            output_dir: dir.path().join("nested").join("out"),
            ..Default::default()
        };
        let runner = DownloadRunner::new(ApiClient::new(config.clone()).unwrap());

        let summary = download(&runner, &catalog, &["Tool".to_string()], &config)
            .await
            .unwrap();

        assert_eq!(summary, BatchSummary { done: 1, failed: 0 });
        assert_eq!(
            std::fs::metadata(config.output_dir.join("tool.exe")).unwrap().len(),
            64
        );
    }
}
