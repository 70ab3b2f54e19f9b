pub mod download_runner;

pub use download_runner::{BatchEvent, DownloadRunner};
