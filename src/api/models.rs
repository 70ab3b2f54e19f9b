use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the HTTP client and the download runner
#[derive(Debug, Clone)]
pub struct DownloaderConfig {
    /// Total time allowed for the HEAD size probe.
    pub probe_timeout: Duration,
    /// Applied to connection establishment and to each body read.
    pub transfer_timeout: Duration,
    pub chunk_size: usize,
    pub output_dir: PathBuf,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            probe_timeout: Duration::from_secs(15),
            transfer_timeout: Duration::from_secs(30),
            chunk_size: 128 * 1024,
            output_dir: PathBuf::from("downloads"),
        }
    }
}
