use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    #[error("Please select at least one program to download.")]
    NoSelection,

    #[error("Unknown program: {0}")]
    UnknownEntry(String),

    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),

    #[error("Metadata probe failed: {0}")]
    MetadataProbe(String),

    #[error("Transfer failed: {0}")]
    Transfer(String),

    #[error("I/O error: {0}")]
    Filesystem(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}
