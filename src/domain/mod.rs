pub mod catalog;
pub mod error;
pub mod model;

pub use catalog::{Catalog, CatalogEntry};
pub use error::AppError;
pub use model::{BatchSummary, DownloadTask, TaskStatus};
