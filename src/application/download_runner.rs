use std::path::Path;

use futures::{stream::BoxStream, FutureExt, StreamExt};
use tokio::io::AsyncWriteExt;

use crate::{
    api::ApiClient,
    domain::{AppError, BatchSummary, Catalog, DownloadTask, TaskStatus},
    utils::{file_name_from_url, ChunkBuffer},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchEvent {
    /// The task moved to InProgress.
    Started {
        name: String,
    },
    /// The server announced the size of the body.
    SizeKnown {
        name: String,
        expected_size: u64,
    },
    Progress {
        name: String,
        bytes_written: u64,
        expected_size: u64,
    },
    Terminal {
        name: String,
        status: TaskStatus,
    },
    Finished(BatchSummary),
}

#[derive(Clone)]
pub struct DownloadRunner {
    api_client: ApiClient,
}

impl DownloadRunner {
    pub fn new(api_client: ApiClient) -> Self {
        Self { api_client }
    }

    /// Turns a selection into tasks, in catalog order. Touches neither the
    /// network nor the disk.
    pub fn select_tasks(
        &self,
        catalog: &Catalog,
        selected: &[String],
        output_dir: &Path,
    ) -> Result<Vec<DownloadTask>, AppError> {
        if selected.is_empty() {
            return Err(AppError::NoSelection);
        }

        if let Some(unknown) = selected.iter().find(|name| catalog.get(name).is_none()) {
            return Err(AppError::UnknownEntry(unknown.clone()));
        }

        Ok(catalog
            .entries()
            .iter()
            .filter(|entry| selected.contains(&entry.name))
            .map(|entry| DownloadTask::new(entry.clone(), output_dir))
            .collect())
    }

    pub async fn create_output_dir(&self, output_dir: &Path) -> Result<(), AppError> {
        tokio::fs::create_dir_all(output_dir).await.map_err(|e| {
            AppError::Filesystem(format!(
                "Failed to create {}: {}",
                output_dir.display(),
                e
            ))
        })
    }

    /// [`select_tasks`](Self::select_tasks), then creates `output_dir`.
    /// The directory is left alone when the selection is rejected.
    pub async fn prepare_batch(
        &self,
        catalog: &Catalog,
        selected: &[String],
        output_dir: &Path,
    ) -> Result<Vec<DownloadTask>, AppError> {
        let tasks = self.select_tasks(catalog, selected, output_dir)?;
        self.create_output_dir(output_dir).await?;
        Ok(tasks)
    }

    /// Downloads every task in order, one at a time.
    /// A failed task never stops the ones after it.
    pub async fn run_batch<P, T>(
        &self,
        tasks: &mut [DownloadTask],
        mut on_progress: P,
        mut on_terminal: T,
    ) -> BatchSummary
    where
        P: FnMut(&str, u64, u64),
        T: FnMut(&str, TaskStatus),
    {
        self.run_batch_with(tasks, |event| match event {
            BatchEvent::Progress {
                name,
                bytes_written,
                expected_size,
            } => on_progress(&name, bytes_written, expected_size),
            BatchEvent::Terminal { name, status } => on_terminal(&name, status),
            BatchEvent::Started { .. } | BatchEvent::SizeKnown { .. } | BatchEvent::Finished(_) => {}
        })
        .await
    }

    async fn run_batch_with<E>(&self, tasks: &mut [DownloadTask], mut emit: E) -> BatchSummary
    where
        E: FnMut(BatchEvent),
    {
        let mut summary = BatchSummary::default();

        for task in tasks.iter_mut() {
            task.transition(TaskStatus::InProgress);
            log::info!("Downloading {} from {}", task.name(), task.entry.url);
            emit(BatchEvent::Started {
                name: task.name().to_string(),
            });

            let status = match self.run_task(task, &mut emit).await {
                Ok(()) => {
                    if let Some(path) = &task.destination_path {
                        log::info!(
                            "Finished {} ({} bytes) -> {}",
                            task.name(),
                            task.bytes_written,
                            path.display()
                        );
                    }
                    TaskStatus::Done
                }
                Err(e) => {
                    log::warn!("Failed {}: {}", task.name(), e);
                    TaskStatus::Failed
                }
            };

            task.transition(status);
            summary.record(status);
            emit(BatchEvent::Terminal {
                name: task.name().to_string(),
                status,
            });
        }

        summary
    }

    /// Runs a batch in the background and yields its events, ending with
    /// [`BatchEvent::Finished`].
    pub fn batch_events(&self, mut tasks: Vec<DownloadTask>) -> BoxStream<'static, BatchEvent> {
        let (sender, receiver) = futures::channel::mpsc::unbounded();
        let runner = self.clone();

        let worker = async move {
            let events = sender.clone();
            let summary = runner
                .run_batch_with(&mut tasks, move |event| {
                    let _ = events.unbounded_send(event);
                })
                .await;

            let _ = sender.unbounded_send(BatchEvent::Finished(summary));
        };

        // The worker never yields items itself; the stream ends once it is done
        // and every sender has been dropped.
        futures::stream::select(
            receiver,
            worker.into_stream().filter_map(|()| async { None }),
        )
        .boxed()
    }

    async fn run_task<E>(&self, task: &mut DownloadTask, emit: &mut E) -> Result<(), AppError>
    where
        E: FnMut(BatchEvent),
    {
        let url = task.entry.url.clone();

        task.expected_size = match self.api_client.probe_size(&url).await {
            Ok(Some(size)) => Some(size),
            Ok(None) => {
                log::debug!("{}: server did not report a size", task.name());
                None
            }
            Err(e) => {
                log::warn!("{}", AppError::MetadataProbe(format!("{}: {}", task.name(), e)));
                None
            }
        };
        if let Some(expected_size) = task.expected_size {
            emit(BatchEvent::SizeKnown {
                name: task.name().to_string(),
                expected_size,
            });
        }

        let file_name = file_name_from_url(&url)
            .ok_or_else(|| AppError::InvalidUrl(format!("no file name in '{}'", url)))?;
        let path = task.destination_dir.join(file_name);
        task.destination_path = Some(path.clone());

        let mut stream = self
            .api_client
            .download_file_stream(&url)
            .await
            .map_err(|e| AppError::Transfer(e.to_string()))?;

        let mut file = tokio::fs::File::create(&path)
            .await
            .map_err(|e| AppError::Filesystem(format!("Failed to create file: {}", e)))?;

        let result = async {
            let mut buffer = ChunkBuffer::new(self.api_client.config().chunk_size);

            while let Some(bytes) = stream.next().await {
                let bytes = bytes.map_err(|e| AppError::Transfer(e.to_string()))?;
                for chunk in buffer.push(&bytes) {
                    write_chunk(&mut file, task, &chunk, emit).await?;
                }
            }
            if let Some(chunk) = buffer.finish() {
                write_chunk(&mut file, task, &chunk, emit).await?;
            }

            file.flush()
                .await
                .map_err(|e| AppError::Filesystem(format!("Failed to flush file: {}", e)))
        }
        .await;

        drop(file);

        match result {
            Ok(()) => {
                if task.expected_size.is_none() {
                    emit(BatchEvent::Progress {
                        name: task.name().to_string(),
                        bytes_written: 1,
                        expected_size: 1,
                    });
                }
                Ok(())
            }
            Err(e) => {
                remove_partial(&path).await;
                Err(e)
            }
        }
    }
}

async fn write_chunk<E>(
    file: &mut tokio::fs::File,
    task: &mut DownloadTask,
    chunk: &[u8],
    emit: &mut E,
) -> Result<(), AppError>
where
    E: FnMut(BatchEvent),
{
    if chunk.is_empty() {
        return Ok(());
    }

    file.write_all(chunk)
        .await
        .map_err(|e| AppError::Filesystem(format!("Write error: {}", e)))?;

    let bytes_written = task.record_chunk(chunk.len());
    if let Some(expected_size) = task.expected_size {
        emit(BatchEvent::Progress {
            name: task.name().to_string(),
            bytes_written,
            expected_size,
        });
    }

    Ok(())
}

async fn remove_partial(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        log::debug!("Could not remove partial file {}: {}", path.display(), e);
    }
}
