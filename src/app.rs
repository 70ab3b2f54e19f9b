use crate::api::DownloaderConfig;
use crate::application::{BatchEvent, DownloadRunner};
use crate::domain::{AppError, Catalog, DownloadTask};
use crate::ui::{CatalogMessage, CatalogView};
use futures::StreamExt;
use iced::Task;
use std::path::PathBuf;

pub struct DownloaderApp {
    view: CatalogView,
    catalog: Catalog,
    runner: DownloadRunner,
    config: DownloaderConfig,
}

impl DownloaderApp {
    pub fn new(catalog: Catalog, runner: DownloadRunner, config: DownloaderConfig) -> Self {
        let names = catalog
            .entries()
            .iter()
            .map(|entry| entry.name.clone())
            .collect();
        let output_dir = std::env::current_dir()
            .map(|cwd| cwd.join(&config.output_dir))
            .unwrap_or_else(|_| config.output_dir.clone());
        let view = CatalogView::new(names, output_dir.display().to_string());

        Self {
            view,
            catalog,
            runner,
            config,
        }
    }

    fn output_dir(&self) -> PathBuf {
        let typed = self.view.output_dir.trim();
        if typed.is_empty() {
            self.config.output_dir.clone()
        } else {
            PathBuf::from(typed)
        }
    }

    fn start_batch(&mut self) -> Task<Message> {
        // A batch is already in flight; the trigger is ignored until it finishes.
        if self.view.is_downloading {
            return Task::none();
        }

        let selected = self.view.selected_names();
        let output_dir = self.output_dir();
        self.view.rows.clear();

        match self
            .runner
            .select_tasks(&self.catalog, &selected, &output_dir)
        {
            Ok(tasks) => {
                log::info!(
                    "Starting batch of {} into {}",
                    tasks.len(),
                    output_dir.display()
                );
                self.view
                    .start_batch(tasks.iter().map(|task| task.name().to_string()).collect());

                // The folder is created off the event loop; the batch starts
                // once `BatchPrepared` comes back.
                let runner = self.runner.clone();
                Task::perform(
                    async move {
                        runner.create_output_dir(&output_dir).await?;
                        Ok::<_, AppError>(tasks)
                    },
                    Message::BatchPrepared,
                )
            }
            Err(e) => self.abort_batch(e),
        }
    }

    fn abort_batch(&mut self, error: AppError) -> Task<Message> {
        log::warn!("Batch not started: {}", error);
        self.view.rows.clear();
        self.view.is_downloading = false;
        self.view.status_message = error.to_string();
        notify(error)
    }
}

#[derive(Debug, Clone)]
pub enum Message {
    UiMessage(CatalogMessage),
    FolderSelected(Option<PathBuf>),
    BatchPrepared(Result<Vec<DownloadTask>, AppError>),
    Batch(BatchEvent),
    NoticeDismissed,
}

/// Blocking warning dialog for errors raised before a batch starts.
fn notify(error: AppError) -> Task<Message> {
    let title = match error {
        AppError::NoSelection => "No selection",
        _ => "Cannot start download",
    };
    let description = error.to_string();

    Task::perform(
        async move {
            rfd::AsyncMessageDialog::new()
                .set_level(rfd::MessageLevel::Warning)
                .set_title(title)
                .set_description(description)
                .set_buttons(rfd::MessageButtons::Ok)
                .show()
                .await;
        },
        |()| Message::NoticeDismissed,
    )
}

pub fn update(app: &mut DownloaderApp, message: Message) -> Task<Message> {
    match message {
        Message::UiMessage(ui_msg) => {
            app.view.update(ui_msg.clone());

            match ui_msg {
                CatalogMessage::DownloadPressed => return app.start_batch(),
                CatalogMessage::BrowsePressed => {
                    let current = app.output_dir();
                    return Task::perform(
                        async move {
                            rfd::AsyncFileDialog::new()
                                .set_directory(&current)
                                .pick_folder()
                                .await
                                .map(|handle| handle.path().to_path_buf())
                        },
                        Message::FolderSelected,
                    );
                }
                CatalogMessage::ProgramToggled(..) | CatalogMessage::OutputDirChanged(_) => {}
            }
        }
        Message::FolderSelected(folder) => {
            // Cancelling the picker keeps the current folder.
            if let Some(folder) = folder {
                app.view.output_dir = folder.display().to_string();
            }
        }
        Message::BatchPrepared(Ok(tasks)) => {
            // Runs off the event loop; every event comes back through `update`.
            return Task::stream(app.runner.batch_events(tasks).map(Message::Batch));
        }
        Message::BatchPrepared(Err(e)) => return app.abort_batch(e),
        Message::Batch(event) => {
            if let BatchEvent::Finished(summary) = &event {
                log::info!(
                    "Batch finished: {} done, {} failed",
                    summary.done,
                    summary.failed
                );
            }
            app.view.apply(event);
        }
        Message::NoticeDismissed => {}
    }
    Task::none()
}

pub fn view(app: &DownloaderApp) -> iced::Element<'_, Message> {
    app.view.view().map(Message::UiMessage)
}
