use std::collections::HashSet;

use iced::{
    widget::{
        button, column, progress_bar, row, scrollable, text, text_input, toggler, Column, Space,
    },
    Element, Length,
};

use crate::application::BatchEvent;
use crate::domain::{BatchSummary, TaskStatus};
use crate::utils::human_size;

pub const CREDIT: &str = "by CeZeY";
pub const WINDOW_TITLE: &str = "Simple Downloader V2 by CeZeY";

/// Display state of one selected program during a batch.
#[derive(Debug, Clone)]
pub struct ProgressRow {
    pub name: String,
    pub bytes_written: u64,
    /// Only set once the server has announced a size.
    pub expected_size: Option<u64>,
    pub status: TaskStatus,
    /// The body of unknown size has been fully written.
    pub filled: bool,
}

impl ProgressRow {
    fn new(name: String) -> Self {
        Self {
            name,
            bytes_written: 0,
            expected_size: None,
            status: TaskStatus::Pending,
            filled: false,
        }
    }

    pub fn fraction(&self) -> f32 {
        match self.expected_size {
            Some(total) if total > 0 => (self.bytes_written as f32 / total as f32).min(1.0),
            _ if self.filled => 1.0,
            _ => 0.0,
        }
    }

    pub fn label(&self) -> String {
        match self.status {
            TaskStatus::Done => format!("{} (Done ✔)", self.name),
            TaskStatus::Failed => format!("{} (Failed ❌)", self.name),
            TaskStatus::Pending | TaskStatus::InProgress => self.name.clone(),
        }
    }

    pub fn caption(&self) -> String {
        match (self.status, self.expected_size) {
            (TaskStatus::Failed, _) => String::new(),
            (_, Some(total)) => format!(
                "{:.0}% ({} / {})",
                self.fraction() * 100.0,
                human_size(self.bytes_written),
                human_size(total)
            ),
            (TaskStatus::InProgress, None) => "downloading…".to_string(),
            (_, None) => String::new(),
        }
    }
}

/// Main view state
pub struct CatalogView {
    pub program_names: Vec<String>,
    pub selected: HashSet<String>,
    pub output_dir: String,
    pub rows: Vec<ProgressRow>,
    pub status_message: String,
    pub is_downloading: bool,
}

#[derive(Debug, Clone)]
pub enum CatalogMessage {
    ProgramToggled(String, bool),
    OutputDirChanged(String),
    BrowsePressed,
    DownloadPressed,
}

impl CatalogView {
    pub fn new(program_names: Vec<String>, output_dir: String) -> Self {
        Self {
            program_names,
            selected: HashSet::new(),
            output_dir,
            rows: Vec::new(),
            status_message: "Select programs to download".to_string(),
            is_downloading: false,
        }
    }

    /// Selected names in catalog order.
    pub fn selected_names(&self) -> Vec<String> {
        self.program_names
            .iter()
            .filter(|name| self.selected.contains(*name))
            .cloned()
            .collect()
    }

    pub fn update(&mut self, message: CatalogMessage) {
        match message {
            CatalogMessage::ProgramToggled(name, checked) => {
                if checked {
                    self.selected.insert(name);
                } else {
                    self.selected.remove(&name);
                }
            }
            CatalogMessage::OutputDirChanged(dir) => {
                self.output_dir = dir;
            }
            CatalogMessage::BrowsePressed | CatalogMessage::DownloadPressed => {
                // Will be handled by the app
            }
        }
    }

    pub fn start_batch(&mut self, names: Vec<String>) {
        self.rows = names.into_iter().map(ProgressRow::new).collect();
        self.is_downloading = true;
        self.status_message = "Downloading...".to_string();
    }

    pub fn apply(&mut self, event: BatchEvent) {
        match event {
            BatchEvent::Started { name } => {
                if let Some(row) = self.row_mut(&name) {
                    row.status = TaskStatus::InProgress;
                }
            }
            BatchEvent::SizeKnown {
                name,
                expected_size,
            } => {
                if let Some(row) = self.row_mut(&name) {
                    row.expected_size = Some(expected_size);
                }
            }
            BatchEvent::Progress {
                name,
                bytes_written,
                expected_size,
            } => {
                if let Some(row) = self.row_mut(&name) {
                    row.status = TaskStatus::InProgress;
                    if row.expected_size.is_some() {
                        row.bytes_written = bytes_written;
                        row.expected_size = Some(expected_size);
                    } else {
                        // (1, 1) completion signal for a body of unknown size.
                        row.filled = true;
                    }
                }
            }
            BatchEvent::Terminal { name, status } => {
                if let Some(row) = self.row_mut(&name) {
                    row.status = status;
                }
            }
            BatchEvent::Finished(summary) => self.finish(summary),
        }
    }

    fn finish(&mut self, summary: BatchSummary) {
        self.is_downloading = false;
        self.status_message = if summary.failed == 0 {
            format!("Finished: {} downloaded", summary.done)
        } else {
            format!(
                "Finished: {} downloaded, {} failed",
                summary.done, summary.failed
            )
        };
    }

    fn row_mut(&mut self, name: &str) -> Option<&mut ProgressRow> {
        self.rows.iter_mut().find(|row| row.name == name)
    }

    pub fn view(&self) -> Element<'_, CatalogMessage> {
        let toggles = self.program_names.iter().map(|name| {
            let name = name.clone();
            toggler(self.selected.contains(&name))
                .label(name.clone())
                .on_toggle(move |checked| CatalogMessage::ProgramToggled(name.clone(), checked))
                .into()
        });
        let programs: Column<'_, CatalogMessage> =
            Column::with_children(toggles).spacing(6).padding([0, 15]);

        let bars = self.rows.iter().map(|progress_row| {
            row![
                text(progress_row.label()).width(Length::Fixed(240.0)),
                progress_bar(0.0..=1.0, progress_row.fraction()),
                text(progress_row.caption()).size(12).width(Length::Fixed(200.0)),
            ]
            .spacing(10)
            .into()
        });
        let progress: Column<'_, CatalogMessage> = Column::with_children(bars).spacing(4);

        let download = button("Download Selected")
            .on_press_maybe((!self.is_downloading).then_some(CatalogMessage::DownloadPressed))
            .padding([10, 20]);

        column![
            text("Select programs to download:").size(16),
            programs,
            Space::new().height(Length::Fixed(10.0)),
            text("Download folder:").size(16),
            row![
                text_input("Folder...", &self.output_dir)
                    .on_input(CatalogMessage::OutputDirChanged)
                    .padding(10),
                button("Browse")
                    .on_press(CatalogMessage::BrowsePressed)
                    .padding([10, 20]),
            ]
            .spacing(10),
            download,
            text(&self.status_message).size(14),
            scrollable(progress).height(Length::Fill),
            text(CREDIT).size(12),
        ]
        .padding(20)
        .spacing(10)
        .into()
    }
}
