use std::path::{Path, PathBuf};

use super::CatalogEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    InProgress,
    Done,
    Failed,
}

impl TaskStatus {
    /// Pending -> InProgress -> {Done, Failed}, never backward.
    pub fn can_become(self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (TaskStatus::Pending, TaskStatus::InProgress)
                | (TaskStatus::InProgress, TaskStatus::Done)
                | (TaskStatus::InProgress, TaskStatus::Failed)
        )
    }
}

/// One file's download within a batch.
#[derive(Debug, Clone)]
pub struct DownloadTask {
    pub entry: CatalogEntry,
    pub destination_dir: PathBuf,
    pub destination_path: Option<PathBuf>,
    pub expected_size: Option<u64>,
    pub bytes_written: u64,
    pub status: TaskStatus,
}

impl DownloadTask {
    pub fn new(entry: CatalogEntry, destination_dir: impl AsRef<Path>) -> Self {
        Self {
            entry,
            destination_dir: destination_dir.as_ref().to_path_buf(),
            destination_path: None,
            expected_size: None,
            bytes_written: 0,
            status: TaskStatus::Pending,
        }
    }

    pub fn name(&self) -> &str {
        &self.entry.name
    }

    /// Moves to `next` if the transition is legal. Returns whether it happened.
    pub fn transition(&mut self, next: TaskStatus) -> bool {
        if self.status.can_become(next) {
            self.status = next;
            true
        } else {
            false
        }
    }

    /// Adds a written chunk and returns the new total.
    pub fn record_chunk(&mut self, len: usize) -> u64 {
        if self.status == TaskStatus::InProgress {
            self.bytes_written += len as u64;
        }
        self.bytes_written
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub done: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn record(&mut self, status: TaskStatus) {
        match status {
            TaskStatus::Done => self.done += 1,
            TaskStatus::Failed => self.failed += 1,
            TaskStatus::Pending | TaskStatus::InProgress => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task() -> DownloadTask {
        DownloadTask::new(CatalogEntry::new("X", "http://host/file.exe"), "out")
    }

    #[test]
    fn test_status_moves_forward_only() {
        let mut task = task();
        assert!(!task.transition(TaskStatus::Done));
        assert!(task.transition(TaskStatus::InProgress));
        assert!(!task.transition(TaskStatus::Pending));
        assert!(task.transition(TaskStatus::Failed));
        assert!(!task.transition(TaskStatus::Done));
        assert!(!task.transition(TaskStatus::InProgress));
        assert_eq!(task.status, TaskStatus::Failed);
    }

    #[test]
    fn test_bytes_only_counted_while_in_progress() {
        let mut task = task();
        assert_eq!(task.record_chunk(10), 0);
        task.transition(TaskStatus::InProgress);
        assert_eq!(task.record_chunk(10), 10);
        assert_eq!(task.record_chunk(5), 15);
        task.transition(TaskStatus::Done);
        assert_eq!(task.record_chunk(5), 15);
    }

    #[test]
    fn test_summary_counts_terminal_states() {
        let mut summary = BatchSummary::default();
        summary.record(TaskStatus::Done);
        summary.record(TaskStatus::Failed);
        summary.record(TaskStatus::Pending);
        assert_eq!(summary, BatchSummary { done: 1, failed: 1 });
    }
}
