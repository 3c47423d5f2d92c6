use serde::Serialize;

use super::model::UploadStage;

/// Snapshot emitted after every step of every file
#[derive(Debug, Clone, Serialize)]
pub struct UploadProgress {
    /// 0-based position in the batch
    pub file_index: usize,
    pub file_name: String,
    pub stage: UploadStage,
    pub percent: f64,
}

pub trait ProgressSink: Send + Sync {
    fn report(&self, progress: &UploadProgress);
}

impl<F> ProgressSink for F
where
    F: Fn(&UploadProgress) + Send + Sync,
{
    fn report(&self, progress: &UploadProgress) {
        self(progress)
    }
}

/// Discards progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _progress: &UploadProgress) {}
}

/// Credit a file has earned once it leaves `stage`.
fn partial_credit(stage: UploadStage) -> f64 {
    match stage {
        UploadStage::Requesting => 0.1,
        UploadStage::Transferring => 0.5,
        UploadStage::Measuring => 0.6,
        UploadStage::Committing | UploadStage::Committed | UploadStage::Failed => 1.0,
    }
}

/// `(completed + partial) / total * 100`, never decreasing.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    total: usize,
    completed: usize,
    partial: f64,
    last: f64,
}

impl ProgressTracker {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            completed: 0,
            partial: 0.0,
            last: 0.0,
        }
    }

    /// Records that the current file finished `stage`.
    pub fn step_done(&mut self, stage: UploadStage) -> f64 {
        self.partial = self.partial.max(partial_credit(stage).min(0.99));
        self.percent()
    }

    /// Records that the current file reached a terminal state.
    pub fn file_done(&mut self) -> f64 {
        self.completed = (self.completed + 1).min(self.total);
        self.partial = 0.0;
        self.percent()
    }

    pub fn percent(&mut self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        let value = if self.completed == self.total {
            100.0
        } else {
            (self.completed as f64 + self.partial) / self.total as f64 * 100.0
        };
        self.last = self.last.max(value);
        self.last
    }
}
