use crate::cli::*;
use chm_coreg::horizontal::CellStatus;
use std::sync::Arc;
use std::thread::JoinHandle;

const PROGRESS_UPDATE_MILLIS: u64 = 500;

/// Shows the progress of the grid search on a spinner.
/// The spinner stops when the tracker is dropped.
pub struct Tracker {
    progress: Arc<Progress<DetailCounter>>,
    handle: Option<JoinHandle<()>>,
}

impl Tracker {
    pub fn new(units: &'static str) -> Self {
        let progress = Arc::new(Progress::new(DetailCounter::new(units)));
        let handle = progress
            .clone()
            .spawn_auto_update_thread(std::time::Duration::from_millis(PROGRESS_UPDATE_MILLIS));
        Tracker {
            progress,
            handle: Some(handle),
        }
    }

    pub fn increment(&self) {
        self.progress.value.processed.fetch_add(1);
    }

    pub fn skip(&self) {
        self.progress.value.skipped.fetch_add(1);
        self.increment();
    }

    /// Record a finished grid cell.
    pub fn observe(&self, status: CellStatus) {
        match status {
            CellStatus::Planned(len) => self.progress.value.total.store(len),
            CellStatus::Searched => self.increment(),
            CellStatus::Skipped => self.skip(),
        }
    }
}
impl Drop for Tracker {
    fn drop(&mut self) {
        self.progress.finish();
        if let Some(handle) = self.handle.take() {
            handle.thread().unpark();
            if handle.join().is_err() {
                log::warn!("progress thread panicked");
            }
        }
    }
}
