use crate::crawler::{CrawlHandle, Coordinator};
use crate::state::{ProgressSnapshot, RunStatus};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// The crawl most recently launched through the control server
#[derive(Default)]
pub(crate) struct RunSlot {
    status: RunStatus,
    current: Option<CrawlHandle>,
}

impl RunSlot {
    /// Moves a finished crawl from Running to Completed
    fn refresh(&mut self) {
        if self.status.is_running()
            && self.current.as_ref().map_or(true, CrawlHandle::is_finished)
        {
            self.status = RunStatus::Completed;
        }
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn snapshot(&self) -> Option<ProgressSnapshot> {
        self.current.as_ref().map(|handle| handle.progress().snapshot())
    }

    pub fn start(&mut self, handle: CrawlHandle) {
        debug_assert!(self.status.can_transition_to(RunStatus::Running));
        self.status = RunStatus::Running;
        self.current = Some(handle);
    }
}

/// Shared state behind every control server handler
pub struct ControlState {
    coordinator: Coordinator,
    slot: Mutex<RunSlot>,
}

impl ControlState {
    pub fn new(coordinator: Coordinator) -> Self {
        Self {
            coordinator,
            slot: Mutex::new(RunSlot::default()),
        }
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    /// Locks the run slot, first noting a crawl that has since finished
    pub(crate) fn slot(&self) -> MutexGuard<'_, RunSlot> {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        slot.refresh();
        slot
    }
}
