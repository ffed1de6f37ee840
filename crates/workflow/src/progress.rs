use std::sync::{Arc, Mutex, PoisonError};

use demandiq_ai::{ProgressLevel, ProgressSink};
use demandiq_core::RunId;

use crate::log::LogEntry;
use crate::state::{WorkflowEvent, WorkflowState};

/// Progress sink handed to the service for one training run.
///
/// Lines land on the shared workflow log only while `run_id` is still the run
/// in flight.
pub(crate) struct RunProgress {
    run_id: RunId,
    state: Arc<Mutex<WorkflowState>>,
}

impl RunProgress {
    pub(crate) fn new(run_id: RunId, state: Arc<Mutex<WorkflowState>>) -> Self {
        Self { run_id, state }
    }
}

impl ProgressSink for RunProgress {
    fn emit(&self, level: ProgressLevel, message: String) {
        let accepted = self
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .apply(WorkflowEvent::ProgressReported {
                run_id: self.run_id,
                entry: LogEntry::new(level, message),
            });
        if !accepted {
            tracing::debug!(run_id = %self.run_id, "dropped progress line from a finished run");
        }
    }
}
