use serde::{Deserialize, Serialize};

/// Where the workflow is in its load → train → forecast cycle.
///
/// `Loading`, `Training` and `Forecasting` are transient: exactly one service
/// call is outstanding while the workflow sits in one of them.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowPhase {
    #[default]
    Idle,
    Loading,
    Training,
    Trained,
    Forecasting,
    Results,
}

impl WorkflowPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowPhase::Idle => "idle",
            WorkflowPhase::Loading => "loading",
            WorkflowPhase::Training => "training",
            WorkflowPhase::Trained => "trained",
            WorkflowPhase::Forecasting => "forecasting",
            WorkflowPhase::Results => "results",
        }
    }

    /// True while a service call is in flight.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            WorkflowPhase::Loading | WorkflowPhase::Training | WorkflowPhase::Forecasting
        )
    }

    /// Whether `command` may start from this phase.
    ///
    /// This is only the phase gate; data preconditions (a non-empty dataset, a
    /// metrics snapshot to select from) are checked by the state itself.
    pub fn accepts(&self, command: Command) -> bool {
        use WorkflowPhase::*;
        match command {
            Command::Load | Command::Train => matches!(self, Idle | Trained | Results),
            Command::Forecast => matches!(self, Trained | Results),
            Command::SelectProduct => !self.is_busy(),
        }
    }
}

impl core::fmt::Display for WorkflowPhase {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The commands a caller can issue against a workflow.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Load,
    Train,
    Forecast,
    SelectProduct,
}

impl Command {
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Load => "load",
            Command::Train => "train",
            Command::Forecast => "forecast",
            Command::SelectProduct => "select_product",
        }
    }
}

impl core::fmt::Display for Command {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
