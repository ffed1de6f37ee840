use thiserror::Error;

use demandiq_ai::ServiceError;

use crate::phase::{Command, WorkflowPhase};

/// Why a workflow command did not complete.
///
/// The first three carry a failed service call; the workflow has already moved
/// back to idle when one is returned. The rest are rejections: the command was
/// refused up front and the state is exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("ingestion failed: {0}")]
    Ingestion(#[source] ServiceError),

    #[error("training failed: {0}")]
    Training(#[source] ServiceError),

    #[error("forecast failed: {0}")]
    Forecast(#[source] ServiceError),

    #[error("cannot {command} while the workflow is {phase}")]
    InvalidCommand { command: Command, phase: WorkflowPhase },

    #[error("no records loaded")]
    EmptyDataset,

    #[error("forecast horizon must be at least one period, got {0}")]
    InvalidHorizon(u32),

    #[error("unknown product: {0}")]
    UnknownProduct(String),
}

impl WorkflowError {
    pub fn invalid_command(command: Command, phase: WorkflowPhase) -> Self {
        Self::InvalidCommand { command, phase }
    }

    /// True if the command was refused without touching state.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::InvalidCommand { .. } | Self::EmptyDataset | Self::InvalidHorizon(_) | Self::UnknownProduct(_)
        )
    }

    /// The underlying service failure, if any.
    pub fn service_error(&self) -> Option<&ServiceError> {
        match self {
            Self::Ingestion(e) | Self::Training(e) | Self::Forecast(e) => Some(e),
            _ => None,
        }
    }
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;
