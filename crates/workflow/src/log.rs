//! The training console: timestamped progress lines kept on the workflow state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use demandiq_ai::ProgressLevel;

/// One progress line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub at: DateTime<Utc>,
    pub level: ProgressLevel,
    pub message: String,
}

impl LogEntry {
    pub fn new(level: ProgressLevel, message: impl Into<String>) -> Self {
        Self {
            at: Utc::now(),
            level,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(ProgressLevel::Info, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(ProgressLevel::Error, message)
    }

    /// Forward to `tracing` at the matching level.
    pub(crate) fn trace(&self) {
        match self.level {
            ProgressLevel::Info => tracing::info!(target: "demandiq::progress", "{}", self.message),
            ProgressLevel::Warn => tracing::warn!(target: "demandiq::progress", "{}", self.message),
            ProgressLevel::Error => tracing::error!(target: "demandiq::progress", "{}", self.message),
        }
    }
}

/// `[14:03:27] [INFO] Training P0001...`
impl core::fmt::Display for LogEntry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "[{}] [{}] {}",
            self.at.format("%H:%M:%S"),
            self.level.as_str(),
            self.message
        )
    }
}
