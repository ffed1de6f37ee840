//! `demandiq-workflow`
//!
//! **Responsibility:** the load → train → forecast lifecycle.
//!
//! - [`WorkflowState`] is the whole observable state; [`WorkflowState::apply`]
//!   is the only thing that changes it.
//! - [`Workflow`] turns caller commands into service calls and events, and
//!   refuses commands that arrive while another call is in flight.
//! - Training progress is streamed onto the state's log as [`LogEntry`] lines
//!   and mirrored to `tracing`.

pub mod config;
pub mod error;
pub mod log;
pub mod phase;
mod progress;
pub mod state;
pub mod workflow;

pub use config::WorkflowConfig;
pub use error::{WorkflowError, WorkflowResult};
pub use log::LogEntry;
pub use phase::{Command, WorkflowPhase};
pub use state::{WorkflowEvent, WorkflowState};
pub use workflow::Workflow;
