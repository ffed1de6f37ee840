//! `demandiq-ai`
//!
//! **Responsibility:** boundary to the forecasting/training service.
//!
//! The model itself is opaque to the workflow:
//! - [`ForecastService`] is the capability the workflow consumes (upload, train, forecast).
//! - [`ProgressSink`] is how a training run streams human-readable progress back.
//! - [`SimulatedForecastService`] is a deterministic in-process implementation.
//! - [`Timed`] turns a silent service into an explicit timeout failure.

pub mod result;
pub mod service;
pub mod simulated;
pub mod timeout;

pub use result::ServiceError;
pub use service::{ForecastService, InMemoryProgressSink, ProgressLevel, ProgressSink};
pub use simulated::{SimulatedForecastService, SimulationConfig};
pub use timeout::Timed;
