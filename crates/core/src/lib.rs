//! `demandiq-core`: value types shared by every stage of the forecasting workflow.
//!
//! This crate is **pure data + validation** (no IO, no async, no service calls):
//! - inventory observations and their row-level schema rules
//! - per-product quality metrics produced by a training run
//! - forecast requests and the points a forecast returns

pub mod error;
pub mod forecast;
pub mod id;
pub mod metrics;
pub mod record;

pub use error::{DomainError, DomainResult};
pub use forecast::{ForecastDataPoint, ForecastHorizon, ForecastRequest, ScenarioType};
pub use id::RunId;
pub use metrics::ProductMetrics;
pub use record::{Column, ColumnLayout, InventoryRecord};
