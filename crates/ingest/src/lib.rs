//! Ingestion & summary: raw inventory rows in, validated [`Dataset`] out.
//!
//! Batches are all-or-nothing: the first invalid row rejects the whole batch,
//! so a summary is never computed over partial data.

pub mod dataset;
pub mod error;
pub mod reader;
pub mod sample;

pub use dataset::{DataSummary, Dataset, DateRange};
pub use error::IngestError;
pub use reader::{RawTable, ingest, read_csv, read_records};
pub use sample::SampleGenerator;
