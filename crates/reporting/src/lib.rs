//! Reporting transforms over a metrics snapshot.
//!
//! Everything here is a pure function of its input: nothing is cached and
//! nothing touches presentation APIs, so results are recomputed on every access.

pub mod export;
pub mod ranking;

pub use export::{CsvExport, EXPORT_FILE_NAME, EXPORT_HEADER, export, export_csv};
pub use ranking::{
    DEFAULT_ACTION, DEFAULT_RANKING_SIZE, Ranking, attention_action, bottom_performers,
    top_performers,
};
