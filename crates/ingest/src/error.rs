use demandiq_core::DomainError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    /// The file could not be read as CSV (bad quoting, invalid UTF-8, ...).
    #[error("malformed csv: {0}")]
    Csv(String),

    #[error("file has no header row")]
    MissingHeader,

    /// The header row lacks a required column.
    #[error("invalid header: {0}")]
    Header(DomainError),

    /// A data row failed validation; `row` is 1-based, not counting the header.
    #[error("row {row}: {source}")]
    Record {
        row: usize,
        #[source]
        source: DomainError,
    },
}

impl IngestError {
    /// The underlying record-level failure, if any.
    pub fn domain_error(&self) -> Option<&DomainError> {
        match self {
            IngestError::Header(e) | IngestError::Record { source: e, .. } => Some(e),
            IngestError::Csv(_) | IngestError::MissingHeader => None,
        }
    }
}

impl From<csv::Error> for IngestError {
    fn from(err: csv::Error) -> Self {
        IngestError::Csv(err.to_string())
    }
}
