use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use demandiq_core::{ForecastDataPoint, ForecastRequest, InventoryRecord, ProductMetrics};

use crate::result::ServiceError;

/// Severity of a progress line.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressLevel {
    Info,
    Warn,
    Error,
}

impl ProgressLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressLevel::Info => "INFO",
            ProgressLevel::Warn => "WARN",
            ProgressLevel::Error => "ERROR",
        }
    }
}

/// Receiver of human-readable progress lines while a training run is outstanding.
///
/// Lines must be kept in emission order.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, level: ProgressLevel, message: String);
}

/// In-memory sink for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryProgressSink {
    inner: Mutex<Vec<(ProgressLevel, String)>>,
}

impl InMemoryProgressSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<(ProgressLevel, String)> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ProgressSink for InMemoryProgressSink {
    fn emit(&self, level: ProgressLevel, message: String) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((level, message));
    }
}

/// The external forecasting service, as seen by the workflow.
///
/// Implementations own transport, timeouts and the model itself. Every call
/// either completes with a full result or fails; partial results are never
/// returned.
#[async_trait]
pub trait ForecastService: Send + Sync + 'static {
    /// Parse and validate an inventory file.
    async fn upload(&self, file: &[u8]) -> Result<Vec<InventoryRecord>, ServiceError>;

    /// Train on the full dataset; one metrics record per product.
    async fn train(
        &self,
        records: &[InventoryRecord],
        progress: &dyn ProgressSink,
    ) -> Result<Vec<ProductMetrics>, ServiceError>;

    /// Forecast with the most recently trained model.
    async fn forecast(&self, request: ForecastRequest) -> Result<Vec<ForecastDataPoint>, ServiceError>;
}

#[async_trait]
impl<S: ForecastService + ?Sized> ForecastService for Arc<S> {
    async fn upload(&self, file: &[u8]) -> Result<Vec<InventoryRecord>, ServiceError> {
        (**self).upload(file).await
    }

    async fn train(
        &self,
        records: &[InventoryRecord],
        progress: &dyn ProgressSink,
    ) -> Result<Vec<ProductMetrics>, ServiceError> {
        (**self).train(records, progress).await
    }

    async fn forecast(&self, request: ForecastRequest) -> Result<Vec<ForecastDataPoint>, ServiceError> {
        (**self).forecast(request).await
    }
}
