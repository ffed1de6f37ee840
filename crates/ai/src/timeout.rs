use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use demandiq_core::{ForecastDataPoint, ForecastRequest, InventoryRecord, ProductMetrics};

use crate::result::ServiceError;
use crate::service::{ForecastService, ProgressSink};

/// Wraps a service with a per-call deadline.
///
/// An elapsed deadline surfaces as [`ServiceError::Timeout`], the same way any
/// other service failure would.
#[derive(Debug, Clone)]
pub struct Timed<S> {
    inner: S,
    timeout: Duration,
}

impl<S: ForecastService> Timed<S> {
    pub fn new(inner: S, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    async fn guard<T>(
        &self,
        call: &'static str,
        fut: impl Future<Output = Result<T, ServiceError>> + Send,
    ) -> Result<T, ServiceError> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!(call, timeout_ms = self.timeout.as_millis() as u64, "service call timed out");
                Err(ServiceError::Timeout(self.timeout))
            }
        }
    }
}

#[async_trait]
impl<S: ForecastService> ForecastService for Timed<S> {
    async fn upload(&self, file: &[u8]) -> Result<Vec<InventoryRecord>, ServiceError> {
        self.guard("upload", self.inner.upload(file)).await
    }

    async fn train(
        &self,
        records: &[InventoryRecord],
        progress: &dyn ProgressSink,
    ) -> Result<Vec<ProductMetrics>, ServiceError> {
        self.guard("train", self.inner.train(records, progress)).await
    }

    async fn forecast(&self, request: ForecastRequest) -> Result<Vec<ForecastDataPoint>, ServiceError> {
        self.guard("forecast", self.inner.forecast(request)).await
    }
}
