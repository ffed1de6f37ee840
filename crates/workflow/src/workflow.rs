use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use demandiq_ai::{ForecastService, ServiceError};
use demandiq_core::{
    ForecastDataPoint, ForecastHorizon, ForecastRequest, InventoryRecord, ProductMetrics, RunId,
    ScenarioType,
};
use demandiq_ingest::{DataSummary, Dataset, RawTable, SampleGenerator, ingest};
use demandiq_reporting::CsvExport;

use crate::config::WorkflowConfig;
use crate::error::{WorkflowError, WorkflowResult};
use crate::phase::{Command, WorkflowPhase};
use crate::progress::RunProgress;
use crate::state::{WorkflowEvent, WorkflowState};

/// Handle to one forecasting workflow.
///
/// Clones share the same state and service. Commands may be issued from any
/// task; at most one load, training or forecast call is in flight at a time
/// and any other command issued meanwhile is refused with
/// [`WorkflowError::InvalidCommand`].
pub struct Workflow<S> {
    service: Arc<S>,
    state: Arc<Mutex<WorkflowState>>,
    config: WorkflowConfig,
}

impl<S> Clone for Workflow<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            state: Arc::clone(&self.state),
            config: self.config.clone(),
        }
    }
}

impl<S: ForecastService> Workflow<S> {
    pub fn new(service: S) -> Self {
        Self::with_config(service, WorkflowConfig::default())
    }

    pub fn with_config(service: S, config: WorkflowConfig) -> Self {
        let state = WorkflowState::new(config.default_request());
        Self {
            service: Arc::new(service),
            state: Arc::new(Mutex::new(state)),
            config,
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// A consistent copy of the current state.
    pub fn snapshot(&self) -> WorkflowState {
        self.lock().clone()
    }

    pub fn phase(&self) -> WorkflowPhase {
        self.lock().phase()
    }

    /// Upload a file through the service and make its records the current dataset.
    pub async fn load_file(&self, file: &[u8]) -> WorkflowResult<DataSummary> {
        let run = self.start(Command::Load, |run_id| WorkflowEvent::LoadStarted { run_id })?;
        info!(run_id = %run.run_id(), bytes = file.len(), "upload started");

        let outcome = match self.service.upload(file).await {
            Ok(records) => Dataset::from_records(records).map_err(ServiceError::from),
            Err(error) => Err(error),
        };
        self.finish_load(run, outcome)
    }

    /// Replace the dataset with records from another source (e.g. generated).
    pub fn load_records(&self, records: Vec<InventoryRecord>) -> WorkflowResult<DataSummary> {
        let run = self.start(Command::Load, |run_id| WorkflowEvent::LoadStarted { run_id })?;
        let outcome = Dataset::from_records(records).map_err(ServiceError::from);
        self.finish_load(run, outcome)
    }

    /// Replace the dataset with raw rows, validated locally.
    pub fn load_table(&self, table: &RawTable) -> WorkflowResult<DataSummary> {
        let run = self.start(Command::Load, |run_id| WorkflowEvent::LoadStarted { run_id })?;
        let outcome = ingest(table).map_err(ServiceError::from);
        self.finish_load(run, outcome)
    }

    pub fn load_sample(&self, generator: &SampleGenerator) -> WorkflowResult<DataSummary> {
        self.load_records(generator.generate())
    }

    /// Train on the current dataset.
    ///
    /// On success the metrics snapshot is replaced wholesale and any previous
    /// forecast is discarded. On failure the previous metrics stay.
    pub async fn train(&self) -> WorkflowResult<Arc<[ProductMetrics]>> {
        let run = self.start(Command::Train, |run_id| WorkflowEvent::TrainingStarted { run_id })?;
        let run_id = run.run_id();
        // Loads are refused while training, so the dataset cannot change under us.
        let dataset = Arc::clone(self.lock().dataset());
        info!(%run_id, records = dataset.len(), "training started");

        let progress = RunProgress::new(run_id, Arc::clone(&self.state));
        let outcome = self
            .service
            .train(dataset.records(), &progress)
            .await
            .and_then(|metrics| {
                ProductMetrics::validate_snapshot(&metrics)
                    .map_err(|e| ServiceError::invalid_response(e.to_string()))?;
                Ok(metrics)
            });

        run.settle();
        let mut state = self.lock();
        match outcome {
            Ok(metrics) => {
                let metrics: Arc<[ProductMetrics]> = metrics.into();
                state.apply(WorkflowEvent::Trained {
                    run_id,
                    metrics: Arc::clone(&metrics),
                });
                info!(%run_id, products = metrics.len(), "training completed");
                Ok(metrics)
            }
            Err(error) => {
                Self::fail(&mut state, run_id, Command::Train, &error);
                Err(WorkflowError::Training(error))
            }
        }
    }

    /// Forecast `horizon` periods ahead under `scenario`.
    pub async fn forecast(
        &self,
        horizon: u32,
        scenario: ScenarioType,
    ) -> WorkflowResult<Arc<[ForecastDataPoint]>> {
        let horizon =
            ForecastHorizon::new(horizon).map_err(|_| WorkflowError::InvalidHorizon(horizon))?;
        self.forecast_with(ForecastRequest::new(horizon, scenario)).await
    }

    /// Forecast with a prepared request.
    ///
    /// A failure leaves the last good metrics and forecast in place.
    pub async fn forecast_with(
        &self,
        request: ForecastRequest,
    ) -> WorkflowResult<Arc<[ForecastDataPoint]>> {
        let run = self.start(Command::Forecast, |run_id| WorkflowEvent::ForecastStarted {
            run_id,
            request,
        })?;
        let run_id = run.run_id();
        info!(
            %run_id,
            horizon = request.horizon.periods(),
            scenario = %request.scenario,
            "forecast started"
        );

        let outcome = self.service.forecast(request).await.and_then(|points| {
            for point in &points {
                point
                    .validate()
                    .map_err(|e| ServiceError::invalid_response(e.to_string()))?;
            }
            Ok(points)
        });

        run.settle();
        let mut state = self.lock();
        match outcome {
            Ok(points) => {
                let points: Arc<[ForecastDataPoint]> = points.into();
                state.apply(WorkflowEvent::Forecasted {
                    run_id,
                    request,
                    points: Arc::clone(&points),
                });
                info!(%run_id, points = points.len(), "forecast completed");
                Ok(points)
            }
            Err(error) => {
                Self::fail(&mut state, run_id, Command::Forecast, &error);
                Err(WorkflowError::Forecast(error))
            }
        }
    }

    /// Focus the detail view on one product of the current metrics snapshot.
    pub fn select_product(&self, product_id: &str) -> WorkflowResult<()> {
        let mut state = self.lock();
        if let Err(error) = state.check_selection(product_id) {
            debug!(product_id, %error, "selection refused");
            return Err(error);
        }
        state.apply(WorkflowEvent::ProductSelected {
            product_id: product_id.to_string(),
        });
        Ok(())
    }

    pub fn top_performers(&self) -> Vec<ProductMetrics> {
        let state = self.lock();
        state
            .top_performers(self.config.ranking_size)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn bottom_performers(&self) -> Vec<ProductMetrics> {
        let state = self.lock();
        state
            .bottom_performers(self.config.ranking_size)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn export(&self) -> CsvExport {
        self.lock().export()
    }

    /// Gate `command` and, if accepted, apply its start event under one lock.
    ///
    /// The returned [`InFlight`] must be settled once the outcome is known;
    /// dropping it unsettled (the caller abandoned the future) fails the run.
    fn start(
        &self,
        command: Command,
        started: impl FnOnce(RunId) -> WorkflowEvent,
    ) -> WorkflowResult<InFlight> {
        let mut state = self.lock();
        if let Err(error) = state.begin(command) {
            warn!(%command, phase = %state.phase(), %error, "command rejected");
            return Err(error);
        }
        let run_id = RunId::new();
        state.apply(started(run_id));
        Ok(InFlight {
            run_id,
            command,
            state: Arc::clone(&self.state),
            armed: true,
        })
    }

    fn finish_load(
        &self,
        run: InFlight,
        outcome: Result<Dataset, ServiceError>,
    ) -> WorkflowResult<DataSummary> {
        let run_id = run.settle();
        let mut state = self.lock();
        match outcome {
            Ok(dataset) => {
                let summary = dataset.summary().clone();
                state.apply(WorkflowEvent::Loaded {
                    run_id,
                    dataset: Arc::new(dataset),
                });
                info!(
                    %run_id,
                    records = summary.total_records,
                    products = summary.unique_products,
                    "dataset loaded"
                );
                Ok(summary)
            }
            Err(error) => {
                Self::fail(&mut state, run_id, Command::Load, &error);
                Err(WorkflowError::Ingestion(error))
            }
        }
    }

    fn fail(state: &mut WorkflowState, run_id: RunId, command: Command, error: &ServiceError) {
        state.apply(WorkflowEvent::OperationFailed {
            run_id,
            command,
            reason: error.to_string(),
        });
        warn!(%run_id, %command, %error, "service call failed");
    }

    fn lock(&self) -> MutexGuard<'_, WorkflowState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The one call a workflow has outstanding.
struct InFlight {
    run_id: RunId,
    command: Command,
    state: Arc<Mutex<WorkflowState>>,
    armed: bool,
}

impl InFlight {
    fn run_id(&self) -> RunId {
        self.run_id
    }

    /// The outcome is about to be applied by the caller.
    fn settle(mut self) -> RunId {
        self.armed = false;
        self.run_id
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.apply(WorkflowEvent::OperationFailed {
            run_id: self.run_id,
            command: self.command,
            reason: "cancelled".to_string(),
        });
        warn!(run_id = %self.run_id, command = %self.command, "in-flight call abandoned");
    }
}
