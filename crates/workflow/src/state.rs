//! Workflow state and the reducer that moves it.
//!
//! Every mutation is a [`WorkflowEvent`] passed through [`WorkflowState::apply`].
//! Commands are checked with [`WorkflowState::begin`] first; a refused command
//! never produces an event. Events tagged with a run id are only honoured while
//! that run is the one in flight, so a late completion or a late progress line
//! from a finished run is dropped.

use std::sync::Arc;

use serde::{Serialize, Serializer};

use demandiq_core::{ForecastDataPoint, ForecastRequest, ProductMetrics, RunId};
use demandiq_ingest::{DataSummary, Dataset};
use demandiq_reporting::{CsvExport, Ranking, bottom_performers, export, top_performers};

use crate::error::{WorkflowError, WorkflowResult};
use crate::log::LogEntry;
use crate::phase::{Command, WorkflowPhase};

#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowEvent {
    LoadStarted {
        run_id: RunId,
    },
    Loaded {
        run_id: RunId,
        dataset: Arc<Dataset>,
    },
    TrainingStarted {
        run_id: RunId,
    },
    ProgressReported {
        run_id: RunId,
        entry: LogEntry,
    },
    Trained {
        run_id: RunId,
        metrics: Arc<[ProductMetrics]>,
    },
    ForecastStarted {
        run_id: RunId,
        request: ForecastRequest,
    },
    Forecasted {
        run_id: RunId,
        request: ForecastRequest,
        points: Arc<[ForecastDataPoint]>,
    },
    OperationFailed {
        run_id: RunId,
        command: Command,
        reason: String,
    },
    ProductSelected {
        product_id: String,
    },
}

impl WorkflowEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            WorkflowEvent::LoadStarted { .. } => "workflow.load.started",
            WorkflowEvent::Loaded { .. } => "workflow.load.completed",
            WorkflowEvent::TrainingStarted { .. } => "workflow.training.started",
            WorkflowEvent::ProgressReported { .. } => "workflow.training.progress",
            WorkflowEvent::Trained { .. } => "workflow.training.completed",
            WorkflowEvent::ForecastStarted { .. } => "workflow.forecast.started",
            WorkflowEvent::Forecasted { .. } => "workflow.forecast.completed",
            WorkflowEvent::OperationFailed { .. } => "workflow.operation.failed",
            WorkflowEvent::ProductSelected { .. } => "workflow.product.selected",
        }
    }

    pub fn run_id(&self) -> Option<RunId> {
        match self {
            WorkflowEvent::LoadStarted { run_id }
            | WorkflowEvent::Loaded { run_id, .. }
            | WorkflowEvent::TrainingStarted { run_id }
            | WorkflowEvent::ProgressReported { run_id, .. }
            | WorkflowEvent::Trained { run_id, .. }
            | WorkflowEvent::ForecastStarted { run_id, .. }
            | WorkflowEvent::Forecasted { run_id, .. }
            | WorkflowEvent::OperationFailed { run_id, .. } => Some(*run_id),
            WorkflowEvent::ProductSelected { .. } => None,
        }
    }
}

/// Everything the workflow knows at one instant.
///
/// Cloning is cheap (the dataset and result snapshots are shared), so readers
/// take a copy and never observe a half-applied transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowState {
    phase: WorkflowPhase,
    #[serde(skip)]
    active_run: Option<RunId>,
    #[serde(rename = "summary", serialize_with = "summary_only")]
    dataset: Arc<Dataset>,
    metrics: Arc<[ProductMetrics]>,
    forecast: Arc<[ForecastDataPoint]>,
    focus: Option<String>,
    last_request: ForecastRequest,
    log: Vec<LogEntry>,
}

fn summary_only<S: Serializer>(dataset: &Arc<Dataset>, serializer: S) -> Result<S::Ok, S::Error> {
    dataset.summary().serialize(serializer)
}

impl Default for WorkflowState {
    fn default() -> Self {
        Self::new(ForecastRequest::default())
    }
}

impl WorkflowState {
    /// Empty state: idle, nothing loaded, `last_request` preset to the defaults.
    pub fn new(default_request: ForecastRequest) -> Self {
        Self {
            phase: WorkflowPhase::Idle,
            active_run: None,
            dataset: Arc::default(),
            metrics: Arc::default(),
            forecast: Arc::default(),
            focus: None,
            last_request: default_request,
            log: Vec::new(),
        }
    }

    pub fn phase(&self) -> WorkflowPhase {
        self.phase
    }

    pub fn active_run(&self) -> Option<RunId> {
        self.active_run
    }

    pub fn dataset(&self) -> &Arc<Dataset> {
        &self.dataset
    }

    pub fn summary(&self) -> &DataSummary {
        self.dataset.summary()
    }

    pub fn metrics(&self) -> &[ProductMetrics] {
        &self.metrics
    }

    pub fn forecast(&self) -> &[ForecastDataPoint] {
        &self.forecast
    }

    pub fn focus(&self) -> Option<&str> {
        self.focus.as_deref()
    }

    /// Metrics of the focused product.
    pub fn focused_metrics(&self) -> Option<&ProductMetrics> {
        let focus = self.focus.as_deref()?;
        self.metrics.iter().find(|m| m.product_id == focus)
    }

    /// Horizon and scenario of the last successful forecast (or the defaults).
    pub fn last_request(&self) -> ForecastRequest {
        self.last_request
    }

    pub fn log(&self) -> &[LogEntry] {
        &self.log
    }

    pub fn is_loading(&self) -> bool {
        self.phase == WorkflowPhase::Loading
    }

    pub fn is_training(&self) -> bool {
        self.phase == WorkflowPhase::Training
    }

    pub fn is_forecasting(&self) -> bool {
        self.phase == WorkflowPhase::Forecasting
    }

    pub fn top_performers(&self, n: usize) -> Vec<&ProductMetrics> {
        top_performers(&self.metrics, n)
    }

    pub fn bottom_performers(&self, n: usize) -> Vec<&ProductMetrics> {
        bottom_performers(&self.metrics, n)
    }

    pub fn ranking(&self, n: usize) -> Ranking<'_> {
        Ranking::of(&self.metrics, n)
    }

    /// CSV of the current metrics snapshot.
    pub fn export(&self) -> CsvExport {
        export(&self.metrics)
    }

    /// Check that `command` may start now.
    pub fn begin(&self, command: Command) -> WorkflowResult<()> {
        if !self.phase.accepts(command) {
            return Err(WorkflowError::invalid_command(command, self.phase));
        }
        match command {
            Command::Train if self.dataset.is_empty() => Err(WorkflowError::EmptyDataset),
            Command::SelectProduct if self.metrics.is_empty() => {
                Err(WorkflowError::invalid_command(command, self.phase))
            }
            _ => Ok(()),
        }
    }

    /// Check that `product_id` can become the focus.
    pub fn check_selection(&self, product_id: &str) -> WorkflowResult<()> {
        self.begin(Command::SelectProduct)?;
        if self.metrics.iter().any(|m| m.product_id == product_id) {
            Ok(())
        } else {
            Err(WorkflowError::UnknownProduct(product_id.to_string()))
        }
    }

    /// Apply one event. Returns `false` if the event was stale and ignored.
    pub fn apply(&mut self, event: WorkflowEvent) -> bool {
        let event_type = event.event_type();
        let run_id = event.run_id();
        let applied = self.reduce(event);
        if applied {
            tracing::debug!(event = event_type, run_id = ?run_id, phase = %self.phase, "workflow event applied");
        } else {
            tracing::debug!(event = event_type, run_id = ?run_id, "stale workflow event ignored");
        }
        applied
    }

    fn reduce(&mut self, event: WorkflowEvent) -> bool {
        match event {
            WorkflowEvent::LoadStarted { run_id } => self.start(run_id, WorkflowPhase::Loading),
            WorkflowEvent::Loaded { run_id, dataset } => {
                if !self.owns(run_id) {
                    return false;
                }
                let summary = dataset.summary();
                let line = format!(
                    "Loaded {} records across {} products",
                    summary.total_records, summary.unique_products
                );
                self.dataset = dataset;
                self.metrics = Arc::default();
                self.forecast = Arc::default();
                self.focus = None;
                self.log.clear();
                self.push(LogEntry::info(line));
                self.settle(WorkflowPhase::Idle)
            }
            WorkflowEvent::TrainingStarted { run_id } => {
                if !self.start(run_id, WorkflowPhase::Training) {
                    return false;
                }
                self.log.clear();
                let line = format!("Training started on {} records", self.dataset.len());
                self.push(LogEntry::info(line));
                true
            }
            WorkflowEvent::ProgressReported { run_id, entry } => {
                if !self.owns(run_id) {
                    return false;
                }
                self.push(entry);
                true
            }
            WorkflowEvent::Trained { run_id, metrics } => {
                if !self.owns(run_id) {
                    return false;
                }
                self.focus = metrics.first().map(|m| m.product_id.clone());
                self.push(LogEntry::info(format!(
                    "Training complete: {} product models ready",
                    metrics.len()
                )));
                self.metrics = metrics;
                self.forecast = Arc::default();
                self.settle(WorkflowPhase::Trained)
            }
            WorkflowEvent::ForecastStarted { run_id, .. } => {
                self.start(run_id, WorkflowPhase::Forecasting)
            }
            WorkflowEvent::Forecasted {
                run_id,
                request,
                points,
            } => {
                if !self.owns(run_id) {
                    return false;
                }
                self.push(LogEntry::info(format!(
                    "Forecast ready: {} periods, {} scenario",
                    request.horizon, request.scenario
                )));
                self.forecast = points;
                self.last_request = request;
                self.settle(WorkflowPhase::Results)
            }
            WorkflowEvent::OperationFailed {
                run_id,
                command,
                reason,
            } => {
                if !self.owns(run_id) {
                    return false;
                }
                let what = match command {
                    Command::Load => "Upload",
                    Command::Train => "Training",
                    Command::Forecast => "Forecast",
                    Command::SelectProduct => "Selection",
                };
                self.push(LogEntry::error(format!("{what} failed: {reason}")));
                self.settle(WorkflowPhase::Idle)
            }
            WorkflowEvent::ProductSelected { product_id } => {
                self.focus = Some(product_id);
                true
            }
        }
    }

    fn owns(&self, run_id: RunId) -> bool {
        self.active_run == Some(run_id)
    }

    fn start(&mut self, run_id: RunId, phase: WorkflowPhase) -> bool {
        if self.phase.is_busy() {
            return false;
        }
        self.active_run = Some(run_id);
        self.phase = phase;
        true
    }

    fn settle(&mut self, phase: WorkflowPhase) -> bool {
        self.active_run = None;
        self.phase = phase;
        true
    }

    fn push(&mut self, entry: LogEntry) {
        entry.trace();
        self.log.push(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use demandiq_ai::ProgressLevel;
    use demandiq_core::{ForecastHorizon, ScenarioType};
    use demandiq_ingest::SampleGenerator;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    fn metrics(id: &str, demand: u64) -> ProductMetrics {
        ProductMetrics {
            product_id: id.to_string(),
            success_rate: 0.9,
            wmape: 0.1,
            guardrail_triggered: false,
            drivers: BTreeSet::new(),
            recommendation: "Stable: Maintain current strategy".to_string(),
            predicted_demand: demand,
            confidence: 0.9,
        }
    }

    fn loaded() -> WorkflowState {
        let mut state = WorkflowState::default();
        let run_id = RunId::new();
        assert!(state.apply(WorkflowEvent::LoadStarted { run_id }));
        let dataset = SampleGenerator::new().with_products(3).with_stores(1).with_days(4).dataset();
        assert!(state.apply(WorkflowEvent::Loaded {
            run_id,
            dataset: Arc::new(dataset),
        }));
        state
    }

    fn trained() -> WorkflowState {
        let mut state = loaded();
        let run_id = RunId::new();
        state.apply(WorkflowEvent::TrainingStarted { run_id });
        state.apply(WorkflowEvent::Trained {
            run_id,
            metrics: vec![metrics("P0001", 10), metrics("P0002", 20), metrics("P0003", 30)].into(),
        });
        state
    }

    #[test]
    fn load_settles_idle_with_summary() {
        let state = loaded();
        assert_eq!(state.phase(), WorkflowPhase::Idle);
        assert_eq!(state.summary().total_records, 12);
        assert_eq!(state.summary().unique_products, 3);
        assert_eq!(state.log().len(), 1);
        assert_eq!(state.log()[0].message, "Loaded 12 records across 3 products");
    }

    #[test]
    fn train_on_empty_dataset_is_refused() {
        let state = WorkflowState::default();
        assert_eq!(state.begin(Command::Train), Err(WorkflowError::EmptyDataset));
    }

    #[test]
    fn training_clears_log_and_focuses_first_product() {
        let mut state = loaded();
        let run_id = RunId::new();
        state.apply(WorkflowEvent::TrainingStarted { run_id });
        assert!(state.is_training());
        assert_eq!(state.log().len(), 1);
        assert!(state.log()[0].message.starts_with("Training started"));

        state.apply(WorkflowEvent::Trained {
            run_id,
            metrics: vec![metrics("P0002", 5), metrics("P0001", 7)].into(),
        });
        assert_eq!(state.phase(), WorkflowPhase::Trained);
        assert_eq!(state.focus(), Some("P0002"));
        assert_eq!(state.focused_metrics().map(|m| m.predicted_demand), Some(5));
        assert!(state.active_run().is_none());
    }

    #[test]
    fn stale_events_are_ignored() {
        let mut state = loaded();
        let finished = RunId::new();
        state.apply(WorkflowEvent::TrainingStarted { run_id: finished });
        state.apply(WorkflowEvent::Trained {
            run_id: finished,
            metrics: vec![metrics("P0001", 1)].into(),
        });
        let before = state.clone();

        assert!(!state.apply(WorkflowEvent::ProgressReported {
            run_id: finished,
            entry: LogEntry::new(ProgressLevel::Info, "late line"),
        }));
        assert!(!state.apply(WorkflowEvent::OperationFailed {
            run_id: finished,
            command: Command::Train,
            reason: "late failure".into(),
        }));
        assert_eq!(state, before);
    }

    #[test]
    fn second_start_while_busy_is_ignored() {
        let mut state = loaded();
        let first = RunId::new();
        state.apply(WorkflowEvent::TrainingStarted { run_id: first });
        assert!(!state.apply(WorkflowEvent::LoadStarted { run_id: RunId::new() }));
        assert_eq!(state.active_run(), Some(first));
        assert!(state.is_training());
    }

    #[test]
    fn failed_retrain_keeps_previous_metrics() {
        let mut state = trained();
        let run_id = RunId::new();
        state.apply(WorkflowEvent::TrainingStarted { run_id });
        state.apply(WorkflowEvent::OperationFailed {
            run_id,
            command: Command::Train,
            reason: "service unavailable".into(),
        });

        assert_eq!(state.phase(), WorkflowPhase::Idle);
        assert_eq!(state.metrics().len(), 3);
        let last = state.log().last().unwrap();
        assert_eq!(last.level, ProgressLevel::Error);
        assert_eq!(last.message, "Training failed: service unavailable");
    }

    #[test]
    fn forecast_records_request_and_reload_discards_results() {
        let mut state = trained();
        let run_id = RunId::new();
        let request = ForecastRequest::new(ForecastHorizon::new(2).unwrap(), ScenarioType::Holiday);
        state.apply(WorkflowEvent::ForecastStarted { run_id, request });
        assert!(state.is_forecasting());
        let date = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        state.apply(WorkflowEvent::Forecasted {
            run_id,
            request,
            points: vec![ForecastDataPoint::forecast(date, 1.0), ForecastDataPoint::forecast(date, 2.0)].into(),
        });
        assert_eq!(state.phase(), WorkflowPhase::Results);
        assert_eq!(state.last_request(), request);
        assert_eq!(state.forecast().len(), 2);

        let reload = RunId::new();
        state.apply(WorkflowEvent::LoadStarted { run_id: reload });
        state.apply(WorkflowEvent::Loaded {
            run_id: reload,
            dataset: Arc::new(SampleGenerator::new().with_products(1).with_stores(1).with_days(2).dataset()),
        });
        assert!(state.metrics().is_empty());
        assert!(state.forecast().is_empty());
        assert_eq!(state.focus(), None);
        assert_eq!(state.last_request(), request);
    }

    #[test]
    fn selection_requires_known_product() {
        let state = trained();
        assert!(state.check_selection("P0003").is_ok());
        assert_eq!(
            state.check_selection("P9999"),
            Err(WorkflowError::UnknownProduct("P9999".into()))
        );
        assert!(matches!(
            loaded().check_selection("P0001"),
            Err(WorkflowError::InvalidCommand { .. })
        ));
    }

    #[test]
    fn snapshot_serializes_summary_not_records() {
        let json = serde_json::to_value(trained()).unwrap();
        assert_eq!(json["phase"], "trained");
        assert_eq!(json["summary"]["total_records"], 12);
        assert_eq!(json["metrics"].as_array().unwrap().len(), 3);
        assert!(json.get("active_run").is_none());
    }

    #[derive(Debug, Clone)]
    enum Op {
        Load(usize),
        Train(bool),
        Forecast(bool),
        Select,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0usize..4).prop_map(Op::Load),
            any::<bool>().prop_map(Op::Train),
            any::<bool>().prop_map(Op::Forecast),
            Just(Op::Select),
        ]
    }

    /// Run one command to completion the way the workflow does: gate, start, settle.
    fn drive(state: &mut WorkflowState, op: &Op) {
        let command = match op {
            Op::Load(_) => Command::Load,
            Op::Train(_) => Command::Train,
            Op::Forecast(_) => Command::Forecast,
            Op::Select => Command::SelectProduct,
        };
        if state.begin(command).is_err() {
            return;
        }
        let run_id = RunId::new();
        let failed = WorkflowEvent::OperationFailed {
            run_id,
            command,
            reason: "boom".into(),
        };
        match op {
            Op::Load(products) => {
                state.apply(WorkflowEvent::LoadStarted { run_id });
                let dataset = SampleGenerator::new()
                    .with_products(*products)
                    .with_stores(1)
                    .with_days(2)
                    .dataset();
                state.apply(WorkflowEvent::Loaded {
                    run_id,
                    dataset: Arc::new(dataset),
                });
            }
            Op::Train(ok) => {
                state.apply(WorkflowEvent::TrainingStarted { run_id });
                if *ok {
                    let fresh: Vec<ProductMetrics> = state
                        .dataset()
                        .product_ids()
                        .iter()
                        .enumerate()
                        .map(|(i, id)| metrics(id, i as u64))
                        .collect();
                    state.apply(WorkflowEvent::Trained {
                        run_id,
                        metrics: fresh.into(),
                    });
                } else {
                    state.apply(failed);
                }
            }
            Op::Forecast(ok) => {
                let request = ForecastRequest::default();
                state.apply(WorkflowEvent::ForecastStarted { run_id, request });
                if *ok {
                    let date = chrono::NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
                    state.apply(WorkflowEvent::Forecasted {
                        run_id,
                        request,
                        points: vec![ForecastDataPoint::forecast(date, 3.0)].into(),
                    });
                } else {
                    state.apply(failed);
                }
            }
            Op::Select => {
                if let Some(id) = state.metrics().last().map(|m| m.product_id.clone()) {
                    state.apply(WorkflowEvent::ProductSelected { product_id: id });
                }
            }
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            ..ProptestConfig::default()
        })]

        /// Property: after any command sequence the state is settled and internally consistent.
        #[test]
        fn command_sequences_keep_state_consistent(ops in prop::collection::vec(op(), 1..24)) {
            let mut state = WorkflowState::default();
            for op in &ops {
                drive(&mut state, op);

                prop_assert!(!state.phase().is_busy());
                prop_assert!(state.active_run().is_none());
                prop_assert_eq!(state.summary().total_records, state.dataset().len());
                if !state.forecast().is_empty() {
                    prop_assert!(!state.metrics().is_empty());
                }
                if matches!(state.phase(), WorkflowPhase::Trained | WorkflowPhase::Results) {
                    prop_assert!(!state.metrics().is_empty());
                }
                if state.phase() == WorkflowPhase::Results {
                    prop_assert!(!state.forecast().is_empty());
                }
                if let Some(focus) = state.focus() {
                    prop_assert!(state.metrics().iter().any(|m| m.product_id == focus));
                }
            }
        }
    }

    #[test]
    fn event_names_are_dotted() {
        let run_id = RunId::new();
        let event = WorkflowEvent::TrainingStarted { run_id };
        assert_eq!(event.event_type(), "workflow.training.started");
        assert_eq!(event.run_id(), Some(run_id));
    }
}
