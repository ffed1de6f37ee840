use demandiq_core::{ForecastHorizon, ForecastRequest, ScenarioType};
use demandiq_reporting::DEFAULT_RANKING_SIZE;

/// Workflow settings.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowConfig {
    /// Forecast settings shown before any forecast has been requested.
    pub default_horizon: ForecastHorizon,
    pub default_scenario: ScenarioType,
    /// How many products the top/bottom performer views hold.
    pub ranking_size: usize,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            default_horizon: ForecastHorizon::DEFAULT,
            default_scenario: ScenarioType::Baseline,
            ranking_size: DEFAULT_RANKING_SIZE,
        }
    }
}

impl WorkflowConfig {
    pub fn with_default_horizon(mut self, horizon: ForecastHorizon) -> Self {
        self.default_horizon = horizon;
        self
    }

    pub fn with_default_scenario(mut self, scenario: ScenarioType) -> Self {
        self.default_scenario = scenario;
        self
    }

    pub fn with_ranking_size(mut self, n: usize) -> Self {
        self.ranking_size = n;
        self
    }

    pub fn default_request(&self) -> ForecastRequest {
        ForecastRequest::new(self.default_horizon, self.default_scenario)
    }
}
