//! Forecast requests and results.

use core::fmt;
use core::num::NonZeroU32;
use core::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Hypothetical business condition applied to a forecast.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioType {
    #[default]
    Baseline,
    Discount,
    PriceCut,
    Holiday,
}

impl ScenarioType {
    pub const ALL: [ScenarioType; 4] = [
        ScenarioType::Baseline,
        ScenarioType::Discount,
        ScenarioType::PriceCut,
        ScenarioType::Holiday,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScenarioType::Baseline => "baseline",
            ScenarioType::Discount => "discount",
            ScenarioType::PriceCut => "price_cut",
            ScenarioType::Holiday => "holiday",
        }
    }
}

impl fmt::Display for ScenarioType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScenarioType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "baseline" => Ok(ScenarioType::Baseline),
            "discount" => Ok(ScenarioType::Discount),
            "price_cut" => Ok(ScenarioType::PriceCut),
            "holiday" => Ok(ScenarioType::Holiday),
            _ => Err(DomainError::validation(
                "scenario must be one of: baseline, discount, price_cut, holiday",
            )),
        }
    }
}

/// Number of future periods a forecast covers (always positive).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ForecastHorizon(NonZeroU32);

impl ForecastHorizon {
    pub const DEFAULT: ForecastHorizon = match NonZeroU32::new(20) {
        Some(n) => ForecastHorizon(n),
        None => unreachable!(),
    };

    pub fn new(periods: u32) -> DomainResult<Self> {
        NonZeroU32::new(periods)
            .map(Self)
            .ok_or_else(|| DomainError::range("horizon", periods, "a positive number of periods"))
    }

    pub fn periods(&self) -> u32 {
        self.0.get()
    }
}

impl Default for ForecastHorizon {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for ForecastHorizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// What a forecast run is asked to produce.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastRequest {
    pub horizon: ForecastHorizon,
    pub scenario: ScenarioType,
}

impl ForecastRequest {
    pub fn new(horizon: ForecastHorizon, scenario: ScenarioType) -> Self {
        Self { horizon, scenario }
    }
}

/// One point of a forecast chart: an observed value, a predicted value, or both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDataPoint {
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub historical: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forecast: Option<f64>,
}

impl ForecastDataPoint {
    pub fn historical(date: NaiveDate, value: f64) -> Self {
        Self {
            date,
            historical: Some(value),
            forecast: None,
        }
    }

    pub fn forecast(date: NaiveDate, value: f64) -> Self {
        Self {
            date,
            historical: None,
            forecast: Some(value),
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.historical.is_none() && self.forecast.is_none() {
            return Err(DomainError::validation(format!(
                "forecast point for {} carries neither a historical nor a forecast value",
                self.date
            )));
        }
        let finite = |v: Option<f64>| v.map_or(true, f64::is_finite);
        if !finite(self.historical) || !finite(self.forecast) {
            return Err(DomainError::validation(format!(
                "forecast point for {} is not a finite number",
                self.date
            )));
        }
        Ok(())
    }
}
