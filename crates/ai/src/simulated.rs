//! Deterministic in-process forecasting service.
//!
//! Metrics are derived from the dataset itself:
//! - WMAPE compares the file's `Demand_Forecast` column with `Units_Sold`.
//! - Price elasticity is the least-squares slope of units sold on price. A
//!   positive slope is illogical, so the guardrail drops price as a driver.
//! - Seasonality is flagged when mean sales differ enough across seasons.
//! - Promotion uplift compares promoted days (discount or holiday) with plain days.
//!
//! Forecasts extend the total daily sales of the last `history_days` with a
//! flat baseline scaled by the scenario's uplift.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::f64::consts::PI;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use tracing::debug;

use demandiq_core::{
    ForecastDataPoint, ForecastRequest, InventoryRecord, ProductMetrics, ScenarioType,
};
use demandiq_ingest::read_records;

use crate::result::ServiceError;
use crate::service::{ForecastService, ProgressLevel, ProgressSink};

pub const PRICE_SENSITIVE: &str = "Price Sensitive";
pub const SEASONAL: &str = "Seasonal";
pub const HIGH_POTENTIAL: &str = "High Potential: Run aggressive promotion";
pub const STABLE: &str = "Stable: Maintain current strategy";

/// Days of trailing sales used as the forecast baseline.
const BASELINE_DAYS: usize = 7;
/// Relative spread of seasonal means above which a product counts as seasonal.
const SEASONAL_SPREAD: f64 = 0.15;
/// Promoted-vs-plain sales ratio above which promotion is recommended.
const PROMOTION_LIFT: f64 = 0.05;

/// Knobs for the simulated service.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Pause between products while training (zero in tests).
    pub step_delay: Duration,
    /// Trailing days of observed sales included in each forecast.
    pub history_days: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            step_delay: Duration::ZERO,
            history_days: 30,
        }
    }
}

impl SimulationConfig {
    pub fn with_step_delay(mut self, delay: Duration) -> Self {
        self.step_delay = delay;
        self
    }

    pub fn with_history_days(mut self, days: usize) -> Self {
        self.history_days = days;
        self
    }
}

#[derive(Debug, Clone)]
struct TrainedModel {
    /// Total units sold per day, ascending by date.
    daily_totals: Vec<(NaiveDate, f64)>,
    baseline: f64,
}

/// In-process service producing reproducible metrics and forecasts.
#[derive(Debug, Default)]
pub struct SimulatedForecastService {
    config: SimulationConfig,
    model: Mutex<Option<TrainedModel>>,
}

impl SimulatedForecastService {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            config,
            model: Mutex::new(None),
        }
    }
}

#[async_trait]
impl ForecastService for SimulatedForecastService {
    async fn upload(&self, file: &[u8]) -> Result<Vec<InventoryRecord>, ServiceError> {
        Ok(read_records(file)?)
    }

    async fn train(
        &self,
        records: &[InventoryRecord],
        progress: &dyn ProgressSink,
    ) -> Result<Vec<ProductMetrics>, ServiceError> {
        if records.is_empty() {
            return Err(ServiceError::rejected("cannot train on an empty dataset"));
        }

        // Group by product, keeping first-seen order.
        let mut order: Vec<&str> = Vec::new();
        let mut groups: HashMap<&str, Vec<&InventoryRecord>> = HashMap::new();
        for r in records {
            groups
                .entry(r.product_id.as_str())
                .or_insert_with(|| {
                    order.push(r.product_id.as_str());
                    Vec::new()
                })
                .push(r);
        }

        let mut metrics = Vec::with_capacity(order.len());
        for product_id in order {
            progress.emit(ProgressLevel::Info, format!("Training {product_id}..."));
            if !self.config.step_delay.is_zero() {
                tokio::time::sleep(self.config.step_delay).await;
            }

            let rows = groups.get(product_id).map(Vec::as_slice).unwrap_or_default();
            let m = evaluate(product_id, rows);
            if m.guardrail_triggered {
                progress.emit(
                    ProgressLevel::Warn,
                    format!("Guardrail triggered for {product_id}: price elasticity illogical, removed from model"),
                );
            } else {
                progress.emit(
                    ProgressLevel::Info,
                    format!("Model converged successfully for {product_id}"),
                );
            }
            metrics.push(m);
        }

        let daily_totals = daily_totals(records.iter());
        let baseline = trailing_mean(&daily_totals, BASELINE_DAYS);
        debug!(products = metrics.len(), baseline, "simulated training finished");

        *self.model.lock().unwrap_or_else(PoisonError::into_inner) = Some(TrainedModel {
            daily_totals,
            baseline,
        });

        Ok(metrics)
    }

    async fn forecast(&self, request: ForecastRequest) -> Result<Vec<ForecastDataPoint>, ServiceError> {
        let model = self
            .model
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| ServiceError::rejected("no trained model; train before forecasting"))?;

        let Some(&(last_date, _)) = model.daily_totals.last() else {
            return Err(ServiceError::rejected("trained model has no history"));
        };

        let history_start = model.daily_totals.len().saturating_sub(self.config.history_days);
        let mut points: Vec<ForecastDataPoint> = model.daily_totals[history_start..]
            .iter()
            .map(|(date, total)| ForecastDataPoint::historical(*date, *total))
            .collect();

        let level = model.baseline * uplift(request.scenario);
        for step in 1..=request.horizon.periods() {
            let date = last_date
                .checked_add_days(Days::new(u64::from(step)))
                .ok_or_else(|| ServiceError::rejected("forecast horizon runs past the supported calendar"))?;
            let weekly = 1.0 + 0.05 * (2.0 * PI * f64::from(step) / 7.0).sin();
            points.push(ForecastDataPoint::forecast(date, round2(level * weekly)));
        }

        Ok(points)
    }
}

/// Demand multiplier applied under each scenario.
pub fn uplift(scenario: ScenarioType) -> f64 {
    match scenario {
        ScenarioType::Baseline => 1.0,
        ScenarioType::Discount => 1.15,
        ScenarioType::PriceCut => 1.10,
        ScenarioType::Holiday => 1.25,
    }
}

fn evaluate(product_id: &str, rows: &[&InventoryRecord]) -> ProductMetrics {
    let actual: f64 = rows.iter().map(|r| f64::from(r.units_sold)).sum();
    let abs_err: f64 = rows
        .iter()
        .map(|r| (f64::from(r.units_sold) - r.demand_forecast).abs())
        .sum();
    let wmape = if actual > 0.0 {
        (abs_err / actual).min(1.0)
    } else if abs_err > 0.0 {
        1.0
    } else {
        0.0
    };

    let mut drivers = BTreeSet::new();
    let elasticity = price_slope(rows);
    let guardrail_triggered = elasticity.is_some_and(|s| s > 0.0);
    if elasticity.is_some_and(|s| s < 0.0) {
        drivers.insert(PRICE_SENSITIVE.to_string());
    }
    if is_seasonal(rows) {
        drivers.insert(SEASONAL.to_string());
    }

    let recommendation = if promotion_lift(rows) > PROMOTION_LIFT {
        HIGH_POTENTIAL
    } else {
        STABLE
    };

    let totals = daily_totals(rows.iter().copied());
    let predicted_demand = trailing_mean(&totals, BASELINE_DAYS).round().max(0.0) as u64;

    ProductMetrics {
        product_id: product_id.to_string(),
        success_rate: 1.0 - wmape,
        wmape,
        guardrail_triggered,
        drivers,
        recommendation: recommendation.to_string(),
        predicted_demand,
        confidence: (1.0 - 1.5 * wmape).clamp(0.0, 1.0),
    }
}

/// Least-squares slope of units sold on price; `None` when price never varies.
fn price_slope(rows: &[&InventoryRecord]) -> Option<f64> {
    if rows.len() < 2 {
        return None;
    }
    let n = rows.len() as f64;
    let mean_p = rows.iter().map(|r| r.price).sum::<f64>() / n;
    let mean_u = rows.iter().map(|r| f64::from(r.units_sold)).sum::<f64>() / n;

    let (cov, var) = rows.iter().fold((0.0, 0.0), |(cov, var), r| {
        let dp = r.price - mean_p;
        (cov + dp * (f64::from(r.units_sold) - mean_u), var + dp * dp)
    });

    if var <= f64::EPSILON {
        return None;
    }
    Some(cov / var)
}

fn is_seasonal(rows: &[&InventoryRecord]) -> bool {
    let mut by_season: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for r in rows {
        let entry = by_season.entry(r.seasonality.as_str()).or_default();
        entry.0 += f64::from(r.units_sold);
        entry.1 += 1;
    }
    if by_season.len() < 2 {
        return false;
    }

    let means: Vec<f64> = by_season.values().map(|(sum, n)| sum / *n as f64).collect();
    let overall = rows.iter().map(|r| f64::from(r.units_sold)).sum::<f64>() / rows.len() as f64;
    if overall <= 0.0 {
        return false;
    }
    let max = means.iter().copied().fold(f64::MIN, f64::max);
    let min = means.iter().copied().fold(f64::MAX, f64::min);
    (max - min) / overall > SEASONAL_SPREAD
}

/// Relative sales uplift on promoted rows; zero when either side is missing.
fn promotion_lift(rows: &[&InventoryRecord]) -> f64 {
    let (promoted, plain): (Vec<&&InventoryRecord>, Vec<&&InventoryRecord>) = rows
        .iter()
        .partition(|r| r.discount > 0.0 || r.holiday_promotion);
    if promoted.is_empty() || plain.is_empty() {
        return 0.0;
    }

    let mean = |group: &[&&InventoryRecord]| {
        group.iter().map(|r| f64::from(r.units_sold)).sum::<f64>() / group.len() as f64
    };
    let plain_mean = mean(&plain);
    if plain_mean <= 0.0 {
        return 0.0;
    }
    mean(&promoted) / plain_mean - 1.0
}

fn daily_totals<'a>(records: impl Iterator<Item = &'a InventoryRecord>) -> Vec<(NaiveDate, f64)> {
    let mut totals: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for r in records {
        *totals.entry(r.date).or_default() += f64::from(r.units_sold);
    }
    totals.into_iter().collect()
}

fn trailing_mean(totals: &[(NaiveDate, f64)], days: usize) -> f64 {
    let tail = &totals[totals.len().saturating_sub(days)..];
    if tail.is_empty() {
        return 0.0;
    }
    tail.iter().map(|(_, v)| v).sum::<f64>() / tail.len() as f64
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
