//! Top / bottom performer selection.

use serde::Serialize;

use demandiq_core::ProductMetrics;

pub const DEFAULT_RANKING_SIZE: usize = 5;

/// Action shown for a bottom performer whose recommendation carries none.
pub const DEFAULT_ACTION: &str = "Review pricing";

/// The `n` records with the greatest predicted demand.
///
/// Ties keep snapshot order (stable sort), so the first-seen record wins.
pub fn top_performers(metrics: &[ProductMetrics], n: usize) -> Vec<&ProductMetrics> {
    let mut ranked: Vec<&ProductMetrics> = metrics.iter().collect();
    ranked.sort_by(|a, b| b.predicted_demand.cmp(&a.predicted_demand));
    ranked.truncate(n);
    ranked
}

/// The `n` records with the least predicted demand; same tie-break as [`top_performers`].
pub fn bottom_performers(metrics: &[ProductMetrics], n: usize) -> Vec<&ProductMetrics> {
    let mut ranked: Vec<&ProductMetrics> = metrics.iter().collect();
    ranked.sort_by_key(|m| m.predicted_demand);
    ranked.truncate(n);
    ranked
}

/// Short action text for a product needing attention.
///
/// Recommendations read `Label: action`; the action part is used, falling back
/// to [`DEFAULT_ACTION`] when there is none.
pub fn attention_action(metrics: &ProductMetrics) -> &str {
    metrics
        .recommendation
        .split(':')
        .nth(1)
        .map(str::trim)
        .filter(|action| !action.is_empty())
        .unwrap_or(DEFAULT_ACTION)
}

/// Both ends of the ranking at once.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranking<'a> {
    pub top: Vec<&'a ProductMetrics>,
    pub bottom: Vec<&'a ProductMetrics>,
}

impl<'a> Ranking<'a> {
    pub fn of(metrics: &'a [ProductMetrics], n: usize) -> Self {
        Self {
            top: top_performers(metrics, n),
            bottom: bottom_performers(metrics, n),
        }
    }
}
