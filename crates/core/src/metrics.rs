use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Quality metrics and headline prediction for one product, from one training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductMetrics {
    pub product_id: String,
    /// Share of validation periods the model got within tolerance, in \[0, 1\].
    pub success_rate: f64,
    /// Weighted mean absolute percentage error, in \[0, 1\].
    pub wmape: f64,
    /// The service dropped an implausible driver from this product's model.
    ///
    /// Informational only: the product still gets a prediction.
    pub guardrail_triggered: bool,
    pub drivers: BTreeSet<String>,
    pub recommendation: String,
    pub predicted_demand: u64,
    /// In \[0, 1\].
    pub confidence: f64,
}

impl ProductMetrics {
    pub fn validate(&self) -> DomainResult<()> {
        if self.product_id.trim().is_empty() {
            return Err(DomainError::validation("metrics record without product_id"));
        }
        ensure_ratio("success_rate", self.success_rate)?;
        ensure_ratio("wmape", self.wmape)?;
        ensure_ratio("confidence", self.confidence)?;
        Ok(())
    }

    /// Validate a whole snapshot: every record valid, product ids unique.
    pub fn validate_snapshot(metrics: &[ProductMetrics]) -> DomainResult<()> {
        let mut seen = HashSet::with_capacity(metrics.len());
        for m in metrics {
            m.validate()?;
            if !seen.insert(m.product_id.as_str()) {
                return Err(DomainError::validation(format!(
                    "duplicate metrics for product {}",
                    m.product_id
                )));
            }
        }
        Ok(())
    }
}

fn ensure_ratio(field: &'static str, value: f64) -> DomainResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(DomainError::range(field, value, "a ratio in [0, 1]"))
    }
}
