//! Validated record batches and their summary statistics.

use std::collections::{BTreeSet, HashSet};

use chrono::NaiveDate;
use serde::Serialize;

use demandiq_core::InventoryRecord;

use crate::error::IngestError;

/// Calendar span covered by a dataset (inclusive).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub min: NaiveDate,
    pub max: NaiveDate,
}

/// Aggregate statistics of one ingested batch.
///
/// Always recomputed from the full batch; never patched incrementally.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DataSummary {
    pub total_records: usize,
    pub unique_products: usize,
    /// `None` only for an empty batch.
    pub date_range: Option<DateRange>,
}

impl DataSummary {
    pub fn of(records: &[InventoryRecord]) -> Self {
        let unique_products = records
            .iter()
            .map(|r| r.product_id.as_str())
            .collect::<HashSet<_>>()
            .len();

        // NaiveDate orders by calendar, not by its string form.
        let date_range = records.iter().map(|r| r.date).fold(None, |acc, d| match acc {
            None => Some(DateRange { min: d, max: d }),
            Some(DateRange { min, max }) => Some(DateRange {
                min: min.min(d),
                max: max.max(d),
            }),
        });

        Self {
            total_records: records.len(),
            unique_products,
            date_range,
        }
    }
}

/// An immutable, validated batch of inventory records plus its summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Dataset {
    records: Vec<InventoryRecord>,
    summary: DataSummary,
}

impl Dataset {
    /// Validate typed records (e.g. returned by an upload service) and summarize them.
    pub fn from_records(records: Vec<InventoryRecord>) -> Result<Self, IngestError> {
        for (idx, record) in records.iter().enumerate() {
            record
                .validate()
                .map_err(|source| IngestError::Record { row: idx + 1, source })?;
        }
        Ok(Self::from_validated(records))
    }

    pub(crate) fn from_validated(records: Vec<InventoryRecord>) -> Self {
        let summary = DataSummary::of(&records);
        Self { records, summary }
    }

    pub fn records(&self) -> &[InventoryRecord] {
        &self.records
    }

    pub fn summary(&self) -> &DataSummary {
        &self.summary
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct product ids, sorted ascending.
    pub fn product_ids(&self) -> Vec<&str> {
        self.records
            .iter()
            .map(|r| r.product_id.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn record(product: &str, date: NaiveDate) -> InventoryRecord {
        InventoryRecord {
            date,
            store_id: "S001".to_string(),
            product_id: product.to_string(),
            category: "Toys".to_string(),
            region: "East".to_string(),
            inventory_level: 100,
            units_sold: 40,
            units_ordered: 20,
            demand_forecast: 42.0,
            price: 19.99,
            discount: 0.1,
            weather_condition: "Sunny".to_string(),
            holiday_promotion: false,
            competitor_pricing: 21.0,
            seasonality: "Spring".to_string(),
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn summary_uses_calendar_order() {
        let records = vec![
            record("P2", day(2022, 10, 1)),
            record("P1", day(2022, 9, 30)),
            record("P1", day(2021, 12, 31)),
        ];

        let summary = DataSummary::of(&records);
        assert_eq!(summary.total_records, 3);
        assert_eq!(summary.unique_products, 2);
        assert_eq!(
            summary.date_range,
            Some(DateRange {
                min: day(2021, 12, 31),
                max: day(2022, 10, 1)
            })
        );
    }

    #[test]
    fn empty_batch_has_no_date_range() {
        let summary = DataSummary::of(&[]);
        assert_eq!(summary, DataSummary::default());
    }

    #[test]
    fn product_ids_are_sorted_and_distinct() {
        let dataset = Dataset::from_records(vec![
            record("P3", day(2022, 1, 1)),
            record("P1", day(2022, 1, 1)),
            record("P3", day(2022, 1, 2)),
        ])
        .unwrap();

        assert_eq!(dataset.product_ids(), vec!["P1", "P3"]);
    }

    #[test]
    fn from_records_rejects_invalid_record_with_row_number() {
        let mut bad = record("P2", day(2022, 1, 2));
        bad.discount = 1.5;

        let err = Dataset::from_records(vec![record("P1", day(2022, 1, 1)), bad]).unwrap_err();
        match err {
            IngestError::Record { row, source } => {
                assert_eq!(row, 2);
                assert!(source.is_range());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            ..ProptestConfig::default()
        })]

        /// Property: unique_products is the number of distinct ids and min <= max.
        #[test]
        fn summary_counts_distinct_products(
            rows in prop::collection::vec((0u8..12, 0i64..800), 1..60)
        ) {
            let start = day(2020, 1, 1);
            let records: Vec<InventoryRecord> = rows
                .iter()
                .map(|(p, offset)| record(&format!("P{p:03}"), start + chrono::Duration::days(*offset)))
                .collect();

            let expected: HashSet<u8> = rows.iter().map(|(p, _)| *p).collect();
            let summary = DataSummary::of(&records);

            prop_assert_eq!(summary.unique_products, expected.len());
            prop_assert_eq!(summary.total_records, records.len());
            let range = summary.date_range.unwrap();
            prop_assert!(range.min <= range.max);
            prop_assert!(records.iter().all(|r| range.min <= r.date && r.date <= range.max));
        }
    }
}
