//! Deterministic synthetic inventory data.
//!
//! Used to preload a workflow before a real file is uploaded, and by tests that
//! need realistic volumes. The same configuration always yields the same rows.

use chrono::{Datelike, Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use demandiq_core::InventoryRecord;

use crate::dataset::Dataset;

const CATEGORIES: &[&str] = &["Groceries", "Toys", "Electronics", "Furniture", "Clothing"];
const REGIONS: &[&str] = &["North", "South", "East", "West"];
const WEATHER: &[&str] = &["Sunny", "Rainy", "Cloudy", "Snowy"];
const DISCOUNTS: &[f64] = &[0.0, 0.05, 0.1, 0.15, 0.2];

fn pick<'a, T>(rng: &mut StdRng, list: &'a [T]) -> &'a T {
    &list[rng.gen_range(0..list.len())]
}

fn season(date: NaiveDate) -> &'static str {
    match date.month() {
        12 | 1 | 2 => "Winter",
        3..=5 => "Spring",
        6..=8 => "Summer",
        _ => "Autumn",
    }
}

fn seasonal_factor(season: &str) -> f64 {
    match season {
        "Winter" => 0.85,
        "Summer" => 1.2,
        _ => 1.0,
    }
}

/// Generator for `products × stores × days` inventory records.
#[derive(Debug, Clone)]
pub struct SampleGenerator {
    products: usize,
    stores: usize,
    days: usize,
    start: NaiveDate,
    seed: u64,
}

impl Default for SampleGenerator {
    fn default() -> Self {
        Self {
            products: 20,
            stores: 5,
            days: 100,
            start: NaiveDate::from_ymd_opt(2022, 1, 1).unwrap_or_default(),
            seed: 42,
        }
    }
}

impl SampleGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_products(mut self, products: usize) -> Self {
        self.products = products;
        self
    }

    pub fn with_stores(mut self, stores: usize) -> Self {
        self.stores = stores;
        self
    }

    pub fn with_days(mut self, days: usize) -> Self {
        self.days = days;
        self
    }

    pub fn with_start(mut self, start: NaiveDate) -> Self {
        self.start = start;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn record_count(&self) -> usize {
        self.products * self.stores * self.days
    }

    /// Rows ordered by day, then store, then product.
    pub fn generate(&self) -> Vec<InventoryRecord> {
        let mut rng = StdRng::seed_from_u64(self.seed);

        // Per-product traits stay fixed across days so the series are learnable.
        let profiles: Vec<(f64, f64, &str)> = (0..self.products)
            .map(|_| {
                let base_demand = rng.gen_range(80.0..300.0_f64);
                let price = (rng.gen_range(10.0..100.0_f64) * 100.0).round() / 100.0;
                let category = *pick(&mut rng, CATEGORIES);
                (base_demand, price, category)
            })
            .collect();
        let regions: Vec<&str> = (0..self.stores).map(|_| *pick(&mut rng, REGIONS)).collect();

        let mut records = Vec::with_capacity(self.record_count());
        for day in 0..self.days {
            let date = self.start + Duration::days(day as i64);
            let season = season(date);
            let weather = *pick(&mut rng, WEATHER);
            let holiday = rng.gen_bool(0.1);

            for (store, region) in regions.iter().enumerate() {
                for (product, (base_demand, base_price, category)) in profiles.iter().enumerate() {
                    let discount = *pick(&mut rng, DISCOUNTS);
                    let price = (base_price * rng.gen_range(0.9..1.1_f64) * 100.0).round() / 100.0;
                    // Demand falls as price rises, but noise can hide it for some products.
                    let elasticity = (base_price / price).powf(1.5);
                    let lift = (1.0 + discount * 1.5) * if holiday { 1.2 } else { 1.0 };
                    let noise = rng.gen_range(0.85..1.15_f64);
                    let units_sold =
                        (base_demand * seasonal_factor(season) * elasticity * lift * noise).round();
                    let forecast_noise = rng.gen_range(0.9..1.1_f64);

                    records.push(InventoryRecord {
                        date,
                        store_id: format!("S{:03}", store + 1),
                        product_id: format!("P{:04}", product + 1),
                        category: (*category).to_string(),
                        region: (*region).to_string(),
                        inventory_level: units_sold as u32 + rng.gen_range(50..300),
                        units_sold: units_sold as u32,
                        units_ordered: rng.gen_range(20..200),
                        demand_forecast: (units_sold * forecast_noise * 100.0).round() / 100.0,
                        price,
                        discount,
                        weather_condition: weather.to_string(),
                        holiday_promotion: holiday,
                        competitor_pricing: (price * rng.gen_range(0.9..1.1_f64) * 100.0).round() / 100.0,
                        seasonality: season.to_string(),
                    });
                }
            }
        }
        records
    }

    /// Generated rows as a ready dataset.
    pub fn dataset(&self) -> Dataset {
        Dataset::from_validated(self.generate())
    }
}
