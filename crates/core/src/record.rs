//! Inventory observation schema and row validation.
//!
//! A raw row is a slice of cells plus a [`ColumnLayout`] saying where each
//! required column lives. Validation is all-or-nothing per row: the first
//! unreadable or out-of-range cell rejects the row.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Required columns of an inventory file, by canonical header name.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Column {
    Date,
    StoreId,
    ProductId,
    Category,
    Region,
    InventoryLevel,
    UnitsSold,
    UnitsOrdered,
    DemandForecast,
    Price,
    Discount,
    WeatherCondition,
    HolidayPromotion,
    CompetitorPricing,
    Seasonality,
}

impl Column {
    pub const COUNT: usize = 15;

    /// All columns in canonical file order.
    pub const ALL: [Column; Column::COUNT] = [
        Column::Date,
        Column::StoreId,
        Column::ProductId,
        Column::Category,
        Column::Region,
        Column::InventoryLevel,
        Column::UnitsSold,
        Column::UnitsOrdered,
        Column::DemandForecast,
        Column::Price,
        Column::Discount,
        Column::WeatherCondition,
        Column::HolidayPromotion,
        Column::CompetitorPricing,
        Column::Seasonality,
    ];

    /// Header name as it appears in inventory files.
    pub const fn name(self) -> &'static str {
        match self {
            Column::Date => "Date",
            Column::StoreId => "Store_ID",
            Column::ProductId => "Product_ID",
            Column::Category => "Category",
            Column::Region => "Region",
            Column::InventoryLevel => "Inventory_Level",
            Column::UnitsSold => "Units_Sold",
            Column::UnitsOrdered => "Units_Ordered",
            Column::DemandForecast => "Demand_Forecast",
            Column::Price => "Price",
            Column::Discount => "Discount",
            Column::WeatherCondition => "Weather_Condition",
            Column::HolidayPromotion => "Holiday_Promotion",
            Column::CompetitorPricing => "Competitor_Pricing",
            Column::Seasonality => "Seasonality",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Where each required column sits within a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    positions: [usize; Column::COUNT],
}

impl ColumnLayout {
    /// Layout for rows already in canonical column order.
    pub fn canonical() -> Self {
        Self {
            positions: core::array::from_fn(|i| i),
        }
    }

    /// Resolve a layout from a header row.
    ///
    /// Matching is by exact name after trimming whitespace (and a leading BOM);
    /// order does not matter and extra columns are ignored.
    pub fn from_headers<S: AsRef<str>>(headers: &[S]) -> DomainResult<Self> {
        let names: Vec<&str> = headers
            .iter()
            .map(|h| h.as_ref().trim_start_matches('\u{feff}').trim())
            .collect();

        let mut positions = [0usize; Column::COUNT];
        for column in Column::ALL {
            let idx = names
                .iter()
                .position(|name| *name == column.name())
                .ok_or_else(|| DomainError::schema(column.name(), "required column is missing"))?;
            positions[column.index()] = idx;
        }
        Ok(Self { positions })
    }

    pub fn position(&self, column: Column) -> usize {
        self.positions[column.index()]
    }

    fn cell<'a, S: AsRef<str>>(&self, row: &'a [S], column: Column) -> DomainResult<&'a str> {
        row.get(self.position(column))
            .map(|cell| cell.as_ref().trim())
            .ok_or_else(|| DomainError::schema(column.name(), "value is missing"))
    }
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self::canonical()
    }
}

/// One inventory observation (store × product × day).
///
/// Immutable once ingested; serialized with the inventory file's header names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryRecord {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Store_ID")]
    pub store_id: String,
    #[serde(rename = "Product_ID")]
    pub product_id: String,
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Region")]
    pub region: String,
    #[serde(rename = "Inventory_Level")]
    pub inventory_level: u32,
    #[serde(rename = "Units_Sold")]
    pub units_sold: u32,
    #[serde(rename = "Units_Ordered")]
    pub units_ordered: u32,
    #[serde(rename = "Demand_Forecast")]
    pub demand_forecast: f64,
    #[serde(rename = "Price")]
    pub price: f64,
    /// Fraction in \[0, 1\].
    #[serde(rename = "Discount")]
    pub discount: f64,
    #[serde(rename = "Weather_Condition")]
    pub weather_condition: String,
    #[serde(rename = "Holiday_Promotion", with = "zero_one")]
    pub holiday_promotion: bool,
    #[serde(rename = "Competitor_Pricing")]
    pub competitor_pricing: f64,
    #[serde(rename = "Seasonality")]
    pub seasonality: String,
}

impl InventoryRecord {
    /// Parse and validate one raw row.
    pub fn from_row<S: AsRef<str>>(layout: &ColumnLayout, row: &[S]) -> DomainResult<Self> {
        let cell = |column: Column| layout.cell(row, column);

        let record = Self {
            date: parse_date(Column::Date, cell(Column::Date)?)?,
            store_id: cell(Column::StoreId)?.to_string(),
            product_id: cell(Column::ProductId)?.to_string(),
            category: cell(Column::Category)?.to_string(),
            region: cell(Column::Region)?.to_string(),
            inventory_level: parse_count(Column::InventoryLevel, cell(Column::InventoryLevel)?)?,
            units_sold: parse_count(Column::UnitsSold, cell(Column::UnitsSold)?)?,
            units_ordered: parse_count(Column::UnitsOrdered, cell(Column::UnitsOrdered)?)?,
            demand_forecast: parse_number(Column::DemandForecast, cell(Column::DemandForecast)?)?,
            price: parse_number(Column::Price, cell(Column::Price)?)?,
            discount: parse_number(Column::Discount, cell(Column::Discount)?)?,
            weather_condition: cell(Column::WeatherCondition)?.to_string(),
            holiday_promotion: parse_flag(Column::HolidayPromotion, cell(Column::HolidayPromotion)?)?,
            competitor_pricing: parse_number(
                Column::CompetitorPricing,
                cell(Column::CompetitorPricing)?,
            )?,
            seasonality: cell(Column::Seasonality)?.to_string(),
        };

        record.validate()?;
        Ok(record)
    }

    /// Check the invariants a typed record must hold.
    ///
    /// Records built outside [`InventoryRecord::from_row`] (e.g. returned by a
    /// remote service) go through this before they are accepted.
    pub fn validate(&self) -> DomainResult<()> {
        if self.store_id.is_empty() {
            return Err(DomainError::schema(Column::StoreId.name(), "must not be empty"));
        }
        if self.product_id.is_empty() {
            return Err(DomainError::schema(Column::ProductId.name(), "must not be empty"));
        }
        if !self.demand_forecast.is_finite() {
            return Err(DomainError::schema(
                Column::DemandForecast.name(),
                "must be a finite number",
            ));
        }
        ensure_non_negative(Column::Price, self.price)?;
        ensure_non_negative(Column::CompetitorPricing, self.competitor_pricing)?;
        if !(0.0..=1.0).contains(&self.discount) {
            return Err(DomainError::range(
                Column::Discount.name(),
                self.discount,
                "a fraction in [0, 1]",
            ));
        }
        Ok(())
    }
}

/// `Holiday_Promotion` is a 0/1 column in files; keep that shape on the wire.
mod zero_one {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        match u8::deserialize(deserializer)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(D::Error::custom(format!("expected 0 or 1, got {other}"))),
        }
    }
}

fn ensure_non_negative(column: Column, value: f64) -> DomainResult<()> {
    if !value.is_finite() {
        return Err(DomainError::schema(column.name(), "must be a finite number"));
    }
    if value < 0.0 {
        return Err(DomainError::range(column.name(), value, "a non-negative number"));
    }
    Ok(())
}

fn parse_date(column: Column, raw: &str) -> DomainResult<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .map_err(|_| DomainError::schema(column.name(), format!("expected a date, got `{raw}`")))
}

fn parse_number(column: Column, raw: &str) -> DomainResult<f64> {
    let value: f64 = raw
        .parse()
        .map_err(|_| DomainError::schema(column.name(), format!("expected a number, got `{raw}`")))?;
    // `f64::from_str` accepts "NaN" and "inf"; neither is a usable observation.
    if !value.is_finite() {
        return Err(DomainError::schema(
            column.name(),
            format!("expected a finite number, got `{raw}`"),
        ));
    }
    Ok(value)
}

fn parse_count(column: Column, raw: &str) -> DomainResult<u32> {
    let value = parse_number(column, raw)?;
    if value.fract() != 0.0 {
        return Err(DomainError::schema(
            column.name(),
            format!("expected an integer, got `{raw}`"),
        ));
    }
    if value < 0.0 || value > f64::from(u32::MAX) {
        return Err(DomainError::range(column.name(), raw, "a non-negative integer"));
    }
    Ok(value as u32)
}

fn parse_flag(column: Column, raw: &str) -> DomainResult<bool> {
    match parse_number(column, raw)? {
        v if v == 0.0 => Ok(false),
        v if v == 1.0 => Ok(true),
        _ => Err(DomainError::range(column.name(), raw, "0 or 1")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn row() -> Vec<String> {
        [
            "2022-01-01",
            "S001",
            "P0001",
            "Groceries",
            "North",
            "231",
            "127",
            "55",
            "135.47",
            "33.50",
            "0.2",
            "Rainy",
            "0",
            "29.69",
            "Autumn",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    fn with_cell(column: Column, value: &str) -> Vec<String> {
        let mut r = row();
        r[column.index()] = value.to_string();
        r
    }

    #[test]
    fn parses_canonical_row() {
        let record = InventoryRecord::from_row(&ColumnLayout::canonical(), &row()).unwrap();

        assert_eq!(record.date, NaiveDate::from_ymd_opt(2022, 1, 1).unwrap());
        assert_eq!(record.product_id, "P0001");
        assert_eq!(record.units_sold, 127);
        assert_eq!(record.discount, 0.2);
        assert!(!record.holiday_promotion);
    }

    #[test]
    fn layout_resolves_reordered_headers() {
        let mut headers: Vec<&str> = Column::ALL.iter().map(|c| c.name()).collect();
        headers.reverse();
        headers.push("Extra");

        let layout = ColumnLayout::from_headers(&headers).unwrap();
        assert_eq!(layout.position(Column::Date), 14);
        assert_eq!(layout.position(Column::Seasonality), 0);
    }

    #[test]
    fn layout_tolerates_bom_and_padding() {
        let mut headers: Vec<String> = Column::ALL.iter().map(|c| format!(" {} ", c.name())).collect();
        headers[0] = format!("\u{feff}{}", Column::Date.name());

        let layout = ColumnLayout::from_headers(&headers).unwrap();
        assert_eq!(layout, ColumnLayout::canonical());
    }

    #[test]
    fn missing_column_is_schema_error() {
        let headers: Vec<&str> = Column::ALL
            .iter()
            .filter(|c| **c != Column::Price)
            .map(|c| c.name())
            .collect();

        let err = ColumnLayout::from_headers(&headers).unwrap_err();
        assert!(err.is_schema());
        assert!(err.to_string().contains("Price"));
    }

    #[test]
    fn short_row_is_schema_error() {
        let mut r = row();
        r.truncate(10);
        let err = InventoryRecord::from_row(&ColumnLayout::canonical(), &r).unwrap_err();
        assert!(err.is_schema());
    }

    #[test]
    fn non_numeric_cell_is_schema_error() {
        let err = InventoryRecord::from_row(&ColumnLayout::canonical(), &with_cell(Column::UnitsSold, "lots"))
            .unwrap_err();
        assert_eq!(
            err,
            DomainError::schema("Units_Sold", "expected a number, got `lots`")
        );
    }

    #[test]
    fn nan_is_schema_error() {
        let err = InventoryRecord::from_row(&ColumnLayout::canonical(), &with_cell(Column::Price, "NaN"))
            .unwrap_err();
        assert!(err.is_schema());
    }

    #[test]
    fn fractional_count_is_schema_error() {
        let err = InventoryRecord::from_row(&ColumnLayout::canonical(), &with_cell(Column::UnitsOrdered, "2.5"))
            .unwrap_err();
        assert!(err.is_schema());
    }

    #[test]
    fn integral_float_count_is_accepted() {
        let record =
            InventoryRecord::from_row(&ColumnLayout::canonical(), &with_cell(Column::InventoryLevel, "40.0"))
                .unwrap();
        assert_eq!(record.inventory_level, 40);
    }

    #[test]
    fn negative_count_is_range_error() {
        let err = InventoryRecord::from_row(&ColumnLayout::canonical(), &with_cell(Column::UnitsSold, "-3"))
            .unwrap_err();
        assert!(err.is_range());
    }

    #[test]
    fn discount_outside_unit_interval_is_range_error() {
        let err = InventoryRecord::from_row(&ColumnLayout::canonical(), &with_cell(Column::Discount, "15"))
            .unwrap_err();
        assert_eq!(err, DomainError::range("Discount", 15.0, "a fraction in [0, 1]"));
    }

    #[test]
    fn negative_price_is_range_error() {
        let err = InventoryRecord::from_row(&ColumnLayout::canonical(), &with_cell(Column::Price, "-0.01"))
            .unwrap_err();
        assert!(err.is_range());
    }

    #[test]
    fn holiday_flag_must_be_zero_or_one() {
        let on = InventoryRecord::from_row(&ColumnLayout::canonical(), &with_cell(Column::HolidayPromotion, "1"))
            .unwrap();
        assert!(on.holiday_promotion);

        let err = InventoryRecord::from_row(&ColumnLayout::canonical(), &with_cell(Column::HolidayPromotion, "2"))
            .unwrap_err();
        assert!(err.is_range());
    }

    #[test]
    fn rfc3339_timestamp_keeps_date_part() {
        let record = InventoryRecord::from_row(
            &ColumnLayout::canonical(),
            &with_cell(Column::Date, "2022-03-04T10:00:00Z"),
        )
        .unwrap();
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2022, 3, 4).unwrap());
    }

    #[test]
    fn bad_date_is_schema_error() {
        let err = InventoryRecord::from_row(&ColumnLayout::canonical(), &with_cell(Column::Date, "01/02/2022"))
            .unwrap_err();
        assert!(err.is_schema());
    }

    #[test]
    fn empty_product_id_is_rejected() {
        let err = InventoryRecord::from_row(&ColumnLayout::canonical(), &with_cell(Column::ProductId, "  "))
            .unwrap_err();
        assert!(err.is_schema());
    }

    #[test]
    fn serializes_with_file_header_names() {
        let record = InventoryRecord::from_row(&ColumnLayout::canonical(), &row()).unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["Product_ID"], "P0001");
        assert_eq!(json["Date"], "2022-01-01");
        assert_eq!(json["Holiday_Promotion"], 0);

        let back: InventoryRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: every whole non-negative count cell parses to itself.
        #[test]
        fn count_cells_parse_to_their_value(units in any::<u32>()) {
            let record = InventoryRecord::from_row(
                &ColumnLayout::canonical(),
                &with_cell(Column::UnitsSold, &units.to_string()),
            )
            .unwrap();
            prop_assert_eq!(record.units_sold, units);
        }

        /// Property: a negative count is a range failure, never a schema failure.
        #[test]
        fn negative_counts_are_range_errors(units in 1i64..=1_000_000) {
            let err = InventoryRecord::from_row(
                &ColumnLayout::canonical(),
                &with_cell(Column::InventoryLevel, &(-units).to_string()),
            )
            .unwrap_err();
            prop_assert!(err.is_range());
        }

        /// Property: discounts inside [0, 1] are kept and those above are refused.
        #[test]
        fn discount_bounds_hold(discount in 0.0f64..2.0) {
            let parsed = InventoryRecord::from_row(
                &ColumnLayout::canonical(),
                &with_cell(Column::Discount, &discount.to_string()),
            );
            if discount <= 1.0 {
                prop_assert_eq!(parsed.unwrap().discount, discount);
            } else {
                prop_assert!(parsed.unwrap_err().is_range());
            }
        }
    }
}
