//! CSV export of a metrics snapshot.

use std::fmt::Write as _;

use serde::Serialize;

use demandiq_core::ProductMetrics;

/// Name of the downloadable artifact.
pub const EXPORT_FILE_NAME: &str = "forecast_results.csv";

pub const EXPORT_HEADER: &str = "Product_ID,Predicted_Demand,Confidence,WMAPE,Recommendation";

/// Export text plus the artifact name it should be served under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CsvExport {
    pub file_name: &'static str,
    pub content: String,
}

/// Render the snapshot as CSV, one row per record in snapshot order.
///
/// Confidence and WMAPE are percentages (1 and 2 decimals). The recommendation
/// is always quoted; product ids only when they need it. Rows are joined with
/// `\n` and there is no trailing newline.
pub fn export_csv(metrics: &[ProductMetrics]) -> String {
    let mut out = String::from(EXPORT_HEADER);
    for m in metrics {
        // Writing into a String cannot fail.
        let _ = write!(
            out,
            "\n{},{},{:.1}%,{:.2}%,{}",
            field(&m.product_id),
            m.predicted_demand,
            percent(m.confidence, 1),
            percent(m.wmape, 2),
            quoted(&m.recommendation),
        );
    }
    out
}

pub fn export(metrics: &[ProductMetrics]) -> CsvExport {
    CsvExport {
        file_name: EXPORT_FILE_NAME,
        content: export_csv(metrics),
    }
}

/// `ratio` as a percentage rounded to `decimals`, ties away from zero.
///
/// `format!` alone rounds ties to even, which would print 91.25 as `91.2`.
fn percent(ratio: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (ratio * 100.0 * scale).round() / scale
}

fn quoted(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        quoted(value)
    } else {
        value.to_string()
    }
}
