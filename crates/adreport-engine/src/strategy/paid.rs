//! Paid traffic: one aggregate row over all ad platform types.

use adreport_core::provider::ProviderResponse;
use adreport_core::report::Cell;

use crate::layout::{MetricLookup, ReportLayout};

pub const COLUMN_LABEL: &str = "Source";
pub const AGGREGATE_LABEL: &str = "Yandex.Direct";

pub fn main_dimension(attribution: &str) -> String {
    format!("ym:ad:{attribution}DirectPlatformType")
}

/// Sum every raw metric across the platform rows and build one row from the
/// sums. Derived columns are recomputed from the summed base values.
pub fn collapse(layout: &ReportLayout, response: &ProviderResponse) -> Vec<Cell> {
    let mut totals: Vec<Option<f64>> = vec![None; response.metrics.len()];
    for row in &response.rows {
        for (total, value) in totals.iter_mut().zip(&row.metrics) {
            if let Some(value) = value {
                *total = Some(total.unwrap_or(0.0) + value);
            }
        }
    }
    let lookup = MetricLookup::new(&response.metrics);
    layout.build_row(AGGREGATE_LABEL, &lookup, &totals)
}
