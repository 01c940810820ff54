use serde::Serialize;

use crate::data::snapshot::CountrySnapshotRow;
use crate::metrics::Metric;

pub const DEFAULT_TOP_N: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedCountry {
    pub country: String,
    pub value: f64,
}

/// Top-N countries by `metric`, highest first.
///
/// Rows without the metric are skipped. The sort is `slice::sort_by`, which is
/// stable, so countries with equal values keep their snapshot order.
pub fn top_n(rows: &[CountrySnapshotRow], metric: Metric, n: usize) -> Vec<RankedCountry> {
    let mut ranked: Vec<RankedCountry> = rows
        .iter()
        .filter_map(|row| {
            row.metric(metric).map(|value| RankedCountry {
                country: row.country.clone(),
                value,
            })
        })
        .collect();

    ranked.sort_by(|a, b| b.value.total_cmp(&a.value));
    ranked.truncate(n);
    ranked
}
