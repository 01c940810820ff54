use serde::Serialize;

use crate::data::snapshot::CountrySnapshotRow;
use crate::metrics::Metric;

/// One bubble on the map. Projection, colour and size are the renderer's business.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub long: f64,
    pub country: String,
    pub value: f64,
}

pub fn geo_points(rows: &[CountrySnapshotRow], metric: Metric) -> Vec<GeoPoint> {
    rows.iter()
        .filter_map(|row| {
            Some(GeoPoint {
                lat: row.lat?,
                long: row.long?,
                country: row.country.clone(),
                value: row.metric(metric)?,
            })
        })
        .collect()
}
