//! Live per-country time series.
//!
//! The fetcher never fails past its own boundary: an unreachable endpoint, an
//! empty payload or a malformed one all come back as
//! `TimeSeries::Unavailable` so the caller renders a "no data" panel instead
//! of erroring the page.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::feeds::{FeedError, FeedSource};
use crate::metrics::Metric;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeriesPoint {
    pub date: DateTime<Utc>,
    pub country: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub province: Option<String>,
    pub metric_values: BTreeMap<String, f64>,
}

impl TimeSeriesPoint {
    pub fn value(&self, metric: Metric) -> Option<f64> {
        self.metric_values.get(metric.key()).copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnavailableReason {
    RequestFailed,
    EmptyPayload,
    MalformedPayload,
    MetricNotReported,
}

impl UnavailableReason {
    pub fn message(self) -> &'static str {
        match self {
            UnavailableReason::RequestFailed => "The time-series service could not be reached.",
            UnavailableReason::EmptyPayload => "No time-series data is available for this country.",
            UnavailableReason::MalformedPayload => "The time-series service returned unreadable data.",
            UnavailableReason::MetricNotReported => {
                "The time-series service does not report this metric."
            }
        }
    }
}

/// Result of a time-series fetch. `Unavailable` is a normal outcome, not an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TimeSeries {
    Available { points: Vec<TimeSeriesPoint> },
    Unavailable { reason: UnavailableReason, message: &'static str },
}

impl TimeSeries {
    pub fn unavailable(reason: UnavailableReason) -> Self {
        TimeSeries::Unavailable {
            reason,
            message: reason.message(),
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, TimeSeries::Available { .. })
    }

    /// Keeps only points that report `metric`.
    pub fn narrow_to(self, metric: Metric) -> Self {
        match self {
            TimeSeries::Available { points } => {
                let points: Vec<_> = points
                    .into_iter()
                    .filter(|p| p.value(metric).is_some())
                    .collect();
                if points.is_empty() {
                    TimeSeries::unavailable(UnavailableReason::MetricNotReported)
                } else {
                    TimeSeries::Available { points }
                }
            }
            unavailable => unavailable,
        }
    }
}

pub fn series_url(base_url: &str, slug: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), slug)
}

pub async fn fetch_time_series(source: &dyn FeedSource, base_url: &str, slug: &str) -> TimeSeries {
    let url = series_url(base_url, slug);
    let body = match source.fetch(&url).await {
        Ok(body) => body,
        Err(e) => {
            warn!("Time series for '{slug}' unavailable: {e}");
            return TimeSeries::unavailable(UnavailableReason::RequestFailed);
        }
    };

    match parse_time_series(&body, slug) {
        Ok(points) if points.is_empty() => {
            debug!("Time series for '{slug}' is empty");
            TimeSeries::unavailable(UnavailableReason::EmptyPayload)
        }
        Ok(points) => TimeSeries::Available { points },
        Err(e) => {
            warn!("Time series for '{slug}' malformed: {e}");
            TimeSeries::unavailable(UnavailableReason::MalformedPayload)
        }
    }
}

/// Accepts a bare array of records or an object holding the array under `slug`.
pub fn parse_time_series(body: &[u8], slug: &str) -> Result<Vec<TimeSeriesPoint>, FeedError> {
    let payload: Value = serde_json::from_slice(body)?;
    let records = match payload {
        Value::Array(records) => records,
        Value::Object(mut map) => match map.remove(slug) {
            Some(Value::Array(records)) => records,
            _ => {
                return Err(FeedError::Malformed(format!(
                    "object payload has no '{slug}' array"
                )))
            }
        },
        other => {
            return Err(FeedError::Malformed(format!(
                "expected array or object, got {other}"
            )))
        }
    };

    let mut points = records
        .iter()
        .enumerate()
        .map(|(idx, record)| parse_point(idx, record, slug))
        .collect::<Result<Vec<_>, _>>()?;

    // sort_by_key is stable; same-day records keep upstream order.
    points.sort_by_key(|p| p.date);
    Ok(points)
}

fn parse_point(idx: usize, record: &Value, slug: &str) -> Result<TimeSeriesPoint, FeedError> {
    let obj = record
        .as_object()
        .ok_or_else(|| FeedError::Malformed(format!("record {idx} is not an object")))?;

    let date = obj
        .get("Date")
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .ok_or_else(|| FeedError::Malformed(format!("record {idx} has no valid Date")))?
        .with_timezone(&Utc);

    let country = obj
        .get("Country")
        .and_then(Value::as_str)
        .unwrap_or(slug)
        .to_string();

    let province = obj
        .get("Province")
        .and_then(Value::as_str)
        .filter(|p| !p.is_empty())
        .map(str::to_string);

    let metric_values = Metric::ALL
        .into_iter()
        .filter_map(|m| {
            obj.get(m.source_name())
                .and_then(Value::as_f64)
                .filter(|v| v.is_finite())
                .map(|v| (m.key().to_string(), v))
        })
        .collect();

    Ok(TimeSeriesPoint {
        date,
        country,
        province,
        metric_values,
    })
}
