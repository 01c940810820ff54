//! Per-country snapshot table loaded from the dataset CSV.
//!
//! Source headers are renamed to snake case (`Country_Region` → `country`,
//! `Long_` → `long`, ...) and anything outside the location/metric set is
//! dropped on the floor.

use std::collections::HashSet;

use csv::StringRecord;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::feeds::{DataUnavailable, Feed, FeedError, FeedSource};
use crate::metrics::Metric;

const COUNTRY_COLUMN: &str = "Country_Region";
const LAT_COLUMN: &str = "Lat";
const LONG_COLUMN: &str = "Long_";

/// Normalized header order used when writing the table back out.
pub const SNAPSHOT_HEADERS: [&str; 9] = [
    "country",
    "lat",
    "long",
    "confirmed",
    "deaths",
    "recovered",
    "active",
    "incident_rate",
    "mortality_rate",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CountrySnapshotRow {
    pub country: String,
    pub lat: Option<f64>,
    pub long: Option<f64>,
    pub confirmed: Option<f64>,
    pub deaths: Option<f64>,
    pub recovered: Option<f64>,
    pub active: Option<f64>,
    pub incident_rate: Option<f64>,
    pub mortality_rate: Option<f64>,
}

impl CountrySnapshotRow {
    pub fn new(country: impl Into<String>) -> Self {
        Self {
            country: country.into(),
            ..Default::default()
        }
    }

    pub fn metric(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Confirmed => self.confirmed,
            Metric::Deaths => self.deaths,
            Metric::Recovered => self.recovered,
            Metric::Active => self.active,
            Metric::IncidentRate => self.incident_rate,
            Metric::MortalityRate => self.mortality_rate,
        }
    }

    pub fn with_metric(mut self, metric: Metric, value: f64) -> Self {
        *self.metric_slot(metric) = Some(value);
        self
    }

    pub fn with_location(mut self, lat: f64, long: f64) -> Self {
        self.lat = Some(lat);
        self.long = Some(long);
        self
    }

    fn metric_slot(&mut self, metric: Metric) -> &mut Option<f64> {
        match metric {
            Metric::Confirmed => &mut self.confirmed,
            Metric::Deaths => &mut self.deaths,
            Metric::Recovered => &mut self.recovered,
            Metric::Active => &mut self.active,
            Metric::IncidentRate => &mut self.incident_rate,
            Metric::MortalityRate => &mut self.mortality_rate,
        }
    }
}

/// The immutable table every view of a session is derived from.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Snapshot {
    rows: Vec<CountrySnapshotRow>,
}

impl Snapshot {
    /// Builds a snapshot, keeping the first row of any repeated country.
    pub fn from_rows(rows: Vec<CountrySnapshotRow>) -> Self {
        let mut seen = HashSet::new();
        let rows = rows
            .into_iter()
            .filter(|row| {
                let fresh = seen.insert(row.country.clone());
                if !fresh {
                    warn!("Dropping duplicate snapshot row for '{}'", row.country);
                }
                fresh
            })
            .collect();
        Self { rows }
    }

    pub fn rows(&self) -> &[CountrySnapshotRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Writes the retained columns with normalized headers. Absent values become empty cells.
    pub fn write_csv<W: std::io::Write>(&self, writer: W) -> Result<(), FeedError> {
        let mut out = csv::Writer::from_writer(writer);
        out.write_record(SNAPSHOT_HEADERS)?;
        for row in &self.rows {
            let mut record = Vec::with_capacity(SNAPSHOT_HEADERS.len());
            record.push(row.country.clone());
            record.push(format_cell(row.lat));
            record.push(format_cell(row.long));
            for metric in Metric::ALL {
                record.push(format_cell(row.metric(metric)));
            }
            out.write_record(&record)?;
        }
        out.flush().map_err(csv::Error::from)?;
        Ok(())
    }

    pub fn to_csv_string(&self) -> Result<String, FeedError> {
        let mut buf = Vec::new();
        self.write_csv(&mut buf)?;
        String::from_utf8(buf).map_err(|e| FeedError::Malformed(e.to_string()))
    }
}

fn format_cell(value: Option<f64>) -> String {
    // f64's Display is the shortest representation that parses back to the same value.
    value.map(|v| v.to_string()).unwrap_or_default()
}

// ────────────────────────────────────────────────────────────────────────────
// Loading
// ────────────────────────────────────────────────────────────────────────────

/// Fetches and normalizes the dataset. Any failure is `DataUnavailable`.
pub async fn load_snapshot(source: &dyn FeedSource, url: &str) -> Result<Snapshot, DataUnavailable> {
    let body = source
        .fetch(url)
        .await
        .map_err(|e| DataUnavailable::new(Feed::Dataset, e))?;

    let snapshot = parse_snapshot(&body).map_err(|e| DataUnavailable::new(Feed::Dataset, e))?;
    if snapshot.is_empty() {
        warn!("Dataset at {url} has a header but no country rows");
    }
    info!("Loaded snapshot with {} countries from {url}", snapshot.len());
    Ok(snapshot)
}

/// Column positions of the recognized fields within the source header row.
struct ColumnMap {
    country: usize,
    lat: Option<usize>,
    long: Option<usize>,
    metrics: Vec<(Metric, usize)>,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord) -> Result<Self, FeedError> {
        let position = |name: &str| headers.iter().position(|h| h == name);

        let country = position(COUNTRY_COLUMN).ok_or_else(|| {
            FeedError::Malformed(format!("missing required column '{COUNTRY_COLUMN}'"))
        })?;

        let metrics = Metric::ALL
            .into_iter()
            .filter_map(|m| position(m.source_name()).map(|idx| (m, idx)))
            .collect();

        Ok(Self {
            country,
            lat: position(LAT_COLUMN),
            long: position(LONG_COLUMN),
            metrics,
        })
    }
}

pub fn parse_snapshot(body: &[u8]) -> Result<Snapshot, FeedError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(body);

    let headers = reader.headers()?.clone();
    let columns = ColumnMap::from_headers(&headers)?;

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // Header is line 1.
        let line = idx + 2;
        let record = result?;

        let country = record.get(columns.country).unwrap_or_default();
        if country.is_empty() {
            warn!("Skipping dataset line {line}: blank {COUNTRY_COLUMN}");
            continue;
        }

        let mut row = CountrySnapshotRow::new(country);
        row.lat = read_cell(&record, columns.lat, LAT_COLUMN, line)?;
        row.long = read_cell(&record, columns.long, LONG_COLUMN, line)?;
        for (metric, col) in &columns.metrics {
            *row.metric_slot(*metric) = read_cell(&record, Some(*col), metric.source_name(), line)?;
        }
        rows.push(row);
    }

    Ok(Snapshot::from_rows(rows))
}

/// Empty and NaN cells are absent; anything else must parse as a float.
fn read_cell(
    record: &StringRecord,
    col: Option<usize>,
    name: &str,
    line: usize,
) -> Result<Option<f64>, FeedError> {
    let raw = match col.and_then(|c| record.get(c)) {
        Some(raw) if !raw.is_empty() => raw,
        _ => return Ok(None),
    };
    let value: f64 = raw.parse().map_err(|_| {
        FeedError::Malformed(format!("line {line}: '{raw}' in column '{name}' is not a number"))
    })?;
    Ok(if value.is_nan() { None } else { Some(value) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feeds::testing::StaticFeedSource;

    const JHU_SAMPLE: &str = "\
Country_Region,Last_Update,Lat,Long_,Confirmed,Deaths,Recovered,Active,Incident_Rate,People_Tested,People_Hospitalized,Mortality_Rate,UID,ISO3
Afghanistan,2021-03-01 02:27:05,33.93911,67.709953,55696,2442,49285,3969,143.0731404659654,,,4.384515943694341,4,AFG
Albania,2021-03-01 02:27:05,41.1533,20.1683,107167,1816,71493,33858,3723.9245955942663,,,1.6945141321862143,8,ALB
Diamond Princess,2021-03-01 02:27:05,,,712,13,699,0,,,,1.8258426966292134,9999,
MS Zaandam,2021-03-01 02:27:05,,,9,2,,7,,,,22.22222222222222,8888,
";

    #[test]
    fn test_renames_and_drops_columns() {
        let snapshot = parse_snapshot(JHU_SAMPLE.as_bytes()).unwrap();
        assert_eq!(snapshot.len(), 4);

        let afg = &snapshot.rows()[0];
        assert_eq!(afg.country, "Afghanistan");
        assert_eq!(afg.lat, Some(33.93911));
        assert_eq!(afg.long, Some(67.709953));
        assert_eq!(afg.confirmed, Some(55696.0));
        assert_eq!(afg.mortality_rate, Some(4.384515943694341));

        let json = serde_json::to_value(afg).unwrap();
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(|k| k.as_str()).collect();
        assert!(keys.contains(&"country"));
        assert!(keys.contains(&"long"));
        assert!(!keys.iter().any(|k| k.contains("People") || k.contains("people")));
        assert!(!keys.contains(&"Country_Region"));
        assert!(!keys.contains(&"iso3"));
    }

    #[test]
    fn test_missing_cells_are_absent() {
        let snapshot = parse_snapshot(JHU_SAMPLE.as_bytes()).unwrap();
        let zaandam = &snapshot.rows()[3];
        assert_eq!(zaandam.lat, None);
        assert_eq!(zaandam.long, None);
        assert_eq!(zaandam.recovered, None);
        assert_eq!(zaandam.active, Some(7.0));
    }

    #[test]
    fn test_write_csv_preserves_retained_values() {
        let snapshot = parse_snapshot(JHU_SAMPLE.as_bytes()).unwrap();
        let written = snapshot.to_csv_string().unwrap();
        assert!(written.starts_with(
            "country,lat,long,confirmed,deaths,recovered,active,incident_rate,mortality_rate"
        ));
        assert!(written.contains("MS Zaandam,,,9,2,,7,,22.22222222222222"));

        // Reading the written table with source headers restored gives the same rows.
        let restored_headers = written.replacen(
            "country,lat,long,confirmed,deaths,recovered,active,incident_rate,mortality_rate",
            "Country_Region,Lat,Long_,Confirmed,Deaths,Recovered,Active,Incident_Rate,Mortality_Rate",
            1,
        );
        let reloaded = parse_snapshot(restored_headers.as_bytes()).unwrap();
        assert_eq!(reloaded, snapshot);
    }

    #[test]
    fn test_missing_country_column_is_malformed() {
        let err = parse_snapshot(b"Lat,Long_,Confirmed\n1,2,3\n").unwrap_err();
        assert!(matches!(err, FeedError::Malformed(msg) if msg.contains("Country_Region")));
    }

    #[test]
    fn test_non_numeric_cell_is_malformed() {
        let err = parse_snapshot(b"Country_Region,Confirmed\nX,lots\n").unwrap_err();
        assert!(matches!(err, FeedError::Malformed(msg) if msg.contains("line 2")));
    }

    #[test]
    fn test_ragged_csv_is_an_error() {
        assert!(parse_snapshot(b"Country_Region,Confirmed\nX,1,2\n").is_err());
    }

    #[test]
    fn test_nan_blank_country_and_duplicates() {
        let csv = "Country_Region,Confirmed\nX,NaN\n,5\nX,7\nY,3\n";
        let snapshot = parse_snapshot(csv.as_bytes()).unwrap();
        let countries: Vec<&str> = snapshot.rows().iter().map(|r| r.country.as_str()).collect();
        assert_eq!(countries, vec!["X", "Y"]);
        assert_eq!(snapshot.rows()[0].confirmed, None);
    }

    #[tokio::test]
    async fn test_load_snapshot_maps_fetch_failure() {
        let source = StaticFeedSource::new().with_status("http://feed/cases.csv", 500);
        let err = load_snapshot(&source, "http://feed/cases.csv").await.unwrap_err();
        assert_eq!(err.feed, Feed::Dataset);
    }

    #[tokio::test]
    async fn test_load_snapshot_from_source() {
        let source = StaticFeedSource::new().with_body("http://feed/cases.csv", JHU_SAMPLE);
        let snapshot = load_snapshot(&source, "http://feed/cases.csv").await.unwrap();
        assert_eq!(snapshot.rows()[1].country, "Albania");
    }
}
