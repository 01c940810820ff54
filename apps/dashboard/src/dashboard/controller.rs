//! Dashboard controller — wires the feeds, the catalog and the chart views.
//!
//! Failure policy:
//! 1. Dataset (feed A) failure aborts the session: nothing can render without it.
//! 2. Directory (feed B) failure disables country selection only.
//! 3. Time-series (feed C) failure degrades that panel to `Unavailable`.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::config::Config;
use crate::dashboard::sessions::{DashboardSession, DirectoryState};
use crate::data::directory::load_directory;
use crate::data::snapshot::load_snapshot;
use crate::data::timeseries::{fetch_time_series, TimeSeries};
use crate::errors::AppError;
use crate::feeds::{DataUnavailable, FeedSource};
use crate::metrics::{CatalogError, MapProjection, Metric, MetricCatalog, MetricDescriptor};
use crate::views::geo::{geo_points, GeoPoint};
use crate::views::ranking::{top_n, RankedCountry};

/// Rows behind the map and the bar chart for one metric selection.
#[derive(Debug, Serialize)]
pub struct MetricView {
    pub metric: &'static MetricDescriptor,
    pub projection: MapProjection,
    pub top_n: usize,
    pub ranking: Vec<RankedCountry>,
    pub geo_points: Vec<GeoPoint>,
}

#[derive(Debug, Serialize)]
pub struct TimeSeriesPanel {
    pub country: String,
    pub slug: String,
    pub metric: Metric,
    pub series: TimeSeries,
}

#[derive(Clone)]
pub struct DashboardController {
    feeds: Arc<dyn FeedSource>,
    catalog: MetricCatalog,
    dataset_url: String,
    countries_url: String,
    timeseries_base_url: String,
    top_n: usize,
}

impl DashboardController {
    pub fn new(config: &Config, feeds: Arc<dyn FeedSource>) -> Self {
        Self {
            feeds,
            catalog: MetricCatalog::new(config.variant),
            dataset_url: config.dataset_url.clone(),
            countries_url: config.countries_url.clone(),
            timeseries_base_url: config.timeseries_base_url.clone(),
            top_n: config.top_n,
        }
    }

    pub fn catalog(&self) -> &MetricCatalog {
        &self.catalog
    }

    /// Pulls the snapshot and the directory for a new page load.
    pub async fn open_session(&self) -> Result<DashboardSession, DataUnavailable> {
        let (snapshot, directory) = tokio::join!(
            load_snapshot(self.feeds.as_ref(), &self.dataset_url),
            load_directory(self.feeds.as_ref(), &self.countries_url),
        );

        let snapshot = snapshot?;
        let directory = match directory {
            Ok(entries) => DirectoryState::Ready { entries },
            Err(e) => {
                warn!("Country selection disabled: {e}");
                DirectoryState::Disabled {
                    reason: format!("the {} could not be loaded", e.feed),
                }
            }
        };

        let session = DashboardSession::new(snapshot, directory);
        info!(
            "Opened session {} ({} countries)",
            session.id,
            session.snapshot.len()
        );
        Ok(session)
    }

    pub fn metric_view(
        &self,
        session: &DashboardSession,
        metric_key: &str,
    ) -> Result<MetricView, CatalogError> {
        let descriptor = self.catalog.describe(metric_key)?;
        let rows = session.snapshot.rows();

        Ok(MetricView {
            metric: descriptor,
            projection: self.catalog.profile().projection,
            top_n: self.top_n,
            ranking: top_n(rows, descriptor.key, self.top_n),
            geo_points: geo_points(rows, descriptor.key),
        })
    }

    /// Translates the display name to a slug and fetches that country's series.
    pub async fn country_series(
        &self,
        session: &DashboardSession,
        country: &str,
        metric_key: &str,
    ) -> Result<TimeSeriesPanel, AppError> {
        let metric = self.catalog.resolve(metric_key)?;

        let directory = match &session.directory {
            DirectoryState::Ready { entries } => entries,
            DirectoryState::Disabled { reason } => {
                return Err(AppError::Disabled(format!(
                    "Country selection is disabled: {reason}"
                )))
            }
        };

        let slug = directory
            .slug_for(country)
            .ok_or_else(|| AppError::NotFound(format!("Country '{country}' not found")))?
            .to_string();

        let series = fetch_time_series(self.feeds.as_ref(), &self.timeseries_base_url, &slug)
            .await
            .narrow_to(metric);

        Ok(TimeSeriesPanel {
            country: country.to_string(),
            slug,
            metric,
            series,
        })
    }
}
