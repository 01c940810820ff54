//! Metric catalog — the static set of selectable COVID-19 statistics and the
//! text shown alongside each chart.
//!
//! A deployment variant enables a subset of the canonical six metrics and
//! picks the map projection handed to the rendering layer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    #[error("Unknown metric: {0}")]
    UnknownMetric(String),

    #[error("Unknown dashboard variant: {0}")]
    UnknownVariant(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Confirmed,
    Deaths,
    Recovered,
    Active,
    IncidentRate,
    MortalityRate,
}

impl Metric {
    pub const ALL: [Metric; 6] = [
        Metric::Confirmed,
        Metric::Deaths,
        Metric::Recovered,
        Metric::Active,
        Metric::IncidentRate,
        Metric::MortalityRate,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Metric::Confirmed => "confirmed",
            Metric::Deaths => "deaths",
            Metric::Recovered => "recovered",
            Metric::Active => "active",
            Metric::IncidentRate => "incident_rate",
            Metric::MortalityRate => "mortality_rate",
        }
    }

    /// Column / field name used by the upstream feeds.
    pub fn source_name(self) -> &'static str {
        match self {
            Metric::Confirmed => "Confirmed",
            Metric::Deaths => "Deaths",
            Metric::Recovered => "Recovered",
            Metric::Active => "Active",
            Metric::IncidentRate => "Incident_Rate",
            Metric::MortalityRate => "Mortality_Rate",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Metric {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .into_iter()
            .find(|m| m.key() == s)
            .ok_or_else(|| CatalogError::UnknownMetric(s.to_string()))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricDescriptor {
    pub key: Metric,
    pub title: &'static str,
    pub description: &'static str,
}

static DESCRIPTORS: [MetricDescriptor; 6] = [
    MetricDescriptor {
        key: Metric::Confirmed,
        title: "Confirmed COVID-19 Cases",
        description: "Counts include confirmed and probable (where reported).",
    },
    MetricDescriptor {
        key: Metric::Deaths,
        title: "Death Count caused by COVID-19",
        description: "Counts include confirmed and probable (where reported).",
    },
    MetricDescriptor {
        key: Metric::Recovered,
        title: "Recovered Cases",
        description: "Recovered cases are estimates based on local media reports, and state and \
                      local reporting when available, and therefore may be substantially lower \
                      than the true number.",
    },
    MetricDescriptor {
        key: Metric::Active,
        title: "Current Active COVID-19 Cases",
        description: "Active cases = total cases - total recovered - total deaths.",
    },
    MetricDescriptor {
        key: Metric::IncidentRate,
        title: "Incident Rate",
        description: "Incidence Rate = cases per 100,000 persons.",
    },
    MetricDescriptor {
        key: Metric::MortalityRate,
        title: "Mortality Rate",
        description: "Case-Fatality Ratio (%) = Number recorded deaths / Number cases.",
    },
];

// ────────────────────────────────────────────────────────────────────────────
// Deployment variants
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DashboardVariant {
    Full,
    Classic,
}

impl FromStr for DashboardVariant {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(DashboardVariant::Full),
            "classic" => Ok(DashboardVariant::Classic),
            other => Err(CatalogError::UnknownVariant(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MapProjection {
    #[serde(rename = "robinson")]
    Robinson,
    #[serde(rename = "natural earth")]
    NaturalEarth,
}

#[derive(Debug, Clone, Serialize)]
pub struct VariantProfile {
    pub variant: DashboardVariant,
    pub metrics: &'static [Metric],
    pub projection: MapProjection,
}

impl VariantProfile {
    pub fn for_variant(variant: DashboardVariant) -> Self {
        match variant {
            DashboardVariant::Full => Self {
                variant,
                metrics: &Metric::ALL,
                projection: MapProjection::Robinson,
            },
            DashboardVariant::Classic => Self {
                variant,
                metrics: &[
                    Metric::Confirmed,
                    Metric::Deaths,
                    Metric::Recovered,
                    Metric::Active,
                ],
                projection: MapProjection::NaturalEarth,
            },
        }
    }
}

/// Read-only lookup restricted to the metrics a variant enables.
#[derive(Debug, Clone)]
pub struct MetricCatalog {
    profile: VariantProfile,
}

impl MetricCatalog {
    pub fn new(variant: DashboardVariant) -> Self {
        Self {
            profile: VariantProfile::for_variant(variant),
        }
    }

    pub fn profile(&self) -> &VariantProfile {
        &self.profile
    }

    /// Parses a metric key, rejecting keys the variant does not enable.
    pub fn resolve(&self, key: &str) -> Result<Metric, CatalogError> {
        let metric: Metric = key.parse()?;
        if self.profile.metrics.contains(&metric) {
            Ok(metric)
        } else {
            Err(CatalogError::UnknownMetric(key.to_string()))
        }
    }

    pub fn describe(&self, key: &str) -> Result<&'static MetricDescriptor, CatalogError> {
        let metric = self.resolve(key)?;
        Ok(descriptor(metric))
    }

    pub fn descriptors(&self) -> Vec<&'static MetricDescriptor> {
        self.profile.metrics.iter().map(|m| descriptor(*m)).collect()
    }
}

fn descriptor(metric: Metric) -> &'static MetricDescriptor {
    // DESCRIPTORS is declared in Metric::ALL order.
    let idx = Metric::ALL
        .iter()
        .position(|m| *m == metric)
        .unwrap_or_default();
    &DESCRIPTORS[idx]
}
