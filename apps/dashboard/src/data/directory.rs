use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::feeds::{DataUnavailable, Feed, FeedError, FeedSource};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountryDirectoryEntry {
    pub display_name: String,
    pub slug: String,
}

/// Upstream record shape; extra fields such as `ISO2` are ignored.
#[derive(Debug, Deserialize)]
struct RawCountry {
    #[serde(rename = "Country")]
    country: String,
    #[serde(rename = "Slug")]
    slug: String,
}

/// Country display names and their time-series slugs, sorted by display name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CountryDirectory {
    entries: Vec<CountryDirectoryEntry>,
}

impl CountryDirectory {
    /// Sorts by display name (ordinal, case-sensitive) and keeps the first entry per slug.
    pub fn from_entries(entries: Vec<CountryDirectoryEntry>) -> Self {
        let mut seen = HashSet::new();
        let mut entries: Vec<_> = entries
            .into_iter()
            .filter(|e| {
                let fresh = seen.insert(e.slug.clone());
                if !fresh {
                    warn!("Dropping duplicate directory slug '{}'", e.slug);
                }
                fresh
            })
            .collect();
        entries.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        Self { entries }
    }

    pub fn entries(&self) -> &[CountryDirectoryEntry] {
        &self.entries
    }

    pub fn slug_for(&self, display_name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.display_name == display_name)
            .map(|e| e.slug.as_str())
    }
}

pub async fn load_directory(
    source: &dyn FeedSource,
    url: &str,
) -> Result<CountryDirectory, DataUnavailable> {
    let body = source
        .fetch(url)
        .await
        .map_err(|e| DataUnavailable::new(Feed::CountryDirectory, e))?;

    let directory =
        parse_directory(&body).map_err(|e| DataUnavailable::new(Feed::CountryDirectory, e))?;
    info!("Loaded {} countries from {url}", directory.entries().len());
    Ok(directory)
}

pub fn parse_directory(body: &[u8]) -> Result<CountryDirectory, FeedError> {
    let raw: Vec<RawCountry> = serde_json::from_slice(body)?;
    let entries = raw
        .into_iter()
        .map(|r| CountryDirectoryEntry {
            display_name: r.country,
            slug: r.slug,
        })
        .collect();
    Ok(CountryDirectory::from_entries(entries))
}
