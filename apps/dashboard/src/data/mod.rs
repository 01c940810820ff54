// Upstream feeds: the snapshot CSV, the country directory and the live time series.
// All reads go through feeds::FeedSource; nothing here talks to reqwest directly.

pub mod directory;
pub mod snapshot;
pub mod timeseries;
