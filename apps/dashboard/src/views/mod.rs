// Chart-ready projections of a snapshot: the ranked bar chart and the bubble map.

pub mod geo;
pub mod ranking;
