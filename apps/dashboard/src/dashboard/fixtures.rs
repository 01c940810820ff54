//! Canned feed payloads shared by the controller and router tests.

use crate::config::Config;
use crate::feeds::testing::StaticFeedSource;
use crate::metrics::DashboardVariant;

pub const DATASET: &str = "http://feed/cases_country.csv";
pub const COUNTRIES: &str = "http://feed/countries";
pub const LIVE: &str = "http://feed/live/country";

pub const CASES_CSV: &str = "\
Country_Region,Lat,Long_,Confirmed,Deaths,Recovered,Active,Incident_Rate,People_Tested,People_Hospitalized,Mortality_Rate
Singapore,1.2833,103.8333,60000,29,59000,971,1025.6,,,0.048
Malaysia,4.2105,101.9758,300000,1100,270000,28900,926.9,,,0.37
Diamond Princess,,,712,13,699,0,,,,1.83
Peru,-9.19,-75.0152,300000,45000,,,2000.1,,,15.0
";

pub const COUNTRIES_JSON: &str = r#"[
    {"Country":"Singapore","Slug":"singapore","ISO2":"SG"},
    {"Country":"Malaysia","Slug":"malaysia","ISO2":"MY"},
    {"Country":"Peru","Slug":"peru","ISO2":"PE"}
]"#;

pub const SINGAPORE_LIVE: &str = r#"[
    {"Country":"Singapore","Confirmed":2299,"Deaths":8,"Recovered":528,"Active":1763,"Date":"2020-04-11T00:00:00Z"},
    {"Country":"Singapore","Confirmed":1910,"Deaths":6,"Recovered":460,"Active":1444,"Date":"2020-04-10T00:00:00Z"}
]"#;

pub fn test_config(variant: DashboardVariant) -> Config {
    Config {
        dataset_url: DATASET.to_string(),
        countries_url: COUNTRIES.to_string(),
        timeseries_base_url: LIVE.to_string(),
        variant,
        top_n: 10,
        fetch_timeout_secs: 1,
        fetch_max_retries: 1,
        max_sessions: 8,
        port: 0,
        rust_log: "debug".to_string(),
    }
}

pub fn healthy_feeds() -> StaticFeedSource {
    StaticFeedSource::new()
        .with_body(DATASET, CASES_CSV)
        .with_body(COUNTRIES, COUNTRIES_JSON)
        .with_body("http://feed/live/country/singapore", SINGAPORE_LIVE)
        .with_body("http://feed/live/country/peru", "[]")
}

