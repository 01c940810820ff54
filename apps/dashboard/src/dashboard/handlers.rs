//! Axum route handlers for the dashboard API.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::dashboard::controller::{MetricView, TimeSeriesPanel};
use crate::dashboard::page::INDEX_HTML;
use crate::dashboard::sessions::{DashboardSession, DirectoryState};
use crate::data::snapshot::CountrySnapshotRow;
use crate::errors::AppError;
use crate::metrics::{MetricDescriptor, VariantProfile};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    pub profile: VariantProfile,
    pub metrics: Vec<&'static MetricDescriptor>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse<'a> {
    pub session_id: Uuid,
    pub opened_at: DateTime<Utc>,
    pub profile: &'a VariantProfile,
    pub metrics: Vec<&'static MetricDescriptor>,
    pub table: &'a [CountrySnapshotRow],
    pub countries: &'a DirectoryState,
}

#[derive(Debug, Deserialize)]
pub struct TimeSeriesQuery {
    pub country: Option<String>,
    pub metric: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /
pub async fn handle_index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// GET /api/v1/metrics
pub async fn handle_catalog(State(state): State<AppState>) -> Json<CatalogResponse> {
    let catalog = state.controller.catalog();
    Json(CatalogResponse {
        profile: catalog.profile().clone(),
        metrics: catalog.descriptors(),
    })
}

/// POST /api/v1/sessions
///
/// Fetches a fresh snapshot and country directory for a page load.
/// A dataset failure fails the whole request; a directory failure is reported
/// inside the response as a disabled country selector.
pub async fn handle_open_session(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let session = state.controller.open_session().await?;
    let session = state.sessions.insert(session).await;

    let catalog = state.controller.catalog();
    let body = serde_json::to_value(SessionResponse {
        session_id: session.id,
        opened_at: session.opened_at,
        profile: catalog.profile(),
        metrics: catalog.descriptors(),
        table: session.snapshot.rows(),
        countries: &session.directory,
    })
    .map_err(anyhow::Error::from)?;

    Ok((StatusCode::CREATED, Json(body)))
}

/// GET /api/v1/sessions/:id/snapshot.csv
pub async fn handle_snapshot_csv(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let session = find_session(&state, session_id).await?;
    let csv = session
        .snapshot
        .to_csv_string()
        .map_err(anyhow::Error::from)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"cases_country.csv\"",
            ),
        ],
        csv,
    ))
}

/// GET /api/v1/sessions/:id/metrics/:metric
pub async fn handle_metric_view(
    State(state): State<AppState>,
    Path((session_id, metric)): Path<(Uuid, String)>,
) -> Result<Json<MetricView>, AppError> {
    let session = find_session(&state, session_id).await?;
    let view = state.controller.metric_view(&session, &metric)?;
    Ok(Json(view))
}

/// GET /api/v1/sessions/:id/timeseries?country=&metric=
///
/// Always 200 once the country resolves: an unreachable or empty upstream is
/// reported as `"status": "unavailable"` in the body.
pub async fn handle_time_series(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Query(query): Query<TimeSeriesQuery>,
) -> Result<Json<TimeSeriesPanel>, AppError> {
    let country = required_param(query.country, "country")?;
    let metric = required_param(query.metric, "metric")?;

    let session = find_session(&state, session_id).await?;
    let panel = state
        .controller
        .country_series(&session, &country, &metric)
        .await?;
    Ok(Json(panel))
}

fn required_param(value: Option<String>, name: &str) -> Result<String, AppError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AppError::Validation(format!("{name} is required"))),
    }
}

async fn find_session(state: &AppState, id: Uuid) -> Result<Arc<DashboardSession>, AppError> {
    state
        .sessions
        .get(&id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        Router,
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::dashboard::fixtures::*;
    use crate::feeds::testing::StaticFeedSource;
    use crate::metrics::DashboardVariant;
    use crate::routes::build_router;
    use crate::state::AppState;

    fn app(feeds: StaticFeedSource, variant: DashboardVariant) -> Router {
        build_router(AppState::new(test_config(variant), Arc::new(feeds)))
    }

    async fn send(app: &Router, method: &str, uri: &str) -> (StatusCode, String) {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    async fn send_json(app: &Router, method: &str, uri: &str) -> (StatusCode, Value) {
        let (status, body) = send(app, method, uri).await;
        (status, serde_json::from_str(&body).unwrap())
    }

    async fn open_session(app: &Router) -> String {
        let (status, body) = send_json(app, "POST", "/api/v1/sessions").await;
        assert_eq!(status, StatusCode::CREATED);
        body["session_id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let app = app(healthy_feeds(), DashboardVariant::Full);
        let (status, body) = send_json(&app, "GET", "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_index_page_served() {
        let app = app(healthy_feeds(), DashboardVariant::Full);
        let (status, body) = send(&app, "GET", "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("COVID-19 Dashboard"));
    }

    #[tokio::test]
    async fn test_catalog_reflects_variant() {
        let app = app(healthy_feeds(), DashboardVariant::Classic);
        let (_, body) = send_json(&app, "GET", "/api/v1/metrics").await;
        assert_eq!(body["profile"]["projection"], "natural earth");
        assert_eq!(body["metrics"].as_array().unwrap().len(), 4);
        assert_eq!(body["metrics"][0]["title"], "Confirmed COVID-19 Cases");
    }

    #[tokio::test]
    async fn test_open_session_returns_table_and_directory() {
        let app = app(healthy_feeds(), DashboardVariant::Full);
        let (status, body) = send_json(&app, "POST", "/api/v1/sessions").await;
        assert_eq!(status, StatusCode::CREATED);

        let table = body["table"].as_array().unwrap();
        assert_eq!(table.len(), 4);
        assert_eq!(table[0]["country"], "Singapore");
        assert_eq!(table[0]["long"], 103.8333);
        assert!(table[0].get("people_tested").is_none());

        assert_eq!(body["countries"]["status"], "ready");
        assert_eq!(body["countries"]["entries"][0]["display_name"], "Malaysia");
    }

    #[tokio::test]
    async fn test_dataset_down_fails_session() {
        let feeds = StaticFeedSource::new().with_body(COUNTRIES, COUNTRIES_JSON);
        let app = app(feeds, DashboardVariant::Full);
        let (status, body) = send_json(&app, "POST", "/api/v1/sessions").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"]["code"], "DATA_UNAVAILABLE");
    }

    #[tokio::test]
    async fn test_directory_down_disables_selector_only() {
        let feeds = StaticFeedSource::new().with_body(DATASET, CASES_CSV);
        let app = app(feeds, DashboardVariant::Full);
        let (status, body) = send_json(&app, "POST", "/api/v1/sessions").await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["countries"]["status"], "disabled");
        let reason = body["countries"]["reason"].as_str().unwrap();
        assert!(!reason.contains("http"), "upstream detail leaked: {reason}");

        let id = body["session_id"].as_str().unwrap();
        let (status, _) = send_json(&app, "GET", &format!("/api/v1/sessions/{id}/metrics/deaths")).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send_json(
            &app,
            "GET",
            &format!("/api/v1/sessions/{id}/timeseries?country=Singapore&metric=deaths"),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"]["code"], "WIDGET_DISABLED");
    }

    #[tokio::test]
    async fn test_metric_view() {
        let app = app(healthy_feeds(), DashboardVariant::Full);
        let id = open_session(&app).await;

        let (status, body) =
            send_json(&app, "GET", &format!("/api/v1/sessions/{id}/metrics/mortality_rate")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["metric"]["title"], "Mortality Rate");
        assert_eq!(body["projection"], "robinson");
        assert_eq!(body["ranking"][0]["country"], "Peru");
        assert_eq!(body["geo_points"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_metric_outside_variant_is_unknown() {
        let app = app(healthy_feeds(), DashboardVariant::Classic);
        let id = open_session(&app).await;
        let (status, body) =
            send_json(&app, "GET", &format!("/api/v1/sessions/{id}/metrics/incident_rate")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "UNKNOWN_METRIC");
    }

    #[tokio::test]
    async fn test_time_series_available_and_unavailable() {
        let app = app(healthy_feeds(), DashboardVariant::Full);
        let id = open_session(&app).await;

        let (status, body) = send_json(
            &app,
            "GET",
            &format!("/api/v1/sessions/{id}/timeseries?country=Singapore&metric=confirmed"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["series"]["status"], "available");
        assert_eq!(body["series"]["points"][0]["metric_values"]["confirmed"], 1910.0);

        let (status, body) = send_json(
            &app,
            "GET",
            &format!("/api/v1/sessions/{id}/timeseries?country=Peru&metric=confirmed"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["series"]["status"], "unavailable");
        assert_eq!(body["series"]["reason"], "empty_payload");
    }

    #[tokio::test]
    async fn test_unknown_session_and_country() {
        let app = app(healthy_feeds(), DashboardVariant::Full);
        let (status, _) = send_json(
            &app,
            "GET",
            &format!("/api/v1/sessions/{}/metrics/confirmed", uuid::Uuid::new_v4()),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let id = open_session(&app).await;
        let (status, _) = send_json(
            &app,
            "GET",
            &format!("/api/v1/sessions/{id}/timeseries?country=Atlantis&metric=confirmed"),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_time_series_missing_params_use_error_envelope() {
        let app = app(healthy_feeds(), DashboardVariant::Full);
        let id = open_session(&app).await;

        for query in ["metric=confirmed", "country=Singapore", "country=%20&metric=confirmed"] {
            let (status, body) =
                send_json(&app, "GET", &format!("/api/v1/sessions/{id}/timeseries?{query}")).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "query {query}");
            assert_eq!(body["error"]["code"], "VALIDATION_ERROR", "query {query}");
        }
    }

    #[tokio::test]
    async fn test_snapshot_csv_download() {
        let app = app(healthy_feeds(), DashboardVariant::Full);
        let id = open_session(&app).await;
        let (status, body) = send(&app, "GET", &format!("/api/v1/sessions/{id}/snapshot.csv")).await;
        assert_eq!(status, StatusCode::OK);
        let mut lines = body.lines();
        assert_eq!(
            lines.next(),
            Some("country,lat,long,confirmed,deaths,recovered,active,incident_rate,mortality_rate")
        );
        assert_eq!(
            lines.next(),
            Some("Singapore,1.2833,103.8333,60000,29,59000,971,1025.6,0.048")
        );
    }
}
