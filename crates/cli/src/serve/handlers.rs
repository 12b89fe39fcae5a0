//! Read-only routes plus the incident actions.

use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chaosboard_core::ExportDocument;
use chaosboard_service::ServiceError;
use chaosboard_storage::StorageError;
use serde::Serialize;

use super::json_error;
use super::state::AppState;
use crate::params::{IncidentQuery, RunQuery};

/// Header naming the user an action is performed as.
const ACTING_USER_HEADER: &str = "x-acting-user";

// ──────────────────────────────────────────────
// Response helpers
// ──────────────────────────────────────────────

/// Status code and body for a failed dashboard operation.
pub(crate) fn service_error(err: ServiceError) -> Response {
    let status = match &err {
        ServiceError::NotFound { .. } => StatusCode::NOT_FOUND,
        ServiceError::Transition(_) => StatusCode::CONFLICT,
        ServiceError::Validation(errors) => {
            let body = serde_json::json!({
                "error": err.to_string(),
                "fields": errors.errors,
            });
            return (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response();
        }
        ServiceError::Storage(StorageError::NotFound { .. }) => StatusCode::NOT_FOUND,
        ServiceError::Storage(StorageError::StaleWrite { .. }) => StatusCode::CONFLICT,
        ServiceError::Storage(_) | ServiceError::Export(_) => {
            tracing::error!(error = %err, "request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    json_error(status, &err.to_string()).into_response()
}

pub(crate) fn respond<T: Serialize>(result: Result<T, ServiceError>) -> Response {
    match result {
        Ok(value) => Json(value).into_response(),
        Err(e) => service_error(e),
    }
}

/// 404 for `Ok(None)`.
pub(crate) fn respond_found<T: Serialize>(
    result: Result<Option<T>, ServiceError>,
    kind: &str,
    id: &str,
) -> Response {
    match result {
        Ok(Some(value)) => Json(value).into_response(),
        Ok(None) => {
            json_error(StatusCode::NOT_FOUND, &format!("{kind} not found: {id}")).into_response()
        }
        Err(e) => service_error(e),
    }
}

pub(crate) fn bad_query(rejection: QueryRejection) -> Response {
    json_error(StatusCode::BAD_REQUEST, &rejection.body_text()).into_response()
}

pub(crate) fn acting_user(state: &AppState, headers: &HeaderMap) -> String {
    headers
        .get(ACTING_USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(state.acting_user.as_str())
        .to_string()
}

/// Export body as a download, honoring `If-None-Match`.
fn export_response(
    result: Result<Option<ExportDocument>, ServiceError>,
    kind: &str,
    id: &str,
    headers: &HeaderMap,
) -> Response {
    let document = match result {
        Ok(Some(document)) => document,
        Ok(None) => {
            return json_error(StatusCode::NOT_FOUND, &format!("{kind} not found: {id}"))
                .into_response()
        }
        Err(e) => return service_error(e),
    };

    let etag_quoted = format!("\"{}\"", document.etag);
    let unchanged = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|inm| inm == etag_quoted || inm == document.etag);
    if unchanged {
        return StatusCode::NOT_MODIFIED.into_response();
    }

    let mut response = (
        [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
        document.content,
    )
        .into_response();
    let response_headers = response.headers_mut();
    if let Ok(val) = etag_quoted.parse() {
        response_headers.insert(header::ETAG, val);
    }
    let disposition = format!("attachment; filename=\"{}\"", document.file_name);
    if let Ok(val) = disposition.parse() {
        response_headers.insert(header::CONTENT_DISPOSITION, val);
    }
    response
}

// ──────────────────────────────────────────────
// General
// ──────────────────────────────────────────────

/// Fallback handler for unmatched routes.
pub(crate) async fn handle_not_found() -> impl IntoResponse {
    json_error(StatusCode::NOT_FOUND, "not found")
}

/// GET /health
pub(crate) async fn handle_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let generator = state.dashboard.generator();
    let response = serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "seed": generator.seed(),
    });
    (StatusCode::OK, Json(response))
}

/// GET /kpis
pub(crate) async fn handle_kpis(State(state): State<Arc<AppState>>) -> Response {
    let now = state.dashboard.generator().now();
    respond(state.dashboard.kpis(now).await)
}

/// GET /catalog
pub(crate) async fn handle_catalog(State(state): State<Arc<AppState>>) -> Response {
    respond(state.dashboard.catalog().await)
}

// ──────────────────────────────────────────────
// Runs
// ──────────────────────────────────────────────

/// GET /runs
pub(crate) async fn handle_list_runs(
    State(state): State<Arc<AppState>>,
    query: Result<Query<RunQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(rejection) => return bad_query(rejection),
    };
    let filter = match query.filter() {
        Ok(f) => f,
        Err(msg) => return json_error(StatusCode::BAD_REQUEST, &msg).into_response(),
    };
    respond(
        state
            .dashboard
            .list_runs(&filter, query.page.unwrap_or(1))
            .await,
    )
}

/// GET /runs/{id}
pub(crate) async fn handle_get_run(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    respond_found(state.dashboard.get_run_detail(&id).await, "run", &id)
}

/// GET /runs/{id}/export
pub(crate) async fn handle_export_run(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    export_response(state.dashboard.export_run(&id).await, "run", &id, &headers)
}

// ──────────────────────────────────────────────
// Incidents
// ──────────────────────────────────────────────

/// GET /incidents
pub(crate) async fn handle_list_incidents(
    State(state): State<Arc<AppState>>,
    query: Result<Query<IncidentQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(rejection) => return bad_query(rejection),
    };
    let filter = match query.filter() {
        Ok(f) => f,
        Err(msg) => return json_error(StatusCode::BAD_REQUEST, &msg).into_response(),
    };
    respond(
        state
            .dashboard
            .list_incidents(&filter, query.page.unwrap_or(1))
            .await,
    )
}

/// GET /incidents/stats
pub(crate) async fn handle_incident_stats(State(state): State<Arc<AppState>>) -> Response {
    respond(state.dashboard.incident_stats().await)
}

/// GET /incidents/{id}
pub(crate) async fn handle_get_incident(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    respond_found(
        state.dashboard.get_incident_detail(&id).await,
        "incident",
        &id,
    )
}

/// POST /incidents/{id}/acknowledge
pub(crate) async fn handle_acknowledge(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let actor = acting_user(&state, &headers);
    respond(state.dashboard.acknowledge_incident(&id, &actor).await)
}

/// POST /incidents/{id}/resolve
pub(crate) async fn handle_resolve(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let actor = acting_user(&state, &headers);
    respond(state.dashboard.resolve_incident(&id, &actor).await)
}

/// GET /incidents/{id}/related-runs
pub(crate) async fn handle_related_runs(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    respond_found(state.dashboard.related_runs(&id).await, "incident", &id)
}

/// GET /incidents/{id}/root-cause
pub(crate) async fn handle_root_cause(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    respond_found(state.dashboard.root_cause(&id).await, "incident", &id)
}

/// GET /incidents/{id}/export
pub(crate) async fn handle_export_incident(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    export_response(
        state.dashboard.export_incident(&id).await,
        "incident",
        &id,
        &headers,
    )
}
