//! Scenario routes: listing, history, create/edit and the lifecycle actions.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chaosboard_core::ScenarioFormData;

use super::handlers::{acting_user, bad_query, respond, respond_found, service_error};
use super::json_error;
use super::state::AppState;
use crate::params::ScenarioQuery;

fn bad_body(rejection: JsonRejection) -> Response {
    json_error(rejection.status(), &rejection.body_text()).into_response()
}

/// GET /scenarios
pub(crate) async fn handle_list_scenarios(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ScenarioQuery>, QueryRejection>,
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
            .list_scenarios(&filter, query.page.unwrap_or(1))
            .await,
    )
}

/// POST /scenarios
///
/// Owner is the acting user. Responds 201 with the stored scenario.
pub(crate) async fn handle_create_scenario(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<ScenarioFormData>, JsonRejection>,
) -> Response {
    let Json(form) = match body {
        Ok(b) => b,
        Err(rejection) => return bad_body(rejection),
    };
    let owner = acting_user(&state, &headers);
    match state.dashboard.create_scenario(&form, &owner).await {
        Ok(scenario) => (StatusCode::CREATED, Json(scenario)).into_response(),
        Err(e) => service_error(e),
    }
}

/// GET /scenarios/{id}
pub(crate) async fn handle_get_scenario(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    respond_found(state.dashboard.get_scenario(&id).await, "scenario", &id)
}

/// PUT /scenarios/{id}
pub(crate) async fn handle_update_scenario(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<ScenarioFormData>, JsonRejection>,
) -> Response {
    let Json(form) = match body {
        Ok(b) => b,
        Err(rejection) => return bad_body(rejection),
    };
    respond(state.dashboard.update_scenario(&id, &form).await)
}

/// POST /scenarios/{id}/archive
pub(crate) async fn handle_archive(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    respond(state.dashboard.archive_scenario(&id).await)
}

/// POST /scenarios/{id}/restore
pub(crate) async fn handle_restore(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    respond(state.dashboard.restore_scenario(&id).await)
}

/// POST /scenarios/{id}/duplicate
pub(crate) async fn handle_duplicate(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    match state.dashboard.duplicate_scenario(&id).await {
        Ok(copy) => (StatusCode::CREATED, Json(copy)).into_response(),
        Err(e) => service_error(e),
    }
}

/// GET /scenarios/{id}/versions
pub(crate) async fn handle_versions(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    respond_found(state.dashboard.scenario_versions(&id).await, "scenario", &id)
}

/// GET /scenarios/{id}/runs
pub(crate) async fn handle_scenario_runs(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    respond_found(state.dashboard.scenario_runs(&id).await, "scenario", &id)
}
