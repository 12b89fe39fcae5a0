//! `chaosboard serve` -- HTTP JSON API over the dashboard.
//!
//! Endpoints:
//! - GET  /health                          - Server status (exempt from auth)
//! - GET  /kpis                            - Last-24h run summary
//! - GET  /catalog                         - Scenario catalog
//! - GET  /runs                            - Filtered, paginated runs
//! - GET  /runs/{id}                       - Run detail with timeline
//! - GET  /runs/{id}/export                - Run export document
//! - GET  /scenarios                       - Filtered, paginated scenarios
//! - POST /scenarios                       - Create a scenario
//! - GET  /scenarios/{id}                  - Scenario detail
//! - PUT  /scenarios/{id}                  - Edit a scenario
//! - POST /scenarios/{id}/archive          - Archive
//! - POST /scenarios/{id}/restore          - Restore to active
//! - POST /scenarios/{id}/duplicate        - Copy under a new id
//! - GET  /scenarios/{id}/versions         - Version history
//! - GET  /scenarios/{id}/runs             - Recent runs of the scenario
//! - GET  /incidents                       - Filtered, paginated incidents
//! - GET  /incidents/stats                 - Open and critical counts
//! - GET  /incidents/{id}                  - Incident detail
//! - POST /incidents/{id}/acknowledge      - Acknowledge as the acting user
//! - POST /incidents/{id}/resolve          - Resolve as the acting user
//! - GET  /incidents/{id}/related-runs     - Runs of the same scenario
//! - GET  /incidents/{id}/root-cause       - Root cause assessment
//! - GET  /incidents/{id}/export           - Incident export document
//!
//! All responses use Content-Type: application/json. Errors are
//! `{"error": "..."}` with 404 for unknown ids, 409 for actions the record's
//! status does not allow, 422 for invalid scenario forms and 400 for
//! malformed query strings.

mod handlers;
mod middleware;
mod scenarios;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::{Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{middleware as axum_middleware, Json, Router};
use tower_http::cors::{Any, CorsLayer};

use self::handlers::{
    handle_acknowledge, handle_catalog, handle_export_incident, handle_export_run,
    handle_get_incident, handle_get_run, handle_health, handle_incident_stats, handle_kpis,
    handle_list_incidents, handle_list_runs, handle_not_found, handle_related_runs,
    handle_resolve, handle_root_cause,
};
use self::middleware::{auth_middleware, rate_limit_middleware};
use self::scenarios::{
    handle_archive, handle_create_scenario, handle_duplicate, handle_get_scenario,
    handle_list_scenarios, handle_restore, handle_scenario_runs, handle_update_scenario,
    handle_versions,
};
use self::state::{AppState, RateLimiter};
use crate::config::ServerConfig;
use crate::Db;

/// Maximum request body size: 1 MB. Scenario forms are the only bodies.
const MAX_BODY_SIZE: usize = 1024 * 1024;

/// Rate limit window duration in seconds (1 minute).
const RATE_LIMIT_WINDOW_SECS: u64 = 60;

/// Construct a JSON error response with the given status code and message.
fn json_error(status: StatusCode, message: &str) -> impl IntoResponse {
    (status, Json(serde_json::json!({"error": message})))
}

fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/kpis", get(handle_kpis))
        .route("/catalog", get(handle_catalog))
        .route("/runs", get(handle_list_runs))
        .route("/runs/{id}", get(handle_get_run))
        .route("/runs/{id}/export", get(handle_export_run))
        .route(
            "/scenarios",
            get(handle_list_scenarios).post(handle_create_scenario),
        )
        .route(
            "/scenarios/{id}",
            get(handle_get_scenario).put(handle_update_scenario),
        )
        .route("/scenarios/{id}/archive", post(handle_archive))
        .route("/scenarios/{id}/restore", post(handle_restore))
        .route("/scenarios/{id}/duplicate", post(handle_duplicate))
        .route("/scenarios/{id}/versions", get(handle_versions))
        .route("/scenarios/{id}/runs", get(handle_scenario_runs))
        .route("/incidents", get(handle_list_incidents))
        .route("/incidents/stats", get(handle_incident_stats))
        .route("/incidents/{id}", get(handle_get_incident))
        .route("/incidents/{id}/acknowledge", post(handle_acknowledge))
        .route("/incidents/{id}/resolve", post(handle_resolve))
        .route("/incidents/{id}/related-runs", get(handle_related_runs))
        .route("/incidents/{id}/root-cause", get(handle_root_cause))
        .route("/incidents/{id}/export", get(handle_export_incident))
        .fallback(handle_not_found)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .layer(cors)
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .with_state(state)
}

/// Serve `dashboard` until Ctrl+C.
///
/// With `tls` set to a (certificate, key) pair the server listens over
/// HTTPS via `axum-server` and rustls, which needs the `tls` feature.
pub(crate) async fn start_server(
    dashboard: Db,
    server: ServerConfig,
    tls: Option<(PathBuf, PathBuf)>,
) -> Result<(), Box<dyn std::error::Error>> {
    if server.api_key.is_some() {
        tracing::info!("API key authentication enabled");
    }
    tracing::info!(
        rate_limit = server.rate_limit,
        acting_user = %server.acting_user,
        "server configured"
    );

    let state = Arc::new(AppState {
        dashboard,
        rate_limiter: RateLimiter::new(
            server.rate_limit,
            Duration::from_secs(RATE_LIMIT_WINDOW_SECS),
        ),
        api_key: server.api_key,
        acting_user: server.acting_user,
    });
    let app = router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], server.port));

    #[cfg(feature = "tls")]
    if let Some((cert_path, key_path)) = &tls {
        let config =
            axum_server::tls_rustls::RustlsConfig::from_pem_file(cert_path, key_path).await?;
        tracing::info!(%addr, "chaosboard listening on https");
        axum_server::bind_rustls(addr, config)
            .serve(app.into_make_service_with_connect_info::<SocketAddr>())
            .await?;
        return Ok(());
    }
    #[cfg(not(feature = "tls"))]
    if tls.is_some() {
        return Err("TLS requires building with the `tls` feature".into());
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "chaosboard listening on http");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("server shut down");
    Ok(())
}

/// Wait for a shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install Ctrl+C handler");
    tracing::info!("received shutdown signal");
}
