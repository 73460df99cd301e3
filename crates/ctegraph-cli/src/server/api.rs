//! REST API handlers for serve mode.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use ctegraph_view::{rebuild, CoordinatorState};
use serde::{Deserialize, Serialize};

use super::state::GraphState;
use super::AppState;

/// Build the API router with all endpoints.
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        .route("/query", post(query))
        .route("/graph", get(graph))
        .route("/lineage", post(lineage))
}

// === Request/Response types ===

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Deserialize)]
struct SqlRequest {
    sql: String,
}

#[derive(Serialize)]
struct QueuedResponse {
    status: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GraphResponse {
    rebuilding: bool,
    #[serde(flatten)]
    graph: GraphState,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// === Handlers ===

/// GET /api/health - Health check with version
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// POST /api/query - Hand new query text to the coordinator
async fn query(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SqlRequest>,
) -> impl IntoResponse {
    state.coordinator.submit(payload.sql);
    (StatusCode::ACCEPTED, Json(QueuedResponse { status: "queued" }))
}

/// GET /api/graph - Latest published graph and rebuild status
async fn graph(State(state): State<Arc<AppState>>) -> Json<GraphResponse> {
    Json(GraphResponse {
        rebuilding: state.coordinator.state() == CoordinatorState::Rebuilding,
        graph: state.view.current(),
    })
}

/// POST /api/lineage - Build and lay out one query, bypassing the coordinator
async fn lineage(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SqlRequest>,
) -> impl IntoResponse {
    match rebuild(
        &payload.sql,
        &state.config.coordinator,
        state.engine.as_ref(),
    )
    .await
    {
        Ok(snapshot) => (StatusCode::OK, Json(snapshot)).into_response(),
        Err(err) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse {
                error: err.to_string(),
            }),
        )
            .into_response(),
    }
}
