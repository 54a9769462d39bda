//! HTTP route handlers.

use axum::body::Bytes;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tracing::{error, info, warn};

use crate::network::NetworkError;
use crate::planner::{PlanError, PlanRequest, Planner};

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/stops/search", get(search_stops))
        .route("/api/routes", get(list_routes))
        .route("/api/routes/:name", get(route_detail))
        .route("/api/budget", get(budget))
        .route("/api/network/reload", post(reload_network))
        .route("/journey/plan", post(plan_journey))
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Search stops by name.
async fn search_stops(
    State(state): State<AppState>,
    Query(req): Query<StopSearchRequest>,
) -> Json<StopSearchResponse> {
    let limit = req.limit.unwrap_or(10).min(50);
    let graph = state.network.snapshot().await;

    let stops = graph
        .search(&req.q, limit)
        .into_iter()
        .map(StopResult::from_stop)
        .collect();

    Json(StopSearchResponse { stops })
}

/// List every route with its stops in travel order.
async fn list_routes(State(state): State<AppState>) -> Json<RoutesResponse> {
    let graph = state.network.snapshot().await;
    let routes = graph.routes().iter().map(RouteResult::from_route).collect();
    Json(RoutesResponse { routes })
}

/// One route by name.
async fn route_detail(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<RouteResult>, AppError> {
    let graph = state.network.snapshot().await;
    let route = graph.route(&name).ok_or_else(|| AppError::NotFound {
        message: format!("Unknown route: {name}"),
    })?;
    Ok(Json(RouteResult::from_route(route)))
}

/// Provider budget and cache status.
async fn budget(State(state): State<AppState>) -> Json<BudgetResponse> {
    let budget = state.budget();
    Json(BudgetResponse {
        provider: state.provider_name(),
        quota_per_window: budget.quota(),
        remaining: budget.remaining(),
        window_secs: budget.window().as_secs(),
        cached_routes: state.directions.entry_count(),
    })
}

/// Re-read the network dataset and swap it in.
async fn reload_network(State(state): State<AppState>) -> Result<Json<ReloadResponse>, AppError> {
    state.network.reload().await?;
    let graph = state.network.snapshot().await;
    info!(
        stops = graph.stop_count(),
        routes = graph.route_count(),
        "Reloaded transit network"
    );
    Ok(Json(ReloadResponse {
        stops: graph.stop_count(),
        routes: graph.route_count(),
    }))
}

/// Plan a journey from the traveller's position to a destination.
async fn plan_journey(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<PlanJourneyResponse>, AppError> {
    // Parse JSON manually so we can log the body on failure
    let req: PlanJourneyRequest = serde_json::from_slice(&body).map_err(|e| {
        warn!(error = %e, body = %String::from_utf8_lossy(&body), "Invalid plan request");
        AppError::BadRequest {
            message: format!("Invalid JSON: {e}"),
        }
    })?;

    let mut request = PlanRequest::from_degrees(
        req.origin.lat,
        req.origin.lng,
        req.destination.lat,
        req.destination.lng,
    )?;
    if let Some(name) = req.destination_name.filter(|n| !n.trim().is_empty()) {
        request = request.with_destination_name(name);
    }

    let graph = state.network.snapshot().await;
    let planner = Planner::new(&graph, state.directions.as_ref(), &state.config);
    let outcome = planner.plan(&request).await?;

    Ok(Json(PlanJourneyResponse::from_outcome(&outcome)))
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    Internal { message: String },
}

impl From<PlanError> for AppError {
    fn from(e: PlanError) -> Self {
        match e {
            PlanError::InvalidInput(_) => AppError::BadRequest {
                message: e.to_string(),
            },
            PlanError::Assembly(_) => AppError::Internal {
                message: e.to_string(),
            },
        }
    }
}

impl From<NetworkError> for AppError {
    fn from(e: NetworkError) -> Self {
        AppError::Internal {
            message: format!("Network reload failed, keeping previous network: {e}"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        if status.is_server_error() {
            error!(%status, %message, "Request failed");
        } else {
            warn!(%status, %message, "Request rejected");
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}
