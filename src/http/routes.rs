//! HTTP route definitions

use std::time::Duration;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Extension, State,
    },
    http::{header, Method, StatusCode},
    middleware,
    response::{IntoResponse, Json},
    routing::{get, post, put},
    Router,
};
use axum_extra::extract::WithRejection;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::error;
use uuid::Uuid;

use crate::app::AppState;
use crate::catalog::DashboardMetrics;
use crate::http::inventory::{
    add_product_handler, delete_by_name_handler, delete_product_handler, export_handler,
    list_inventory_handler, set_stock_handler, update_by_name_handler, update_product_handler,
};
use crate::http::middleware::require_session;
use crate::http::suppliers::{
    add_supplier_handler, delete_supplier_handler, list_suppliers_handler, rename_supplier_handler,
};
use crate::session::{AuthError, Session};
use crate::store::{Product, StoreError};
use crate::util::time::uptime_secs;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    // CORS configuration - support multiple origins (comma-separated in CLIENT_ORIGIN)
    let allowed_origins: Vec<header::HeaderValue> = state
        .config
        .client_origin
        .split(',')
        .filter_map(|s| s.trim().parse::<header::HeaderValue>().ok())
        .filter(|v| !v.is_empty())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true);

    // Public routes (no session required)
    let public_routes = Router::new()
        .route("/health", get(health_handler))
        .route("/login", post(login_handler));

    // Protected routes (session required)
    let protected_routes = Router::new()
        .route("/logout", post(logout_handler))
        .route("/dashboard", get(dashboard_handler))
        .route("/consistency", get(consistency_handler))
        .route(
            "/inventory",
            get(list_inventory_handler).post(add_product_handler),
        )
        .route("/inventory/export", get(export_handler))
        .route("/inventory/stock", post(set_stock_handler))
        .route(
            "/inventory/by-name/:name",
            put(update_by_name_handler).delete(delete_by_name_handler),
        )
        .route(
            "/inventory/:id",
            put(update_product_handler).delete(delete_product_handler),
        )
        .route(
            "/suppliers",
            get(list_suppliers_handler).post(add_supplier_handler),
        )
        .route(
            "/suppliers/:name",
            put(rename_supplier_handler).delete(delete_supplier_handler),
        )
        .layer(middleware::from_fn_with_state(state.clone(), require_session));

    let timeout = Duration::from_secs(state.config.request_timeout_secs.max(1));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(TimeoutLayer::new(timeout))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ============================================================================
// Health endpoint
// ============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    active_sessions: usize,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: uptime_secs(),
        active_sessions: state.sessions.active(),
    })
}

// ============================================================================
// Session endpoints
// ============================================================================

#[derive(Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Serialize)]
struct LoginResponse {
    token: Uuid,
    expires_at: DateTime<Utc>,
}

async fn login_handler(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<LoginRequest>, AppError>,
) -> Result<Json<LoginResponse>, AppError> {
    if !state.login_throttle.allow() {
        return Err(AppError::TooManyRequests);
    }

    let session = state.sessions.login(&req.username, &req.password)?;

    Ok(Json(LoginResponse {
        token: session.token,
        expires_at: session.expires_at,
    }))
}

#[derive(Serialize)]
struct LogoutResponse {
    success: bool,
    message: String,
}

async fn logout_handler(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Json<LogoutResponse> {
    let success = state.sessions.logout(session.token);

    Json(LogoutResponse {
        success,
        message: "Logged out".to_string(),
    })
}

// ============================================================================
// Dashboard endpoints
// ============================================================================

async fn dashboard_handler(State(state): State<AppState>) -> Result<Json<DashboardMetrics>, AppError> {
    let threshold = state.config.low_stock_threshold;
    let mut catalog = state.catalog.lock();
    let (inventory, suppliers) = catalog.tables()?;

    Ok(Json(DashboardMetrics::compute(inventory, suppliers, threshold)))
}

#[derive(Serialize)]
struct ConsistencyResponse {
    consistent: bool,
    orphans: Vec<Product>,
}

async fn consistency_handler(State(state): State<AppState>) -> Result<Json<ConsistencyResponse>, AppError> {
    let orphans = state.catalog.lock().orphans()?;

    Ok(Json(ConsistencyResponse {
        consistent: orphans.is_empty(),
        orphans,
    }))
}

// ============================================================================
// Error handling
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Unauthorized(#[from] AuthError),

    #[error("Too many requests")]
    TooManyRequests,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match &e {
            StoreError::Validation(v) => AppError::BadRequest(v.to_string()),
            StoreError::ProductNotFound(_)
            | StoreError::ProductIdNotFound(_)
            | StoreError::SupplierNotFound(_) => AppError::NotFound(e.to_string()),
            StoreError::Io { .. } | StoreError::Csv { .. } => {
                error!(error = %e, "Storage failure");
                AppError::Internal(e.to_string())
            }
        }
    }
}

/// Malformed bodies and path segments get the same JSON error shape as everything else
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::Unauthorized(auth) => return auth.into_response(),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::TooManyRequests => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many requests".to_string(),
            ),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, Json(body)).into_response()
    }
}
