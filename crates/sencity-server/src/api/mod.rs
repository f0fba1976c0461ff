mod accounts;
mod places;
mod route;
mod spots;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, header::InvalidHeaderValue, HeaderName, HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use sencity_core::{Coordinate, Environment, RouteError};
use sencity_db::{DbError, PgSpotLocator};
use sencity_navitia::{NavitiaClient, NavitiaError};
use sencity_planner::RouteEnhancer;
use serde::Serialize;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::middleware::{enforce_rate_limit, request_id, require_user, RateLimitState, RequestId};

pub type Enhancer = RouteEnhancer<PgSpotLocator, Arc<NavitiaClient>, Arc<NavitiaClient>>;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub navitia: Arc<NavitiaClient>,
    pub enhancer: Arc<Enhancer>,
    pub auth_salt: Arc<str>,
    pub closest_poi_radius_m: f64,
}

impl AppState {
    #[must_use]
    pub fn new(
        pool: PgPool,
        navitia: Arc<NavitiaClient>,
        auth_salt: &str,
        detour_concurrency: usize,
        closest_poi_radius_m: f64,
    ) -> Self {
        let enhancer = RouteEnhancer::new(
            PgSpotLocator::new(pool.clone()),
            Arc::clone(&navitia),
            Arc::clone(&navitia),
        )
        .with_detour_concurrency(detour_concurrency);

        Self {
            pool,
            navitia,
            enhancer: Arc::new(enhancer),
            auth_salt: Arc::from(auth_salt),
            closest_poi_radius_m,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub(super) fn new(request_id: String, data: T) -> Self {
        Self {
            data,
            meta: ResponseMeta::new(request_id),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" | "no_journey" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "upstream_error" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn map_db_error(request_id: String, error: &DbError) -> ApiError {
    match error {
        DbError::NotFound => ApiError::new(request_id, "not_found", "record not found"),
        DbError::Conflict(message) => ApiError::new(request_id, "conflict", message.clone()),
        _ => {
            tracing::error!(error = %error, "database query failed");
            ApiError::new(request_id, "internal_error", "database query failed")
        }
    }
}

pub(super) fn map_route_error(request_id: String, error: &RouteError) -> ApiError {
    match error {
        RouteError::InvalidInput(message) => {
            ApiError::new(request_id, "validation_error", message.clone())
        }
        RouteError::UpstreamEmpty => {
            ApiError::new(request_id, "no_journey", "no journey found between these points")
        }
        RouteError::MalformedUpstream(_) | RouteError::Upstream(_) => {
            tracing::error!(error = %error, "journey planning failed");
            ApiError::new(request_id, "upstream_error", "journey planning service failed")
        }
    }
}

pub(super) fn map_navitia_error(request_id: String, error: NavitiaError) -> ApiError {
    map_route_error(request_id, &RouteError::from(error))
}

/// Parses a `lon`/`lat` query pair, treating a missing value as invalid.
pub(super) fn parse_coordinate(
    request_id: &str,
    lon: Option<&str>,
    lat: Option<&str>,
) -> Result<Coordinate, ApiError> {
    let (Some(lon), Some(lat)) = (lon, lat) else {
        return Err(ApiError::new(
            request_id,
            "validation_error",
            "both lon and lat are required",
        ));
    };
    Coordinate::parse(lon, lat).map_err(|e| map_route_error(request_id.to_string(), &e))
}

/// Browser origins the API answers CORS requests for.
#[derive(Debug, Clone)]
pub enum CorsPolicy {
    AnyOrigin,
    Origins(Vec<HeaderValue>),
}

impl CorsPolicy {
    /// Configured origins always win. Without any, development and test
    /// accept every origin while production accepts none.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidHeaderValue`] if an origin is not a valid header value.
    pub fn new(env: &Environment, origins: &[String]) -> Result<Self, InvalidHeaderValue> {
        if origins.is_empty() && *env != Environment::Production {
            return Ok(Self::AnyOrigin);
        }
        origins
            .iter()
            .map(|origin| HeaderValue::from_str(origin))
            .collect::<Result<Vec<_>, _>>()
            .map(Self::Origins)
    }
}

fn build_cors(policy: &CorsPolicy) -> CorsLayer {
    let allow_origin = match policy {
        CorsPolicy::AnyOrigin => AllowOrigin::any(),
        CorsPolicy::Origins(origins) => AllowOrigin::list(origins.iter().cloned()),
    };
    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn user_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/profile", get(accounts::profile))
        .route("/api/v1/spot", post(spots::create_spot))
        .route("/api/v1/spots", get(spots::list_spots))
        .route("/api/v1/route", get(route::route))
        .layer(axum::middleware::from_fn_with_state(state, require_user))
}

fn api_router(state: AppState, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/sign_up", post(accounts::sign_up))
        .route("/api/v1/sign_in", post(accounts::sign_in))
        .route("/api/v1/address", get(places::address))
        .route("/api/v1/autocomplete", get(places::autocomplete))
        .route("/api/v1/closest_poi", get(places::closest_poi))
        .route("/api/v1/spots_route", get(spots::spots_route))
        .merge(user_router(state))
        .layer(axum::middleware::from_fn_with_state(
            rate_limit,
            enforce_rate_limit,
        ))
}

pub fn build_app(state: AppState, rate_limit: RateLimitState, cors: &CorsPolicy) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(api_router(state.clone(), rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors(cors))
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    match sencity_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse::new(
                req_id.0,
                HealthData {
                    status: "ok",
                    database: "ok",
                },
            )),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse::new(
                    req_id.0,
                    HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                )),
            )
        }
    }
}

pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(120, Duration::from_secs(60))
}
