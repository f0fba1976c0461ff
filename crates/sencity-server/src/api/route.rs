use axum::{
    extract::{Query, State},
    Extension, Json,
};
use sencity_core::Route;
use serde::{Deserialize, Serialize};

use crate::middleware::{CurrentUser, RequestId};

use super::{map_route_error, parse_coordinate, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct RouteQuery {
    pub from_lon: Option<String>,
    pub from_lat: Option<String>,
    pub to_lon: Option<String>,
    pub to_lat: Option<String>,
}

/// A route plus whether the detour pass succeeded.
#[derive(Debug, Serialize)]
pub(super) struct RouteData {
    #[serde(flatten)]
    pub route: Route,
    pub enhanced: bool,
}

/// Plans the best journey and detours its walking legs for the current user.
///
/// A failed detour pass is logged and the plain journey is served with
/// `enhanced: false`.
pub(super) async fn route(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<RouteQuery>,
) -> Result<Json<ApiResponse<RouteData>>, ApiError> {
    let from = parse_coordinate(&req_id.0, query.from_lon.as_deref(), query.from_lat.as_deref())?;
    let to = parse_coordinate(&req_id.0, query.to_lon.as_deref(), query.to_lat.as_deref())?;

    let planned = state
        .navitia
        .plan_route(from, to)
        .await
        .map_err(|e| map_route_error(req_id.0.clone(), &e))?;

    let data = match state.enhancer.enhance(planned.clone(), user.id).await {
        Ok(route) => {
            tracing::debug!(
                user_id = user.id,
                waypoints = route.waypoints.len(),
                duration = route.duration,
                "route enhanced"
            );
            RouteData {
                route,
                enhanced: true,
            }
        }
        Err(e) => {
            tracing::error!(
                request_id = %req_id.0,
                user_id = user.id,
                error = %e,
                "route enhancement failed, serving plain journey"
            );
            RouteData {
                route: planned,
                enhanced: false,
            }
        }
    };

    Ok(Json(ApiResponse::new(req_id.0, data)))
}
