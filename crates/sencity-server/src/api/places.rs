use axum::{
    extract::{Query, State},
    Extension, Json,
};
use sencity_core::{Place, Poi, PoiLocator, SearchArea};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_navitia_error, map_route_error, parse_coordinate, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct CoordQuery {
    pub lon: Option<String>,
    pub lat: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct AutocompleteQuery {
    pub q: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct AddressData {
    pub address: Option<String>,
}

pub(super) async fn address(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<CoordQuery>,
) -> Result<Json<ApiResponse<AddressData>>, ApiError> {
    let coord = parse_coordinate(&req_id.0, query.lon.as_deref(), query.lat.as_deref())?;
    let address = state
        .navitia
        .address_at(coord)
        .await
        .map_err(|e| map_navitia_error(req_id.0.clone(), e))?;

    Ok(Json(ApiResponse::new(req_id.0, AddressData { address })))
}

pub(super) async fn autocomplete(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<AutocompleteQuery>,
) -> Result<Json<ApiResponse<Vec<Place>>>, ApiError> {
    let q = query.q.unwrap_or_default();
    let places = state
        .navitia
        .autocomplete(&q)
        .await
        .map_err(|e| map_navitia_error(req_id.0.clone(), e))?;

    Ok(Json(ApiResponse::new(req_id.0, places)))
}

/// Nearest park or garden within the configured radius, or `null`.
pub(super) async fn closest_poi(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<CoordQuery>,
) -> Result<Json<ApiResponse<Option<Poi>>>, ApiError> {
    let center = parse_coordinate(&req_id.0, query.lon.as_deref(), query.lat.as_deref())?;
    let area = SearchArea {
        center,
        radius_meters: state.closest_poi_radius_m,
    };

    let poi = state
        .navitia
        .find_nearest_poi(area)
        .await
        .map_err(|e| map_route_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(req_id.0, poi)))
}
