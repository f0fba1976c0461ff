use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use futures::future::try_join_all;
use sencity_core::{Coordinate, Route, Spot};
use sencity_db::NewSpot;
use serde::Deserialize;

use crate::middleware::{CurrentUser, RequestId};

use super::{map_db_error, map_route_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct CreateSpotRequest {
    pub name: String,
    #[serde(rename = "type", default)]
    pub spot_type: i32,
    pub lon: f64,
    pub lat: f64,
}

#[derive(Debug, Deserialize)]
pub(super) struct SpotsRouteQuery {
    pub spots: Option<String>,
}

fn validate_new_spot(body: CreateSpotRequest) -> Result<NewSpot, String> {
    let name = body.name.trim();
    if name.is_empty() {
        return Err("name must not be empty".to_string());
    }
    let coord = Coordinate::new(body.lon, body.lat).map_err(|e| e.to_string())?;
    if !(-180.0..=180.0).contains(&coord.lon) || !(-90.0..=90.0).contains(&coord.lat) {
        return Err(format!(
            "coordinate ({}, {}) is out of range",
            coord.lon, coord.lat
        ));
    }
    Ok(NewSpot {
        name: name.to_string(),
        spot_type: body.spot_type,
        coord,
    })
}

/// Parses a comma-separated list of spot ids such as `1,2,3`.
fn parse_spot_ids(raw: &str) -> Result<Vec<i64>, String> {
    let ids = raw
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<i64>()
                .map_err(|_| format!("spot id '{part}' is not an integer"))
        })
        .collect::<Result<Vec<_>, _>>()?;
    if ids.is_empty() {
        return Err("spots must list at least one spot id".to_string());
    }
    Ok(ids)
}

pub(super) async fn create_spot(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<CreateSpotRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Spot>>), ApiError> {
    let new_spot = validate_new_spot(body)
        .map_err(|message| ApiError::new(req_id.0.clone(), "validation_error", message))?;

    let row = sencity_db::insert_spot(&state.pool, &new_spot, Some(user.id))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    tracing::info!(spot_id = row.id, user_id = user.id, "spot created");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(req_id.0, Spot::from(row))),
    ))
}

pub(super) async fn list_spots(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Vec<Spot>>>, ApiError> {
    let rows = sencity_db::list_spots_for_user(&state.pool, user.id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows.into_iter().map(Spot::from).collect();
    Ok(Json(ApiResponse::new(req_id.0, data)))
}

/// Walking-preferred route visiting the listed spots in order.
pub(super) async fn spots_route(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<SpotsRouteQuery>,
) -> Result<Json<ApiResponse<Route>>, ApiError> {
    let ids = parse_spot_ids(query.spots.as_deref().unwrap_or_default())
        .map_err(|message| ApiError::new(req_id.0.clone(), "validation_error", message))?;

    let rows = sencity_db::get_spots_by_ids(&state.pool, &ids)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    let coords: Vec<Coordinate> = rows
        .iter()
        .map(|row| Coordinate {
            lon: row.lon,
            lat: row.lat,
        })
        .collect();

    let legs = try_join_all(
        coords
            .windows(2)
            .map(|pair| state.navitia.walking_sections(pair[0], pair[1])),
    )
    .await
    .map_err(|e| map_route_error(req_id.0.clone(), &e))?;

    let route = Route::from_sections(legs.into_iter().flatten().collect());
    Ok(Json(ApiResponse::new(req_id.0, route)))
}
