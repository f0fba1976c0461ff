//! Database operations for the `spots` and `user_visited_spots` tables.

use chrono::{DateTime, Utc};
use sencity_core::{Coordinate, SearchArea, Spot, EARTH_RADIUS_METERS};
use sqlx::PgPool;

use crate::DbError;

/// A spot as seen by one user.
///
/// `distance` is only populated by [`list_nearby_spots`].
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SpotRow {
    pub id: i64,
    pub name: String,
    pub spot_type: i32,
    pub lon: f64,
    pub lat: f64,
    pub added_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub visited: bool,
    pub distance: Option<f64>,
}

impl From<SpotRow> for Spot {
    fn from(row: SpotRow) -> Self {
        Spot {
            id: row.id,
            name: row.name,
            spot_type: row.spot_type,
            coord: Coordinate {
                lon: row.lon,
                lat: row.lat,
            },
            visited: row.visited,
            distance: row.distance,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewSpot {
    pub name: String,
    pub spot_type: i32,
    pub coord: Coordinate,
}

/// Inserts a spot and returns it as unvisited.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails, including when the
/// coordinate is outside the valid lon/lat range.
pub async fn insert_spot(
    pool: &PgPool,
    spot: &NewSpot,
    added_by: Option<i64>,
) -> Result<SpotRow, DbError> {
    let row = sqlx::query_as::<_, SpotRow>(
        "INSERT INTO spots (name, spot_type, lon, lat, added_by) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING id, name, spot_type, lon, lat, added_by, created_at, \
                   false AS visited, NULL::DOUBLE PRECISION AS distance",
    )
    .bind(&spot.name)
    .bind(spot.spot_type)
    .bind(spot.coord.lon)
    .bind(spot.coord.lat)
    .bind(added_by)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Returns every spot, annotated with whether `user_id` has visited it,
/// ordered by id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_spots_for_user(pool: &PgPool, user_id: i64) -> Result<Vec<SpotRow>, DbError> {
    let rows = sqlx::query_as::<_, SpotRow>(
        "SELECT s.id, s.name, s.spot_type, s.lon, s.lat, s.added_by, s.created_at, \
                (uvs.spot_id IS NOT NULL) AS visited, \
                NULL::DOUBLE PRECISION AS distance \
         FROM spots s \
         LEFT JOIN user_visited_spots uvs ON uvs.spot_id = s.id AND uvs.user_id = $1 \
         ORDER BY s.id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns the spots with the given ids, in the order requested.
///
/// Repeated ids yield repeated rows. `visited` is always `false`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if any id does not exist, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_spots_by_ids(pool: &PgPool, ids: &[i64]) -> Result<Vec<SpotRow>, DbError> {
    let rows = sqlx::query_as::<_, SpotRow>(
        "SELECT id, name, spot_type, lon, lat, added_by, created_at, \
                false AS visited, NULL::DOUBLE PRECISION AS distance \
         FROM spots \
         WHERE id = ANY($1)",
    )
    .bind(ids)
    .fetch_all(pool)
    .await?;

    ids.iter()
        .map(|id| {
            rows.iter()
                .find(|row| row.id == *id)
                .cloned()
                .ok_or(DbError::NotFound)
        })
        .collect()
}

/// Returns the spots strictly inside `area`, annotated with their haversine
/// distance to the centre and whether `user_id` has visited them.
///
/// The distance filter runs in the database. The result is unordered; rank
/// it with [`sencity_core::rank_spots`].
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_nearby_spots(
    pool: &PgPool,
    area: SearchArea,
    user_id: i64,
) -> Result<Vec<SpotRow>, DbError> {
    // LEAST guards asin against rounding just above 1 for antipodal points.
    let rows = sqlx::query_as::<_, SpotRow>(
        "SELECT * FROM ( \
             SELECT s.id, s.name, s.spot_type, s.lon, s.lat, s.added_by, s.created_at, \
                    (uvs.spot_id IS NOT NULL) AS visited, \
                    2 * $4 * asin(LEAST(1.0, sqrt( \
                        power(sin(radians(s.lat - $2) / 2), 2) \
                        + cos(radians($2)) * cos(radians(s.lat)) \
                          * power(sin(radians(s.lon - $1) / 2), 2) \
                    ))) AS distance \
             FROM spots s \
             LEFT JOIN user_visited_spots uvs ON uvs.spot_id = s.id AND uvs.user_id = $3 \
         ) candidates \
         WHERE distance < $5",
    )
    .bind(area.center.lon)
    .bind(area.center.lat)
    .bind(user_id)
    .bind(EARTH_RADIUS_METERS)
    .bind(area.radius_meters)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Records that `user_id` visited `spot_id`. Idempotent.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the user or spot does not exist, or
/// [`DbError::Sqlx`] if the insert fails.
pub async fn mark_spot_visited(pool: &PgPool, user_id: i64, spot_id: i64) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO user_visited_spots (user_id, spot_id) \
         VALUES ($1, $2) \
         ON CONFLICT (user_id, spot_id) DO NOTHING",
    )
    .bind(user_id)
    .bind(spot_id)
    .execute(pool)
    .await
    .map_err(missing_reference_or_sqlx)?;
    Ok(())
}

fn missing_reference_or_sqlx(err: sqlx::Error) -> DbError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_foreign_key_violation() {
            return DbError::NotFound;
        }
    }
    DbError::Sqlx(err)
}
