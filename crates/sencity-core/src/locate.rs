//! Collaborator seams of the route enhancer and the selection policies that
//! sit behind them.
//!
//! The spot store, the places service and the journey planner are each
//! reached through one trait so the enhancer can run against Postgres and
//! Navitia in production and against in-memory fakes in tests. Ranking lives
//! here as pure functions so every backend applies the same policy.

use std::cmp::Ordering;
use std::future::Future;
use std::sync::Arc;

use crate::error::RouteError;
use crate::geo::SearchArea;
use crate::route::{Coordinate, Poi, PoiCategory, Section, Spot};

/// Finds user-curated spots near a point.
pub trait SpotLocator: Send + Sync {
    /// Best spot strictly inside `area` for `user_id`, ranked by
    /// [`rank_spots`].
    fn find_nearest_spot(
        &self,
        area: SearchArea,
        user_id: i64,
    ) -> impl Future<Output = Result<Option<Spot>, RouteError>> + Send;
}

/// Finds parks and gardens near a point.
pub trait PoiLocator: Send + Sync {
    fn find_nearest_poi(
        &self,
        area: SearchArea,
    ) -> impl Future<Output = Result<Option<Poi>, RouteError>> + Send;
}

/// Requests routes between two coordinates.
pub trait JourneyPlanner: Send + Sync {
    /// Sections of the best journey from `from` to `to`, in traversal order.
    ///
    /// The planner may return any number of sections, including transit legs
    /// when walking alone is impractical.
    fn plan_sections(
        &self,
        from: Coordinate,
        to: Coordinate,
        prefer_walking: bool,
    ) -> impl Future<Output = Result<Vec<Section>, RouteError>> + Send;
}

impl<T: SpotLocator> SpotLocator for Arc<T> {
    fn find_nearest_spot(
        &self,
        area: SearchArea,
        user_id: i64,
    ) -> impl Future<Output = Result<Option<Spot>, RouteError>> + Send {
        (**self).find_nearest_spot(area, user_id)
    }
}

impl<T: PoiLocator> PoiLocator for Arc<T> {
    fn find_nearest_poi(
        &self,
        area: SearchArea,
    ) -> impl Future<Output = Result<Option<Poi>, RouteError>> + Send {
        (**self).find_nearest_poi(area)
    }
}

impl<T: JourneyPlanner> JourneyPlanner for Arc<T> {
    fn plan_sections(
        &self,
        from: Coordinate,
        to: Coordinate,
        prefer_walking: bool,
    ) -> impl Future<Output = Result<Vec<Section>, RouteError>> + Send {
        (**self).plan_sections(from, to, prefer_walking)
    }
}

/// Picks the spot to detour through.
///
/// Unvisited spots rank before visited ones; within each group the closest
/// wins. Candidates without a distance sort last in their group, and equal
/// candidates fall back to the lowest id so the choice is deterministic.
#[must_use]
pub fn rank_spots(candidates: Vec<Spot>) -> Option<Spot> {
    candidates.into_iter().min_by(|a, b| {
        a.visited
            .cmp(&b.visited)
            .then_with(|| cmp_distance(a.distance, b.distance))
            .then_with(|| a.id.cmp(&b.id))
    })
}

fn cmp_distance(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Resolves per-category nearest-neighbour results to a single winner.
///
/// The closest candidate wins; equal distances go to the category declared
/// first in [`PoiCategory`]. A failed category is tolerated as long as some
/// other category produced a candidate. When nothing was found and at least
/// one category failed, the first failure is returned because the failed
/// query may have held the only candidate.
///
/// # Errors
///
/// Returns the first category error when no candidate was found.
pub fn pick_nearest_poi(
    results: Vec<(PoiCategory, Result<Option<Poi>, RouteError>)>,
) -> Result<Option<Poi>, RouteError> {
    let mut first_error = None;
    let mut best: Option<Poi> = None;

    for (_, result) in results {
        match result {
            Ok(Some(candidate)) => {
                let closer = best.as_ref().is_none_or(|current| {
                    candidate
                        .distance
                        .total_cmp(&current.distance)
                        .then_with(|| candidate.category.cmp(&current.category))
                        == Ordering::Less
                });
                if closer {
                    best = Some(candidate);
                }
            }
            Ok(None) => {}
            Err(err) => {
                first_error.get_or_insert(err);
            }
        }
    }

    match (best, first_error) {
        (Some(poi), _) => Ok(Some(poi)),
        (None, Some(err)) => Err(err),
        (None, None) => Ok(None),
    }
}
