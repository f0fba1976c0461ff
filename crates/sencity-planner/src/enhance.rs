//! The route enhancer.
//!
//! Sections are planned independently and concurrently (bounded by
//! `detour_concurrency`), then folded back in their original order. Each
//! walking section gets at most one detour: the first source in
//! [`DETOUR_ORDER`] that finds a candidate inside the circle through the
//! section's endpoints wins, and the section is replaced by the walking
//! routes to and from that waypoint. Any failure aborts the whole call.

use futures::stream::{self, StreamExt, TryStreamExt};
use sencity_core::{
    Coordinate, JourneyPlanner, PoiLocator, Route, RouteError, SearchArea, Section, SpotLocator,
    Waypoint,
};

pub const DEFAULT_DETOUR_CONCURRENCY: usize = 4;

/// Where a detour candidate comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetourSource {
    Spot,
    Poi,
}

/// Detour sources in priority order. The first one with a candidate wins.
pub const DETOUR_ORDER: [DetourSource; 2] = [DetourSource::Spot, DetourSource::Poi];

/// Outcome of planning one input section.
#[derive(Debug)]
enum PlannedSection {
    Unchanged(Section),
    Detour {
        sections: Vec<Section>,
        waypoint: Waypoint,
    },
}

/// Running totals of the rebuilt route.
#[derive(Debug, Default)]
struct RouteAccumulator {
    duration: u64,
    sections: Vec<Section>,
    waypoints: Vec<Waypoint>,
}

impl RouteAccumulator {
    fn push(mut self, planned: PlannedSection) -> Self {
        match planned {
            PlannedSection::Unchanged(section) => {
                self.duration += section.duration;
                self.sections.push(section);
            }
            PlannedSection::Detour { sections, waypoint } => {
                self.duration += sections.iter().map(|s| s.duration).sum::<u64>();
                self.sections.extend(sections);
                self.waypoints.push(waypoint);
            }
        }
        self
    }

    fn finish(self) -> Route {
        Route {
            duration: self.duration,
            sections: self.sections,
            waypoints: self.waypoints,
        }
    }
}

/// Detours walking sections through nearby spots or points of interest.
pub struct RouteEnhancer<S, P, J> {
    spots: S,
    pois: P,
    journeys: J,
    detour_concurrency: usize,
}

impl<S, P, J> RouteEnhancer<S, P, J>
where
    S: SpotLocator,
    P: PoiLocator,
    J: JourneyPlanner,
{
    pub fn new(spots: S, pois: P, journeys: J) -> Self {
        Self {
            spots,
            pois,
            journeys,
            detour_concurrency: DEFAULT_DETOUR_CONCURRENCY,
        }
    }

    /// Number of sections planned at once. `1` plans strictly in sequence;
    /// `0` is treated as `1`.
    #[must_use]
    pub fn with_detour_concurrency(mut self, detour_concurrency: usize) -> Self {
        self.detour_concurrency = detour_concurrency.max(1);
        self
    }

    /// Rebuilds `route` with at most one detour per walking section.
    ///
    /// Non-walking sections are kept unchanged and in order. The returned
    /// duration is the sum of the returned sections' durations.
    ///
    /// # Errors
    ///
    /// Returns the first [`RouteError`] raised by a locator or the journey
    /// planner, or [`RouteError::MalformedUpstream`] for a walking section
    /// without endpoints. No partial route is returned.
    pub async fn enhance(&self, route: Route, user_id: i64) -> Result<Route, RouteError> {
        let walking = route.walking_section_count();
        tracing::debug!(
            sections = route.sections.len(),
            walking,
            concurrency = self.detour_concurrency,
            "enhancing route"
        );

        let plans: Vec<_> = route
            .sections
            .into_iter()
            .map(|section| self.plan_section(section, user_id))
            .collect();

        let enhanced = stream::iter(plans)
            .buffered(self.detour_concurrency)
            .try_fold(RouteAccumulator::default(), |acc, planned| async move {
                Ok::<_, RouteError>(acc.push(planned))
            })
            .await?
            .finish();

        tracing::debug!(
            duration = enhanced.duration,
            waypoints = enhanced.waypoints.len(),
            "route enhanced"
        );
        Ok(enhanced)
    }

    async fn plan_section(
        &self,
        section: Section,
        user_id: i64,
    ) -> Result<PlannedSection, RouteError> {
        if !section.is_walking() {
            return Ok(PlannedSection::Unchanged(section));
        }

        let Some((from, to)) = section.endpoints().map(|(f, t)| (f.coord, t.coord)) else {
            return Err(RouteError::MalformedUpstream(
                "walking section has no endpoints".to_string(),
            ));
        };
        let area = SearchArea::around_leg(from, to)?;

        let Some(waypoint) = self.find_detour(area, user_id).await? else {
            tracing::debug!(radius_m = area.radius_meters, "no detour for walking section");
            return Ok(PlannedSection::Unchanged(section));
        };

        let via = waypoint.coord();
        tracing::debug!(waypoint = waypoint.name(), radius_m = area.radius_meters, "detour found");
        let sections = self.route_via(from, via, to).await?;
        Ok(PlannedSection::Detour { sections, waypoint })
    }

    async fn find_detour(
        &self,
        area: SearchArea,
        user_id: i64,
    ) -> Result<Option<Waypoint>, RouteError> {
        for source in DETOUR_ORDER {
            let found = match source {
                DetourSource::Spot => self
                    .spots
                    .find_nearest_spot(area, user_id)
                    .await?
                    .map(Waypoint::Spot),
                DetourSource::Poi => self.pois.find_nearest_poi(area).await?.map(Waypoint::Poi),
            };
            if found.is_some() {
                return Ok(found);
            }
        }
        Ok(None)
    }

    /// Walking-preferred sections `from -> via -> to`; both legs are requested
    /// at once.
    async fn route_via(
        &self,
        from: Coordinate,
        via: Coordinate,
        to: Coordinate,
    ) -> Result<Vec<Section>, RouteError> {
        let (mut to_waypoint, from_waypoint) = futures::try_join!(
            self.journeys.plan_sections(from, via, true),
            self.journeys.plan_sections(via, to, true),
        )?;
        tracing::debug!(
            to_waypoint = to_waypoint.len(),
            from_waypoint = from_waypoint.len(),
            "sub-routes planned"
        );
        to_waypoint.extend(from_waypoint);
        Ok(to_waypoint)
    }
}

#[cfg(test)]
#[path = "enhance_test.rs"]
mod tests;
