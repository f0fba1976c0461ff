use std::sync::Mutex;
use std::time::Duration;

use sencity_core::{
    distance_meters, midpoint, pick_nearest_poi, rank_spots, Place, Poi, PoiCategory,
    SectionKind, Spot,
};

use super::*;

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

/// In-memory spot store applying the same radius filter and ranking as SQL.
#[derive(Default)]
struct FakeSpots {
    spots: Vec<Spot>,
    fail: bool,
}

impl SpotLocator for FakeSpots {
    async fn find_nearest_spot(
        &self,
        area: SearchArea,
        _user_id: i64,
    ) -> Result<Option<Spot>, RouteError> {
        if self.fail {
            return Err(RouteError::Upstream("spot store down".to_string()));
        }
        let mut inside = Vec::new();
        for spot in &self.spots {
            let d = distance_meters(area.center, spot.coord)?;
            if d < area.radius_meters {
                inside.push(Spot {
                    distance: Some(d),
                    ..spot.clone()
                });
            }
        }
        Ok(rank_spots(inside))
    }
}

/// In-memory places service: nearest POI per category, resolved like the
/// real locator.
#[derive(Default)]
struct FakePois {
    pois: Vec<(PoiCategory, &'static str, Coordinate)>,
    calls: Mutex<u32>,
}

impl PoiLocator for FakePois {
    async fn find_nearest_poi(&self, area: SearchArea) -> Result<Option<Poi>, RouteError> {
        *self.calls.lock().unwrap() += 1;
        let mut results = Vec::new();
        for category in PoiCategory::ALL {
            let mut best: Option<Poi> = None;
            for (c, name, coord) in &self.pois {
                if *c != category {
                    continue;
                }
                let d = distance_meters(area.center, *coord)?;
                if d < area.radius_meters && best.as_ref().is_none_or(|b| d < b.distance) {
                    best = Some(Poi {
                        name: (*name).to_string(),
                        coord: *coord,
                        distance: d,
                        category,
                    });
                }
            }
            results.push((category, Ok(best)));
        }
        pick_nearest_poi(results)
    }
}

/// Journey planner returning canned sub-routes keyed by endpoints, or one
/// walking section of fixed duration otherwise.
#[derive(Default)]
struct FakePlanner {
    canned: Vec<(Coordinate, Coordinate, Vec<Section>)>,
    calls: Mutex<Vec<(Coordinate, Coordinate, bool)>>,
    fail: bool,
}

impl JourneyPlanner for FakePlanner {
    async fn plan_sections(
        &self,
        from: Coordinate,
        to: Coordinate,
        prefer_walking: bool,
    ) -> Result<Vec<Section>, RouteError> {
        self.calls.lock().unwrap().push((from, to, prefer_walking));
        if self.fail {
            return Err(RouteError::Upstream("planner timeout".to_string()));
        }
        if let Some((_, _, sections)) = self
            .canned
            .iter()
            .find(|(f, t, _)| *f == from && *t == to)
        {
            return Ok(sections.clone());
        }
        Ok(vec![walk(from, to, 100)])
    }
}

/// Planner whose answer is delayed in proportion to the origin longitude so
/// later sections can finish before earlier ones.
struct SlowPlanner;

impl JourneyPlanner for SlowPlanner {
    async fn plan_sections(
        &self,
        from: Coordinate,
        to: Coordinate,
        _prefer_walking: bool,
    ) -> Result<Vec<Section>, RouteError> {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let delay = ((3.0 - from.lon) * 100.0).max(0.0) as u64;
        tokio::time::sleep(Duration::from_millis(delay)).await;
        Ok(vec![walk(from, to, 10)])
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn coord(lon: f64, lat: f64) -> Coordinate {
    Coordinate { lon, lat }
}

fn place(name: &str, c: Coordinate) -> Place {
    Place {
        name: name.to_string(),
        coord: c,
    }
}

fn walk(from: Coordinate, to: Coordinate, duration: u64) -> Section {
    Section {
        kind: SectionKind::StreetNetwork,
        duration,
        from: Some(place("from", from)),
        to: Some(place("to", to)),
        geometry: None,
        line: None,
        direction: None,
    }
}

fn transit(from: Coordinate, to: Coordinate, duration: u64, line: &str) -> Section {
    Section {
        kind: SectionKind::Other("public_transport".to_string()),
        duration,
        from: Some(place("station", from)),
        to: Some(place("station", to)),
        geometry: None,
        line: Some(line.to_string()),
        direction: Some("terminus".to_string()),
    }
}

fn waiting(duration: u64) -> Section {
    Section {
        kind: SectionKind::Waiting,
        duration,
        from: None,
        to: None,
        geometry: None,
        line: None,
        direction: None,
    }
}

fn spot(id: i64, c: Coordinate, visited: bool) -> Spot {
    Spot {
        id,
        name: format!("spot-{id}"),
        spot_type: 0,
        coord: c,
        visited,
        distance: None,
    }
}

/// A ~1.3 km walking leg across central Paris.
fn sample_leg() -> (Coordinate, Coordinate) {
    (coord(2.30, 48.85), coord(2.31, 48.86))
}

/// Point `meters` north of the sample leg's midpoint.
fn north_of_mid(meters: f64) -> Coordinate {
    let (a, b) = sample_leg();
    let mid = midpoint(a, b).unwrap();
    coord(mid.lon, mid.lat + meters / 111_319.5)
}

fn assert_duration_invariant(route: &Route) {
    assert_eq!(
        route.duration,
        route.sections.iter().map(|s| s.duration).sum::<u64>()
    );
}

// ---------------------------------------------------------------------------
// Detour selection
// ---------------------------------------------------------------------------

#[tokio::test]
async fn no_candidate_leaves_walking_section_unchanged() {
    let (a, b) = sample_leg();
    let route = Route::from_sections(vec![walk(a, b, 900)]);
    let planner = FakePlanner::default();
    let enhancer = RouteEnhancer::new(FakeSpots::default(), FakePois::default(), planner);

    let enhanced = enhancer.enhance(route.clone(), 1).await.unwrap();

    assert_eq!(enhanced.sections, route.sections);
    assert!(enhanced.waypoints.is_empty());
    assert_eq!(enhanced.duration, 900);
    assert!(enhancer.journeys.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn unvisited_spot_wins_over_closer_poi_source() {
    let (a, b) = sample_leg();
    let spots = FakeSpots {
        spots: vec![spot(7, north_of_mid(50.0), false)],
        fail: false,
    };
    let pois = FakePois {
        pois: vec![(PoiCategory::Park, "Parc", north_of_mid(80.0))],
        ..FakePois::default()
    };
    let enhancer = RouteEnhancer::new(spots, pois, FakePlanner::default());

    let enhanced = enhancer
        .enhance(Route::from_sections(vec![walk(a, b, 900)]), 1)
        .await
        .unwrap();

    assert_eq!(enhanced.waypoints.len(), 1);
    match &enhanced.waypoints[0] {
        Waypoint::Spot(s) => {
            assert_eq!(s.id, 7);
            assert!(!s.visited);
        }
        other => panic!("expected spot waypoint, got {other:?}"),
    }
    assert_eq!(
        *enhancer.pois.calls.lock().unwrap(),
        0,
        "POIs are not queried once a spot is found"
    );
}

#[tokio::test]
async fn visited_spot_is_still_a_detour_and_keeps_its_flag() {
    let (a, b) = sample_leg();
    let spots = FakeSpots {
        spots: vec![spot(3, north_of_mid(20.0), true)],
        fail: false,
    };
    let enhancer = RouteEnhancer::new(spots, FakePois::default(), FakePlanner::default());

    let enhanced = enhancer
        .enhance(Route::from_sections(vec![walk(a, b, 900)]), 1)
        .await
        .unwrap();

    assert!(matches!(&enhanced.waypoints[..], [Waypoint::Spot(s)] if s.visited));
}

#[tokio::test]
async fn closer_garden_wins_when_no_spot() {
    let (a, b) = sample_leg();
    let pois = FakePois {
        pois: vec![
            (PoiCategory::Park, "Parc Monceau", north_of_mid(120.0)),
            (PoiCategory::Garden, "Jardin", north_of_mid(90.0)),
        ],
        ..FakePois::default()
    };
    let enhancer = RouteEnhancer::new(FakeSpots::default(), pois, FakePlanner::default());

    let enhanced = enhancer
        .enhance(Route::from_sections(vec![walk(a, b, 900)]), 1)
        .await
        .unwrap();

    match &enhanced.waypoints[..] {
        [Waypoint::Poi(p)] => {
            assert_eq!(p.category, PoiCategory::Garden);
            assert_eq!(p.name, "Jardin");
        }
        other => panic!("expected one garden waypoint, got {other:?}"),
    }
}

#[tokio::test]
async fn multi_section_sub_routes_are_spliced_in_place() {
    let (a, b) = sample_leg();
    let via = north_of_mid(40.0);
    let planner = FakePlanner {
        canned: vec![
            (
                a,
                via,
                vec![walk(a, coord(2.302, 48.852), 120), walk(coord(2.302, 48.852), via, 200)],
            ),
            (via, b, vec![walk(via, b, 300)]),
        ],
        ..FakePlanner::default()
    };
    let spots = FakeSpots {
        spots: vec![spot(1, via, false)],
        fail: false,
    };
    let before = transit(coord(2.28, 48.84), a, 600, "M1");
    let after = waiting(45);
    let route = Route::from_sections(vec![before.clone(), walk(a, b, 900), after.clone()]);
    let enhancer = RouteEnhancer::new(spots, FakePois::default(), planner);

    let enhanced = enhancer.enhance(route, 1).await.unwrap();

    let durations: Vec<u64> = enhanced.sections.iter().map(|s| s.duration).collect();
    assert_eq!(durations, vec![600, 120, 200, 300, 45]);
    assert_eq!(enhanced.sections[0], before);
    assert_eq!(enhanced.sections[4], after);
    assert_eq!(enhanced.duration, 1265);
    assert_duration_invariant(&enhanced);

    let calls = enhancer.journeys.calls.lock().unwrap().clone();
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|(_, _, walking)| *walking));
    assert!(calls.contains(&(a, via, true)));
    assert!(calls.contains(&(via, b, true)));
}

// ---------------------------------------------------------------------------
// Invariants
// ---------------------------------------------------------------------------

#[tokio::test]
async fn non_walking_sections_pass_through_in_order() {
    let p = coord(2.30, 48.85);
    let q = coord(2.35, 48.87);
    let sections = vec![
        transit(p, q, 300, "A"),
        waiting(60),
        walk(p, q, 500),
        transit(q, p, 400, "B"),
        Section {
            kind: SectionKind::Other("crow_fly".to_string()),
            ..walk(q, p, 20)
        },
    ];
    let spots = FakeSpots {
        spots: vec![spot(1, midpoint(p, q).unwrap(), false)],
        fail: false,
    };
    let enhancer = RouteEnhancer::new(spots, FakePois::default(), FakePlanner::default());

    let enhanced = enhancer
        .enhance(Route::from_sections(sections.clone()), 1)
        .await
        .unwrap();

    let passthrough_in: Vec<&Section> = sections.iter().filter(|s| !s.is_walking()).collect();
    let passthrough_out: Vec<&Section> =
        enhanced.sections.iter().filter(|s| !s.is_walking()).collect();
    assert_eq!(passthrough_in, passthrough_out);
    assert_duration_invariant(&enhanced);
}

#[tokio::test]
async fn at_most_one_detour_per_walking_section() {
    let legs = [
        (coord(2.30, 48.85), coord(2.31, 48.86)),
        (coord(2.32, 48.86), coord(2.33, 48.87)),
        (coord(2.40, 48.90), coord(2.41, 48.91)),
    ];
    // Several spots inside the first two legs' circles, none near the third.
    let spots = FakeSpots {
        spots: vec![
            spot(1, midpoint(legs[0].0, legs[0].1).unwrap(), false),
            spot(2, north_of_mid(30.0), false),
            spot(3, midpoint(legs[1].0, legs[1].1).unwrap(), true),
        ],
        fail: false,
    };
    let sections: Vec<Section> = legs.iter().map(|(a, b)| walk(*a, *b, 700)).collect();
    let original_walking = sections.len();
    let enhancer = RouteEnhancer::new(spots, FakePois::default(), FakePlanner::default());

    let enhanced = enhancer
        .enhance(Route::from_sections(sections), 9)
        .await
        .unwrap();

    assert!(enhanced.waypoints.len() <= original_walking);
    assert_eq!(enhanced.waypoints.len(), 2);
    // Two legs became four sub-sections, the third stayed as is.
    assert_eq!(enhanced.sections.len(), 5);
    assert_eq!(enhanced.sections[4].duration, 700);
    assert_duration_invariant(&enhanced);
}

#[tokio::test]
async fn concurrent_planning_preserves_section_and_waypoint_order() {
    // Later legs answer faster, so completion order is the reverse of input order.
    let legs: Vec<(Coordinate, Coordinate)> = (0..4)
        .map(|i| {
            let lon = 2.30 + f64::from(i) * 0.1;
            (coord(lon, 48.85), coord(lon + 0.01, 48.86))
        })
        .collect();
    let spots = FakeSpots {
        spots: legs
            .iter()
            .zip(1..)
            .map(|((a, b), id)| spot(id, midpoint(*a, *b).unwrap(), false))
            .collect(),
        fail: false,
    };
    let sections: Vec<Section> = legs.iter().map(|(a, b)| walk(*a, *b, 500)).collect();

    let sequential = RouteEnhancer::new(
        FakeSpots {
            spots: spots.spots.clone(),
            fail: false,
        },
        FakePois::default(),
        SlowPlanner,
    )
    .with_detour_concurrency(1)
    .enhance(Route::from_sections(sections.clone()), 1)
    .await
    .unwrap();
    let concurrent = RouteEnhancer::new(spots, FakePois::default(), SlowPlanner)
        .with_detour_concurrency(4)
        .enhance(Route::from_sections(sections), 1)
        .await
        .unwrap();

    assert_eq!(sequential, concurrent);
    let ids: Vec<i64> = concurrent
        .waypoints
        .iter()
        .map(|w| match w {
            Waypoint::Spot(s) => s.id,
            Waypoint::Poi(_) => -1,
        })
        .collect();
    assert_eq!(ids, vec![1, 2, 3, 4]);
    assert_eq!(concurrent.duration, 80);
}

#[test]
fn zero_concurrency_is_clamped_to_one() {
    let enhancer = RouteEnhancer::new(FakeSpots::default(), FakePois::default(), SlowPlanner)
        .with_detour_concurrency(0);
    assert_eq!(enhancer.detour_concurrency, 1);
}

#[test]
fn spots_are_tried_before_pois() {
    assert_eq!(DETOUR_ORDER, [DetourSource::Spot, DetourSource::Poi]);
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn spot_store_failure_aborts_enhancement() {
    let (a, b) = sample_leg();
    let spots = FakeSpots {
        spots: Vec::new(),
        fail: true,
    };
    let enhancer = RouteEnhancer::new(spots, FakePois::default(), FakePlanner::default());

    let err = enhancer
        .enhance(Route::from_sections(vec![walk(a, b, 900)]), 1)
        .await
        .unwrap_err();
    assert_eq!(err, RouteError::Upstream("spot store down".to_string()));
}

#[tokio::test]
async fn sub_route_failure_aborts_enhancement() {
    let (a, b) = sample_leg();
    let spots = FakeSpots {
        spots: vec![spot(1, north_of_mid(10.0), false)],
        fail: false,
    };
    let planner = FakePlanner {
        fail: true,
        ..FakePlanner::default()
    };
    let route = Route::from_sections(vec![waiting(30), walk(a, b, 900)]);
    let enhancer = RouteEnhancer::new(spots, FakePois::default(), planner);

    let err = enhancer.enhance(route, 1).await.unwrap_err();
    assert!(matches!(err, RouteError::Upstream(_)));
}

#[tokio::test]
async fn walking_section_without_endpoints_is_malformed() {
    let mut section = walk(coord(2.30, 48.85), coord(2.31, 48.86), 100);
    section.to = None;
    let enhancer =
        RouteEnhancer::new(FakeSpots::default(), FakePois::default(), FakePlanner::default());

    let err = enhancer
        .enhance(Route::from_sections(vec![section]), 1)
        .await
        .unwrap_err();
    assert!(matches!(err, RouteError::MalformedUpstream(_)));
}

#[tokio::test]
async fn empty_route_stays_empty() {
    let enhancer =
        RouteEnhancer::new(FakeSpots::default(), FakePois::default(), FakePlanner::default());
    let enhanced = enhancer
        .enhance(Route::from_sections(Vec::new()), 1)
        .await
        .unwrap();
    assert_eq!(enhanced.duration, 0);
    assert!(enhanced.sections.is_empty() && enhanced.waypoints.is_empty());
}
