//! Journey planning and POI lookup handlers for the CLI.

use std::sync::Arc;

use sencity_core::{AppConfig, Coordinate, PoiLocator, Route, SearchArea, Section, Waypoint};
use sencity_db::PgSpotLocator;
use sencity_navitia::NavitiaClient;
use sencity_planner::RouteEnhancer;

/// Plans the best journey between two points and prints it.
///
/// With `user` set, walking legs are detoured through that user's spots or
/// nearby parks first. Detour failures are returned, not swallowed.
///
/// # Errors
///
/// Returns an error if no journey exists, Navitia fails, or the detour pass
/// fails.
pub(crate) async fn run_route(
    pool: sqlx::PgPool,
    config: &AppConfig,
    client: NavitiaClient,
    from: Coordinate,
    to: Coordinate,
    user: Option<i64>,
    json: bool,
) -> anyhow::Result<()> {
    let client = Arc::new(client);
    let planned = client.plan_route(from, to).await?;

    let route = match user {
        Some(user_id) => {
            let enhancer = RouteEnhancer::new(
                PgSpotLocator::new(pool),
                Arc::clone(&client),
                Arc::clone(&client),
            )
            .with_detour_concurrency(config.detour_concurrency);
            let enhanced = enhancer.enhance(planned, user_id).await?;
            tracing::info!(
                user_id,
                waypoints = enhanced.waypoints.len(),
                duration = enhanced.duration,
                "route enhanced"
            );
            enhanced
        }
        None => planned,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&route)?);
    } else {
        print_route(&route);
    }
    Ok(())
}

fn place_name(section: &Section, to: bool) -> &str {
    let place = if to { &section.to } else { &section.from };
    place.as_ref().map_or("\u{2014}", |p| p.name.as_str())
}

fn print_route(route: &Route) {
    println!(
        "{:<4}{:<16}{:>8}  {:<30}{:<30}LINE",
        "#", "TYPE", "SECONDS", "FROM", "TO"
    );
    for (i, section) in route.sections.iter().enumerate() {
        println!(
            "{:<4}{:<16}{:>8}  {:<30}{:<30}{}",
            i + 1,
            section.kind,
            section.duration,
            place_name(section, false),
            place_name(section, true),
            section.line.as_deref().unwrap_or("")
        );
    }
    println!();
    println!("total duration: {}s", route.duration);

    if route.waypoints.is_empty() {
        println!("no detours");
        return;
    }
    for waypoint in &route.waypoints {
        let source = match waypoint {
            Waypoint::Spot(spot) if spot.visited => "spot (visited)",
            Waypoint::Spot(_) => "spot",
            Waypoint::Poi(_) => "poi",
        };
        let coord = waypoint.coord();
        println!(
            "via {} [{source}] at {},{}",
            waypoint.name(),
            coord.lon,
            coord.lat
        );
    }
}

/// Prints the nearest park or garden strictly inside `radius` meters.
///
/// # Errors
///
/// Returns an error if the coordinate is invalid or every category query
/// fails.
pub(crate) async fn run_poi(
    client: &NavitiaClient,
    at: Coordinate,
    radius: f64,
) -> anyhow::Result<()> {
    if !radius.is_finite() || radius <= 0.0 {
        anyhow::bail!("radius must be a positive number of meters, got {radius}");
    }

    let area = SearchArea {
        center: at,
        radius_meters: radius,
    };
    match client.find_nearest_poi(area).await? {
        Some(poi) => println!(
            "{} ({}) {:.0} m away at {},{}",
            poi.name, poi.category, poi.distance, poi.coord.lon, poi.coord.lat
        ),
        None => println!("no park or garden within {radius} m"),
    }
    Ok(())
}
