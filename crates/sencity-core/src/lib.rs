//! Domain model shared by every Sencity crate.
//!
//! Holds the coordinate and route types produced by the journey normalizer and
//! consumed by the enhancer, the geo primitives used to size detour searches,
//! the collaborator traits the enhancer is written against, and the
//! environment-driven application config.

pub mod app_config;
pub mod config;
pub mod error;
pub mod geo;
pub mod locate;
pub mod places;
pub mod route;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use error::{ConfigError, RouteError};
pub use geo::{distance_meters, midpoint, SearchArea, EARTH_RADIUS_METERS};
pub use locate::{pick_nearest_poi, rank_spots, JourneyPlanner, PoiLocator, SpotLocator};
pub use places::{load_place_resolver, PlaceResolver};
pub use route::{
    total_duration, Coordinate, Place, Poi, PoiCategory, Route, Section, SectionKind, Spot,
    Waypoint,
};
