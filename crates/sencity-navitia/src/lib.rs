//! Navitia journey-planning client for Sencity.
//!
//! Wraps the Navitia REST API (journeys, nearby places, reverse geocoding and
//! autocomplete), normalizes journey responses into [`sencity_core::Route`]s
//! and implements the [`sencity_core::PoiLocator`] and
//! [`sencity_core::JourneyPlanner`] seams used by the route enhancer.

pub mod client;
pub mod error;
pub mod normalize;
pub mod types;

mod journeys;
mod places;
mod poi;
mod retry;

pub use client::{NavitiaClient, NavitiaSettings};
pub use error::NavitiaError;
pub use normalize::{normalize_best_journey, normalize_place, normalize_section};
