//! Route enhancement: detours each walking leg of a journey through a nearby
//! user spot or park/garden.

pub mod enhance;

pub use enhance::{DetourSource, RouteEnhancer, DEFAULT_DETOUR_CONCURRENCY, DETOUR_ORDER};
