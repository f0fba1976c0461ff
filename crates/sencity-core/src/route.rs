//! Route, section and waypoint types.
//!
//! These are the flattened shapes the normalizer produces from raw journey
//! responses and the enhancer rebuilds into the final route. Field names and
//! serde renames follow the JSON the mobile clients already consume.

use serde::{Deserialize, Serialize};

use crate::error::RouteError;

/// A WGS84 position. Both components must be finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lon: f64,
    pub lat: f64,
}

impl Coordinate {
    /// Builds a coordinate, rejecting NaN and infinite components.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::InvalidInput`] if either component is not finite.
    pub fn new(lon: f64, lat: f64) -> Result<Self, RouteError> {
        let coord = Self { lon, lat };
        coord.validate()?;
        Ok(coord)
    }

    /// Parses a coordinate from the decimal strings used on the wire.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::InvalidInput`] if either string is not numeric.
    pub fn parse(lon: &str, lat: &str) -> Result<Self, RouteError> {
        let parse_axis = |name: &str, raw: &str| {
            raw.trim()
                .parse::<f64>()
                .map_err(|_| RouteError::InvalidInput(format!("{name} '{raw}' is not numeric")))
        };
        Self::new(parse_axis("lon", lon)?, parse_axis("lat", lat)?)
    }

    /// # Errors
    ///
    /// Returns [`RouteError::InvalidInput`] if either component is not finite.
    pub fn validate(&self) -> Result<(), RouteError> {
        if self.lon.is_finite() && self.lat.is_finite() {
            Ok(())
        } else {
            Err(RouteError::InvalidInput(format!(
                "coordinate ({}, {}) is not numeric",
                self.lon, self.lat
            )))
        }
    }
}

/// A named endpoint: section origin/destination or an autocomplete hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    pub coord: Coordinate,
}

/// Travel mode of a section.
///
/// Modes the pipeline does not special-case are kept verbatim in
/// [`SectionKind::Other`] so they round-trip to the client unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SectionKind {
    StreetNetwork,
    Transit,
    Waiting,
    Other(String),
}

impl SectionKind {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            SectionKind::StreetNetwork => "street_network",
            SectionKind::Transit => "transit",
            SectionKind::Waiting => "waiting",
            SectionKind::Other(mode) => mode,
        }
    }
}

impl From<&str> for SectionKind {
    fn from(raw: &str) -> Self {
        match raw {
            "street_network" => SectionKind::StreetNetwork,
            "transit" => SectionKind::Transit,
            "waiting" => SectionKind::Waiting,
            other => SectionKind::Other(other.to_string()),
        }
    }
}

impl From<String> for SectionKind {
    fn from(raw: String) -> Self {
        SectionKind::from(raw.as_str())
    }
}

impl From<SectionKind> for String {
    fn from(kind: SectionKind) -> Self {
        kind.as_str().to_string()
    }
}

impl std::fmt::Display for SectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One leg of a journey.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    #[serde(rename = "type")]
    pub kind: SectionKind,
    /// Seconds.
    pub duration: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Place>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Place>,
    /// Opaque GeoJSON path, passed through from the journey planner untouched.
    #[serde(rename = "geojson", default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
}

impl Section {
    #[must_use]
    pub fn is_walking(&self) -> bool {
        self.kind == SectionKind::StreetNetwork
    }

    /// Returns `(from, to)` when both endpoints are present.
    #[must_use]
    pub fn endpoints(&self) -> Option<(&Place, &Place)> {
        self.from.as_ref().zip(self.to.as_ref())
    }
}

/// Sum of section durations in seconds.
#[must_use]
pub fn total_duration(sections: &[Section]) -> u64 {
    sections.iter().map(|s| s.duration).sum()
}

/// A user-curated spot as seen by one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spot {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub spot_type: i32,
    pub coord: Coordinate,
    pub visited: bool,
    /// Distance from the search centre in meters, when the spot came from a
    /// proximity query.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

/// Point-of-interest categories searched for detours.
///
/// Declaration order is the tie-break priority when two candidates are
/// equally close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoiCategory {
    Park,
    Garden,
}

impl PoiCategory {
    /// Every category, in tie-break priority order.
    pub const ALL: [PoiCategory; 2] = [PoiCategory::Park, PoiCategory::Garden];

    /// Navitia `poi_type` identifier for this category.
    #[must_use]
    pub fn poi_type_id(self) -> &'static str {
        match self {
            PoiCategory::Park => "poi_type:leisure:park",
            PoiCategory::Garden => "poi_type:leisure:garden",
        }
    }
}

impl std::fmt::Display for PoiCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PoiCategory::Park => write!(f, "park"),
            PoiCategory::Garden => write!(f, "garden"),
        }
    }
}

/// A point of interest returned by the external places service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Poi {
    pub name: String,
    pub coord: Coordinate,
    /// Meters from the search centre, as reported by the service.
    pub distance: f64,
    pub category: PoiCategory,
}

/// A detour target inserted into a walking leg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Waypoint {
    Spot(Spot),
    Poi(Poi),
}

impl Waypoint {
    #[must_use]
    pub fn coord(&self) -> Coordinate {
        match self {
            Waypoint::Spot(spot) => spot.coord,
            Waypoint::Poi(poi) => poi.coord,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Waypoint::Spot(spot) => &spot.name,
            Waypoint::Poi(poi) => &poi.name,
        }
    }
}

/// A journey from origin to destination.
///
/// `duration` always equals the sum of the section durations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub duration: u64,
    pub sections: Vec<Section>,
    #[serde(default)]
    pub waypoints: Vec<Waypoint>,
}

impl Route {
    /// Builds a route with no waypoints, deriving the duration.
    #[must_use]
    pub fn from_sections(sections: Vec<Section>) -> Self {
        Self {
            duration: total_duration(&sections),
            sections,
            waypoints: Vec::new(),
        }
    }

    #[must_use]
    pub fn walking_section_count(&self) -> usize {
        self.sections.iter().filter(|s| s.is_walking()).count()
    }
}
