//! Raw Navitia response shapes.
//!
//! Only the fields the normalizer and locators read are modelled; everything
//! else in the payload is ignored. Navitia sends coordinates and distances as
//! decimal strings, so those fields accept either a string or a number.

use serde::{Deserialize, Deserializer};

/// Top-level `/journeys` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JourneysResponse {
    #[serde(default)]
    pub journeys: Vec<RawJourney>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawJourney {
    #[serde(default)]
    pub sections: Vec<RawSection>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawSection {
    #[serde(rename = "type")]
    pub section_type: String,
    pub duration: u64,
    #[serde(default)]
    pub from: Option<RawPlace>,
    #[serde(default)]
    pub to: Option<RawPlace>,
    #[serde(default)]
    pub geojson: Option<serde_json::Value>,
    #[serde(default)]
    pub display_informations: Option<DisplayInformations>,
}

/// A journey endpoint. The coordinate is nested under a key that depends on
/// `embedded_type`, so the rest of the object is kept as a map.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPlace {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub embedded_type: Option<String>,
    #[serde(flatten)]
    pub rest: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DisplayInformations {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub direction: Option<String>,
}

/// Raw `{lon, lat}` pair with lenient numeric parsing.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RawCoord {
    #[serde(deserialize_with = "lenient_f64")]
    pub lon: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub lat: f64,
}

/// `/coords/{lon};{lat}/places_nearby` response. Navitia omits the list
/// entirely when nothing is nearby.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlacesNearbyResponse {
    #[serde(default)]
    pub places_nearby: Vec<RawNearbyPlace>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawNearbyPlace {
    #[serde(deserialize_with = "lenient_f64")]
    pub distance: f64,
    #[serde(default)]
    pub poi: Option<RawPoi>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawPoi {
    pub name: String,
    pub coord: RawCoord,
}

/// `/places` autocomplete response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlacesResponse {
    #[serde(default)]
    pub places: Vec<RawPlace>,
}

/// `/coord/{lon};{lat}` reverse-geocoding response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddressResponse {
    #[serde(default)]
    pub address: Option<RawAddress>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawAddress {
    pub name: String,
}

/// Navitia error envelope, e.g. `{"error": {"id": "no_solution", "message": "..."}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    Text(String),
}

/// Accepts `2.35` or `"2.35"`; rejects anything that does not parse to a
/// finite number.
pub(crate) fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => n,
        NumberOrString::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| serde::de::Error::custom(format!("'{s}' is not numeric")))?,
    };
    if value.is_finite() {
        Ok(value)
    } else {
        Err(serde::de::Error::custom("value is not finite"))
    }
}
