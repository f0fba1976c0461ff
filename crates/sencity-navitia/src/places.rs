use sencity_core::{Coordinate, Place};

use crate::client::NavitiaClient;
use crate::error::NavitiaError;
use crate::normalize::normalize_place;
use crate::types::{AddressResponse, PlacesResponse};

/// Place types offered by autocomplete.
const AUTOCOMPLETE_TYPES: &[&str] = &["stop_point", "address", "poi", "stop_area"];

impl NavitiaClient {
    /// Reverse-geocodes a coordinate to an address label.
    ///
    /// Returns `None` when Navitia knows no address at that point.
    ///
    /// # Errors
    ///
    /// - [`NavitiaError::InvalidRequest`] if the coordinate is not finite.
    /// - [`NavitiaError::Api`] / [`NavitiaError::Http`] on upstream failure.
    /// - [`NavitiaError::Deserialize`] on an unexpected body.
    pub async fn address_at(&self, coord: Coordinate) -> Result<Option<String>, NavitiaError> {
        coord
            .validate()
            .map_err(|e| NavitiaError::InvalidRequest(e.to_string()))?;

        let url = self.endpoint(&format!("coord/{};{}", coord.lon, coord.lat), &[])?;
        let response: AddressResponse = self.get_json(&url, "coord").await?;
        Ok(response.address.map(|a| a.name))
    }

    /// Free-text place search.
    ///
    /// Places whose coordinate cannot be resolved are skipped.
    ///
    /// # Errors
    ///
    /// - [`NavitiaError::InvalidRequest`] if `query` is blank.
    /// - [`NavitiaError::Api`] / [`NavitiaError::Http`] on upstream failure.
    /// - [`NavitiaError::Deserialize`] on an unexpected body.
    pub async fn autocomplete(&self, query: &str) -> Result<Vec<Place>, NavitiaError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(NavitiaError::InvalidRequest(
                "autocomplete query must not be empty".to_string(),
            ));
        }

        let mut params: Vec<(&str, &str)> =
            AUTOCOMPLETE_TYPES.iter().map(|t| ("type[]", *t)).collect();
        params.push(("q", query));
        let url = self.endpoint(&format!("coverage/{}/places", self.coverage), &params)?;
        let response: PlacesResponse = self.get_json(&url, "places").await?;

        let places = response
            .places
            .iter()
            .filter_map(|raw| match normalize_place(raw, &self.resolver) {
                Ok(place) => Some(place),
                Err(err) => {
                    tracing::debug!(name = %raw.name, error = %err, "skipping unresolvable place");
                    None
                }
            })
            .collect();
        Ok(places)
    }
}
