use futures::future::join_all;
use sencity_core::{
    pick_nearest_poi, Coordinate, Poi, PoiCategory, PoiLocator, RouteError, SearchArea,
};

use crate::client::NavitiaClient;
use crate::error::NavitiaError;
use crate::types::PlacesNearbyResponse;

impl NavitiaClient {
    /// Closest point of interest of `category` strictly inside `area`.
    ///
    /// Navitia takes an integer search distance, so the radius is floored; a
    /// radius under one meter matches nothing and sends no request.
    ///
    /// # Errors
    ///
    /// - [`NavitiaError::InvalidRequest`] if the centre is not finite.
    /// - [`NavitiaError::Api`] / [`NavitiaError::Http`] on upstream failure.
    /// - [`NavitiaError::Deserialize`] on an unexpected body, including a
    ///   non-numeric distance or coordinate.
    pub async fn nearest_poi_of_category(
        &self,
        area: SearchArea,
        category: PoiCategory,
    ) -> Result<Option<Poi>, NavitiaError> {
        area.center
            .validate()
            .map_err(|e| NavitiaError::InvalidRequest(e.to_string()))?;

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let distance = area.radius_meters.floor().max(0.0) as u64;
        if distance == 0 {
            return Ok(None);
        }

        let path = format!(
            "coverage/{}/coords/{};{}/places_nearby",
            self.coverage, area.center.lon, area.center.lat
        );
        let distance = distance.to_string();
        let filter = format!("poi_type.id={}", category.poi_type_id());
        let url = self.endpoint(
            &path,
            &[
                ("count", "1"),
                ("distance", &distance),
                ("type[]", "poi"),
                ("filter", &filter),
            ],
        )?;

        let response: PlacesNearbyResponse = self.get_json(&url, "places_nearby").await?;

        // Results come sorted by distance; the first usable entry is the closest.
        let nearest = response.places_nearby.into_iter().find_map(|place| {
            let poi = place.poi?;
            (place.distance < area.radius_meters).then_some((poi, place.distance))
        });

        let Some((poi, distance)) = nearest else {
            return Ok(None);
        };
        Ok(Some(Poi {
            name: poi.name,
            // `RawCoord` only deserializes finite values.
            coord: Coordinate {
                lon: poi.coord.lon,
                lat: poi.coord.lat,
            },
            distance,
            category,
        }))
    }
}

impl PoiLocator for NavitiaClient {
    async fn find_nearest_poi(&self, area: SearchArea) -> Result<Option<Poi>, RouteError> {
        let lookups = PoiCategory::ALL.map(|category| async move {
            let result = self
                .nearest_poi_of_category(area, category)
                .await
                .map_err(RouteError::from);
            (category, result)
        });
        let results = join_all(lookups).await;

        let any_found = results.iter().any(|(_, r)| matches!(r, Ok(Some(_))));
        if any_found {
            for (category, result) in &results {
                if let Err(err) = result {
                    tracing::warn!(
                        %category,
                        error = %err,
                        "poi lookup failed, using other categories"
                    );
                }
            }
        }

        pick_nearest_poi(results)
    }
}
