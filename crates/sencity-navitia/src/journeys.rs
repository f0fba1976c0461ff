use sencity_core::{Coordinate, JourneyPlanner, Route, RouteError, Section};

use crate::client::NavitiaClient;
use crate::error::NavitiaError;
use crate::normalize::normalize_best_journey;
use crate::types::JourneysResponse;

fn coord_param(coord: Coordinate) -> String {
    format!("{};{}", coord.lon, coord.lat)
}

impl NavitiaClient {
    /// Requests journeys between two coordinates.
    ///
    /// With `prefer_walking`, the first and last legs are constrained to
    /// walking; Navitia may still include transit in between. A Navitia
    /// "no solution" answer yields an empty journey list rather than an error.
    ///
    /// # Errors
    ///
    /// - [`NavitiaError::InvalidRequest`] if a coordinate is not finite.
    /// - [`NavitiaError::Api`] / [`NavitiaError::Http`] on upstream failure.
    /// - [`NavitiaError::Deserialize`] if the body does not match the
    ///   journeys shape.
    pub async fn journeys(
        &self,
        from: Coordinate,
        to: Coordinate,
        prefer_walking: bool,
    ) -> Result<JourneysResponse, NavitiaError> {
        for coord in [from, to] {
            coord
                .validate()
                .map_err(|e| NavitiaError::InvalidRequest(e.to_string()))?;
        }

        let from_param = coord_param(from);
        let to_param = coord_param(to);
        let mut query = vec![("from", from_param.as_str()), ("to", to_param.as_str())];
        if prefer_walking {
            query.push(("first_section_mode[]", "walking"));
            query.push(("last_section_mode[]", "walking"));
        }

        let path = format!("coverage/{}/journeys", self.coverage);
        let url = self.endpoint(&path, &query)?;
        match self.get_json::<JourneysResponse>(&url, "journeys").await {
            Ok(response) => Ok(response),
            Err(err) if err.is_no_solution() => {
                tracing::debug!(
                    from = %from_param,
                    to = %to_param,
                    error = %err,
                    "no journey found"
                );
                Ok(JourneysResponse::default())
            }
            Err(err) => Err(err),
        }
    }

    /// The normalized best journey between two coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::UpstreamEmpty`] when Navitia has no journey, and
    /// the other [`RouteError`] kinds as described on [`NavitiaClient::journeys`]
    /// and [`normalize_best_journey`].
    pub async fn plan_route(&self, from: Coordinate, to: Coordinate) -> Result<Route, RouteError> {
        let response = self.journeys(from, to, false).await?;
        normalize_best_journey(response, &self.resolver)
    }

    /// Sections of the best walking-preferred journey, normalized.
    ///
    /// # Errors
    ///
    /// Same as [`NavitiaClient::plan_route`].
    pub async fn walking_sections(
        &self,
        from: Coordinate,
        to: Coordinate,
    ) -> Result<Vec<Section>, RouteError> {
        let response = self.journeys(from, to, true).await?;
        Ok(normalize_best_journey(response, &self.resolver)?.sections)
    }
}

impl JourneyPlanner for NavitiaClient {
    async fn plan_sections(
        &self,
        from: Coordinate,
        to: Coordinate,
        prefer_walking: bool,
    ) -> Result<Vec<Section>, RouteError> {
        if prefer_walking {
            self.walking_sections(from, to).await
        } else {
            Ok(self.plan_route(from, to).await?.sections)
        }
    }
}
