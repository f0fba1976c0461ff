//! Normalization of raw Navitia journeys into [`Route`]s.
//!
//! Only the best (first) journey is kept. Each section is pruned to the
//! fields the clients consume and its endpoints are flattened from Navitia's
//! `embedded_type`-keyed nesting into plain [`Place`]s.

use sencity_core::{Coordinate, Place, PlaceResolver, Route, RouteError, Section, SectionKind};

use crate::types::{JourneysResponse, RawCoord, RawPlace, RawSection};

/// Normalizes the first journey of `response`.
///
/// # Errors
///
/// - [`RouteError::UpstreamEmpty`] if the response holds no journey.
/// - [`RouteError::MalformedUpstream`] if a non-waiting section lacks a
///   resolvable endpoint.
pub fn normalize_best_journey(
    response: JourneysResponse,
    resolver: &PlaceResolver,
) -> Result<Route, RouteError> {
    let journey = response
        .journeys
        .into_iter()
        .next()
        .ok_or(RouteError::UpstreamEmpty)?;

    let sections = journey
        .sections
        .into_iter()
        .map(|section| normalize_section(section, resolver))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Route::from_sections(sections))
}

/// Normalizes one raw section.
///
/// Waiting sections keep only their type and duration.
///
/// # Errors
///
/// Returns [`RouteError::MalformedUpstream`] if a non-waiting section is
/// missing `from`/`to` or either endpoint cannot be resolved.
pub fn normalize_section(raw: RawSection, resolver: &PlaceResolver) -> Result<Section, RouteError> {
    let kind = SectionKind::from(raw.section_type);

    if kind == SectionKind::Waiting {
        return Ok(Section {
            kind,
            duration: raw.duration,
            from: None,
            to: None,
            geometry: None,
            line: None,
            direction: None,
        });
    }

    let endpoint = |place: Option<&RawPlace>, side: &str| -> Result<Place, RouteError> {
        let place = place.ok_or_else(|| {
            RouteError::MalformedUpstream(format!("{kind} section has no '{side}' place"))
        })?;
        normalize_place(place, resolver)
    };
    let from = endpoint(raw.from.as_ref(), "from")?;
    let to = endpoint(raw.to.as_ref(), "to")?;

    let (line, direction) = raw
        .display_informations
        .map_or((None, None), |info| (info.label, info.direction));

    Ok(Section {
        kind,
        duration: raw.duration,
        from: Some(from),
        to: Some(to),
        geometry: raw.geojson,
        line,
        direction,
    })
}

/// Flattens a raw place into a named coordinate.
///
/// # Errors
///
/// Returns [`RouteError::MalformedUpstream`] if the place has no
/// `embedded_type`, the resolver does not know it, or the nested `coord` is
/// missing or non-numeric.
pub fn normalize_place(raw: &RawPlace, resolver: &PlaceResolver) -> Result<Place, RouteError> {
    let embedded_type = raw.embedded_type.as_deref().ok_or_else(|| {
        RouteError::MalformedUpstream(format!("place '{}' has no embedded_type", raw.name))
    })?;

    let coord_value = resolver
        .nested_coord(embedded_type, &raw.rest)
        .ok_or_else(|| {
            RouteError::MalformedUpstream(format!(
                "place '{}' of type '{embedded_type}' has no resolvable coord",
                raw.name
            ))
        })?;

    let coord: RawCoord = serde_json::from_value(coord_value.clone()).map_err(|e| {
        RouteError::MalformedUpstream(format!("place '{}' has an invalid coord: {e}", raw.name))
    })?;

    Ok(Place {
        name: raw.name.clone(),
        coord: Coordinate::new(coord.lon, coord.lat)
            .map_err(|e| RouteError::MalformedUpstream(e.to_string()))?,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn response(value: serde_json::Value) -> JourneysResponse {
        serde_json::from_value(value).expect("valid raw journeys")
    }

    fn stop_point(name: &str, lon: &str, lat: &str) -> serde_json::Value {
        json!({
            "name": name,
            "embedded_type": "stop_point",
            "stop_point": {"id": "stop_point:1", "coord": {"lon": lon, "lat": lat}}
        })
    }

    fn address(name: &str, lon: &str, lat: &str) -> serde_json::Value {
        json!({
            "name": name,
            "embedded_type": "address",
            "address": {"coord": {"lon": lon, "lat": lat}}
        })
    }

    #[test]
    fn empty_journey_list_is_upstream_empty() {
        let err = normalize_best_journey(
            response(json!({"journeys": []})),
            &PlaceResolver::default(),
        )
        .unwrap_err();
        assert_eq!(err, RouteError::UpstreamEmpty);
    }

    #[test]
    fn only_the_first_journey_is_used() {
        let raw = response(json!({"journeys": [
            {"sections": [{"type": "waiting", "duration": 60}]},
            {"sections": [{"type": "waiting", "duration": 999}]}
        ]}));
        let route = normalize_best_journey(raw, &PlaceResolver::default()).unwrap();
        assert_eq!(route.duration, 60);
        assert_eq!(route.sections.len(), 1);
    }

    #[test]
    fn waiting_section_keeps_only_type_and_duration() {
        let raw = response(json!({"journeys": [{"sections": [
            {"type": "waiting", "duration": 180, "geojson": {"type": "LineString"}}
        ]}]}));
        let route = normalize_best_journey(raw, &PlaceResolver::default()).unwrap();
        let section = &route.sections[0];
        assert_eq!(section.kind, SectionKind::Waiting);
        assert!(section.from.is_none() && section.to.is_none());
        assert!(section.geometry.is_none());
    }

    #[test]
    fn transit_section_is_flattened_with_display_informations() {
        let raw = response(json!({"journeys": [{"sections": [{
            "type": "public_transport",
            "duration": 420,
            "from": stop_point("Gare de Lyon", "2.3733", "48.8443"),
            "to": stop_point("Châtelet", "2.3470", "48.8583"),
            "geojson": {"type": "LineString", "coordinates": [[2.37, 48.84], [2.34, 48.85]]},
            "display_informations": {"label": "A", "direction": "Saint-Germain-en-Laye"}
        }]}]}));
        let route = normalize_best_journey(raw, &PlaceResolver::default()).unwrap();
        let section = &route.sections[0];
        assert_eq!(section.kind, SectionKind::Other("public_transport".to_string()));
        let (from, to) = section.endpoints().expect("endpoints");
        assert_eq!(from.name, "Gare de Lyon");
        assert!((from.coord.lon - 2.3733).abs() < 1e-9);
        assert_eq!(to.name, "Châtelet");
        assert_eq!(section.line.as_deref(), Some("A"));
        assert_eq!(section.direction.as_deref(), Some("Saint-Germain-en-Laye"));
        assert_eq!(section.geometry.as_ref().unwrap()["type"], "LineString");
    }

    #[test]
    fn walking_section_without_display_informations_has_no_line() {
        let raw = response(json!({"journeys": [{"sections": [{
            "type": "street_network",
            "duration": 300,
            "from": address("10 Rue de Rivoli", "2.3601", "48.8553"),
            "to": stop_point("Saint-Paul", "2.3610", "48.8551")
        }]}]}));
        let route = normalize_best_journey(raw, &PlaceResolver::default()).unwrap();
        assert!(route.sections[0].is_walking());
        assert!(route.sections[0].line.is_none());
        assert_eq!(route.duration, 300);
    }

    #[test]
    fn missing_nested_coord_is_malformed() {
        let raw = response(json!({"journeys": [{"sections": [{
            "type": "street_network",
            "duration": 300,
            "from": {"name": "nowhere", "embedded_type": "address", "address": {}},
            "to": address("here", "2.36", "48.85")
        }]}]}));
        let err = normalize_best_journey(raw, &PlaceResolver::default()).unwrap_err();
        assert!(matches!(err, RouteError::MalformedUpstream(ref m) if m.contains("nowhere")));
    }

    #[test]
    fn missing_endpoint_is_malformed() {
        let raw = response(json!({"journeys": [{"sections": [{
            "type": "street_network",
            "duration": 300,
            "to": address("here", "2.36", "48.85")
        }]}]}));
        let err = normalize_best_journey(raw, &PlaceResolver::default()).unwrap_err();
        assert!(matches!(err, RouteError::MalformedUpstream(ref m) if m.contains("from")));
    }

    #[test]
    fn non_numeric_coord_is_malformed() {
        let raw = response(json!({"journeys": [{"sections": [{
            "type": "street_network",
            "duration": 300,
            "from": address("here", "2.36", "48.85"),
            "to": address("there", "n/a", "48.85")
        }]}]}));
        let err = normalize_best_journey(raw, &PlaceResolver::default()).unwrap_err();
        assert!(matches!(err, RouteError::MalformedUpstream(_)));
    }

    #[test]
    fn duration_is_the_sum_of_section_durations() {
        let raw = response(json!({"journeys": [{"duration": 1, "sections": [
            {"type": "street_network", "duration": 120,
             "from": address("a", "2.30", "48.85"), "to": address("b", "2.31", "48.85")},
            {"type": "waiting", "duration": 60},
            {"type": "public_transport", "duration": 600,
             "from": stop_point("b", "2.31", "48.85"), "to": stop_point("c", "2.35", "48.86")}
        ]}]}));
        let route = normalize_best_journey(raw, &PlaceResolver::default()).unwrap();
        assert_eq!(route.duration, 780);
        assert_eq!(route.walking_section_count(), 1);
    }
}
