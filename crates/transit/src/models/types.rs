//! Core data types for fleet data.

use std::sync::Arc;

use busline_api_types::{EtaDto, PathDto, StopDto, VehicleDto, WaitSuggestionDto};
use geo::{Coord, LineString, Point};

use crate::identifiers::*;
use crate::models::color::RouteColor;

// ============================================================================
// Data Structures
// ============================================================================

/// One polled snapshot of a vehicle.
///
/// `location` is `None` when the feed sent coordinates that do not parse. Such a
/// vehicle stays in the fetched collection and is dropped at the render boundary.
#[derive(Clone, Debug, PartialEq)]
pub struct Vehicle {
    pub id: VehicleIdentifier,
    pub name: Arc<str>,
    /// Route name as the feed spells it (e.g. "EE Route")
    pub route: Arc<str>,
    pub location: Option<Point>,
    /// Degrees clockwise from north, 0 when the feed value is unusable
    pub heading: f64,
    /// Occupancy percentage
    pub occupancy: Option<f64>,
    pub color: Option<RouteColor>,
    pub wait_suggestion: Option<WaitSuggestion>,
}

impl Vehicle {
    pub fn route_key(&self) -> RouteKey {
        RouteKey::normalize(&self.route)
    }
}

/// Server-side hint that a bunched vehicle should hold at an upcoming stop.
#[derive(Clone, Debug, PartialEq)]
pub struct WaitSuggestion {
    pub stop_id: Option<StopIdentifier>,
    pub stop_name: Arc<str>,
    pub wait_seconds: f64,
}

impl WaitSuggestion {
    /// Whole minutes, rounded to nearest
    pub fn wait_minutes(&self) -> i64 {
        (self.wait_seconds / 60.0).round() as i64
    }
}

/// A fixed boarding location. Loaded once.
#[derive(Clone, Debug, PartialEq)]
pub struct Stop {
    pub id: StopIdentifier,
    pub name: Arc<str>,
    pub location: Option<Point>,
    /// Raw route names served here
    pub routes: Vec<Arc<str>>,
}

impl Stop {
    pub fn serves(&self, route: &RouteKey) -> bool {
        self.routes
            .iter()
            .any(|raw| RouteKey::normalize(raw) == *route)
    }
}

/// Ordered path geometry of one route. Coordinates are stored x = lon, y = lat.
#[derive(Clone, Debug, PartialEq)]
pub struct PathTrace {
    pub route: RouteKey,
    pub line: LineString,
}

impl PathTrace {
    /// Build from `[lat, lon]` pairs, skipping non-finite points.
    pub fn from_lat_lon(route: RouteKey, points: &[[f64; 2]]) -> Self {
        let coords = points
            .iter()
            .filter(|[lat, lon]| lat.is_finite() && lon.is_finite())
            .map(|&[lat, lon]| Coord { x: lon, y: lat })
            .collect::<Vec<_>>();

        Self {
            route,
            line: LineString::new(coords),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.line.0.is_empty()
    }
}

/// One arrival estimate at a stop, with the label exactly as the feed sent it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EtaRecord {
    pub route: Arc<str>,
    pub label: Arc<str>,
}

impl EtaRecord {
    pub fn new(route: impl Into<Arc<str>>, label: impl Into<Arc<str>>) -> Self {
        Self {
            route: route.into(),
            label: label.into(),
        }
    }

    pub fn route_key(&self) -> RouteKey {
        RouteKey::normalize(&self.route)
    }
}

// ============================================================================
// Wire conversions
// ============================================================================

fn point_from(lat: Option<f64>, lon: Option<f64>) -> Option<Point> {
    Some(Point::new(lon?, lat?))
}

impl From<VehicleDto> for Vehicle {
    fn from(dto: VehicleDto) -> Self {
        let id = VehicleIdentifier::from(&dto.id);
        let name = dto.name.map(Arc::from).unwrap_or_else(|| id.as_str().into());

        Self {
            location: point_from(dto.lat.to_f64(), dto.lon.to_f64()),
            heading: dto.course.and_then(|c| c.to_f64()).unwrap_or(0.0),
            occupancy: dto.pax_load.and_then(|p| p.to_f64()),
            color: dto.color.parse().ok(),
            wait_suggestion: dto.wait_suggestion.and_then(WaitSuggestion::from_dto),
            route: dto.route.into(),
            name,
            id,
        }
    }
}

impl WaitSuggestion {
    /// Suggestions without a stop name are not shown, so they are not kept.
    fn from_dto(dto: WaitSuggestionDto) -> Option<Self> {
        let stop_name = dto.at_stop_name.filter(|name| !name.is_empty())?;

        Some(Self {
            stop_id: dto.at_stop_id.as_ref().map(StopIdentifier::from),
            stop_name: stop_name.into(),
            wait_seconds: dto.wait_seconds.to_f64().unwrap_or(0.0),
        })
    }
}

impl From<StopDto> for Stop {
    fn from(dto: StopDto) -> Self {
        Self {
            id: StopIdentifier::from(&dto.id),
            name: dto.name.into(),
            location: point_from(dto.latitude.to_f64(), dto.longitude.to_f64()),
            routes: dto.routes.into_iter().map(Arc::from).collect(),
        }
    }
}

impl From<EtaDto> for EtaRecord {
    fn from(dto: EtaDto) -> Self {
        Self::new(dto.route, dto.eta)
    }
}

impl PathTrace {
    pub fn from_dto(route: RouteKey, dto: &PathDto) -> Self {
        Self::from_lat_lon(route, dto)
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum TransitError {
    #[error("Feed unreachable: {0}")]
    Transport(String),

    #[error("Feed returned status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Malformed feed payload: {0}")]
    Decode(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

pub type Result<T> = std::result::Result<T, TransitError>;

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use busline_api_types::{FeedId, Numeric};

    fn vehicle_dto(lat: &str, lon: &str) -> VehicleDto {
        VehicleDto {
            id: FeedId::Number(4021),
            name: Some("4021".into()),
            route: "EE Route".into(),
            lat: Numeric::from(lat),
            lon: Numeric::from(lon),
            course: Some(Numeric::from("not a number")),
            color: "#FF8000".into(),
            pax_load: Some(Numeric::from(35.0)),
            wait_suggestion: None,
        }
    }

    #[test]
    fn test_vehicle_from_dto() {
        let vehicle = Vehicle::from(vehicle_dto("40.5", "-74.45"));

        assert_eq!(vehicle.id, VehicleIdentifier::new("4021"));
        assert_eq!(vehicle.route_key(), RouteKey::new("EE"));
        let location = vehicle.location.unwrap();
        assert_relative_eq!(location.y(), 40.5);
        assert_relative_eq!(location.x(), -74.45);
        assert_eq!(vehicle.heading, 0.0);
        assert_eq!(vehicle.occupancy, Some(35.0));
        assert!(vehicle.color.is_some());
    }

    #[test]
    fn test_vehicle_with_bad_coordinates_is_kept() {
        let vehicle = Vehicle::from(vehicle_dto("", "-74.45"));
        assert!(vehicle.location.is_none());
    }

    #[test]
    fn test_wait_suggestion_requires_stop_name() {
        let mut dto = vehicle_dto("40.5", "-74.45");
        dto.wait_suggestion = Some(WaitSuggestionDto {
            wait_seconds: Numeric::from(90.0),
            at_stop_id: Some(FeedId::Number(10035)),
            at_stop_name: Some("Scott Hall".into()),
        });
        let wait = Vehicle::from(dto.clone()).wait_suggestion.unwrap();
        assert_eq!(wait.wait_minutes(), 2);
        assert_eq!(wait.stop_id, Some(StopIdentifier::new("10035")));

        dto.wait_suggestion = Some(WaitSuggestionDto {
            wait_seconds: Numeric::from(90.0),
            at_stop_id: None,
            at_stop_name: None,
        });
        assert!(Vehicle::from(dto).wait_suggestion.is_none());
    }

    #[test]
    fn test_stop_serves_normalized_route() {
        let stop = Stop {
            id: StopIdentifier::new("10034"),
            name: "College Ave".into(),
            location: None,
            routes: vec!["A Route".into(), "B/L Loop".into()],
        };

        assert!(stop.serves(&RouteKey::new("A")));
        assert!(stop.serves(&RouteKey::new("B/L Loop")));
        assert!(!stop.serves(&RouteKey::new("EE")));
    }

    #[test]
    fn test_path_trace_from_lat_lon_pairs() {
        let trace = PathTrace::from_lat_lon(
            RouteKey::new("A"),
            &[[40.5, -74.45], [f64::NAN, -74.0], [40.6, -74.40]],
        );

        assert_eq!(trace.line.0.len(), 2);
        assert_eq!(trace.line.0[0], Coord { x: -74.45, y: 40.5 });
        assert_eq!(trace.line.0[1], Coord { x: -74.40, y: 40.6 });
    }
}
