//! Driving routes from OSRM with a straight-line fallback.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use trip_core::models::{Coordinate, CoordinateError, RouteResult};
use trip_core::spatial::straight_line_route;

use crate::config::Config;

#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("routing request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("routing service returned status {0}")]
    Status(u16),
    #[error("routing service found no route (code {0})")]
    NoRoute(String),
    #[error("route geometry has {0} points")]
    InvalidGeometry(usize),
}

/// A road-routing backend.
#[async_trait]
pub trait RoutingService: Send + Sync {
    async fn fetch_route(&self, start: Coordinate, end: Coordinate)
        -> Result<RouteResult, RoutingError>;
}

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    /// Meters.
    distance: f64,
    /// Seconds.
    duration: f64,
    geometry: OsrmGeometry,
}

#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    /// `[lng, lat]` pairs.
    coordinates: Vec<[f64; 2]>,
}

/// OSRM HTTP client (`/route/v1/driving`).
pub struct OsrmClient {
    client: Client,
    base_url: String,
}

impl OsrmClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, RoutingError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, RoutingError> {
        Self::new(
            config.osrm_url.clone(),
            Duration::from_secs(config.route_timeout_s.max(1)),
        )
    }

    fn route_url(&self, start: Coordinate, end: Coordinate) -> String {
        format!(
            "{}/route/v1/driving/{},{};{},{}?overview=full&geometries=geojson",
            self.base_url, start.lng, start.lat, end.lng, end.lat
        )
    }
}

#[async_trait]
impl RoutingService for OsrmClient {
    async fn fetch_route(
        &self,
        start: Coordinate,
        end: Coordinate,
    ) -> Result<RouteResult, RoutingError> {
        let response = self.client.get(self.route_url(start, end)).send().await?;
        if !response.status().is_success() {
            return Err(RoutingError::Status(response.status().as_u16()));
        }
        let body: OsrmResponse = response.json().await?;
        route_from_osrm(body)
    }
}

fn route_from_osrm(body: OsrmResponse) -> Result<RouteResult, RoutingError> {
    if body.code != "Ok" {
        return Err(RoutingError::NoRoute(body.code));
    }
    let route = body
        .routes
        .into_iter()
        .next()
        .ok_or_else(|| RoutingError::NoRoute(body.code))?;

    let coordinates: Vec<Coordinate> = route
        .geometry
        .coordinates
        .into_iter()
        .map(|[lng, lat]| Coordinate::new(lat, lng))
        .collect();
    if coordinates.len() < 2 {
        return Err(RoutingError::InvalidGeometry(coordinates.len()));
    }

    Ok(RouteResult {
        distance_km: route.distance.max(0.0) / 1000.0,
        time_minutes: route.duration.max(0.0) / 60.0,
        coordinates,
        is_fallback: false,
    })
}

/// Routes for plan synthesis. Never fails on routing-service errors.
#[derive(Clone)]
pub struct RouteProvider {
    service: Arc<dyn RoutingService>,
}

impl RouteProvider {
    pub fn new(service: Arc<dyn RoutingService>) -> Self {
        Self { service }
    }

    /// Road route between two points, or a straight line when the
    /// service cannot provide one. Only invalid coordinates are an error.
    pub async fn get_route(
        &self,
        start: Coordinate,
        end: Coordinate,
    ) -> Result<RouteResult, CoordinateError> {
        start.validate()?;
        end.validate()?;

        match self.service.fetch_route(start, end).await {
            Ok(route) => {
                tracing::debug!(
                    distance_km = route.distance_km,
                    points = route.coordinates.len(),
                    "Road route found"
                );
                Ok(route)
            }
            Err(err) => {
                tracing::warn!("No road route ({}); using straight line", err);
                Ok(straight_line_route(start, end))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trip_core::spatial::haversine_km;

    struct Unreachable;

    #[async_trait]
    impl RoutingService for Unreachable {
        async fn fetch_route(
            &self,
            _start: Coordinate,
            _end: Coordinate,
        ) -> Result<RouteResult, RoutingError> {
            Err(RoutingError::Status(503))
        }
    }

    fn osrm(json: &str) -> OsrmResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn osrm_geometry_is_flipped_to_lat_lng() {
        let body = osrm(
            r#"{"code": "Ok", "routes": [{
                "distance": 82400.0, "duration": 7524.0,
                "geometry": {"type": "LineString",
                             "coordinates": [[106.92, 47.92], [107.4, 47.95], [107.92, 47.92]]}
            }]}"#,
        );
        let route = route_from_osrm(body).unwrap();
        assert!(!route.is_fallback);
        assert!((route.distance_km - 82.4).abs() < 1e-9);
        assert!((route.time_minutes - 125.4).abs() < 1e-9);
        assert_eq!(route.coordinates[0], Coordinate::new(47.92, 106.92));
        assert_eq!(route.coordinates[2], Coordinate::new(47.92, 107.92));
    }

    #[test]
    fn osrm_without_routes_is_an_error() {
        assert!(matches!(
            route_from_osrm(osrm(r#"{"code": "NoRoute", "routes": []}"#)),
            Err(RoutingError::NoRoute(code)) if code == "NoRoute"
        ));
        assert!(matches!(
            route_from_osrm(osrm(r#"{"code": "Ok"}"#)),
            Err(RoutingError::NoRoute(_))
        ));
        assert!(matches!(
            route_from_osrm(osrm(
                r#"{"code": "Ok", "routes": [{"distance": 0, "duration": 0,
                    "geometry": {"coordinates": [[106.9, 47.9]]}}]}"#
            )),
            Err(RoutingError::InvalidGeometry(1))
        ));
    }

    #[test]
    fn route_url_uses_lng_lat_order() {
        let client = OsrmClient::new("http://osrm.local/", Duration::from_secs(1)).unwrap();
        let url = client.route_url(Coordinate::new(47.92, 106.92), Coordinate::new(48.0, 107.5));
        assert_eq!(
            url,
            "http://osrm.local/route/v1/driving/106.92,47.92;107.5,48?overview=full&geometries=geojson"
        );
    }

    #[tokio::test]
    async fn unreachable_service_falls_back_to_straight_line() {
        let provider = RouteProvider::new(Arc::new(Unreachable));
        let start = Coordinate::new(47.92, 106.92);
        let end = Coordinate::new(47.92, 107.92);

        let route = provider.get_route(start, end).await.unwrap();
        assert!(route.is_fallback);
        assert_eq!(route.coordinates, vec![start, end]);
        assert!((route.distance_km - haversine_km(start, end)).abs() < 1e-9);
        assert!((route.time_minutes - route.distance_km / 60.0 * 60.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn invalid_coordinates_are_rejected() {
        let provider = RouteProvider::new(Arc::new(Unreachable));
        let err = provider
            .get_route(Coordinate::new(f64::NAN, 0.0), Coordinate::new(47.0, 107.0))
            .await
            .unwrap_err();
        assert!(matches!(err, CoordinateError::NotFinite { .. }));

        let err = provider
            .get_route(Coordinate::new(47.0, 107.0), Coordinate::new(47.0, 190.0))
            .await
            .unwrap_err();
        assert_eq!(err, CoordinateError::LongitudeOutOfRange(190.0));
    }
}
