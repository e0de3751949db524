//! `RouteFetcher` backed by an OSRM-compatible HTTP routing service.

use serde::Deserialize;
use std::time::Duration;
use url::Url;

use crate::config::RouteServiceConfig;
use crate::error::ConfigurationError;
use crate::geo::Coordinate;
use crate::http::HttpClient;
use crate::retry::FetchError;

use super::chunk::Chunk;
use super::fetcher::{RouteFetcher, RouteSegment};

#[derive(Debug, Deserialize)]
struct RouteResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<RouteBody>,
}

#[derive(Debug, Deserialize)]
struct RouteBody {
    duration: f64,
    distance: f64,
    geometry: RouteGeometry,
}

/// GeoJSON line string: `[lon, lat]` pairs.
#[derive(Debug, Deserialize)]
struct RouteGeometry {
    coordinates: Vec<[f64; 2]>,
}

/// Fetches one chunk per request: `GET {base}/route/v1/{profile}/{lon,lat;...}`.
#[derive(Debug, Clone)]
pub struct HttpRouteFetcher {
    base_url: Url,
    profile: String,
    api_key: Option<String>,
    client: HttpClient,
}

impl HttpRouteFetcher {
    /// Build from config. The API key is passed separately so it can come from
    /// the environment rather than the config file.
    pub fn new(cfg: &RouteServiceConfig, api_key: Option<String>) -> Result<Self, ConfigurationError> {
        let base_url = Url::parse(&cfg.base_url).map_err(|e| ConfigurationError::InvalidInput {
            key: "route.base_url".to_string(),
            reason: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigurationError::InvalidInput {
                key: "route.base_url".to_string(),
                reason: "not a base URL".to_string(),
            });
        }
        Ok(Self {
            base_url,
            profile: cfg.profile.clone(),
            api_key,
            client: HttpClient::with_timeout(Duration::from_secs(cfg.timeout_secs)),
        })
    }

    /// Request URL for `chunk`.
    pub fn request_url(&self, chunk: &Chunk) -> Url {
        let coords = chunk
            .stops
            .iter()
            .map(|s| format!("{},{}", s.lon, s.lat))
            .collect::<Vec<_>>()
            .join(";");
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["route", "v1", self.profile.as_str(), coords.as_str()]);
        }
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("overview", "full")
                .append_pair("geometries", "geojson");
            if let Some(key) = &self.api_key {
                query.append_pair("key", key);
            }
        }
        url
    }
}

impl RouteFetcher for HttpRouteFetcher {
    fn fetch(&self, chunk: &Chunk) -> Result<RouteSegment, FetchError> {
        let url = self.request_url(chunk);
        tracing::debug!(chunk = chunk.index, stops = chunk.len(), "requesting route chunk");
        let response = self.client.get(url.as_str())?;
        parse_route_response(&response.body)
    }
}

/// Parse a routing response body into the first route's segment.
pub(crate) fn parse_route_response(body: &[u8]) -> Result<RouteSegment, FetchError> {
    let parsed: RouteResponse =
        serde_json::from_slice(body).map_err(|e| FetchError::InvalidResponse(e.to_string()))?;
    if parsed.code != "Ok" {
        let detail = parsed.message.unwrap_or_default();
        return Err(FetchError::InvalidResponse(format!("{} {}", parsed.code, detail).trim().to_string()));
    }
    let route = parsed
        .routes
        .into_iter()
        .next()
        .ok_or_else(|| FetchError::InvalidResponse("no routes in response".to_string()))?;
    Ok(RouteSegment {
        duration_secs: route.duration,
        distance_m: route.distance,
        geometry: route
            .geometry
            .coordinates
            .into_iter()
            .map(|[lon, lat]| Coordinate::new(lat, lon))
            .collect(),
    })
}
