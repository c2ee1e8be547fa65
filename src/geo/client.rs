use std::time::Duration;

use serde::Deserialize;

use crate::error::LookupError;

/// First candidate returned by a geocoder search.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoHit {
    pub latitude: f64,
    pub longitude: f64,
    pub display_name: String,
}

/// Anything that can turn a free-text query into a coordinate.
pub trait Geocoder {
    fn search(&self, query: &str) -> Result<GeoHit, LookupError>;
}

/// Nominatim returns coordinates as strings.
#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: Option<String>,
}

/// Blocking client for a Nominatim-compatible `/search` endpoint.
pub struct NominatimClient {
    http: reqwest::blocking::Client,
    base_url: String,
}

impl NominatimClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, LookupError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("rigscope/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }
}

impl Geocoder for NominatimClient {
    fn search(&self, query: &str) -> Result<GeoHit, LookupError> {
        let url = format!("{}/search", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("q", query), ("limit", "1"), ("format", "json")])
            .header(reqwest::header::ACCEPT, "application/json")
            .send()?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(LookupError::Status(status.as_u16()));
        }

        let places: Vec<Place> = response.json()?;
        let place = places.into_iter().next().ok_or(LookupError::NoResults)?;
        parse_place(place)
    }
}

fn parse_place(place: Place) -> Result<GeoHit, LookupError> {
    let latitude: f64 = place
        .lat
        .trim()
        .parse()
        .map_err(|_| LookupError::BadCoordinate(place.lat.clone()))?;
    let longitude: f64 = place
        .lon
        .trim()
        .parse()
        .map_err(|_| LookupError::BadCoordinate(place.lon.clone()))?;
    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return Err(LookupError::BadCoordinate(format!("{latitude},{longitude}")));
    }
    Ok(GeoHit {
        latitude,
        longitude,
        display_name: place
            .display_name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| "Unknown".to_owned()),
    })
}
