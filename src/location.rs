/*
 *  location.rs
 *
 *  forecast-widget - precipitation at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Location service - coordinates from config or a geolocation lookup
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use async_trait::async_trait;
use log::info;
use reqwest::{header, Client};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

use crate::config::LocationConfig;
use crate::error::LocationError;

/// Location information with coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub source: LocationSource,
}

/// Source of location data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationSource {
    UserConfig,
    Geolocation,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64, source: LocationSource) -> Result<Self, LocationError> {
        if (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude) {
            Ok(Self { latitude, longitude, source })
        } else {
            Err(LocationError::InvalidCoordinates(latitude, longitude))
        }
    }

    /// Both coordinates configured means no lookup is needed.
    pub fn from_config(config: &LocationConfig) -> Option<Result<Self, LocationError>> {
        match (config.latitude, config.longitude) {
            (Some(lat), Some(lng)) => Some(Location::new(lat, lng, LocationSource::UserConfig)),
            _ => None,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.4}, {:.4}) [{}]",
            self.latitude, self.longitude,
            match self.source {
                LocationSource::UserConfig => "config",
                LocationSource::Geolocation => "geolocation",
            })
    }
}

/// What the scheduler knows about the widget's position.
///
/// Only geolocation results change it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LocationState {
    pub coordinates: Option<Location>,
    pub lookup_failed: bool,
    pub lookup_succeeded: bool,
}

impl LocationState {
    pub fn fixed(location: Location) -> Self {
        Self { coordinates: Some(location), lookup_failed: false, lookup_succeeded: false }
    }

    pub fn succeeded(location: Location) -> Self {
        Self { coordinates: Some(location), lookup_failed: false, lookup_succeeded: true }
    }

    pub fn failed() -> Self {
        Self { coordinates: None, lookup_failed: true, lookup_succeeded: false }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeolocationOptions {
    pub enable_high_accuracy: bool,
    pub timeout: Duration,
}

impl From<&crate::config::GeolocationConfig> for GeolocationOptions {
    fn from(c: &crate::config::GeolocationConfig) -> Self {
        Self {
            enable_high_accuracy: c.enable_high_accuracy,
            timeout: Duration::from_millis(c.timeout_ms),
        }
    }
}

/// Single-shot device location query.
#[async_trait]
pub trait Geolocate: Send + Sync {
    async fn locate(&self, options: &GeolocationOptions) -> Result<Location, LocationError>;
}

#[derive(Debug, Deserialize)]
struct GeoIpReply {
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    city: String,
    #[serde(default)]
    region_code: String,
}

/// IP based lookup; the closest a headless box gets to device geolocation.
#[derive(Debug, Clone)]
pub struct IpGeolocator {
    url: String,
}

impl Default for IpGeolocator {
    fn default() -> Self {
        Self { url: "https://ipapi.co/json/".to_string() }
    }
}

impl IpGeolocator {
    fn client(timeout: Duration) -> Result<Client, reqwest::Error> {
        const VERSION: &str = concat!(env!("CARGO_PKG_NAME"), " v", env!("CARGO_PKG_VERSION"));
        let mut headers = header::HeaderMap::new();
        headers.insert("User-Agent", header::HeaderValue::from_static(VERSION));
        headers.insert("Accept", header::HeaderValue::from_static("application/json"));
        headers.insert("Connection", header::HeaderValue::from_static("close"));

        Client::builder()
            .connect_timeout(timeout)
            .default_headers(headers)
            .timeout(timeout)
            .build()
    }
}

#[async_trait]
impl Geolocate for IpGeolocator {
    async fn locate(&self, options: &GeolocationOptions) -> Result<Location, LocationError> {
        info!("No location in config, attempting geolocation lookup...");
        let client = Self::client(options.timeout).map_err(|e| LocationError::Unavailable(e.to_string()))?;

        let reply = client
            .get(&self.url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                if e.is_timeout() {
                    LocationError::Timeout(options.timeout)
                } else if e.status().is_some_and(|s| s == reqwest::StatusCode::FORBIDDEN) {
                    LocationError::Denied(e.to_string())
                } else {
                    LocationError::Unavailable(e.to_string())
                }
            })?
            .json::<GeoIpReply>()
            .await
            .map_err(|e| LocationError::Unavailable(e.to_string()))?;

        let location = Location::new(reply.latitude, reply.longitude, LocationSource::Geolocation)?;
        if reply.city.is_empty() {
            info!("Geolocation successful: {}", location);
        } else {
            info!("Geolocation successful: {} {} {}", reply.city, reply.region_code, location);
        }
        Ok(location)
    }
}
