/*
 *  fetch.rs
 *
 *  forecast-widget - precipitation at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Weather payload retrieval
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
use flate2::read::GzDecoder;
use log::{debug, info};
use reqwest::{header, Client};
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::ApiConfig;
use crate::error::FetchError;
use crate::location::Location;
use crate::model::WeatherSnapshot;

/// Where forecasts are requested from.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiEndpoint {
    pub api_base: String,
    pub api_key: String,
    pub units: &'static str,
    pub language: String,
}

impl ApiEndpoint {
    pub fn from_config(api: &ApiConfig) -> Self {
        Self {
            api_base: api.api_base.trim_end_matches('/').to_string(),
            api_key: api.api_key.clone(),
            units: api.units.request_param(),
            language: api.language.clone(),
        }
    }

    /// `{base}/{key}/{lat},{lon}?units=..&lang=..`
    pub fn url(&self, location: &Location) -> String {
        format!(
            "{}/{}/{},{}?units={}&lang={}",
            self.api_base, self.api_key, location.latitude, location.longitude, self.units, self.language
        )
    }
}

/// One forecast request; at most one is outstanding per cycle.
#[async_trait]
pub trait WeatherFetch: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<WeatherSnapshot, FetchError>;
}

/// Forecast service over HTTPS.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        const VERSION: &str = concat!(env!("CARGO_PKG_NAME"), " v", env!("CARGO_PKG_VERSION"));

        let mut headers = header::HeaderMap::new();
        headers.insert("User-Agent", header::HeaderValue::from_static(VERSION));
        headers.insert("Accept", header::HeaderValue::from_static("application/json"));
        headers.insert("Accept-Encoding", header::HeaderValue::from_static("gzip, deflate"));
        headers.insert("Connection", header::HeaderValue::from_static("close"));

        let client = Client::builder()
            .connect_timeout(Duration::from_millis(2000).min(timeout))
            .default_headers(headers)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl WeatherFetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<WeatherSnapshot, FetchError> {
        // the key sits in the path, keep it out of the logs
        debug!("Requesting forecast from {}", redact(url));
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        let raw = response.bytes().await?;
        let body = decode_body(&raw);
        Ok(WeatherSnapshot::from_json(&body)?)
    }
}

/// Canned payload from disk, for debugging layouts without an API key.
#[derive(Debug, Clone)]
pub struct FileFetcher {
    path: PathBuf,
}

impl FileFetcher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl WeatherFetch for FileFetcher {
    async fn fetch(&self, _url: &str) -> Result<WeatherSnapshot, FetchError> {
        info!("Reading weather payload from {}", self.path.display());
        let raw = tokio::fs::read(&self.path).await?;
        Ok(WeatherSnapshot::from_json(&decode_body(&raw))?)
    }
}

/// Gunzip when the body is compressed, otherwise take it as text.
pub fn decode_body(raw: &[u8]) -> String {
    let mut decoder = GzDecoder::new(raw);
    let mut decoded = String::new();
    match decoder.read_to_string(&mut decoded) {
        Ok(_) => decoded,
        Err(_) => String::from_utf8_lossy(raw).to_string(),
    }
}

fn redact(url: &str) -> String {
    match url.rsplit_once('/') {
        Some((base, tail)) => match base.rsplit_once('/') {
            Some((root, _key)) => format!("{}/***/{}", root, tail),
            None => url.to_string(),
        },
        None => url.to_string(),
    }
}
