/*
 *  error.rs
 *
 *  forecast-widget - precipitation at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Error types shared across the widget
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

use std::time::Duration;
use thiserror::Error;

/// Transient failures while retrieving the weather payload.
///
/// These never reach the renderers: the scheduler logs them and retries
/// after the configured fixed delay.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("weather service answered with status {0}")]
    Status(u16),
    #[error("payload parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("payload read error: {0}")]
    Io(#[from] std::io::Error),
    #[error("weather request timed out after {0:?}")]
    Timeout(Duration),
}

/// Device geolocation failures. Permanent for the lifetime of a widget.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LocationError {
    #[error("geolocation permission denied: {0}")]
    Denied(String),
    #[error("geolocation timed out after {0:?}")]
    Timeout(Duration),
    #[error("geolocation unavailable: {0}")]
    Unavailable(String),
    #[error("invalid coordinates {0}, {1}")]
    InvalidCoordinates(f64, f64),
}

/// Permanent widget-level failures shown instead of the dashboard.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WidgetError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error(transparent)]
    Location(#[from] LocationError),
}

/// Failures exporting a finished frame. Drawing itself is infallible.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("frame of {0}x{1} pixels cannot be exported")]
    EmptyFrame(u32, u32),
    #[error("PNG encoding failed: {0}")]
    Png(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
