/*
 *  units.rs
 *
 *  forecast-widget - precipitation at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Provider unit handling: everything downstream works in Fahrenheit
 *  and inches per hour
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

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unit tag the provider reports for imperial payloads.
pub const IMPERIAL_TAG: &str = "us";

const MM_PER_INCH: f64 = 25.4;

/// Units a payload was delivered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    /// Fahrenheit, inches/hour, mph
    Imperial,
    /// Celsius, mm/hour
    Metric,
}

impl UnitSystem {
    /// Anything but the imperial tag is treated as metric (`si`, `ca`, `uk2`).
    pub fn from_tag(tag: &str) -> Self {
        if tag == IMPERIAL_TAG {
            UnitSystem::Imperial
        } else {
            UnitSystem::Metric
        }
    }

    pub fn is_imperial(&self) -> bool {
        matches!(self, UnitSystem::Imperial)
    }
}

/// Configured unit preference, mapped onto the request `units` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum UnitPreference {
    /// let the provider pick from the location
    #[default]
    Default,
    Metric,
    Imperial,
}

impl UnitPreference {
    pub fn request_param(&self) -> &'static str {
        match self {
            UnitPreference::Default => "auto",
            UnitPreference::Metric => "si",
            UnitPreference::Imperial => "us",
        }
    }
}

impl fmt::Display for UnitPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.request_param())
    }
}

/// Temperature in canonical Fahrenheit.
#[inline]
pub fn to_fahrenheit(value: f64, units: UnitSystem) -> f64 {
    match units {
        UnitSystem::Imperial => value,
        UnitSystem::Metric => value * 1.8 + 32.0,
    }
}

/// Precipitation intensity in canonical inches/hour.
#[inline]
pub fn to_inches_per_hour(value: f64, units: UnitSystem) -> f64 {
    match units {
        UnitSystem::Imperial => value,
        UnitSystem::Metric => value / MM_PER_INCH,
    }
}

/// Back from canonical Fahrenheit to the units the user reads.
#[inline]
pub fn from_fahrenheit(fahrenheit: f64, units: UnitSystem) -> f64 {
    match units {
        UnitSystem::Imperial => fahrenheit,
        UnitSystem::Metric => (fahrenheit - 32.0) / 1.8,
    }
}

/// Round a displayed temperature to `places` decimal places.
pub fn round_temp(value: f64, places: u32) -> f64 {
    let scalar = 10f64.powi(places.min(6) as i32);
    (value * scalar).round() / scalar
}
