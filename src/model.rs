/*
 *  model.rs
 *
 *  forecast-widget - precipitation at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Weather payload as delivered, and the canonical forecast built from it
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

use crate::units::{to_fahrenheit, to_inches_per_hour, UnitSystem};

/// Raw payload, provider units.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSnapshot {
    #[serde(default)]
    pub currently: Currently,
    #[serde(default)]
    pub minutely: Option<Summary>,
    #[serde(default)]
    pub hourly: Hourly,
    #[serde(default)]
    pub daily: Daily,
    #[serde(default)]
    pub flags: Flags,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Currently {
    pub temperature: f64,
    pub wind_speed: f64,
    pub icon: String,
    pub summary: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Summary {
    pub icon: String,
    pub summary: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hourly {
    pub icon: String,
    pub summary: String,
    pub data: Vec<HourSample>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Daily {
    pub data: Vec<DaySample>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Flags {
    pub units: String,
}

impl Default for Flags {
    fn default() -> Self {
        Self { units: "us".to_string() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HourSample {
    pub time: i64,
    pub temperature: f64,
    /// absent from the payload when it is dry
    pub precip_intensity: f64,
    pub icon: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DaySample {
    pub time: i64,
    pub temperature_min: f64,
    pub temperature_max: f64,
    pub icon: String,
    pub sunrise_time: i64,
    pub sunset_time: i64,
}

impl WeatherSnapshot {
    pub fn units(&self) -> UnitSystem {
        UnitSystem::from_tag(&self.flags.units)
    }

    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

/// Current conditions. Temperature is canonical Fahrenheit; wind stays in
/// provider units since it is only ever displayed.
#[derive(Debug, Clone, PartialEq)]
pub struct Conditions {
    pub temperature_f: f64,
    pub wind_speed: f64,
    pub icon: String,
    pub summary: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HourPoint {
    pub time: i64,
    pub temperature_f: f64,
    pub precip_in_hr: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayPoint {
    pub time: i64,
    pub temperature_min_f: f64,
    pub temperature_max_f: f64,
    pub icon: String,
    pub sunrise: i64,
    pub sunset: i64,
}

/// A snapshot normalized once into canonical units (Fahrenheit, in/h).
///
/// Built whole on every successful fetch and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    /// units the provider delivered, kept for display
    pub units: UnitSystem,
    pub current: Conditions,
    pub hours: Vec<HourPoint>,
    pub days: Vec<DayPoint>,
}

impl Forecast {
    pub fn from_snapshot(snapshot: &WeatherSnapshot) -> Self {
        let units = snapshot.units();
        // minute-by-minute summary is the more precise one when present
        let (icon, summary) = match &snapshot.minutely {
            Some(m) => (m.icon.clone(), m.summary.clone()),
            None => (snapshot.hourly.icon.clone(), snapshot.hourly.summary.clone()),
        };
        let current = Conditions {
            temperature_f: to_fahrenheit(snapshot.currently.temperature, units),
            wind_speed: snapshot.currently.wind_speed,
            icon,
            summary,
        };
        let hours = snapshot
            .hourly
            .data
            .iter()
            .map(|h| HourPoint {
                time: h.time,
                temperature_f: to_fahrenheit(h.temperature, units),
                precip_in_hr: to_inches_per_hour(h.precip_intensity, units),
            })
            .collect();
        let days = snapshot
            .daily
            .data
            .iter()
            .map(|d| DayPoint {
                time: d.time,
                temperature_min_f: to_fahrenheit(d.temperature_min, units),
                temperature_max_f: to_fahrenheit(d.temperature_max, units),
                icon: d.icon.clone(),
                sunrise: d.sunrise_time,
                sunset: d.sunset_time,
            })
            .collect();
        Forecast { units, current, hours, days }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = r#"{
        "currently": {"temperature": 0.0, "windSpeed": 4.6, "icon": "rain", "summary": "Rain"},
        "hourly": {
            "icon": "rain", "summary": "Rain until evening.",
            "data": [
                {"time": 1700000000, "temperature": 0.0, "precipIntensity": 5.0, "icon": "rain"},
                {"time": 1700003600, "temperature": 1.5, "icon": "cloudy"}
            ]
        },
        "daily": {"data": [
            {"time": 1699948800, "temperatureMin": -2.0, "temperatureMax": 4.0, "icon": "rain",
             "sunriseTime": 1699972000, "sunsetTime": 1700007000}
        ]},
        "flags": {"units": "si"}
    }"#;

    #[test]
    fn test_parse_payload() {
        let snap = WeatherSnapshot::from_json(PAYLOAD).unwrap();
        assert_eq!(snap.units(), UnitSystem::Metric);
        assert_eq!(snap.hourly.data.len(), 2);
        assert_eq!(snap.hourly.data[1].precip_intensity, 0.0);
        assert!(snap.minutely.is_none());
        assert_eq!(snap.daily.data[0].sunset_time, 1700007000);
    }

    #[test]
    fn test_normalizes_once_at_ingestion() {
        let snap = WeatherSnapshot::from_json(PAYLOAD).unwrap();
        let f = Forecast::from_snapshot(&snap);
        assert!((f.current.temperature_f - 32.0).abs() < 1e-9);
        assert!((f.hours[0].temperature_f - 32.0).abs() < 1e-9);
        assert!((f.hours[0].precip_in_hr - 5.0 / 25.4).abs() < 1e-9);
        assert!((f.days[0].temperature_min_f - 28.4).abs() < 1e-9);
        assert_eq!(f.current.summary, "Rain until evening.");
        // the snapshot is untouched
        assert_eq!(snap.hourly.data[0].precip_intensity, 5.0);
    }

    #[test]
    fn test_minutely_summary_wins() {
        let mut snap = WeatherSnapshot::from_json(PAYLOAD).unwrap();
        snap.minutely = Some(Summary { icon: "clear-day".into(), summary: "Clearing soon.".into() });
        let f = Forecast::from_snapshot(&snap);
        assert_eq!(f.current.icon, "clear-day");
        assert_eq!(f.current.summary, "Clearing soon.");
    }

    #[test]
    fn test_missing_flags_default_to_imperial() {
        let snap = WeatherSnapshot::from_json(r#"{"currently": {"temperature": 50}}"#).unwrap();
        assert_eq!(snap.units(), UnitSystem::Imperial);
        assert_eq!(Forecast::from_snapshot(&snap).current.temperature_f, 50.0);
    }
}
