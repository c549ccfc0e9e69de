/*
 *  forecast.rs
 *
 *  forecast-widget - precipitation at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Multi-day forecast rows with proportional temperature bars
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

use chrono::{DateTime, TimeZone};
use serde::Serialize;
use std::fmt::Display;

use crate::icons::icon_class;
use crate::model::Forecast;
use crate::units::{from_fahrenheit, round_temp};

/// Widths, in percent of the row, of the spacer before the bar, the bar
/// and the spacer after it. Always sums to 100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BarGeometry {
    pub left: f64,
    pub bar: f64,
    pub right: f64,
}

/// Places one day's `[day_min, day_max]` on the window's `[min, max]` scale.
pub fn bar_geometry(day_min: f64, day_max: f64, min: f64, max: f64) -> BarGeometry {
    let range = max - min;
    if !range.is_finite() || range.abs() <= f64::EPSILON {
        // single temperature window: nothing to scale against
        return BarGeometry { left: 50.0, bar: 0.0, right: 50.0 };
    }
    let interval = 100.0 / range;
    BarGeometry {
        left: interval * (day_min - min),
        bar: interval * (day_max - day_min),
        right: interval * (max - day_max),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastRow {
    /// short weekday, e.g. "Tue"
    pub weekday: String,
    pub icon: String,
    pub icon_class: &'static str,
    pub min: f64,
    pub max: f64,
    pub bar: BarGeometry,
}

/// Rows for the first `max_days` days, temperatures in display units.
///
/// Weekdays are taken in `tz`; the dashboard passes the local zone.
pub fn forecast_rows<Tz>(forecast: &Forecast, max_days: usize, places: u32, tz: &Tz) -> Vec<ForecastRow>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let days = &forecast.days[..forecast.days.len().min(max_days)];
    if days.is_empty() {
        return Vec::new();
    }
    let display = |f: f64| round_temp(from_fahrenheit(f, forecast.units), places);
    let temps: Vec<(f64, f64)> = days
        .iter()
        .map(|d| (display(d.temperature_min_f), display(d.temperature_max_f)))
        .collect();

    // window bounds come from the shown values so no spacer goes negative
    let min = temps.iter().map(|t| t.0).fold(f64::INFINITY, f64::min);
    let max = temps.iter().map(|t| t.1).fold(f64::NEG_INFINITY, f64::max);

    days.iter()
        .zip(temps)
        .map(|(day, (day_min, day_max))| ForecastRow {
            weekday: weekday(day.time, tz),
            icon: day.icon.clone(),
            icon_class: icon_class(&day.icon),
            min: day_min,
            max: day_max,
            bar: bar_geometry(day_min, day_max, min, max),
        })
        .collect()
}

fn weekday<Tz>(time: i64, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    DateTime::from_timestamp(time, 0)
        .map(|utc| utc.with_timezone(tz).format("%a").to_string())
        .unwrap_or_default()
}
