/*
 *  icons.rs
 *
 *  forecast-widget - precipitation at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Provider icon tags to weather-icons glyph classes
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

pub const WIND: &str = "wi-strong-wind";
pub const SUNRISE: &str = "wi-sunrise";
pub const SUNSET: &str = "wi-sunset";
pub const NO_DATA: &str = "wi-na";

/// Glyph class for a provider icon tag.
pub fn icon_class(tag: &str) -> &'static str {
    match tag {
        "clear-day" => "wi-day-sunny",
        "clear-night" => "wi-night-clear",
        "rain" => "wi-rain",
        "snow" => "wi-snow",
        "sleet" => "wi-rain-mix",
        "wind" => "wi-cloudy-gusts",
        "fog" => "wi-fog",
        "cloudy" => "wi-cloudy",
        "partly-cloudy-day" => "wi-day-cloudy",
        "partly-cloudy-night" => "wi-night-cloudy",
        "hail" => "wi-hail",
        "thunderstorm" => "wi-thunderstorm",
        "tornado" => "wi-tornado",
        _ => NO_DATA,
    }
}
