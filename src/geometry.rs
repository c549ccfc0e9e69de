/*
 *  geometry.rs
 *
 *  forecast-widget - precipitation at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Pixel scale factors for the precipitation graph
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

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Scale factors for one render pass. Origin top-left, y grows downward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphGeometry {
    pub width: f64,
    pub height: f64,
    pub hours: u32,
    pub fahrenheit_low: f64,
    pub fahrenheit_high: f64,
}

impl GraphGeometry {
    pub fn new(width: u32, height: u32, hours: u32, fahrenheit_low: f64, fahrenheit_high: f64) -> Self {
        Self {
            width: width as f64,
            height: height as f64,
            hours,
            fahrenheit_low,
            fahrenheit_high,
        }
    }

    #[inline]
    pub fn pixels_per_hour(&self) -> f64 {
        self.width / self.hours.max(1) as f64
    }

    #[inline]
    pub fn temp_pixels_per_degree(&self) -> f64 {
        let span = self.fahrenheit_high - self.fahrenheit_low;
        if span > 0.0 { self.height / span } else { 0.0 }
    }

    /// Higher temperatures map to smaller y.
    #[inline]
    pub fn temperature_y(&self, fahrenheit: f64) -> f64 {
        self.height - (fahrenheit - self.fahrenheit_low) * self.temp_pixels_per_degree()
    }

    #[inline]
    pub fn hour_x(&self, hour: usize) -> f64 {
        hour as f64 * self.pixels_per_hour()
    }

    #[inline]
    pub fn seconds_to_x(&self, seconds: f64) -> f64 {
        seconds / SECONDS_PER_HOUR * self.pixels_per_hour()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_graph_scales() {
        let g = GraphGeometry::new(400, 120, 36, -10.0, 110.0);
        assert!((g.pixels_per_hour() - 400.0 / 36.0).abs() < 1e-9);
        assert_eq!(g.temp_pixels_per_degree(), 1.0);
        assert_eq!(g.temperature_y(-10.0), 120.0);
        assert_eq!(g.temperature_y(110.0), 0.0);
        assert_eq!(g.temperature_y(32.0), 78.0);
    }

    #[test]
    fn test_hotter_is_higher() {
        let g = GraphGeometry::new(200, 60, 24, 0.0, 100.0);
        assert!(g.temperature_y(80.0) < g.temperature_y(20.0));
    }

    #[test]
    fn test_time_to_pixels() {
        let g = GraphGeometry::new(480, 100, 48, 0.0, 100.0);
        assert_eq!(g.hour_x(6), 60.0);
        assert_eq!(g.seconds_to_x(3.0 * 3600.0), 30.0);
    }

    #[test]
    fn test_flat_axis_does_not_divide_by_zero() {
        let g = GraphGeometry::new(100, 50, 0, 40.0, 40.0);
        assert_eq!(g.temp_pixels_per_degree(), 0.0);
        assert_eq!(g.temperature_y(70.0), 50.0);
        assert_eq!(g.pixels_per_hour(), 100.0);
    }
}
