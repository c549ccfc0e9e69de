/*
 *  precip.rs
 *
 *  forecast-widget - precipitation at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Piecewise precipitation intensity scale
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

//! Maps an intensity in inches/hour onto a fraction of graph height.
//!
//! The graph is split into three equal bands. Light rain tops out one
//! band up, heavy rain two bands up, so the same rain rate always lands
//! at the same height whatever the peak in the current window is.

use serde::{Deserialize, Serialize};

/// One intensity tier, as a fraction of graph height.
pub const BAND_WIDTH: f64 = 1.0 / 3.0;

/// Break points of the scale, in inches/hour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrecipCutoffs {
    /// at or below this it is not raining (about 0.05 mm/h)
    pub none: f64,
    /// top of "light" rain (about 2.5 mm/h)
    pub light: f64,
    /// start of "heavy" rain (about 10 mm/h)
    pub heavy: f64,
}

impl Default for PrecipCutoffs {
    fn default() -> Self {
        Self { none: 0.0019, light: 0.1, heavy: 0.4 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PrecipBand {
    None,
    Light,
    Moderate,
    Heavy,
}

impl PrecipCutoffs {
    pub fn new(none: f64, light: f64, heavy: f64) -> Self {
        Self { none, light, heavy }
    }

    /// `0 <= none < light < heavy`
    pub fn is_valid(&self) -> bool {
        self.none >= 0.0 && self.none < self.light && self.light < self.heavy
    }

    fn light_slope(&self) -> f64 {
        BAND_WIDTH / self.light
    }

    fn moderate_slope(&self) -> f64 {
        BAND_WIDTH / (self.heavy - self.light)
    }

    /// Scaled height for an intensity in inches/hour.
    ///
    /// Kinked at `light` and `heavy`, continuous and non-decreasing, and
    /// unbounded past `heavy` where it keeps climbing at the light slope.
    pub fn scale(&self, intensity: f64) -> f64 {
        if !intensity.is_finite() || intensity <= self.none {
            0.0
        } else if intensity <= self.light {
            intensity * self.light_slope()
        } else if intensity <= self.heavy {
            BAND_WIDTH + (intensity - self.light) * self.moderate_slope()
        } else {
            2.0 * BAND_WIDTH + (intensity - self.heavy) * self.light_slope()
        }
    }

    pub fn band(&self, intensity: f64) -> PrecipBand {
        if !intensity.is_finite() || intensity <= self.none {
            PrecipBand::None
        } else if intensity <= self.light {
            PrecipBand::Light
        } else if intensity <= self.heavy {
            PrecipBand::Moderate
        } else {
            PrecipBand::Heavy
        }
    }
}
