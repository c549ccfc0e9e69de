/*
 *  graph.rs
 *
 *  forecast-widget - precipitation at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Precipitation and temperature graph, six layers back to front
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

//! Paint order is fixed: daylight, hot/freeze lines, precipitation area,
//! temperature trace, band dividers, ticks. Later layers overdraw earlier
//! ones, so reordering changes the picture.

use embedded_graphics::pixelcolor::{PixelColor, Rgb888};
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use log::debug;

use crate::color::Color;
use crate::config::GraphConfig;
use crate::draw::{RasterSurface, Stroke};
use crate::geometry::GraphGeometry;
use crate::model::Forecast;
use crate::precip::PrecipCutoffs;
use crate::vframebuf::VarFrameBuf;

const HOT_FREEZE_DASH: (u32, u32) = (5, 10);
const DIVIDER_DASH: (u32, u32) = (5, 15);
const TICK_LENGTH: i32 = 7;
const MARKER_DIAMETER: u32 = 3;
const LABEL_OFFSET: i32 = 5;
/// precipitation path starts and ends this far below the bottom edge
const BASELINE_DROP: i32 = 2;

/// Layer colors converted once into the surface's pixel type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphPalette<C> {
    pub background: C,
    pub daylight: C,
    pub precip_fill: C,
    pub precip_line: C,
    pub temp_line: C,
    pub label: C,
    pub hot: C,
    pub freeze: C,
    pub divider: C,
    pub tick: C,
}

impl<C: PixelColor> GraphPalette<C> {
    pub fn from_config<F: Fn(&Color) -> C>(config: &GraphConfig, convert: F) -> Self {
        Self {
            background: convert(&config.background_color),
            daylight: convert(&config.daylight_color),
            precip_fill: convert(&config.precip_fill_color),
            precip_line: convert(&config.precip_line_color),
            temp_line: convert(&config.temp_line_color),
            label: convert(&config.label_color),
            hot: convert(&config.hot_color),
            freeze: convert(&config.freeze_color),
            divider: convert(&config.divider_color),
            tick: convert(&config.tick_color),
        }
    }
}

#[inline]
fn px(x: f64, y: f64) -> Point {
    Point::new(x.round() as i32, y.round() as i32)
}

/// Keeps a plotted y within a couple of pixels of the graph. Anything
/// further out is clipped anyway, and unbounded values would overflow
/// integer pixel math.
#[inline]
fn clamp_y(geo: &GraphGeometry, y: f64) -> f64 {
    let margin = BASELINE_DROP as f64;
    if y.is_nan() {
        return geo.height;
    }
    y.clamp(-margin, geo.height + margin)
}

pub struct GraphRenderer<'a, C> {
    config: &'a GraphConfig,
    palette: GraphPalette<C>,
    cutoffs: PrecipCutoffs,
}

impl<'a, C: PixelColor> GraphRenderer<'a, C> {
    pub fn new(config: &'a GraphConfig, palette: GraphPalette<C>) -> Self {
        Self { config, palette, cutoffs: config.cutoffs() }
    }

    pub fn geometry(&self, size: Size) -> GraphGeometry {
        GraphGeometry::new(
            size.width,
            size.height,
            self.config.hours,
            self.config.fahrenheit_low,
            self.config.fahrenheit_high,
        )
    }

    /// Draws every enabled layer. `now` is a unix timestamp and the only
    /// source of time, so equal inputs give equal frames.
    pub fn render<S>(&self, surface: &mut S, forecast: &Forecast, now: i64) -> Result<(), S::Error>
    where
        S: RasterSurface<Color = C>,
    {
        let geo = self.geometry(surface.size());
        debug!(
            "Rendering graph {}x{} over {}h, {} hourly samples",
            geo.width, geo.height, geo.hours, forecast.hours.len()
        );

        if self.config.show_sunrise_graph {
            self.draw_daylight(surface, &geo, forecast, now)?;
        }
        if self.config.show_temp_graph {
            self.draw_reference_lines(surface, &geo)?;
        }
        self.draw_precipitation(surface, &geo, forecast)?;
        if self.config.show_temp_graph {
            self.draw_temperature(surface, &geo, forecast)?;
        }
        if self.config.show_precip_levels {
            self.draw_precip_levels(surface, &geo)?;
        }
        self.draw_ticks(surface, &geo)
    }

    /// Number of hourly samples that fall inside the span.
    fn visible_hours(&self, forecast: &Forecast) -> usize {
        forecast.hours.len().min(self.config.hours as usize + 1)
    }

    fn draw_daylight<S>(&self, surface: &mut S, geo: &GraphGeometry, forecast: &Forecast, now: i64) -> Result<(), S::Error>
    where
        S: RasterSurface<Color = C>,
    {
        let days = (geo.hours as f64 / 24.0).ceil() as usize + 1;
        for (index, day) in forecast.days.iter().enumerate().take(days) {
            let mut until_sunrise = day.sunrise - now;
            let mut until_sunset = day.sunset - now;
            // today's sun may already be up, or down
            if index == 0 {
                until_sunrise = until_sunrise.max(0);
                until_sunset = until_sunset.max(0);
            }
            let start = geo.seconds_to_x(until_sunrise as f64).round() as i32;
            let end = geo.seconds_to_x(until_sunset as f64).round() as i32;
            if end <= start {
                continue;
            }
            let rect = Rectangle::new(
                Point::new(start, 0),
                Size::new((end - start) as u32, geo.height as u32),
            );
            surface.fill_rect(rect, self.palette.daylight)?;
        }
        Ok(())
    }

    fn draw_reference_lines<S>(&self, surface: &mut S, geo: &GraphGeometry) -> Result<(), S::Error>
    where
        S: RasterSurface<Color = C>,
    {
        let (on, off) = HOT_FREEZE_DASH;
        let mut lines = Vec::with_capacity(2);
        if self.config.show_hot {
            lines.push((self.config.hot_fahrenheit, self.palette.hot));
        }
        if self.config.show_freeze {
            lines.push((self.config.freeze_fahrenheit, self.palette.freeze));
        }
        for (fahrenheit, color) in lines {
            let y = clamp_y(geo, geo.temperature_y(fahrenheit));
            surface.line(px(0.0, y), px(geo.width, y), Stroke::dashed(color, 1, on, off))?;
        }
        Ok(())
    }

    fn draw_precipitation<S>(&self, surface: &mut S, geo: &GraphGeometry, forecast: &Forecast) -> Result<(), S::Error>
    where
        S: RasterSurface<Color = C>,
    {
        let visible = self.visible_hours(forecast);
        if visible == 0 {
            return Ok(());
        }
        let below = geo.height as i32 + BASELINE_DROP;
        let mut outline = Vec::with_capacity(visible + 2);
        outline.push(Point::new(0, below));
        for (i, hour) in forecast.hours.iter().take(visible).enumerate() {
            let magnitude = self.cutoffs.scale(hour.precip_in_hr) * geo.height;
            outline.push(px(geo.hour_x(i), clamp_y(geo, geo.height - magnitude)));
        }
        outline.push(Point::new(geo.width.round() as i32, below));

        surface.path(
            &outline,
            Some(self.palette.precip_fill),
            Some(Stroke::solid(self.palette.precip_line, 2)),
        )
    }

    fn draw_temperature<S>(&self, surface: &mut S, geo: &GraphGeometry, forecast: &Forecast) -> Result<(), S::Error>
    where
        S: RasterSurface<Color = C>,
    {
        let visible = self.visible_hours(forecast);
        let points: Vec<Point> = forecast
            .hours
            .iter()
            .take(visible)
            .enumerate()
            .map(|(i, h)| px(geo.hour_x(i), clamp_y(geo, geo.temperature_y(h.temperature_f))))
            .collect();

        let stroke = Stroke::solid(self.palette.temp_line, 2);
        for pair in points.windows(2) {
            surface.line(pair[0], pair[1], stroke)?;
        }
        for p in &points {
            surface.marker(*p, MARKER_DIAMETER, self.palette.temp_line)?;
        }
        for (i, (p, hour)) in points.iter().zip(&forecast.hours).enumerate() {
            if i % 2 == 1 {
                let shown = hour.temperature_f.round() as i64;
                let at = Point::new(p.x - LABEL_OFFSET, p.y - LABEL_OFFSET);
                surface.text(&shown.to_string(), at, self.palette.label)?;
            }
        }
        Ok(())
    }

    fn draw_precip_levels<S>(&self, surface: &mut S, geo: &GraphGeometry) -> Result<(), S::Error>
    where
        S: RasterSurface<Color = C>,
    {
        let (on, off) = DIVIDER_DASH;
        let third = (geo.height / 3.0).round() as i32;
        let right = geo.width.round() as i32;
        for k in 1..3 {
            let y = k * third;
            surface.line(Point::new(0, y), Point::new(right, y), Stroke::dashed(self.palette.divider, 1, on, off))?;
        }
        Ok(())
    }

    fn draw_ticks<S>(&self, surface: &mut S, geo: &GraphGeometry) -> Result<(), S::Error>
    where
        S: RasterSurface<Color = C>,
    {
        let tick_hours = self.config.tick_hours.max(1) as f64;
        let spacing = geo.pixels_per_hour() * tick_hours;
        let span = geo.pixels_per_hour() * geo.hours.max(1) as f64 / tick_hours;
        if spacing <= 0.0 || span <= 0.0 {
            return Ok(());
        }
        let count = (geo.width / span).round() as i32;
        let bottom = geo.height.round() as i32;
        for i in 1..count {
            let x = (i as f64 * spacing).round() as i32;
            surface.line(
                Point::new(x, bottom),
                Point::new(x, bottom - TICK_LENGTH),
                Stroke::solid(self.palette.tick, 2),
            )?;
        }
        Ok(())
    }
}

/// Renders the graph into a fresh RGB frame sized from the config.
pub fn render_frame(config: &GraphConfig, forecast: &Forecast, now: i64) -> VarFrameBuf<Rgb888> {
    let palette = GraphPalette::from_config(config, Color::to_rgb888);
    let mut frame = VarFrameBuf::new(config.width, config.height, palette.background);
    if let Err(never) = GraphRenderer::new(config, palette).render(&mut frame, forecast, now) {
        match never {}
    }
    frame
}
