/*
 *  lib.rs
 *
 *  forecast-widget - precipitation at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Weather dashboard widget: current conditions, a precipitation and
 *  temperature graph, and a multi-day forecast
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

pub mod color;
pub mod config;
pub mod dashboard;
pub mod draw;
pub mod error;
pub mod fetch;
pub mod forecast;
pub mod geometry;
pub mod graph;
pub mod icons;
pub mod location;
pub mod model;
pub mod poller;
pub mod precip;
pub mod scheduler;
pub mod units;
pub mod vframebuf;
