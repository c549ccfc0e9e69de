/*
 *  dashboard.rs
 *
 *  forecast-widget - precipitation at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Composes the widget into a host neutral element tree
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
use embedded_graphics::pixelcolor::Rgb888;
use serde::Serialize;
use std::fmt::Display;

use crate::config::{Config, DisplayConfig, GraphConfig};
use crate::error::WidgetError;
use crate::forecast::{forecast_rows, BarGeometry, ForecastRow};
use crate::graph::render_frame;
use crate::icons::{self, icon_class};
use crate::model::Forecast;
use crate::scheduler::WidgetStatus;
use crate::vframebuf::VarFrameBuf;

const MESSAGE_CLASS: &str = "dimmed light small";

pub const LOADING: &str = "Loading...";
pub const MISSING_LOCATION: &str =
    "Geolocation lookup failed, please set latitude and longitude in the config";

/// What the host lays out. Classes follow the weather-icons and
/// dashboard stylesheet names.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Element {
    Block { class: String, children: Vec<Element> },
    Text { class: String, text: String },
    Icon { class: String },
    Raster {
        class: String,
        width: usize,
        height: usize,
        #[serde(skip)]
        frame: VarFrameBuf<Rgb888>,
    },
    Table { class: String, rows: Vec<Element> },
    Row { class: String, cells: Vec<Element> },
    Bar { min: String, max: String, geometry: BarGeometry },
}

impl Element {
    fn text(class: &str, text: impl Into<String>) -> Self {
        Element::Text { class: class.to_string(), text: text.into() }
    }

    fn icon(class: impl Into<String>) -> Self {
        Element::Icon { class: class.into() }
    }

    /// First rendered frame in the tree, depth first.
    pub fn raster(&self) -> Option<&VarFrameBuf<Rgb888>> {
        match self {
            Element::Raster { frame, .. } => Some(frame),
            Element::Block { children, .. } => children.iter().find_map(Element::raster),
            Element::Table { rows, .. } => rows.iter().find_map(Element::raster),
            Element::Row { cells, .. } => cells.iter().find_map(Element::raster),
            _ => None,
        }
    }
}

pub struct Dashboard<'a> {
    graph: &'a GraphConfig,
    display: &'a DisplayConfig,
}

impl<'a> Dashboard<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { graph: &config.graph, display: &config.display }
    }

    /// The element tree for `status` as seen at `now`. Permanent failures
    /// and loading collapse to a single message.
    pub fn compose<Tz>(&self, status: &WidgetStatus, now: &DateTime<Tz>) -> Element
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        match status {
            WidgetStatus::Loading => Element::text(MESSAGE_CLASS, LOADING),
            WidgetStatus::Failed(WidgetError::Configuration(message)) => Element::text(MESSAGE_CLASS, message.as_str()),
            WidgetStatus::Failed(WidgetError::Location(e)) => {
                Element::text(MESSAGE_CLASS, format!("{MISSING_LOCATION} ({e})"))
            }
            WidgetStatus::Ready { forecast, temperature } => self.compose_ready(forecast, *temperature, now),
        }
    }

    fn compose_ready<Tz>(&self, forecast: &Forecast, temperature: f64, now: &DateTime<Tz>) -> Element
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let mut children = vec![self.headline(forecast, temperature, now)];

        if self.display.show_summary {
            children.push(Element::text("small dimmed summary", forecast.current.summary.as_str()));
        }
        if self.display.show_precipitation_graph {
            let frame = render_frame(self.graph, forecast, now.timestamp());
            children.push(Element::Raster {
                class: "precipitation-graph".to_string(),
                width: frame.width(),
                height: frame.height(),
                frame,
            });
        }
        if self.display.show_forecast {
            let rows = forecast_rows(forecast, self.display.max_days_forecast, self.display.temp_decimal_places, &now.timezone());
            children.push(Element::Table {
                class: "forecast".to_string(),
                rows: rows.iter().map(|r| self.forecast_row(r)).collect(),
            });
        }
        Element::Block { class: "forecast-widget".to_string(), children }
    }

    fn headline<Tz>(&self, forecast: &Forecast, temperature: f64, now: &DateTime<Tz>) -> Element
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let mut children = vec![
            Element::icon(format!("big-icon wi {}", icon_class(&forecast.current.icon))),
            Element::text("bright", format!(" {}°", self.degrees(temperature))),
        ];

        if self.display.show_wind {
            children.push(Element::icon(format!("big-icon wi {} xdimmed", icons::WIND)));
            children.push(Element::text("dim", format!(" {} ", forecast.current.wind_speed.round() as i64)));
        }

        if self.display.show_sunrise {
            if let Some(today) = forecast.days.first() {
                let at = now.timestamp();
                let (icon, when) = if today.sunrise < at && today.sunset > at {
                    (icons::SUNSET, today.sunset)
                } else {
                    (icons::SUNRISE, today.sunrise)
                };
                children.push(Element::Block {
                    class: "small dimmed summary".to_string(),
                    children: vec![
                        Element::icon(format!("wi {icon} xdimmed")),
                        Element::text("light", clock(when, &now.timezone())),
                    ],
                });
            }
        }

        Element::Block { class: "large light".to_string(), children }
    }

    fn forecast_row(&self, row: &ForecastRow) -> Element {
        Element::Row {
            class: "forecast-row".to_string(),
            cells: vec![
                Element::text("forecast-day", row.weekday.as_str()),
                Element::icon(format!("wi weathericon {}", row.icon_class)),
                Element::Bar {
                    min: format!("{}°", self.degrees(row.min)),
                    max: format!("{}°", self.degrees(row.max)),
                    geometry: row.bar,
                },
            ],
        }
    }

    fn degrees(&self, value: f64) -> String {
        format!("{:.*}", self.display.temp_decimal_places as usize, value)
    }
}

/// `7:05 pm` style local clock time.
fn clock<Tz>(timestamp: i64, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    DateTime::from_timestamp(timestamp, 0)
        .map(|utc| utc.with_timezone(tz).format("%-I:%M %P").to_string())
        .unwrap_or_default()
}
