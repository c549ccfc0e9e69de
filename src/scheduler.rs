/*
 *  scheduler.rs
 *
 *  forecast-widget - precipitation at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Refresh state machine: geolocation, fetch, retry and polling
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

//! The scheduler never sleeps or performs I/O itself. Each transition
//! consumes one event (start, timer, geolocation result, fetch result)
//! and hands back the commands the driver must carry out. Only one
//! timer is ever requested at a time, so fetches cannot overlap.

use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;

use crate::config::ScheduleConfig;
use crate::error::{FetchError, LocationError, WidgetError};
use crate::location::{Location, LocationState};
use crate::model::Forecast;
use crate::units::{from_fahrenheit, round_temp};

/// Re-check interval while a geolocation lookup is still pending.
pub const LOCATION_POLL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    /// no credentials; permanent
    Misconfigured,
    AwaitingLocation,
    LocationReady,
    /// geolocation refused or timed out; permanent
    LocationFailed,
    NoLocationNeeded,
    Fetching,
    Loaded,
    FetchFailed,
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Misconfigured | Phase::LocationFailed)
    }
}

/// Work the driver performs on the scheduler's behalf.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Geolocate,
    ArmTimer(Duration),
    Fetch { cycle: u64, location: Location },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduleTiming {
    pub initial_delay: Duration,
    pub update_interval: Duration,
    pub retry_delay: Duration,
}

impl From<&ScheduleConfig> for ScheduleTiming {
    fn from(c: &ScheduleConfig) -> Self {
        Self {
            initial_delay: c.initial_load_delay(),
            update_interval: c.update_interval(),
            retry_delay: c.retry_delay(),
        }
    }
}

/// What the dashboard is allowed to show.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetStatus {
    Loading,
    Ready {
        forecast: Arc<Forecast>,
        /// headline temperature in display units, rounded
        temperature: f64,
    },
    Failed(WidgetError),
}

#[derive(Debug)]
pub struct Scheduler {
    timing: ScheduleTiming,
    phase: Phase,
    location: LocationState,
    failure: Option<LocationError>,
    credentials: bool,
    cycle: u64,
    loaded: bool,
    forecast: Option<Arc<Forecast>>,
    temperature: Option<f64>,
    temp_places: u32,
}

impl Scheduler {
    /// `fixed_location` bypasses geolocation; `credentials` is false when
    /// there is neither an API key nor a canned payload to read.
    pub fn new(timing: ScheduleTiming, fixed_location: Option<Location>, credentials: bool, temp_places: u32) -> Self {
        Self {
            timing,
            phase: Phase::Idle,
            location: fixed_location.map(LocationState::fixed).unwrap_or_default(),
            failure: None,
            credentials,
            cycle: 0,
            loaded: false,
            forecast: None,
            temperature: None,
            temp_places,
        }
    }

    pub fn phase(&self) -> Phase { self.phase }
    pub fn location(&self) -> &LocationState { &self.location }
    pub fn cycle(&self) -> u64 { self.cycle }
    pub fn is_loaded(&self) -> bool { self.loaded }

    pub fn start(&mut self) -> Vec<Command> {
        if self.phase != Phase::Idle {
            warn!("Scheduler already started ({:?})", self.phase);
            return Vec::new();
        }
        if !self.credentials {
            warn!("No API key configured, weather will not be fetched");
            self.phase = Phase::Misconfigured;
            return Vec::new();
        }
        if self.location.coordinates.is_some() {
            self.phase = Phase::NoLocationNeeded;
            vec![Command::ArmTimer(self.timing.initial_delay)]
        } else {
            self.phase = Phase::AwaitingLocation;
            vec![Command::Geolocate, Command::ArmTimer(self.timing.initial_delay)]
        }
    }

    pub fn on_location(&mut self, result: Result<Location, LocationError>) -> Vec<Command> {
        if self.phase != Phase::AwaitingLocation {
            warn!("Ignoring geolocation result while {:?}", self.phase);
            return Vec::new();
        }
        match result {
            Ok(location) => {
                info!("Location acquired: {}", location);
                self.location = LocationState::succeeded(location);
                self.phase = Phase::LocationReady;
            }
            Err(e) => {
                warn!("Geolocation failed, widget disabled: {}", e);
                self.location = LocationState::failed();
                self.phase = Phase::LocationFailed;
                self.failure = Some(e);
            }
        }
        // the armed timer picks up from here
        Vec::new()
    }

    pub fn on_timer(&mut self) -> Vec<Command> {
        match self.phase {
            Phase::Idle | Phase::Misconfigured | Phase::LocationFailed => Vec::new(),
            Phase::AwaitingLocation => {
                debug!("Location still pending, checking again in {:?}", LOCATION_POLL);
                vec![Command::ArmTimer(LOCATION_POLL)]
            }
            Phase::Fetching => {
                warn!("Timer fired while cycle {} is in flight", self.cycle);
                Vec::new()
            }
            Phase::LocationReady | Phase::NoLocationNeeded | Phase::Loaded | Phase::FetchFailed => {
                let Some(location) = self.location.coordinates else {
                    return vec![Command::ArmTimer(LOCATION_POLL)];
                };
                self.cycle += 1;
                self.phase = Phase::Fetching;
                debug!("Starting fetch cycle {}", self.cycle);
                vec![Command::Fetch { cycle: self.cycle, location }]
            }
        }
    }

    pub fn on_fetch(&mut self, cycle: u64, result: Result<Forecast, FetchError>) -> Vec<Command> {
        if self.phase != Phase::Fetching || cycle != self.cycle {
            warn!("Discarding stale response for cycle {} (current {})", cycle, self.cycle);
            return Vec::new();
        }
        match result {
            Ok(forecast) => {
                let display = from_fahrenheit(forecast.current.temperature_f, forecast.units);
                self.temperature = Some(round_temp(display, self.temp_places));
                self.forecast = Some(Arc::new(forecast));
                self.loaded = true;
                self.phase = Phase::Loaded;
                info!("Weather data loaded (cycle {})", cycle);
                vec![Command::ArmTimer(self.timing.update_interval)]
            }
            Err(e) => {
                warn!("Weather fetch failed (cycle {}), retrying in {:?}: {}", cycle, self.timing.retry_delay, e);
                self.phase = Phase::FetchFailed;
                vec![Command::ArmTimer(self.timing.retry_delay)]
            }
        }
    }

    pub fn status(&self) -> WidgetStatus {
        match self.phase {
            Phase::Misconfigured => WidgetStatus::Failed(WidgetError::Configuration(
                "Please set the forecast.io api_key in the config".to_string(),
            )),
            Phase::LocationFailed => WidgetStatus::Failed(WidgetError::Location(
                self.failure.clone().unwrap_or(LocationError::Unavailable("unknown".into())),
            )),
            _ => match (&self.forecast, self.temperature, self.loaded) {
                (Some(forecast), Some(temperature), true) => WidgetStatus::Ready {
                    forecast: Arc::clone(forecast),
                    temperature,
                },
                _ => WidgetStatus::Loading,
            },
        }
    }
}
