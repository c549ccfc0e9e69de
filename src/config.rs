/*
 *  config.rs
 *
 *  forecast-widget - precipitation at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  YAML configuration with command line overrides
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

use clap::{ArgAction, Parser, ValueHint};
use dirs_next::home_dir;
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}, time::Duration};
use thiserror::Error;

use crate::color::Color;
use crate::precip::PrecipCutoffs;
use crate::units::UnitPreference;

/// Error type for config loading/validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Top-level widget configuration. Every group falls back to its defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>, // e.g., "info" | "debug"
    pub api: ApiConfig,
    pub location: LocationConfig,
    pub schedule: ScheduleConfig,
    pub graph: GraphConfig,
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    pub api_key: String,
    pub api_base: String,
    pub units: UnitPreference,
    pub language: String,
    /// canned payload read instead of calling the service
    pub data: Option<PathBuf>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: "https://api.darksky.net/forecast".to_string(),
            units: UnitPreference::Default,
            language: "en".to_string(),
            data: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct LocationConfig {
    /// both set: geolocation is skipped
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub geolocation: GeolocationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeolocationConfig {
    pub enable_high_accuracy: bool,
    pub timeout_ms: u64,
}

impl Default for GeolocationConfig {
    fn default() -> Self {
        Self { enable_high_accuracy: true, timeout_ms: 5000 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScheduleConfig {
    pub update_interval_ms: u64,
    pub retry_delay_ms: u64,
    pub initial_load_delay_ms: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            update_interval_ms: 6 * 60 * 1000,
            retry_delay_ms: 2500,
            initial_load_delay_ms: 0,
        }
    }
}

impl ScheduleConfig {
    pub fn update_interval(&self) -> Duration { Duration::from_millis(self.update_interval_ms) }
    pub fn retry_delay(&self) -> Duration { Duration::from_millis(self.retry_delay_ms) }
    pub fn initial_load_delay(&self) -> Duration { Duration::from_millis(self.initial_load_delay_ms) }
}

/// Precipitation/temperature graph geometry, scale, colors and layers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GraphConfig {
    pub hours: u32,
    pub tick_hours: u32,
    pub width: u32,
    pub height: u32,
    pub min_precip_cutoff: f64,
    pub light_precip_cutoff: f64,
    pub heavy_precip_cutoff: f64,
    pub fahrenheit_low: f64,
    pub fahrenheit_high: f64,
    pub hot_fahrenheit: f64,
    pub freeze_fahrenheit: f64,
    pub show_sunrise_graph: bool,
    pub show_temp_graph: bool,
    pub show_hot: bool,
    pub show_freeze: bool,
    pub show_precip_levels: bool,
    pub background_color: Color,
    pub daylight_color: Color,
    pub precip_fill_color: Color,
    pub precip_line_color: Color,
    pub temp_line_color: Color,
    pub label_color: Color,
    pub hot_color: Color,
    pub freeze_color: Color,
    pub divider_color: Color,
    pub tick_color: Color,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            hours: 36,
            tick_hours: 6,
            width: 400,
            height: 120,
            min_precip_cutoff: 0.0019,
            light_precip_cutoff: 0.1,
            heavy_precip_cutoff: 0.4,
            fahrenheit_low: -10.0,
            fahrenheit_high: 110.0,
            hot_fahrenheit: 80.0,
            freeze_fahrenheit: 32.0,
            show_sunrise_graph: true,
            show_temp_graph: true,
            show_hot: true,
            show_freeze: true,
            show_precip_levels: false,
            background_color: Color::Black,
            daylight_color: Color::Charcoal,
            precip_fill_color: Color::Blue,
            precip_line_color: Color::Gray,
            temp_line_color: Color::Gray,
            label_color: Color::Gray,
            hot_color: Color::Red,
            freeze_color: Color::Blue,
            divider_color: Color::Gray,
            tick_color: Color::Gray,
        }
    }
}

impl GraphConfig {
    pub fn cutoffs(&self) -> PrecipCutoffs {
        PrecipCutoffs::new(self.min_precip_cutoff, self.light_precip_cutoff, self.heavy_precip_cutoff)
    }
}

/// Which dashboard sections are shown, and how numbers are rounded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    pub show_summary: bool,
    pub show_forecast: bool,
    pub show_wind: bool,
    pub show_sunrise: bool,
    pub show_precipitation_graph: bool,
    pub max_days_forecast: usize,
    pub temp_decimal_places: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            show_summary: true,
            show_forecast: true,
            show_wind: true,
            show_sunrise: true,
            show_precipitation_graph: true,
            max_days_forecast: 7,
            temp_decimal_places: 0,
        }
    }
}

/// CLI overrides. All fields are Options so we can layer them over YAML.
#[derive(Debug, Parser, Clone, Default)]
#[command(name = "forecast-widget", about = "Weather dashboard widget", version)]
pub struct Cli {
    /// Path to a YAML config file (overrides search)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub log_level: Option<String>,
    /// debug logging
    #[arg(short, long, action = ArgAction::SetTrue)]
    pub debug: bool,
    #[arg(long)]
    pub api_key: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    pub latitude: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    pub longitude: Option<f64>,
    #[arg(long, value_enum)]
    pub units: Option<UnitPreference>,
    /// read the weather payload from this file instead of the network
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub data: Option<PathBuf>,
    /// where each rendered graph is written
    #[arg(long, value_hint = ValueHint::FilePath, default_value = "precipitation.png")]
    pub output: PathBuf,
    /// exit after the first completed refresh
    #[arg(long, action = ArgAction::SetTrue)]
    pub once: bool,
    /// dump fully merged config (after overrides) and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub dump_config: bool,
}

/// Read YAML (explicit path or search), layer the CLI on top, validate.
pub fn load(cli: &Cli) -> Result<Config, ConfigError> {
    let mut cfg = if let Some(p) = cli.config.as_ref() {
        if p.exists() {
            read_yaml(p)?
        } else {
            return Err(ConfigError::Validation(format!(
                "Config file not found: {}",
                p.display()
            )));
        }
    } else if let Some(p) = find_config_file() {
        read_yaml(&p)?
    } else {
        Config::default()
    };

    apply_cli_overrides(&mut cfg, cli);
    validate(&cfg)?;
    Ok(cfg)
}

/// Try common locations in order (first hit wins).
fn find_config_file() -> Option<PathBuf> {
    if let Some(home) = home_dir() {
        let p = home.join(".config/forecast-widget/config.yaml");
        if p.exists() { return Some(p) }
        let p = home.join(".config/forecast-widget.yaml");
        if p.exists() { return Some(p) }
    }
    for candidate in &["forecast-widget.yaml", "config.yaml", "config/forecast-widget.yaml"] {
        let p = PathBuf::from(candidate);
        if p.exists() { return Some(p) }
    }
    None
}

pub fn read_yaml(path: &Path) -> Result<Config, ConfigError> {
    let s = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&s)?;
    Ok(cfg)
}

pub fn apply_cli_overrides(cfg: &mut Config, cli: &Cli) {
    if cli.log_level.is_some() { cfg.log_level = cli.log_level.clone(); }
    if cli.debug               { cfg.log_level = Some("debug".to_string()); }
    if let Some(key) = &cli.api_key { cfg.api.api_key = key.clone(); }
    if let Some(units) = cli.units  { cfg.api.units = units; }
    if cli.data.is_some()      { cfg.api.data = cli.data.clone(); }
    if cli.latitude.is_some()  { cfg.location.latitude = cli.latitude; }
    if cli.longitude.is_some() { cfg.location.longitude = cli.longitude; }
}

/// Put any invariants here (required fields, ranges, etc.)
pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    let loc = &cfg.location;
    match (loc.latitude, loc.longitude) {
        (Some(lat), Some(lng)) => {
            if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
                return Err(ConfigError::Validation(format!("coordinates out of range: {lat}, {lng}")));
            }
        }
        (None, None) => {}
        _ => return Err(ConfigError::Validation("latitude and longitude must be set together".into())),
    }

    let g = &cfg.graph;
    if g.width == 0 || g.height == 0 {
        return Err(ConfigError::Validation("graph width/height must be > 0".into()));
    }
    if g.hours == 0 || g.tick_hours == 0 {
        return Err(ConfigError::Validation("graph hours and tick_hours must be > 0".into()));
    }
    if g.fahrenheit_low >= g.fahrenheit_high {
        return Err(ConfigError::Validation("graph fahrenheit_low must be below fahrenheit_high".into()));
    }
    if !g.cutoffs().is_valid() {
        return Err(ConfigError::Validation(
            "precipitation cutoffs must satisfy 0 <= min < light < heavy".into(),
        ));
    }
    if cfg.display.max_days_forecast == 0 {
        return Err(ConfigError::Validation("max_days_forecast must be > 0".into()));
    }
    if cfg.schedule.update_interval_ms == 0 {
        return Err(ConfigError::Validation("update_interval_ms must be > 0".into()));
    }
    Ok(())
}

/// Settings that load fine but probably won't do what was meant. Logged
/// once the logger is up.
pub fn advisories(cfg: &Config) -> Vec<String> {
    let mut notes = Vec::new();
    if cfg.graph.hours > 48 {
        notes.push(format!("graph covers {} hours but the feed only carries 48", cfg.graph.hours));
    }
    notes
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_validate() {
        let cfg = Config::default();
        assert!(validate(&cfg).is_ok());
        assert_eq!(cfg.graph.hours, 36);
        assert_eq!(cfg.schedule.retry_delay(), Duration::from_millis(2500));
        assert_eq!(cfg.graph.cutoffs(), PrecipCutoffs::default());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = "
api:
  api_key: abc123
  units: metric
location:
  latitude: 51.5
  longitude: -0.12
graph:
  width: 480
  precip_fill_color: \"#3366ff\"
display:
  max_days_forecast: 5
";
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.api.api_key, "abc123");
        assert_eq!(cfg.api.units, UnitPreference::Metric);
        assert_eq!(cfg.graph.width, 480);
        assert_eq!(cfg.graph.height, 120);
        assert_eq!(cfg.graph.precip_fill_color, Color::Rgb(0x33, 0x66, 0xff));
        assert_eq!(cfg.display.max_days_forecast, 5);
        assert!(cfg.display.show_wind);
        assert!(validate(&cfg).is_ok());
    }

    #[test]
    fn test_cli_overrides_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "api:\n  api_key: from-file\nlocation:\n  latitude: 10.0\n  longitude: 20.0").unwrap();
        let cli = Cli {
            config: Some(file.path().to_path_buf()),
            api_key: Some("from-cli".into()),
            latitude: Some(-33.9),
            longitude: Some(151.2),
            debug: true,
            ..Default::default()
        };
        let cfg = load(&cli).unwrap();
        assert_eq!(cfg.api.api_key, "from-cli");
        assert_eq!(cfg.location.latitude, Some(-33.9));
        assert_eq!(cfg.location.longitude, Some(151.2));
        assert_eq!(cfg.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_missing_config_file() {
        let cli = Cli { config: Some(PathBuf::from("/nonexistent/forecast.yaml")), ..Default::default() };
        assert!(matches!(load(&cli), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_half_a_location_is_rejected() {
        let mut cfg = Config::default();
        cfg.location.latitude = Some(40.0);
        assert!(validate(&cfg).is_err());
        cfg.location.longitude = Some(-200.0);
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn test_bad_graph_settings_are_rejected() {
        let mut cfg = Config::default();
        cfg.graph.light_precip_cutoff = 0.5;
        assert!(validate(&cfg).is_err());

        let mut cfg = Config::default();
        cfg.graph.fahrenheit_low = 120.0;
        assert!(validate(&cfg).is_err());

        let mut cfg = Config::default();
        cfg.graph.tick_hours = 0;
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn test_long_span_is_advised_not_rejected() {
        let mut cfg = Config::default();
        assert!(advisories(&cfg).is_empty());
        cfg.graph.hours = 60;
        assert!(validate(&cfg).is_ok());
        let notes = advisories(&cfg);
        assert_eq!(notes.len(), 1);
        assert!(notes[0].contains("60 hours"));
    }
}
