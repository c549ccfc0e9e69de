/*
 *  main.rs
 *
 *  forecast-widget - precipitation at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Runs the widget headless: polls the forecast, writes the graph
 *  as PNG and prints the composed dashboard as JSON
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

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use env_logger::Env;
use log::{info, warn};
use std::sync::Arc;
use tokio::sync::watch;

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

use forecast_widget::config::{self, Cli};
use forecast_widget::dashboard::Dashboard;
use forecast_widget::fetch::{FileFetcher, HttpFetcher, WeatherFetch};
use forecast_widget::location::IpGeolocator;
use forecast_widget::poller::{Poller, DEFAULT_FETCH_TIMEOUT};
use forecast_widget::scheduler::WidgetStatus;

include!(concat!(env!("OUT_DIR"), "/build_info.rs"));

/// Waits for SIGINT, SIGTERM or SIGHUP.
#[cfg(unix)]
async fn signal_handler() -> std::io::Result<()> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sighup = signal(SignalKind::hangup())?;

    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT received. Initiating graceful shutdown.");
        }
        _ = sigterm.recv() => {
            info!("SIGTERM received. Initiating graceful shutdown.");
        }
        _ = sighup.recv() => {
            info!("SIGHUP received. Initiating graceful shutdown.");
        }
    }
    Ok(())
}

#[cfg(not(unix))]
async fn signal_handler() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await?;
    info!("Ctrl-C received. Initiating graceful shutdown.");
    Ok(())
}

/// Re-composes the dashboard on every status change. With `--once` it
/// returns as soon as the status is no longer loading.
async fn show(dashboard: &Dashboard<'_>, status_rx: &mut watch::Receiver<WidgetStatus>, cli: &Cli) -> Result<()> {
    loop {
        let status = status_rx.borrow_and_update().clone();
        let element = dashboard.compose(&status, &Local::now());

        if let Some(frame) = element.raster() {
            frame
                .save_png(&cli.output)
                .with_context(|| format!("writing {}", cli.output.display()))?;
            info!("Graph written to {}", cli.output.display());
        }
        println!("{}", serde_json::to_string_pretty(&element)?);

        if cli.once && status != WidgetStatus::Loading {
            return Ok(());
        }
        if status_rx.changed().await.is_err() {
            warn!("Weather poller went away");
            return Ok(());
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(&cli).context("loading configuration")?;

    if cli.dump_config {
        print!("{}", serde_yaml::to_string(&cfg)?);
        return Ok(());
    }

    let level = cfg.log_level.clone().unwrap_or_else(|| "info".to_string());
    env_logger::Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();

    info!("{} - precipitation at a glance", env!("CARGO_PKG_NAME"));
    info!("v.{} built {}", env!("CARGO_PKG_VERSION"), BUILD_DATE);
    for note in config::advisories(&cfg) {
        warn!("{}", note);
    }

    let fetcher: Arc<dyn WeatherFetch> = match &cfg.api.data {
        Some(path) => Arc::new(FileFetcher::new(path)),
        None => Arc::new(HttpFetcher::new(DEFAULT_FETCH_TIMEOUT)?),
    };
    let poller = Poller::from_config(&cfg, fetcher, Arc::new(IpGeolocator::default()))?;
    let (poll_handle, mut status_rx, stop_tx) = poller.start_polling_with_watch();
    let dashboard = Dashboard::new(&cfg);

    tokio::select! {
        res = signal_handler() => res?,
        res = show(&dashboard, &mut status_rx, &cli) => res?,
    }

    if stop_tx.send(()).await.is_err() {
        warn!("Weather poller already stopped");
    }
    poll_handle.await?;
    info!("Weather polling stopped.");
    Ok(())
}
