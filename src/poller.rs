/*
 *  poller.rs
 *
 *  forecast-widget - precipitation at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Drives the refresh scheduler on tokio and publishes widget status
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

use log::{debug, error, info};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::error::{FetchError, LocationError, WidgetError};
use crate::fetch::{ApiEndpoint, WeatherFetch};
use crate::location::{Geolocate, GeolocationOptions, Location};
use crate::model::{Forecast, WeatherSnapshot};
use crate::scheduler::{Command, ScheduleTiming, Scheduler, WidgetStatus};

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Results reported back by the tasks the poller spawns.
#[derive(Debug)]
enum Event {
    Timer,
    Located(Result<Location, LocationError>),
    Fetched { cycle: u64, result: Result<WeatherSnapshot, FetchError> },
}

/// Owns the scheduler and carries out its commands.
pub struct Poller {
    scheduler: Scheduler,
    fetcher: Arc<dyn WeatherFetch>,
    locator: Arc<dyn Geolocate>,
    endpoint: ApiEndpoint,
    geolocation: GeolocationOptions,
    fetch_timeout: Duration,
}

impl Poller {
    pub fn new(
        scheduler: Scheduler,
        fetcher: Arc<dyn WeatherFetch>,
        locator: Arc<dyn Geolocate>,
        endpoint: ApiEndpoint,
        geolocation: GeolocationOptions,
    ) -> Self {
        Self { scheduler, fetcher, locator, endpoint, geolocation, fetch_timeout: DEFAULT_FETCH_TIMEOUT }
    }

    /// A canned payload file counts as a credential; coordinates out of
    /// range are a permanent location failure.
    pub fn from_config(
        config: &Config,
        fetcher: Arc<dyn WeatherFetch>,
        locator: Arc<dyn Geolocate>,
    ) -> Result<Self, WidgetError> {
        let fixed = Location::from_config(&config.location).transpose()?;
        let credentials = !config.api.api_key.trim().is_empty() || config.api.data.is_some();
        let scheduler = Scheduler::new(
            ScheduleTiming::from(&config.schedule),
            fixed,
            credentials,
            config.display.temp_decimal_places,
        );
        Ok(Self::new(
            scheduler,
            fetcher,
            locator,
            ApiEndpoint::from_config(&config.api),
            GeolocationOptions::from(&config.location.geolocation),
        ))
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Runs the event loop on a background task.
    ///
    /// Returns the task handle, a receiver for status updates and the
    /// sender that stops the loop.
    pub fn start_polling_with_watch(mut self) -> (JoinHandle<()>, watch::Receiver<WidgetStatus>, mpsc::Sender<()>) {
        let (status_tx, status_rx) = watch::channel(WidgetStatus::Loading);
        let (stop_tx, mut stop_rx) = mpsc::channel::<()>(1);
        let (event_tx, mut event_rx) = mpsc::channel::<Event>(8);

        let poll_handle = tokio::spawn(async move {
            let commands = self.scheduler.start();
            self.execute(commands, &event_tx);
            self.publish(&status_tx);

            loop {
                tokio::select! {
                    Some(event) = event_rx.recv() => {
                        let commands = self.handle(event);
                        self.execute(commands, &event_tx);
                        self.publish(&status_tx);
                    }
                    _ = stop_rx.recv() => {
                        info!("Weather polling received stop signal. Exiting.");
                        break;
                    }
                }
            }
        });

        (poll_handle, status_rx, stop_tx)
    }

    fn handle(&mut self, event: Event) -> Vec<Command> {
        match event {
            Event::Timer => self.scheduler.on_timer(),
            Event::Located(result) => self.scheduler.on_location(result),
            Event::Fetched { cycle, result } => {
                let result = result.map(|snapshot| Forecast::from_snapshot(&snapshot));
                self.scheduler.on_fetch(cycle, result)
            }
        }
    }

    fn execute(&self, commands: Vec<Command>, events: &mpsc::Sender<Event>) {
        for command in commands {
            let events = events.clone();
            match command {
                Command::ArmTimer(delay) => {
                    debug!("Next weather event in {:?}", delay);
                    tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        let _ = events.send(Event::Timer).await;
                    });
                }
                Command::Geolocate => {
                    let locator = Arc::clone(&self.locator);
                    let options = self.geolocation;
                    tokio::spawn(async move {
                        let result = locator.locate(&options).await;
                        let _ = events.send(Event::Located(result)).await;
                    });
                }
                Command::Fetch { cycle, location } => {
                    let fetcher = Arc::clone(&self.fetcher);
                    let url = self.endpoint.url(&location);
                    let limit = self.fetch_timeout;
                    tokio::spawn(async move {
                        let result = match tokio::time::timeout(limit, fetcher.fetch(&url)).await {
                            Ok(result) => result,
                            Err(_) => Err(FetchError::Timeout(limit)),
                        };
                        let _ = events.send(Event::Fetched { cycle, result }).await;
                    });
                }
            }
        }
    }

    fn publish(&self, status_tx: &watch::Sender<WidgetStatus>) {
        let status = self.scheduler.status();
        if let WidgetStatus::Failed(e) = &status {
            if *status_tx.borrow() != status {
                error!("Weather widget disabled: {}", e);
            }
        }
        status_tx.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::LocationSource;
    use crate::units::UnitPreference;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedFetcher {
        calls: AtomicUsize,
        script: Mutex<VecDeque<Result<f64, u16>>>,
        urls: Mutex<Vec<String>>,
    }

    impl ScriptedFetcher {
        fn new(script: Vec<Result<f64, u16>>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                script: Mutex::new(script.into()),
                urls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl WeatherFetch for ScriptedFetcher {
        async fn fetch(&self, url: &str) -> Result<WeatherSnapshot, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.urls.lock().unwrap().push(url.to_string());
            let next = self.script.lock().unwrap().pop_front().unwrap_or(Ok(70.0));
            match next {
                Ok(temperature) => {
                    let mut snap = WeatherSnapshot::default();
                    snap.currently.temperature = temperature;
                    Ok(snap)
                }
                Err(code) => Err(FetchError::Status(code)),
            }
        }
    }

    struct StalledFetcher {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl WeatherFetch for StalledFetcher {
        async fn fetch(&self, _url: &str) -> Result<WeatherSnapshot, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            std::future::pending().await
        }
    }

    struct FixedLocator {
        calls: AtomicUsize,
        result: Result<Location, LocationError>,
    }

    impl FixedLocator {
        fn new(result: Result<Location, LocationError>) -> Arc<Self> {
            Arc::new(Self { calls: AtomicUsize::new(0), result })
        }
    }

    #[async_trait]
    impl Geolocate for FixedLocator {
        async fn locate(&self, _options: &GeolocationOptions) -> Result<Location, LocationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(300)).await;
            self.result.clone()
        }
    }

    fn config(with_location: bool) -> Config {
        let mut cfg = Config::default();
        cfg.api.api_key = "secret".into();
        cfg.api.units = UnitPreference::Imperial;
        cfg.schedule.initial_load_delay_ms = 100;
        cfg.schedule.update_interval_ms = 60_000;
        cfg.schedule.retry_delay_ms = 2_500;
        if with_location {
            cfg.location.latitude = Some(44.98);
            cfg.location.longitude = Some(-93.26);
        }
        cfg
    }

    async fn wait_for_ready(rx: &mut watch::Receiver<WidgetStatus>) -> f64 {
        loop {
            if let WidgetStatus::Ready { temperature, .. } = &*rx.borrow_and_update() {
                return *temperature;
            }
            rx.changed().await.unwrap();
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixed_location_fetches_without_geolocation() {
        let fetcher = ScriptedFetcher::new(vec![Ok(71.6)]);
        let locator = FixedLocator::new(Err(LocationError::Denied("unused".into())));
        let poller = Poller::from_config(&config(true), fetcher.clone(), locator.clone()).unwrap();
        let (handle, mut rx, stop) = poller.start_polling_with_watch();

        assert_eq!(wait_for_ready(&mut rx).await, 72.0);
        assert_eq!(locator.calls.load(Ordering::SeqCst), 0);
        assert_eq!(fetcher.calls(), 1);
        assert!(fetcher.urls.lock().unwrap()[0].contains("/secret/44.98,-93.26?units=us"));

        stop.send(()).await.unwrap();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_geolocated_then_polls_every_interval() {
        let fetcher = ScriptedFetcher::new(vec![Ok(50.0), Ok(55.0)]);
        let found = Location::new(10.0, 20.0, LocationSource::Geolocation).unwrap();
        let locator = FixedLocator::new(Ok(found));
        let poller = Poller::from_config(&config(false), fetcher.clone(), locator.clone()).unwrap();
        let (handle, mut rx, stop) = poller.start_polling_with_watch();

        let started = tokio::time::Instant::now();
        assert_eq!(wait_for_ready(&mut rx).await, 50.0);
        assert_eq!(locator.calls.load(Ordering::SeqCst), 1);
        // the initial timer fired before the lookup finished, so the
        // fetch waited for the one second location re-check
        assert!(started.elapsed() >= Duration::from_secs(1));

        rx.changed().await.unwrap();
        assert!(matches!(&*rx.borrow(), WidgetStatus::Ready { temperature, .. } if *temperature == 55.0));
        assert!(started.elapsed() >= Duration::from_secs(61));
        assert_eq!(fetcher.calls(), 2);
        assert!(fetcher.urls.lock().unwrap()[1].contains("/10,20?"));

        stop.send(()).await.unwrap();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_fetch_retries_after_fixed_delay() {
        let fetcher = ScriptedFetcher::new(vec![Err(503), Ok(40.0)]);
        let locator = FixedLocator::new(Err(LocationError::Denied("unused".into())));
        let poller = Poller::from_config(&config(true), fetcher.clone(), locator).unwrap();
        let (handle, mut rx, stop) = poller.start_polling_with_watch();

        let started = tokio::time::Instant::now();
        assert_eq!(wait_for_ready(&mut rx).await, 40.0);
        let waited = started.elapsed();
        assert!(waited >= Duration::from_millis(2_600), "{waited:?}");
        assert!(waited < Duration::from_secs(60), "{waited:?}");
        assert_eq!(fetcher.calls(), 2);

        stop.send(()).await.unwrap();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_location_failure_disables_widget() {
        let fetcher = ScriptedFetcher::new(vec![]);
        let locator = FixedLocator::new(Err(LocationError::Timeout(Duration::from_secs(5))));
        let poller = Poller::from_config(&config(false), fetcher.clone(), locator).unwrap();
        let (handle, mut rx, stop) = poller.start_polling_with_watch();

        rx.changed().await.unwrap();
        assert!(matches!(
            &*rx.borrow(),
            WidgetStatus::Failed(WidgetError::Location(LocationError::Timeout(_)))
        ));

        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert_eq!(fetcher.calls(), 0);

        stop.send(()).await.unwrap();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_api_key() {
        let fetcher = ScriptedFetcher::new(vec![]);
        let locator = FixedLocator::new(Err(LocationError::Denied("unused".into())));
        let mut cfg = config(true);
        cfg.api.api_key.clear();
        let poller = Poller::from_config(&cfg, fetcher.clone(), locator).unwrap();
        let (handle, mut rx, stop) = poller.start_polling_with_watch();

        rx.changed().await.unwrap();
        assert!(matches!(&*rx.borrow(), WidgetStatus::Failed(WidgetError::Configuration(_))));
        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(fetcher.calls(), 0);

        stop.send(()).await.unwrap();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_fetch_times_out_and_retries() {
        let fetcher = Arc::new(StalledFetcher { calls: AtomicUsize::new(0) });
        let locator = FixedLocator::new(Err(LocationError::Denied("unused".into())));
        let poller = Poller::from_config(&config(true), fetcher.clone(), locator)
            .unwrap()
            .with_fetch_timeout(Duration::from_secs(5));
        let (handle, rx, stop) = poller.start_polling_with_watch();

        // 0.1s initial delay, then (5s timeout + 2.5s retry) per attempt
        tokio::time::sleep(Duration::from_millis(100 + 7_500 + 1_000)).await;
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
        assert_eq!(*rx.borrow(), WidgetStatus::Loading);

        stop.send(()).await.unwrap();
        handle.await.unwrap();
    }

    #[test]
    fn test_out_of_range_coordinates_rejected() {
        let mut cfg = config(true);
        cfg.location.latitude = Some(123.0);
        let fetcher = ScriptedFetcher::new(vec![]);
        let locator = FixedLocator::new(Err(LocationError::Denied("unused".into())));
        let err = Poller::from_config(&cfg, fetcher, locator).err().unwrap();
        assert_eq!(err, WidgetError::Location(LocationError::InvalidCoordinates(123.0, -93.26)));
    }
}
