/*
 *  tests/widget_integration.rs
 *
 *  End to end: payload file -> poller -> forecast -> dashboard
 *
 *  forecast-widget - precipitation at a glance
 *  (c) 2020-26 Stuart Hunter
 */

use chrono::{DateTime, Utc};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use forecast_widget::config::Config;
use forecast_widget::dashboard::{Dashboard, Element};
use forecast_widget::error::WidgetError;
use forecast_widget::fetch::FileFetcher;
use forecast_widget::forecast::forecast_rows;
use forecast_widget::location::IpGeolocator;
use forecast_widget::model::{Forecast, WeatherSnapshot};
use forecast_widget::poller::Poller;
use forecast_widget::precip::PrecipBand;
use forecast_widget::scheduler::WidgetStatus;
use forecast_widget::units::UnitSystem;

const METRIC_PAYLOAD: &str = r#"{
    "currently": {"temperature": 0.0, "windSpeed": 3.2, "icon": "rain", "summary": "Rain"},
    "minutely": {"icon": "rain", "summary": "Rain for the hour."},
    "hourly": {
        "icon": "rain", "summary": "Rain throughout the day.",
        "data": [
            {"time": 1700000000, "temperature": 0.0, "precipIntensity": 5.0, "icon": "rain"},
            {"time": 1700003600, "temperature": 1.0, "precipIntensity": 2.0, "icon": "rain"},
            {"time": 1700007200, "temperature": 2.0, "precipIntensity": 0.0, "icon": "cloudy"}
        ]
    },
    "daily": {"data": [
        {"time": 1699963200, "temperatureMin": -1.0, "temperatureMax": 4.0, "icon": "rain",
         "sunriseTime": 1699963000, "sunsetTime": 1699997000},
        {"time": 1700049600, "temperatureMin": 1.0, "temperatureMax": 6.0, "icon": "cloudy",
         "sunriseTime": 1700049500, "sunsetTime": 1700083400}
    ]},
    "flags": {"units": "si"}
}"#;

fn payload_file(body: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(body.as_bytes()).unwrap();
    file
}

fn file_config(path: &std::path::Path) -> Config {
    let mut cfg = Config::default();
    cfg.api.data = Some(path.to_path_buf());
    cfg.location.latitude = Some(59.33);
    cfg.location.longitude = Some(18.07);
    cfg
}

async fn settled(rx: &mut watch::Receiver<WidgetStatus>) -> WidgetStatus {
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            let status = rx.borrow_and_update().clone();
            if status != WidgetStatus::Loading {
                return status;
            }
            rx.changed().await.unwrap();
        }
    })
    .await
    .expect("widget never left loading")
}

#[tokio::test]
async fn test_metric_payload_end_to_end() {
    let file = payload_file(METRIC_PAYLOAD);
    let cfg = file_config(file.path());
    let poller = Poller::from_config(
        &cfg,
        Arc::new(FileFetcher::new(file.path())),
        Arc::new(IpGeolocator::default()),
    )
    .unwrap();
    let (handle, mut rx, stop) = poller.start_polling_with_watch();

    let status = settled(&mut rx).await;
    let WidgetStatus::Ready { forecast, temperature } = &status else {
        panic!("unexpected status {status:?}");
    };
    // headline stays in the provider's units
    assert_eq!(*temperature, 0.0);
    assert_eq!(forecast.units, UnitSystem::Metric);
    assert!((forecast.hours[0].temperature_f - 32.0).abs() < 1e-9);
    assert!((forecast.hours[0].precip_in_hr - 0.19685).abs() < 1e-5);
    assert_eq!(cfg.graph.cutoffs().band(forecast.hours[0].precip_in_hr), PrecipBand::Moderate);
    assert_eq!(forecast.current.summary, "Rain for the hour.");

    let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
    let element = Dashboard::new(&cfg).compose(&status, &now);
    let frame = element.raster().expect("graph enabled by default");
    let out = tempfile::tempdir().unwrap();
    let png = out.path().join("precipitation.png");
    frame.save_png(&png).unwrap();
    let bytes = std::fs::read(&png).unwrap();
    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");

    let json = serde_json::to_string(&element).unwrap();
    assert!(json.contains("wi-rain"));
    assert!(json.contains("\"kind\":\"raster\""));

    stop.send(()).await.unwrap();
    handle.await.unwrap();
}

#[test]
fn test_metric_and_imperial_agree() {
    let metric = WeatherSnapshot::from_json(METRIC_PAYLOAD).unwrap();
    let mut imperial = metric.clone();
    imperial.flags.units = "us".to_string();
    imperial.currently.temperature = 32.0;
    for h in imperial.hourly.data.iter_mut() {
        h.temperature = h.temperature * 1.8 + 32.0;
        h.precip_intensity /= 25.4;
    }

    let a = Forecast::from_snapshot(&metric);
    let b = Forecast::from_snapshot(&imperial);
    assert!((a.current.temperature_f - b.current.temperature_f).abs() < 1e-9);
    for (x, y) in a.hours.iter().zip(&b.hours) {
        assert!((x.temperature_f - y.temperature_f).abs() < 1e-9);
        assert!((x.precip_in_hr - y.precip_in_hr).abs() < 1e-9);
    }
}

#[test]
fn test_forecast_bars_from_payload() {
    let snap = WeatherSnapshot::from_json(METRIC_PAYLOAD).unwrap();
    let forecast = Forecast::from_snapshot(&snap);
    let rows = forecast_rows(&forecast, 7, 0, &Utc);
    assert_eq!(rows.len(), 2);
    // window is -1C..6C, shown in Celsius
    assert_eq!((rows[0].min, rows[0].max), (-1.0, 4.0));
    assert!((rows[0].bar.left).abs() < 1e-9);
    assert!((rows[1].bar.right).abs() < 1e-9);
    for r in &rows {
        assert!((r.bar.left + r.bar.bar + r.bar.right - 100.0).abs() < 1e-9);
    }
}

#[tokio::test]
async fn test_unconfigured_widget_explains_itself() {
    let mut cfg = Config::default();
    cfg.location.latitude = Some(1.0);
    cfg.location.longitude = Some(1.0);
    let poller = Poller::from_config(
        &cfg,
        Arc::new(FileFetcher::new("/nonexistent")),
        Arc::new(IpGeolocator::default()),
    )
    .unwrap();
    let (handle, mut rx, stop) = poller.start_polling_with_watch();

    let status = settled(&mut rx).await;
    assert!(matches!(status, WidgetStatus::Failed(WidgetError::Configuration(_))));
    match Dashboard::new(&cfg).compose(&status, &Utc::now()) {
        Element::Text { text, .. } => assert!(text.contains("api_key")),
        other => panic!("unexpected {other:?}"),
    }

    stop.send(()).await.unwrap();
    handle.await.unwrap();
}

#[tokio::test]
async fn test_unreadable_payload_keeps_loading() {
    let mut cfg = Config::default();
    cfg.api.data = Some("/nonexistent/payload.json".into());
    cfg.location.latitude = Some(1.0);
    cfg.location.longitude = Some(1.0);
    cfg.schedule.retry_delay_ms = 10;
    let poller = Poller::from_config(
        &cfg,
        Arc::new(FileFetcher::new("/nonexistent/payload.json")),
        Arc::new(IpGeolocator::default()),
    )
    .unwrap();
    let (handle, rx, stop) = poller.start_polling_with_watch();

    tokio::time::sleep(Duration::from_millis(200)).await;
    // transient failures are retried, never shown
    assert_eq!(*rx.borrow(), WidgetStatus::Loading);

    stop.send(()).await.unwrap();
    handle.await.unwrap();
}
