/// Integration tests for the assembled pipeline
///
/// This test module covers:
/// - Readings flowing through detection, alerting and persistence
/// - Snapshot and health reporting
/// - Simulation against live values
/// - Loading configuration from disk
/// - Replaying recorded readings on their own timestamps
use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use greenflow::analytics::AlertRecord;
use greenflow::clock::ManualClock;
use greenflow::config::{GreenflowConfig, load_config_from_path};
use greenflow::error::{GreenflowError, GreenflowResult};
use greenflow::monitoring::HealthStatus;
use greenflow::pipeline::AnalyticsPipeline;
use greenflow::simulation::SimulationInput;
use greenflow::sink::{AlertSink, MemorySink};
use greenflow::telemetry::{Field, Reading};
use std::fs;
use std::sync::Arc;
use tempfile::tempdir;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn reading(sensor: &str, city: &str, field: Field, value: f64) -> Reading {
    Reading::new(sensor).with_city(city).with_value(field, value)
}

#[tokio::test]
async fn test_alerts_reach_the_sink() {
    init_logger();
    let sink = Arc::new(MemorySink::new());
    let pipeline = AnalyticsPipeline::new(&GreenflowConfig::default())
        .unwrap()
        .with_sink(sink.clone(), 16);

    let outcome = pipeline.process(&reading("aq-1", "Delhi", Field::Aqi, 310.0));
    assert!(outcome.anomalies.is_empty());
    assert_eq!(outcome.alerts.len(), 1);

    // Second breach is inside the cooldown
    let outcome = pipeline.process(&reading("aq-1", "Delhi", Field::Aqi, 305.0));
    assert!(outcome.alerts.is_empty());

    pipeline.shutdown().await;
    let stored = sink.stored();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].alert_type, "AQI_HIGH");
    assert_eq!(stored[0].city.as_deref(), Some("Delhi"));
}

#[tokio::test]
async fn test_snapshot_and_metrics() {
    let pipeline = AnalyticsPipeline::new(&GreenflowConfig::default()).unwrap();

    for i in 0..12 {
        pipeline.process(&reading("co2-9", "Bengaluru", Field::Co2Ppm, 420.0 + (i % 2) as f64));
    }
    let outcome = pipeline.process(&reading("co2-9", "Bengaluru", Field::Co2Ppm, 990.0));
    assert_eq!(outcome.anomalies.len(), 1);
    // threshold breach plus the anomaly alert
    assert_eq!(outcome.alerts.len(), 2);

    let snapshot = pipeline.snapshot();
    assert_eq!(snapshot.anomalies_recent, 1);
    assert_eq!(snapshot.alerts_total, 2);
    assert_eq!(snapshot.alerts_recent.len(), 2);
    assert_eq!(snapshot.window_stats["co2-9"][&Field::Co2Ppm], 13);

    let json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(json["window_stats"]["co2-9"]["co2_ppm"], 13);

    let metrics = pipeline.metrics().unwrap();
    assert_eq!(metrics.readings_total.get(), 13);
    assert_eq!(metrics.tracked_windows.get(), 1);
    assert!(metrics.export_text().unwrap().contains("greenflow_anomalies_total{field=\"co2_ppm\"} 1"));

    assert_eq!(pipeline.health().status, HealthStatus::Ok);
}

#[tokio::test]
async fn test_simulation_uses_latest_readings() {
    let pipeline = AnalyticsPipeline::new(&GreenflowConfig::default()).unwrap();
    pipeline.process(
        &Reading::new("multi-1")
            .with_value(Field::Co2Ppm, 640.0)
            .with_value(Field::Aqi, 180.0),
    );

    let result = pipeline.simulate(&SimulationInput::new(50.0, 0.0, 0.0)).await;
    assert_eq!(result.baseline_co2, 640.0);
    assert!(result.new_predicted_co2 < 640.0);
    assert_eq!(pipeline.metrics().unwrap().simulations_total.get(), 1);
}

#[tokio::test]
async fn test_idle_windows_are_swept() {
    init_logger();
    let mut config = GreenflowConfig::default();
    config.anomaly.idle_window_timeout_secs = Some(60);
    config.monitoring.eviction_interval = 2;

    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 5, 20, 12, 0, 0).unwrap(),
    ));
    let pipeline = AnalyticsPipeline::with_clock(&config, clock.clone()).unwrap();

    pipeline.process(&reading("old", "Kochi", Field::Humidity, 70.0));
    clock.advance(Duration::seconds(120));
    // second reading triggers the sweep
    pipeline.process(&reading("new", "Kochi", Field::Humidity, 71.0));

    let stats = pipeline.snapshot().window_stats;
    assert!(!stats.contains_key("old"));
    assert!(stats.contains_key("new"));
}

#[test]
fn test_config_file_drives_the_pipeline() {
    let dir = tempdir().expect("Failed to create temporary directory");
    let path = dir.path().join("greenflow.toml");
    fs::write(
        &path,
        r#"
[alerting]
cooldown_secs = 0

[[alerting.rules]]
field = "humidity"
low = 70.0
medium = 80.0
high = 90.0
critical = 95.0
alert_type = "HUMIDITY_HIGH"
unit = "%"

[monitoring]
metrics_enabled = false
"#,
    )
    .unwrap();

    let config = load_config_from_path(&path).unwrap();
    assert_eq!(config.anomaly.window_size, 60);
    let pipeline = AnalyticsPipeline::new(&config).unwrap();
    assert!(pipeline.metrics().is_none());

    let first = pipeline.process(&reading("h-1", "Goa", Field::Humidity, 91.0));
    let second = pipeline.process(&reading("h-1", "Goa", Field::Humidity, 96.0));
    assert_eq!(first.alerts[0].alert_type, "HUMIDITY_HIGH");
    // zero cooldown lets every breach through
    assert_eq!(second.alerts.len(), 1);
    // CO₂ rule is gone with the replaced table
    assert!(pipeline.process(&reading("c-1", "Goa", Field::Co2Ppm, 2000.0)).alerts.is_empty());
}

#[tokio::test]
async fn test_replay_measures_cooldown_on_reading_time() {
    init_logger();
    let sink = Arc::new(MemorySink::new());
    let pipeline = AnalyticsPipeline::replaying(&GreenflowConfig::default())
        .unwrap()
        .with_sink(sink.clone(), 16);

    let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    let first = reading("aq-7", "Delhi", Field::Aqi, 320.0).with_timestamp(start);
    let inside = reading("aq-7", "Delhi", Field::Aqi, 325.0)
        .with_timestamp(start + Duration::seconds(120));
    let after = reading("aq-7", "Delhi", Field::Aqi, 330.0)
        .with_timestamp(start + Duration::seconds(600));

    let fired = pipeline.process(&first).alerts;
    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].timestamp, start);
    assert!(pipeline.process(&inside).alerts.is_empty());
    // 600 s of reading time clears the 300 s cooldown, however fast the replay runs
    let fired = pipeline.process(&after).alerts;
    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].timestamp, start + Duration::seconds(600));

    pipeline.shutdown().await;
    assert_eq!(sink.len(), 2);
}

#[test]
fn test_out_of_range_cooldown_is_a_config_error() {
    let mut config = GreenflowConfig::default();
    config.anomaly.cooldown_secs = 10_000_000_000_000_000;

    match AnalyticsPipeline::new(&config) {
        Err(GreenflowError::Config(message)) => assert!(message.contains("cooldown")),
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("pipeline accepted an unrepresentable cooldown"),
    }
}

struct PanickingSink;

#[async_trait]
impl AlertSink for PanickingSink {
    async fn persist(&self, _alerts: &[AlertRecord]) -> GreenflowResult<()> {
        panic!("storage driver crashed");
    }
}

#[tokio::test]
async fn test_dispatcher_health_reports_stopped_worker() {
    let pipeline = AnalyticsPipeline::new(&GreenflowConfig::default()).unwrap();
    assert!(pipeline.dispatcher_health().is_none());

    let pipeline = pipeline.with_sink(Arc::new(PanickingSink), 4);
    assert_eq!(pipeline.dispatcher_health().unwrap().status, HealthStatus::Ok);

    pipeline.process(&reading("aq-2", "Patna", Field::Aqi, 340.0));
    for _ in 0..200 {
        if pipeline.dispatcher_health().unwrap().status == HealthStatus::Failed {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let health = pipeline.dispatcher_health().unwrap();
    assert_eq!(health.status, HealthStatus::Failed);
    assert_eq!(health.name, "alert_dispatcher");
    pipeline.shutdown().await;
}
