/// Integration tests for alert fusion
///
/// This test module covers:
/// - Inclusive severity bounds
/// - City/type cooldown boundaries
/// - Best-effort persistence through a failing sink
/// - Detector and engine working together
use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use greenflow::GreenflowError;
use greenflow::analytics::{AlertEngine, AlertRecord, AnomalyDetector, Severity};
use greenflow::clock::ManualClock;
use greenflow::config::{AlertConfig, AnomalyConfig};
use greenflow::error::GreenflowResult;
use greenflow::sink::{AlertSink, MemorySink};
use greenflow::telemetry::{Field, Readings};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn manual_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 11, 3, 8, 0, 0).unwrap(),
    ))
}

struct FailingSink {
    attempts: AtomicUsize,
}

#[async_trait]
impl AlertSink for FailingSink {
    async fn persist(&self, _alerts: &[AlertRecord]) -> GreenflowResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(GreenflowError::Persistence("database unavailable".to_string()))
    }
}

#[test]
fn test_value_on_bound_takes_that_severity() {
    let engine = AlertEngine::new(AlertConfig::default()).unwrap();

    let alerts = engine.evaluate(&Readings::from([(Field::Co2Ppm, 800.0)]), Some("Pune"), &[]);
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].alert_type, "CO2_HIGH");
    assert_eq!(alerts[0].severity, Severity::High);
    assert_eq!(
        alerts[0].message,
        "co2_ppm reached 800.0ppm in Pune — HIGH alert."
    );

    let below = engine.evaluate(&Readings::from([(Field::Aqi, 99.9)]), Some("Pune"), &[]);
    assert!(below.is_empty());
}

#[test]
fn test_cooldown_boundary() {
    let clock = manual_clock();
    let engine = AlertEngine::with_clock(AlertConfig::default(), clock.clone()).unwrap();
    let breach = Readings::from([(Field::Aqi, 320.0)]);

    assert_eq!(engine.evaluate(&breach, Some("Delhi"), &[]).len(), 1);

    clock.advance(Duration::seconds(299));
    assert!(engine.evaluate(&breach, Some("Delhi"), &[]).is_empty());

    // A different city is not muted
    assert_eq!(engine.evaluate(&breach, Some("Mumbai"), &[]).len(), 1);

    clock.advance(Duration::seconds(2));
    let again = engine.evaluate(&breach, Some("Delhi"), &[]);
    assert_eq!(again.len(), 1);
    assert_eq!(again[0].severity, Severity::Critical);
    assert_eq!(engine.total_fired(), 3);
}

#[tokio::test]
async fn test_failing_sink_does_not_surface() {
    let engine = AlertEngine::new(AlertConfig::default()).unwrap();
    let sink = FailingSink {
        attempts: AtomicUsize::new(0),
    };

    let alerts = engine
        .evaluate_async(
            &Readings::from([(Field::TemperatureC, 46.0)]),
            Some("Jaipur"),
            &[],
            Some(&sink),
        )
        .await;

    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].alert_type, "HEAT_HIGH");
    assert_eq!(sink.attempts.load(Ordering::SeqCst), 1);
    assert_eq!(engine.recent(5).len(), 1);
}

#[tokio::test]
async fn test_sink_receives_fired_alerts() {
    let engine = AlertEngine::new(AlertConfig::default()).unwrap();
    let sink = MemorySink::new();

    engine
        .evaluate_async(
            &Readings::from([(Field::Co2Ppm, 990.0), (Field::RiskScore, 55.0)]),
            None,
            &[],
            Some(&sink),
        )
        .await;

    let stored = sink.stored();
    assert_eq!(stored.len(), 2);
    assert!(stored.iter().all(|alert| alert.city.is_none()));
    assert!(stored.iter().any(|alert| alert.message.contains("unknown city")));
}

#[test]
fn test_anomaly_becomes_alert() {
    let clock = manual_clock();
    let detector = AnomalyDetector::with_clock(AnomalyConfig::default(), clock.clone());
    let engine = AlertEngine::with_clock(AlertConfig::default(), clock.clone()).unwrap();

    for i in 0..12 {
        detector.ingest("hum-1", &Readings::from([(Field::Humidity, 40.0 + (i % 2) as f64)]));
        clock.advance(Duration::seconds(10));
    }

    let spike = Readings::from([(Field::Humidity, 95.0)]);
    let anomalies = detector.ingest("hum-1", &spike);
    assert_eq!(anomalies.len(), 1);

    // humidity has no threshold rule, so only the anomaly pathway fires
    let alerts = engine.evaluate(&spike, Some("Chennai"), &anomalies);
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].alert_type, "ANOMALY_HUMIDITY");
    assert_eq!(alerts[0].severity, anomalies[0].severity);
    assert_eq!(alerts[0].message, anomalies[0].message);
}
