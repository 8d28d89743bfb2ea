use crate::error::{CliError, CliResult};
use clap::ArgMatches;
use greenflow::pipeline::AnalyticsPipeline;
use greenflow::sink::MemorySink;
use greenflow::telemetry::Reading;
use log::warn;
use std::sync::Arc;
use tokio::fs;

use super::load_config;

/// Handle replay command
pub async fn handle_replay_command(matches: &ArgMatches) -> CliResult<()> {
    let config = load_config(matches)?;
    let path = matches.value_of("input").ok_or_else(|| CliError::ParseError {
        field: "input".to_string(),
        message: "Input file is not specified. Please use the --input option.".to_string(),
    })?;

    let content = fs::read_to_string(path).await?;

    let sink = Arc::new(MemorySink::new());
    let pipeline = AnalyticsPipeline::replaying(&config)?
        .with_sink(sink.clone(), config.monitoring.persistence_queue_capacity);

    let mut processed = 0usize;
    let mut skipped = 0usize;
    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let reading = match Reading::from_json(line) {
            Ok(reading) => reading,
            Err(e) => {
                warn!("Skipping line {}: {}", index + 1, e);
                skipped += 1;
                continue;
            }
        };

        let outcome = pipeline.process(&reading);
        processed += 1;
        for alert in &outcome.alerts {
            println!("[{}] {} {}", alert.severity, alert.alert_type, alert.message);
        }
    }

    let snapshot = pipeline.snapshot();
    pipeline.shutdown().await;

    println!(
        "\nProcessed {} reading(s), skipped {}, persisted {} alert(s)",
        processed,
        skipped,
        sink.len()
    );
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}
