use crate::error::CliResult;
use clap::ArgMatches;
use greenflow::analytics::ThresholdEvaluator;

use super::load_config;

/// Handle rules command
pub fn handle_rules_command(matches: &ArgMatches) -> CliResult<()> {
    let config = load_config(matches)?;
    let evaluator = ThresholdEvaluator::new(config.alerting.rules)?;

    println!(
        "{:<14} {:<14} {:>10} {:>10} {:>10} {:>10}  {}",
        "FIELD", "ALERT TYPE", "LOW", "MEDIUM", "HIGH", "CRITICAL", "UNIT"
    );
    for rule in evaluator.rules() {
        let [low, medium, high, critical] = rule.bounds();
        println!(
            "{:<14} {:<14} {:>10} {:>10} {:>10} {:>10}  {}",
            rule.field.as_str(),
            rule.alert_type,
            low,
            medium,
            high,
            critical,
            rule.unit
        );
    }
    println!(
        "\nCooldown: {}s per city and alert type",
        config.alerting.cooldown_secs
    );
    Ok(())
}
