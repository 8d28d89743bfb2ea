use crate::error::{CliError, CliResult};
use clap::ArgMatches;
use greenflow::simulation::{LiveBaseline, SimulationEngine, SimulationInput, SimulationResult};

use super::load_config;

fn parse_number(matches: &ArgMatches, name: &str) -> CliResult<Option<f64>> {
    matches
        .value_of(name)
        .map(|raw| {
            raw.trim().parse::<f64>().map_err(|e| CliError::ParseError {
                field: name.to_string(),
                message: format!("'{}' is not a number: {}", raw, e),
            })
        })
        .transpose()
}

fn build_input(matches: &ArgMatches) -> CliResult<SimulationInput> {
    let mut input = SimulationInput::new(
        parse_number(matches, "traffic")?.unwrap_or(0.0),
        parse_number(matches, "ventilation")?.unwrap_or(0.0),
        parse_number(matches, "industry")?.unwrap_or(0.0),
    );
    input.baseline_co2 = parse_number(matches, "co2")?;
    input.baseline_aqi = parse_number(matches, "aqi")?;
    input.baseline_risk = parse_number(matches, "risk")?;
    input.baseline_temp = parse_number(matches, "temp")?;
    Ok(input)
}

fn print_report(result: &SimulationResult) {
    println!("Simulation result");
    println!(
        "  CO2:        {:.2} -> {:.2} ppm ({:.1}%)",
        result.baseline_co2, result.new_predicted_co2, result.co2_reduction_pct
    );
    println!(
        "  Risk score: {:.2} -> {:.2}",
        result.baseline_risk, result.new_risk_score
    );
    println!("  Status:     {}", result.alert_level);
    println!("  Traffic saved:       {:.2} ppm", result.traffic_co2_saved);
    println!("  Industry saved:      {:.2} ppm", result.industry_co2_saved);
    println!("  Ventilation diluted: {:.2} ppm", result.ventilation_co2_diluted);
    println!();
    println!("{}", result.impact_summary);
}

/// Handle simulate command
pub async fn handle_simulate_command(matches: &ArgMatches) -> CliResult<()> {
    load_config(matches)?;
    let input = build_input(matches)?;

    let engine = SimulationEngine::new();
    let result = engine.simulate(&input, &LiveBaseline::default());

    if matches.is_present("json") {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_report(&result);
    }
    Ok(())
}
