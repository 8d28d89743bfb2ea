use clap::{App, Arg, SubCommand};
use std::error::Error;

mod commands;
mod error;

use commands::*;
use error::{CliError, CliResult};

fn config_arg() -> Arg<'static> {
    Arg::new("config")
        .short('c')
        .long("config")
        .value_name("FILE")
        .takes_value(true)
        .help("Path to a TOML or JSON configuration file")
        .required(false)
}

fn lever_arg(name: &'static str, short: char, help: &'static str) -> Arg<'static> {
    Arg::new(name)
        .short(short)
        .long(name)
        .value_name("PERCENT")
        .takes_value(true)
        .help(help)
        .default_value("0")
}

fn baseline_arg(name: &'static str, help: &'static str) -> Arg<'static> {
    Arg::new(name)
        .long(name)
        .value_name("VALUE")
        .takes_value(true)
        .help(help)
        .required(false)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let matches = App::new("greenflow")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Environmental telemetry analytics CLI")
        .subcommand(
            SubCommand::with_name("simulate")
                .about("Run a what-if policy simulation")
                .arg(lever_arg("traffic", 't', "Traffic reduction percentage"))
                .arg(lever_arg("ventilation", 'v', "Ventilation increase percentage"))
                .arg(lever_arg("industry", 'i', "Industrial cutback percentage"))
                .arg(baseline_arg("co2", "Baseline CO2 in ppm"))
                .arg(baseline_arg("aqi", "Baseline AQI"))
                .arg(baseline_arg("risk", "Baseline risk score"))
                .arg(baseline_arg("temp", "Baseline temperature in °C"))
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print the result as JSON")
                        .required(false),
                )
                .arg(config_arg()),
        )
        .subcommand(
            SubCommand::with_name("replay")
                .about("Replay newline-delimited JSON readings through the pipeline")
                .arg(
                    Arg::new("input")
                        .short('f')
                        .long("input")
                        .value_name("FILE")
                        .takes_value(true)
                        .help("Readings file, one JSON object per line")
                        .required(true),
                )
                .arg(config_arg()),
        )
        .subcommand(
            SubCommand::with_name("rules")
                .about("Show the threshold rules in effect")
                .arg(config_arg()),
        )
        .get_matches();

    let result: CliResult<()> = match matches.subcommand() {
        Some(("simulate", sub_matches)) => handle_simulate_command(sub_matches).await,
        Some(("replay", sub_matches)) => handle_replay_command(sub_matches).await,
        Some(("rules", sub_matches)) => handle_rules_command(sub_matches),
        Some((cmd, _)) => Err(CliError::UnknownCommand(cmd.to_string())),
        None => Err(CliError::NoCommand),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
