pub mod replay;
pub mod rules;
pub mod simulate;

pub use replay::handle_replay_command;
pub use rules::handle_rules_command;
pub use simulate::handle_simulate_command;

use crate::error::{CliError, CliResult};
use clap::ArgMatches;
use greenflow::config::{GreenflowConfig, load_config_from_path};
use greenflow::logging::init_logging;
use std::path::Path;

/// Load `--config` (or defaults), apply `GREENFLOW_*` overrides and start logging
pub(crate) fn load_config(matches: &ArgMatches) -> CliResult<GreenflowConfig> {
    let config = match matches.value_of("config") {
        Some(path) => {
            let mut config = load_config_from_path(Path::new(path))?;
            config.apply_overrides(std::env::vars());
            config
        }
        None => GreenflowConfig::load_from_env(),
    };
    config
        .validate()
        .map_err(|errors| CliError::ConfigurationError(errors.join("; ")))?;

    init_logging(&config.logging)?;
    Ok(config)
}
