//! Config subcommand handlers.

use lumenkeep_config::Config;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init { force } => {
            let path = super::config_file(global);
            if path.exists() && !force {
                return Err(CliError::ConfigExists {
                    path: path.display().to_string(),
                });
            }
            let defaults = Config::default();
            match &global.config {
                Some(explicit) => lumenkeep_config::save_config_to(&defaults, explicit)?,
                None => lumenkeep_config::save_config(&defaults)?,
            }
            if !global.quiet {
                eprintln!("Wrote default configuration to {}", path.display());
            }
            Ok(())
        }

        ConfigCommand::Show => {
            let config = super::load_config(global)?;
            let out = output::render_single(&global.output, &config, as_toml, as_toml)?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&super::config_file(global).display().to_string(), false);
            Ok(())
        }
    }
}

fn as_toml(config: &Config) -> String {
    toml::to_string_pretty(config).unwrap_or_else(|e| format!("# cannot render config: {e}"))
}
