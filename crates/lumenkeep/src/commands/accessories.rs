//! Accessory command handlers.

use tabled::Tabled;

use lumenkeep_core::{Accessory, LightProfile};

use crate::cli::{AccessoriesArgs, AccessoriesCommand, GlobalOpts};
use crate::error::CliError;
use crate::host::FileRegistry;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct AccessoryRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Unique ID")]
    unique_id: String,
    #[tabled(rename = "IP")]
    ip: String,
    #[tabled(rename = "Profile")]
    profile: &'static str,
    #[tabled(rename = "Missed Runs")]
    restarts: u32,
}

impl From<&Accessory> for AccessoryRow {
    fn from(a: &Accessory) -> Self {
        Self {
            name: a.display_name().to_owned(),
            unique_id: a.unique_id().to_string(),
            ip: a.context.cached_ip_address.to_string(),
            profile: LightProfile::for_product(a.context.device.light_version_modifier)
                .convenient_name,
            restarts: a.restarts_since_seen(),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: AccessoriesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        AccessoriesCommand::List => {
            let config = super::load_config(global)?;
            let registry = FileRegistry::open(super::registry_file(global, &config)).await?;
            let accessories = registry.accessories().await;

            let out = output::render_list(
                &global.output,
                &accessories,
                |a| AccessoryRow::from(a),
                |a| a.unique_id().to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
