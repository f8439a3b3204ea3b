//! `run`: one restart of the platform.

use std::sync::Arc;

use tracing::info;

use lumenkeep_core::{Collaborators, Platform, ProfileAdapter, RunSummary};

use crate::cli::{GlobalOpts, RunArgs};
use crate::error::CliError;
use crate::host::{FileRegistry, SnapshotDiscovery, SnapshotTransport};
use crate::output;

pub async fn handle(args: RunArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let config = super::load_config(global)?;
    let registry = Arc::new(FileRegistry::open(super::registry_file(global, &config)).await?);

    let platform = Platform::new(
        lumenkeep_config::to_platform_config(&config),
        Collaborators {
            discovery: Arc::new(SnapshotDiscovery::new(&args.devices)),
            transport: Arc::new(SnapshotTransport::new(&args.devices)),
            registry: registry.clone(),
            adapter: Arc::new(ProfileAdapter),
        },
    );
    let summary = platform.run().await?;

    if args.dry_run {
        info!("dry run, accessory state not saved");
    } else {
        registry.save().await?;
    }

    let out = output::render_single(&global.output, &summary, RunSummary::to_string, plain)?;
    output::print_output(&out, global.quiet);
    Ok(())
}

fn plain(summary: &RunSummary) -> String {
    format!(
        "registered={}\nnew={}\ncached_seen={}\nunseen={}\npruned={}\nfailed={}",
        summary.registered,
        summary.new,
        summary.cached_seen,
        summary.unseen,
        summary.pruned,
        summary.failed
    )
}
