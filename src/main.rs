use std::path::PathBuf;

use gatewaypair::bootstrap::{init_tracing_subscriber, load_config_or_default, wire_dependencies};
use gp_app::{ImportConfiguredGateways, ListConfigEntries};
use gp_core::FlowResult;
use tracing::{info, warn};

/// Directory for the rolling log file; stdout only when unset.
const LOG_DIR_ENV: &str = "GATEWAYPAIR_LOG_DIR";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let log_dir = std::env::var_os(LOG_DIR_ENV).map(PathBuf::from);
    init_tracing_subscriber(log_dir.as_deref())?;

    let config = load_config_or_default(std::env::args_os().nth(1).map(PathBuf::from))?;
    let deps = wire_dependencies(config)?;

    let imported = ImportConfiguredGateways::new(deps.controller.clone())
        .execute()
        .await?;
    for flow in imported {
        match &flow.result {
            FlowResult::CreateEntry { title, .. } => {
                info!(gateway_id = %flow.gateway_id, title = %title, "config entry created");
            }
            FlowResult::Abort { reason } => {
                info!(gateway_id = %flow.gateway_id, reason = %reason, "import aborted");
            }
            FlowResult::ShowForm { step_id, .. } => {
                warn!(gateway_id = %flow.gateway_id, step = %step_id, "import needs input, no key configured");
            }
        }
        if let Some(ctx) = flow.context {
            deps.controller.abandon(ctx).await;
        }
    }

    let entries = ListConfigEntries::new(deps.entry_store.clone(), deps.config.flow.domain.clone())
        .execute()
        .await?;
    println!("{}", serde_json::to_string_pretty(&entries)?);

    Ok(())
}
