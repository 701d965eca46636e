//! opbot - automatic channel operator bot.

use anyhow::Context;
use slirc_opbot::config::{Config, validate};
use slirc_opbot::network::{IrcClient, Transport};
use slirc_opbot::registry::RegistryStore;
use slirc_opbot::services::OpBot;
use slirc_opbot::telemetry;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "opbot.toml".to_string());

    let mut config = Config::load(&config_path)
        .with_context(|| format!("failed to load config {config_path}"))?;
    config.apply_env();

    telemetry::init(&config.log.level, config.log.json);

    if let Err(errors) = validate(&config) {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        anyhow::bail!("{} configuration error(s) in {config_path}", errors.len());
    }

    info!(
        server = %config.irc.server,
        nick = %config.irc.nick,
        opfile = %config.opbot.opfile.display(),
        empty_masks = ?config.opbot.empty_masks,
        "Starting opbot"
    );

    let store = RegistryStore::open(config.opbot.opfile.clone(), config.opbot.empty_masks);
    let client = IrcClient::new(config.irc.clone());
    let transport: Arc<dyn Transport> = Arc::new(client.handle());
    let bot = Arc::new(OpBot::new(store, transport, &config.opbot));

    client.run(bot).await?;
    Ok(())
}
