use anyhow::{Context, Result, bail};
use finance_sim::cfg::Config;
use finance_sim::db::Store;
use finance_sim::server::Server;
use finance_sim::{logging, quote};
use tokio::sync::oneshot;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    logging::init();

    let config = Config::load().context("failed to load configuration")?;
    if config.auth.jwt_secret.trim().len() < 32 {
        bail!("auth.jwt_secret must be at least 32 characters (set APP__AUTH__JWT_SECRET)");
    }

    let store = Store::connect(&config.database.url, config.database.max_connections).await?;
    info!("database ready at {}", config.database.url);
    let quotes = quote::from_config(&config.quote)?;

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for ctrl-c: {}", e);
        }
        let _ = shutdown_tx.send(());
    });

    Server::new(&config, store, quotes).start(shutdown_rx).await
}
