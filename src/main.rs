use anyhow::Result;
use hestia::api::{AccountsClient, ApiContext, Authenticator, Division};
use hestia::config::Config;
use hestia::logging::init_logging;
use hestia::publish::LogPublisher;
use hestia::session::PollingSession;
use hestia::tariff::{TariffSelector, TariffSubscriber};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config =
        Config::load().map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;
    init_logging(&config.logging)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Hestia energy tariff bridge starting up");

    let context = ApiContext::new(&config.api)?;
    let authenticator = Authenticator::new(
        context.clone(),
        &config.api.username,
        &config.api.password,
        Duration::from_secs(config.api.token_refresh_interval_mins * 60),
    );

    let mut selectors = Vec::new();
    for tariff in &config.tariffs {
        selectors.push(TariffSelector::from_config(tariff)?);
    }
    let divisions: Vec<Division> = selectors.iter().map(|s| s.division).collect();

    let client = AccountsClient::new(
        context,
        authenticator.clone(),
        &config.api.customer_nr,
        divisions,
    );
    let session = PollingSession::start(
        client,
        Arc::new(LogPublisher::new("bridge")),
        Duration::from_secs(config.polling.interval_mins * 60),
        config.polling.poll_on_start,
    );

    for selector in selectors {
        let publisher = Arc::new(LogPublisher::new("tariff"));
        session.subscribe(Arc::new(TariffSubscriber::new(
            selector,
            publisher.clone(),
            publisher,
        )));
    }

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    session.dispose();
    authenticator.dispose();
    info!("Shutdown complete");
    Ok(())
}
