use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use crypto_listings::coingecko::CoinGeckoClient;
use crypto_listings::config::{BaselineBook, Config};
use crypto_listings::engine::Engine;
use crypto_listings::model::QuoteCurrency;
use crypto_listings::server::{self, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {:#}", e);
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                config
                    .logging
                    .level
                    .parse()
                    .unwrap_or_else(|_| "info".parse().unwrap())
            }),
        )
        .init();

    let universe = config.assets.universe_symbols();
    let baselines = BaselineBook::load(&config.assets.baseline_file)?;
    baselines.validate_coverage(&universe)?;
    let coin_ids = baselines.ids_for(&universe);

    tracing::info!(
        universe = universe.len(),
        mapped_ids = coin_ids.len(),
        base_url = %config.coingecko.base_url,
        "Starting crypto-listings"
    );

    let engine = Engine::new(
        universe,
        baselines.prices.clone(),
        config.synthesis.clone(),
        config.assets.cad_to_usd_rate,
    );
    let client = CoinGeckoClient::new(
        &config.coingecko.base_url,
        config.coingecko.api_key.clone(),
        config.coingecko.per_page,
    );

    let state = AppState {
        engine: Arc::new(engine),
        client: Arc::new(client),
        coin_ids: Arc::new(coin_ids),
        default_currency: QuoteCurrency::parse(&config.coingecko.default_quote_currency),
        refresh_interval: Duration::from_secs(config.coingecko.refresh_interval_secs),
        frontend_dir: config.server.frontend_dir.clone(),
    };

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind_addr))?;
    tracing::info!(addr = %config.server.bind_addr, "Listening");

    axum::serve(listener, server::router(state))
        .await
        .context("server error")?;

    Ok(())
}
