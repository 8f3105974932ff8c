pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod log;
pub mod providers;
pub mod quote_provider;
pub mod resolver;
pub mod store;
pub mod valuation;

use anyhow::Result;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, info};

use crate::store::DiskStore;

pub enum AppCommand {
    Create { name: String },
    Delete { name: String },
    Portfolios,
    Buy {
        portfolio: String,
        symbol: String,
        quantity: u32,
        date: NaiveDate,
    },
    Sell {
        portfolio: String,
        symbol: String,
        date: NaiveDate,
        price: f64,
    },
    View { portfolio: String },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("folio starting...");

    let config = match config_path {
        Some(path) => config::AppConfig::load_from_path(path)?,
        None => config::AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let store = DiskStore::open(&config.data_path()?)?;

    match command {
        AppCommand::Create { name } => cli::portfolio::create(&store, &name),
        AppCommand::Delete { name } => cli::portfolio::delete(&store, &name),
        AppCommand::Portfolios => cli::portfolio::list(&store),
        AppCommand::Sell {
            portfolio,
            symbol,
            date,
            price,
        } => cli::portfolio::sell(&store, &portfolio, &symbol, date, price),
        AppCommand::Buy {
            portfolio,
            symbol,
            quantity,
            date,
        } => {
            let provider = build_provider(&config)?;
            cli::buy::run(&store, &provider, &portfolio, &symbol, quantity, date).await
        }
        AppCommand::View { portfolio } => {
            let provider = build_provider(&config)?;
            cli::view::run(&store, &provider, &portfolio).await
        }
    }
}

fn build_provider(config: &config::AppConfig) -> Result<providers::IexProvider> {
    let latest_cache = Arc::new(cache::Cache::new());
    Ok(providers::IexProvider::new(
        &config.provider.base_url,
        &config.api_token()?,
        latest_cache,
    ))
}
