pub mod cli;
pub mod converter;
pub mod core;
pub mod providers;

pub use crate::converter::Converter;
pub use crate::core::{ConversionError, ConversionErrorKind, ConversionRequest, RateTable};

use crate::core::config::AppConfig;
use crate::providers::{blockchain::BlockchainTickerProvider, exchange_rates::ExchangeRatesProvider};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    Convert {
        amount: Option<f64>,
        from: Option<String>,
        to: Option<String>,
    },
    Rates {
        base: Option<String>,
        bitcoin: bool,
    },
}

/// Wires the HTTP providers named in `config` into a [`Converter`].
pub fn build_converter(config: &AppConfig) -> Converter {
    let fiat_provider = ExchangeRatesProvider::new(config.providers.exchange_rates_url());
    let ticker_provider = BlockchainTickerProvider::new(config.providers.blockchain_url());
    Converter::new(Arc::new(fiat_provider), Arc::new(ticker_provider))
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Currency converter starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let converter = build_converter(&config);

    match command {
        AppCommand::Convert { amount, from, to } => {
            let request = ConversionRequest::new(
                amount.unwrap_or(config.defaults.amount),
                &from.unwrap_or(config.defaults.from),
                &to.unwrap_or(config.defaults.to),
            );
            cli::convert::run(&converter, &request).await
        }
        AppCommand::Rates { base, bitcoin } => {
            let base = base.unwrap_or(config.defaults.from);
            cli::rates::run(&converter, &base, bitcoin).await
        }
    }
}
