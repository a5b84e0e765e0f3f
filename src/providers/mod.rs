pub mod blockchain;
pub mod exchange_rates;

pub use blockchain::BlockchainTickerProvider;
pub use exchange_rates::ExchangeRatesProvider;
