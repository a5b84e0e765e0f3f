//! Core business logic abstractions

pub mod config;
pub mod currency;
pub mod error;
pub mod log;
pub mod rates;

// Re-export main types for cleaner imports
pub use currency::{ConversionRequest, RateTable};
pub use error::{ConversionError, ConversionErrorKind};
pub use rates::{BitcoinTickerProvider, FiatRateProvider, FiatRates, Ticker, TickerEntry};
