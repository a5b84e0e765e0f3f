//! The single error surfaced by conversions

use std::error::Error as StdError;
use thiserror::Error;

pub const CONVERSION_ERROR_MESSAGE: &str =
    "Please specify a valid `from` and/or `to` currency value!";

/// What went wrong underneath a [`ConversionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionErrorKind {
    /// A provider request failed, returned a non-success status or a malformed body
    Upstream,
    /// The assembled rate table could not resolve a currency code
    UnknownCurrency,
    /// The request cannot be served at all (e.g. BTC to BTC, negative amount)
    InvalidRequest,
}

/// Every conversion failure displays the same message; the cause is kept
/// as `source()` and classified by `kind()`.
#[derive(Debug, Error)]
#[error("Please specify a valid `from` and/or `to` currency value!")]
pub struct ConversionError {
    kind: ConversionErrorKind,
    #[source]
    source: Box<dyn StdError + Send + Sync + 'static>,
}

impl ConversionError {
    pub fn new(
        kind: ConversionErrorKind,
        source: impl Into<Box<dyn StdError + Send + Sync + 'static>>,
    ) -> Self {
        Self {
            kind,
            source: source.into(),
        }
    }

    pub fn upstream(source: anyhow::Error) -> Self {
        Self::new(ConversionErrorKind::Upstream, source)
    }

    pub fn unknown_currency(source: anyhow::Error) -> Self {
        Self::new(ConversionErrorKind::UnknownCurrency, source)
    }

    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::new(ConversionErrorKind::InvalidRequest, reason.into())
    }

    pub fn kind(&self) -> ConversionErrorKind {
        self.kind
    }

    /// Description of the underlying cause, for logs.
    pub fn detail(&self) -> String {
        self.source.to_string()
    }
}
