//! Caller-visible failure taxonomy for the quote and valuation cores.

use chrono::NaiveDate;
use thiserror::Error;

/// Failure modes of a quote lookup.
///
/// `NotFound` means the provider answered but had no closing price; the
/// resolver treats it as "try the next fallback date". `Unavailable` covers
/// transport and parse failures and aborts a resolution immediately — the
/// fixed date-shift sequence is the only retry policy.
#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("no price data for {symbol} on {date}")]
    NotFound { symbol: String, date: NaiveDate },

    #[error("no latest price available for {symbol}")]
    LatestNotFound { symbol: String },

    #[error("price provider unavailable: {0}")]
    Unavailable(String),
}

impl QuoteError {
    /// Both variants surface to the user the same way; only operators care
    /// about the distinction (it is logged at the provider).
    pub fn user_message(&self) -> String {
        match self {
            QuoteError::NotFound { symbol, .. } | QuoteError::LatestNotFound { symbol } => {
                format!("Symbol {symbol} not recognized or no data for that date")
            }
            QuoteError::Unavailable(_) => {
                "Symbol not recognized or no data for that date".to_string()
            }
        }
    }
}

/// Failure modes of a portfolio valuation.
#[derive(Debug, Error)]
pub enum ValuationError {
    /// Empty lot list or zero total purchase value. Surfaced as "nothing to
    /// display", never as a numeric error.
    #[error("nothing to value")]
    InsufficientData,

    /// A lot's symbol has no current price. The whole valuation fails; a
    /// dashboard with holes is worse than an explicit error.
    #[error("no current price available for {symbol}")]
    MissingPrice {
        symbol: String,
        #[source]
        source: QuoteError,
    },
}
