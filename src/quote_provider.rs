//! Quote abstractions and core types

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::QuoteError;

/// A closing price the provider reported for a symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub price: f64,
}

/// A quote together with the trading day it actually came from, which may
/// differ from the date the user asked for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedQuote {
    pub symbol: String,
    pub date_used: NaiveDate,
    pub price: f64,
}

#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Closing price for `symbol` on exactly `date`. `NotFound` when the
    /// exchange produced no close that day.
    async fn close_on(&self, symbol: &str, date: NaiveDate) -> Result<Quote, QuoteError>;

    /// Most recent available close, no date parameter. Used for all
    /// current-value math so a view on a non-trading day cannot fail.
    async fn latest(&self, symbol: &str) -> Result<Quote, QuoteError>;
}
