use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::cache::Cache;
use crate::error::QuoteError;
use crate::quote_provider::{Quote, QuoteProvider};

/// IEX-style quote provider. Two endpoints: chart-by-day for a specific
/// calendar date, and the latest-quote endpoint for current prices.
///
/// Latest quotes are cached keyed by `(symbol, today)` so repeat views on
/// the same day cost one provider call per symbol. Chart lookups are not
/// cached; a resolution is already bounded at one to three calls.
pub struct IexProvider {
    base_url: String,
    token: String,
    latest_cache: Arc<Cache<(String, NaiveDate), Quote>>,
}

impl IexProvider {
    pub fn new(
        base_url: &str,
        token: &str,
        latest_cache: Arc<Cache<(String, NaiveDate), Quote>>,
    ) -> Self {
        IexProvider {
            base_url: base_url.to_string(),
            token: token.to_string(),
            latest_cache,
        }
    }

    fn client() -> Result<reqwest::Client, QuoteError> {
        reqwest::Client::builder()
            .user_agent("folio/0.1")
            .build()
            .map_err(|e| QuoteError::Unavailable(e.to_string()))
    }
}

#[derive(Deserialize, Debug)]
struct ChartDay {
    close: Option<f64>,
    symbol: Option<String>,
}

#[derive(Deserialize, Debug)]
struct LatestQuoteResponse {
    #[serde(alias = "latestPrice")]
    latest_price: Option<f64>,
    symbol: Option<String>,
}

#[async_trait]
impl QuoteProvider for IexProvider {
    #[instrument(name = "IexCloseOn", skip(self), fields(symbol = %symbol, date = %date))]
    async fn close_on(&self, symbol: &str, date: NaiveDate) -> Result<Quote, QuoteError> {
        let url = format!(
            "{}/stock/{}/chart/date/{}?token={}&chartByDay=true",
            self.base_url,
            symbol,
            date.format("%Y%m%d"),
            self.token
        );
        debug!("Requesting closing price from {}", url);

        let response = Self::client()?.get(&url).send().await.map_err(|e| {
            warn!(error = %e, "Transport failure fetching chart data");
            QuoteError::Unavailable(format!("request error for {symbol}: {e}"))
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(QuoteError::NotFound {
                symbol: symbol.to_string(),
                date,
            });
        }
        if !status.is_success() {
            warn!(%status, "Provider returned HTTP error for chart data");
            return Err(QuoteError::Unavailable(format!(
                "HTTP {status} for {symbol} on {date}"
            )));
        }

        // The chart-by-day endpoint answers with an array; a non-trading
        // day is an empty array, not an error status.
        let days = response.json::<Vec<ChartDay>>().await.map_err(|e| {
            warn!(error = %e, "Malformed chart payload");
            QuoteError::Unavailable(format!("malformed payload for {symbol}: {e}"))
        })?;

        match days.first().and_then(|d| d.close) {
            Some(price) => Ok(Quote {
                symbol: days[0].symbol.clone().unwrap_or_else(|| symbol.to_string()),
                price,
            }),
            None => Err(QuoteError::NotFound {
                symbol: symbol.to_string(),
                date,
            }),
        }
    }

    #[instrument(name = "IexLatest", skip(self), fields(symbol = %symbol))]
    async fn latest(&self, symbol: &str) -> Result<Quote, QuoteError> {
        let today = Local::now().date_naive();
        let key = (symbol.to_string(), today);
        if let Some(cached) = self.latest_cache.get(&key).await {
            return Ok(cached);
        }

        let url = format!("{}/stock/{}/quote?token={}", self.base_url, symbol, self.token);
        debug!("Requesting latest quote from {}", url);

        let response = Self::client()?.get(&url).send().await.map_err(|e| {
            warn!(error = %e, "Transport failure fetching latest quote");
            QuoteError::Unavailable(format!("request error for {symbol}: {e}"))
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(QuoteError::LatestNotFound {
                symbol: symbol.to_string(),
            });
        }
        if !status.is_success() {
            warn!(%status, "Provider returned HTTP error for latest quote");
            return Err(QuoteError::Unavailable(format!("HTTP {status} for {symbol}")));
        }

        let payload = response.json::<LatestQuoteResponse>().await.map_err(|e| {
            warn!(error = %e, "Malformed latest-quote payload");
            QuoteError::Unavailable(format!("malformed payload for {symbol}: {e}"))
        })?;

        let quote = match payload.latest_price {
            Some(price) => Quote {
                symbol: payload.symbol.unwrap_or_else(|| symbol.to_string()),
                price,
            },
            None => {
                return Err(QuoteError::LatestNotFound {
                    symbol: symbol.to_string(),
                });
            }
        };

        self.latest_cache.put(key, quote.clone()).await;
        Ok(quote)
    }
}
