//! Portfolio valuation and gain/loss normalization.
//!
//! Lots are priced with the provider's latest close (never the date-based
//! endpoint, which would fail on non-trading days), aggregated into dollar
//! and percent change, and normalized onto a common [-1, 1] scale so gains
//! and losses can be rendered as proportional bars.

use futures::future::join_all;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

use crate::error::{QuoteError, ValuationError};
use crate::quote_provider::{Quote, QuoteProvider};
use crate::store::Lot;

#[derive(Debug, Clone)]
pub struct LotValuation {
    pub lot: Lot,
    pub current_price: f64,
    /// `(current - purchase_price) * quantity`, unrounded.
    pub dollar_change: f64,
    /// `dollar_change / max |dollar_change|`, sign-preserving, rounded to
    /// 4 places. Zero for every lot when the whole portfolio is flat.
    pub relative_scale: f64,
    /// This lot's share of the total invested capital's movement, signed,
    /// rounded to 2 places.
    pub contribution_pct: f64,
}

impl LotValuation {
    pub fn current_value(&self) -> f64 {
        self.current_price * f64::from(self.lot.quantity)
    }
}

#[derive(Debug)]
pub struct PortfolioValuation {
    /// Sorted by `dollar_change` descending: biggest gain first, biggest
    /// loss last. Rendering relies on this order.
    pub lots: Vec<LotValuation>,
    pub total_purchase_value: f64,
    pub total_current_value: f64,
    pub total_dollar_change: f64,
    /// Rounded to 2 places.
    pub total_percent_change: f64,
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Values a portfolio's lots against current prices.
///
/// Latest prices are fetched concurrently, one call per distinct symbol;
/// `on_fetch` fires as each completes (progress reporting). Any symbol
/// without a price fails the whole valuation — there is no partial mode.
pub async fn valuate(
    lots: &[Lot],
    provider: &dyn QuoteProvider,
    on_fetch: &(dyn Fn() + Sync),
) -> Result<PortfolioValuation, ValuationError> {
    if lots.is_empty() {
        return Err(ValuationError::InsufficientData);
    }

    let symbols: BTreeSet<&str> = lots.iter().map(|l| l.symbol.as_str()).collect();
    debug!(lots = lots.len(), symbols = symbols.len(), "Valuating portfolio");

    let quote_futures = symbols.iter().map(|symbol| async move {
        let result = provider.latest(symbol).await;
        on_fetch();
        (symbol.to_string(), result)
    });
    let mut quotes: HashMap<String, Result<Quote, QuoteError>> =
        join_all(quote_futures).await.into_iter().collect();

    let mut prices: HashMap<String, f64> = HashMap::new();
    for symbol in &symbols {
        match quotes.remove(*symbol) {
            Some(Ok(quote)) => {
                prices.insert(symbol.to_string(), quote.price);
            }
            Some(Err(source)) => {
                return Err(ValuationError::MissingPrice {
                    symbol: symbol.to_string(),
                    source,
                });
            }
            None => unreachable!("every symbol was fetched"),
        }
    }

    let mut total_purchase_value = 0.0;
    let mut total_current_value = 0.0;
    let mut valued: Vec<LotValuation> = lots
        .iter()
        .map(|lot| {
            let current_price = prices[&lot.symbol];
            let quantity = f64::from(lot.quantity);
            let dollar_change = (current_price - lot.purchase_price) * quantity;
            total_purchase_value += lot.purchase_value();
            total_current_value += current_price * quantity;
            LotValuation {
                lot: lot.clone(),
                current_price,
                dollar_change,
                relative_scale: 0.0,
                contribution_pct: 0.0,
            }
        })
        .collect();

    if total_purchase_value == 0.0 {
        return Err(ValuationError::InsufficientData);
    }

    let total_dollar_change = total_current_value - total_purchase_value;
    let total_percent_change = round_to(total_dollar_change / total_purchase_value * 100.0, 2);

    // Normalize against the single largest-magnitude lot, gain or loss.
    let max_magnitude = valued
        .iter()
        .map(|v| v.dollar_change.abs())
        .fold(0.0, f64::max);
    for v in &mut valued {
        if max_magnitude > 0.0 {
            v.relative_scale = round_to(v.dollar_change / max_magnitude, 4);
        }
        v.contribution_pct = round_to(v.dollar_change / total_purchase_value * 100.0, 2);
    }

    valued.sort_by(|a, b| b.dollar_change.total_cmp(&a.dollar_change));

    Ok(PortfolioValuation {
        lots: valued,
        total_purchase_value,
        total_current_value,
        total_dollar_change,
        total_percent_change,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::Mutex;

    struct StaticPrices {
        prices: HashMap<String, f64>,
        calls: Mutex<Vec<String>>,
    }

    impl StaticPrices {
        fn new(prices: &[(&str, f64)]) -> Self {
            Self {
                prices: prices
                    .iter()
                    .map(|(s, p)| (s.to_string(), *p))
                    .collect(),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl QuoteProvider for StaticPrices {
        async fn close_on(&self, _symbol: &str, _date: NaiveDate) -> Result<Quote, QuoteError> {
            unimplemented!("valuation never uses the date-based endpoint")
        }

        async fn latest(&self, symbol: &str) -> Result<Quote, QuoteError> {
            self.calls.lock().unwrap().push(symbol.to_string());
            match self.prices.get(symbol) {
                Some(price) => Ok(Quote {
                    symbol: symbol.to_string(),
                    price: *price,
                }),
                None => Err(QuoteError::LatestNotFound {
                    symbol: symbol.to_string(),
                }),
            }
        }
    }

    fn lot(symbol: &str, quantity: u32, price: f64) -> Lot {
        Lot {
            portfolio: "test".to_string(),
            symbol: symbol.to_string(),
            quantity,
            purchase_price: price,
            purchase_date: NaiveDate::from_ymd_opt(2023, 1, 3).unwrap(),
        }
    }

    fn no_progress() {}

    #[tokio::test]
    async fn test_empty_portfolio_is_insufficient_data() {
        let provider = StaticPrices::new(&[]);
        let result = valuate(&[], &provider, &no_progress).await;
        assert!(matches!(result, Err(ValuationError::InsufficientData)));
        assert!(provider.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_gain_loss_scenario() {
        // AAPL 10 @ 100 now 150 => +500; MSFT 5 @ 200 now 180 => -100.
        let provider = StaticPrices::new(&[("AAPL", 150.0), ("MSFT", 180.0)]);
        let lots = [lot("AAPL", 10, 100.0), lot("MSFT", 5, 200.0)];

        let valuation = valuate(&lots, &provider, &no_progress).await.unwrap();

        assert_eq!(valuation.lots[0].lot.symbol, "AAPL");
        assert_eq!(valuation.lots[0].dollar_change, 500.0);
        assert_eq!(valuation.lots[0].relative_scale, 1.0);
        assert_eq!(valuation.lots[0].contribution_pct, 25.0);

        assert_eq!(valuation.lots[1].lot.symbol, "MSFT");
        assert_eq!(valuation.lots[1].dollar_change, -100.0);
        assert_eq!(valuation.lots[1].relative_scale, -0.2);
        assert_eq!(valuation.lots[1].contribution_pct, -5.0);

        assert_eq!(valuation.total_purchase_value, 2000.0);
        assert_eq!(valuation.total_current_value, 2400.0);
        assert_eq!(valuation.total_dollar_change, 400.0);
        assert_eq!(valuation.total_percent_change, 20.0);
    }

    #[tokio::test]
    async fn test_scales_bounded_with_single_extreme() {
        let provider =
            StaticPrices::new(&[("AAPL", 150.0), ("MSFT", 180.0), ("NVDA", 410.0)]);
        let lots = [
            lot("AAPL", 10, 100.0),
            lot("MSFT", 5, 200.0),
            lot("NVDA", 2, 400.0),
        ];

        let valuation = valuate(&lots, &provider, &no_progress).await.unwrap();

        for v in &valuation.lots {
            assert!((-1.0..=1.0).contains(&v.relative_scale));
        }
        let extremes = valuation
            .lots
            .iter()
            .filter(|v| v.relative_scale.abs() == 1.0)
            .count();
        assert_eq!(extremes, 1);

        // Descending dollar change is the rendering contract.
        let changes: Vec<f64> = valuation.lots.iter().map(|v| v.dollar_change).collect();
        assert_eq!(changes, vec![500.0, 20.0, -100.0]);
    }

    #[tokio::test]
    async fn test_sum_check() {
        let provider = StaticPrices::new(&[("AAPL", 153.17), ("MSFT", 181.33)]);
        let lots = [lot("AAPL", 7, 99.42), lot("MSFT", 3, 212.91)];

        let valuation = valuate(&lots, &provider, &no_progress).await.unwrap();
        let sum: f64 = lots.iter().map(Lot::purchase_value).sum();
        assert!((sum + valuation.total_dollar_change - valuation.total_current_value).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_flat_portfolio_has_zero_scales() {
        let provider = StaticPrices::new(&[("AAPL", 100.0)]);
        let lots = [lot("AAPL", 10, 100.0)];

        let valuation = valuate(&lots, &provider, &no_progress).await.unwrap();
        assert_eq!(valuation.lots[0].relative_scale, 0.0);
        assert_eq!(valuation.total_percent_change, 0.0);
    }

    #[tokio::test]
    async fn test_missing_price_fails_whole_valuation() {
        let provider = StaticPrices::new(&[("AAPL", 150.0)]);
        let lots = [lot("AAPL", 10, 100.0), lot("GONE", 5, 200.0)];

        let result = valuate(&lots, &provider, &no_progress).await;
        match result {
            Err(ValuationError::MissingPrice { symbol, .. }) => assert_eq!(symbol, "GONE"),
            other => panic!("expected MissingPrice, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_repeated_symbol_fetched_once() {
        let provider = StaticPrices::new(&[("AAPL", 150.0)]);
        let lots = [lot("AAPL", 10, 100.0), lot("AAPL", 5, 120.0)];

        let valuation = valuate(&lots, &provider, &no_progress).await.unwrap();
        assert_eq!(valuation.lots.len(), 2);
        assert_eq!(provider.calls.lock().unwrap().len(), 1);
    }
}
