//! Nearest-trading-day quote resolution.
//!
//! Markets produce no close on weekends and holidays, and the provider has
//! no intraday bar for the current day. Given a requested purchase date,
//! the resolver walks a fixed sequence of nearby dates and returns the
//! first one the provider has a close for, along with the date actually
//! used. The sequence is the whole retry policy; nothing else retries.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use tracing::debug;

use crate::error::QuoteError;
use crate::quote_provider::{QuoteProvider, ResolvedQuote};

/// Day offsets to try, in order, for a requested date.
///
/// The current day is special: its own bar does not exist yet, so every
/// branch starts in the past. For historical dates, weekends probe the
/// adjacent weekdays and plain weekdays probe the exact date first.
fn fallback_offsets(requested: NaiveDate, today: NaiveDate) -> &'static [i64] {
    if requested == today {
        match requested.weekday() {
            Weekday::Sat => &[-1, -2],
            Weekday::Sun => &[-2, -3],
            Weekday::Mon => &[-3],
            _ => &[-1],
        }
    } else {
        match requested.weekday() {
            Weekday::Sat => &[-1, 3],
            Weekday::Sun => &[1, -3],
            _ => &[0, -1, 2],
        }
    }
}

/// Resolves `requested` to an actual trading day with a closing price.
///
/// `today` is passed explicitly so the policy is deterministic under test;
/// callers pass the local calendar date. A `NotFound` from one probe moves
/// to the next offset; `Unavailable` aborts immediately and propagates.
pub async fn resolve(
    provider: &dyn QuoteProvider,
    symbol: &str,
    requested: NaiveDate,
    today: NaiveDate,
) -> Result<ResolvedQuote, QuoteError> {
    for &offset in fallback_offsets(requested, today) {
        let probe = requested + Duration::days(offset);
        debug!(%requested, %probe, offset, "Probing for a closing price");
        match provider.close_on(symbol, probe).await {
            Ok(quote) => {
                return Ok(ResolvedQuote {
                    symbol: quote.symbol,
                    date_used: probe,
                    price: quote.price,
                });
            }
            Err(QuoteError::NotFound { .. }) => continue,
            Err(e) => return Err(e),
        }
    }

    Err(QuoteError::NotFound {
        symbol: symbol.to_string(),
        date: requested,
    })
}
