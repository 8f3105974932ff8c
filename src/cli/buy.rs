use anyhow::{Result, bail};
use chrono::{Local, NaiveDate};
use tracing::warn;

use super::ui;
use crate::error::QuoteError;
use crate::quote_provider::QuoteProvider;
use crate::resolver;
use crate::store::{Lot, LotStore};

/// Oldest purchase date accepted, in days before today. The provider's
/// historical archive does not reach further back.
const MAX_LOOKBACK_DAYS: i64 = 1825;

pub async fn run(
    store: &dyn LotStore,
    provider: &dyn QuoteProvider,
    portfolio: &str,
    symbol: &str,
    quantity: u32,
    date: NaiveDate,
) -> Result<()> {
    if quantity == 0 {
        bail!("Quantity must be a positive whole number of shares");
    }
    if !store.portfolio_exists(portfolio)? {
        bail!("Portfolio '{portfolio}' does not exist");
    }

    let today = Local::now().date_naive();
    if date > today {
        bail!("Purchase date cannot be in the future");
    }
    if (today - date).num_days() > MAX_LOOKBACK_DAYS {
        bail!("Purchase date cannot be more than {MAX_LOOKBACK_DAYS} days in the past");
    }

    let symbol = symbol.to_uppercase();
    let resolved = match resolver::resolve(provider, &symbol, date, today).await {
        Ok(resolved) => resolved,
        Err(e) => {
            if let QuoteError::Unavailable(detail) = &e {
                warn!(%detail, "Provider unavailable during purchase");
            }
            println!("{}", ui::style_text(&e.user_message(), ui::StyleType::Error));
            return Ok(());
        }
    };

    let lot = Lot {
        portfolio: portfolio.to_string(),
        symbol: resolved.symbol.clone(),
        quantity,
        purchase_price: resolved.price,
        purchase_date: resolved.date_used,
    };
    store.insert_lot(&lot)?;

    println!(
        "Bought {} x {} @ ${:.2} into '{}'",
        quantity, resolved.symbol, resolved.price, portfolio
    );
    if resolved.date_used != date {
        println!(
            "{}",
            ui::style_text(
                &format!("No trading on {date}; priced with the close of {}", resolved.date_used),
                ui::StyleType::Subtle,
            )
        );
    }
    Ok(())
}
