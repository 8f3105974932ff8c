use anyhow::{Result, bail};
use comfy_table::Cell;
use std::collections::BTreeSet;
use tracing::warn;

use super::ui;
use crate::error::{QuoteError, ValuationError};
use crate::quote_provider::QuoteProvider;
use crate::store::LotStore;
use crate::valuation::{self, PortfolioValuation};

const BAR_WIDTH: usize = 20;

pub async fn run(
    store: &dyn LotStore,
    provider: &dyn QuoteProvider,
    portfolio: &str,
) -> Result<()> {
    if !store.portfolio_exists(portfolio)? {
        bail!("Portfolio '{portfolio}' does not exist");
    }

    let lots = store.list_lots(portfolio)?;
    if lots.is_empty() {
        println!(
            "{}",
            ui::style_text("Nothing to display: the portfolio has no shares", ui::StyleType::Subtle)
        );
        return Ok(());
    }

    let distinct_symbols = lots
        .iter()
        .map(|l| l.symbol.as_str())
        .collect::<BTreeSet<_>>()
        .len();
    let pb = ui::new_progress_bar(distinct_symbols as u64, true);
    pb.set_message("Fetching current prices...");

    let result = valuation::valuate(&lots, provider, &|| pb.inc(1)).await;
    pb.finish_and_clear();

    match result {
        Ok(valuation) => {
            println!(
                "Portfolio: {}\n",
                ui::style_text(portfolio, ui::StyleType::Title)
            );
            display_valuation(&valuation);
            Ok(())
        }
        Err(ValuationError::InsufficientData) => {
            println!(
                "{}",
                ui::style_text("Nothing to display: the portfolio has no shares", ui::StyleType::Subtle)
            );
            Ok(())
        }
        Err(ValuationError::MissingPrice { symbol, source }) => {
            if let QuoteError::Unavailable(detail) = &source {
                warn!(%symbol, %detail, "Provider unavailable during valuation");
            }
            println!(
                "{}",
                ui::style_text(
                    &format!("No current price available for {symbol}; try again later"),
                    ui::StyleType::Error,
                )
            );
            Ok(())
        }
    }
}

fn display_valuation(valuation: &PortfolioValuation) {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Symbol"),
        ui::header_cell("Shares"),
        ui::header_cell("Paid"),
        ui::header_cell("Current"),
        ui::header_cell("Change"),
        ui::header_cell("Gain/Loss"),
        ui::header_cell("Contribution"),
    ]);

    for v in &valuation.lots {
        table.add_row(vec![
            Cell::new(&v.lot.symbol),
            Cell::new(v.lot.quantity.to_string()),
            ui::money_cell(v.lot.purchase_price),
            ui::money_cell(v.current_price),
            ui::change_cell(v.dollar_change, format!("${:+.2}", v.dollar_change)),
            Cell::new(ui::gain_loss_bar(v.relative_scale, BAR_WIDTH)),
            ui::change_cell(v.contribution_pct, format!("{:+.2}%", v.contribution_pct)),
        ]);
    }
    println!("{table}");

    let total_style = if valuation.total_dollar_change >= 0.0 {
        ui::StyleType::Gain
    } else {
        ui::StyleType::Loss
    };
    println!(
        "\n{} ${:.2} -> ${:.2} ({})",
        ui::style_text("Total:", ui::StyleType::TotalLabel),
        valuation.total_purchase_value,
        valuation.total_current_value,
        ui::style_text(
            &format!(
                "${:+.2}, {:+.2}%",
                valuation.total_dollar_change, valuation.total_percent_change
            ),
            total_style,
        ),
    );
}
