use anyhow::Result;
use chrono::NaiveDate;
use comfy_table::Cell;

use super::ui;
use crate::store::LotStore;

pub fn create(store: &dyn LotStore, name: &str) -> Result<()> {
    store.create_portfolio(name)?;
    println!("Created portfolio '{name}'");
    Ok(())
}

pub fn delete(store: &dyn LotStore, name: &str) -> Result<()> {
    if store.remove_portfolio(name)? {
        println!("Deleted portfolio '{name}' and its shares");
    } else {
        println!(
            "{}",
            ui::style_text(&format!("No portfolio named '{name}'"), ui::StyleType::Error)
        );
    }
    Ok(())
}

pub fn list(store: &dyn LotStore) -> Result<()> {
    let names = store.portfolios()?;
    if names.is_empty() {
        println!(
            "{}",
            ui::style_text("No portfolios yet; create one with 'folio create'", ui::StyleType::Subtle)
        );
        return Ok(());
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Portfolio"), ui::header_cell("Lots")]);
    for name in names {
        let count = store.list_lots(&name)?.len();
        table.add_row(vec![Cell::new(&name), Cell::new(count.to_string())]);
    }
    println!("{table}");
    Ok(())
}

/// Deletes the lots matching a recorded purchase. The original purchase is
/// identified the way it was reported at buy time: symbol, resolved date
/// and resolved price.
pub fn sell(
    store: &dyn LotStore,
    portfolio: &str,
    symbol: &str,
    date: NaiveDate,
    price: f64,
) -> Result<()> {
    let symbol = symbol.to_uppercase();
    let removed = store.delete_lots(portfolio, &symbol, date, price)?;
    if removed == 0 {
        println!(
            "{}",
            ui::style_text(
                &format!("No shares of {symbol} bought on {date} at ${price:.2} in '{portfolio}'"),
                ui::StyleType::Error,
            )
        );
    } else {
        println!("Removed {removed} lot(s) of {symbol} from '{portfolio}'");
    }
    Ok(())
}
