pub mod disk;
pub mod memory;

use anyhow::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub use disk::DiskStore;
pub use memory::MemoryStore;

/// One recorded purchase. Immutable once priced: created by `buy`, removed
/// by `sell`, never mutated. `purchase_price` and `purchase_date` always
/// come from a quote the resolver actually returned, so a stored lot never
/// references a day the provider had no data for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lot {
    pub portfolio: String,
    pub symbol: String,
    pub quantity: u32,
    pub purchase_price: f64,
    pub purchase_date: NaiveDate,
}

impl Lot {
    pub fn purchase_value(&self) -> f64 {
        self.purchase_price * f64::from(self.quantity)
    }
}

/// Persistence seam for portfolios and their lots. The valuation core only
/// sees `Vec<Lot>`; identity scoping (which user owns which store) is the
/// front end's concern.
pub trait LotStore: Send + Sync {
    /// Registers a new portfolio name. Errors if the name is taken.
    fn create_portfolio(&self, name: &str) -> Result<()>;

    /// Removes a portfolio and all of its lots. Returns false when no such
    /// portfolio existed.
    fn remove_portfolio(&self, name: &str) -> Result<bool>;

    fn portfolio_exists(&self, name: &str) -> Result<bool>;

    /// All portfolio names, sorted.
    fn portfolios(&self) -> Result<Vec<String>>;

    /// Stores a lot. Errors if its portfolio is not registered.
    fn insert_lot(&self, lot: &Lot) -> Result<()>;

    fn list_lots(&self, portfolio: &str) -> Result<Vec<Lot>>;

    /// Removes every lot matching (symbol, purchase_date, purchase_price).
    /// Returns how many were removed.
    fn delete_lots(
        &self,
        portfolio: &str,
        symbol: &str,
        date: NaiveDate,
        price: f64,
    ) -> Result<usize>;
}

/// Prices are keyed with fixed precision so an insert and a later delete
/// for the same lot always agree on the key text.
pub(crate) fn price_key(price: f64) -> String {
    format!("{price:.4}")
}
