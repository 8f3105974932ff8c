use anyhow::{Result, bail};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::RwLock;

use super::{Lot, LotStore, price_key};

/// In-memory twin of the disk store, used by tests and anywhere a
/// throwaway store is handy.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<BTreeMap<String, Vec<Lot>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LotStore for MemoryStore {
    fn create_portfolio(&self, name: &str) -> Result<()> {
        if name.is_empty() {
            bail!("Invalid portfolio name");
        }
        let mut inner = self.inner.write().unwrap();
        if inner.contains_key(name) {
            bail!("Portfolio '{name}' already exists");
        }
        inner.insert(name.to_string(), Vec::new());
        Ok(())
    }

    fn remove_portfolio(&self, name: &str) -> Result<bool> {
        Ok(self.inner.write().unwrap().remove(name).is_some())
    }

    fn portfolio_exists(&self, name: &str) -> Result<bool> {
        Ok(self.inner.read().unwrap().contains_key(name))
    }

    fn portfolios(&self) -> Result<Vec<String>> {
        Ok(self.inner.read().unwrap().keys().cloned().collect())
    }

    fn insert_lot(&self, lot: &Lot) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        match inner.get_mut(&lot.portfolio) {
            Some(lots) => {
                lots.push(lot.clone());
                Ok(())
            }
            None => bail!("Portfolio '{}' does not exist", lot.portfolio),
        }
    }

    fn list_lots(&self, portfolio: &str) -> Result<Vec<Lot>> {
        Ok(self
            .inner
            .read()
            .unwrap()
            .get(portfolio)
            .cloned()
            .unwrap_or_default())
    }

    fn delete_lots(
        &self,
        portfolio: &str,
        symbol: &str,
        date: NaiveDate,
        price: f64,
    ) -> Result<usize> {
        let mut inner = self.inner.write().unwrap();
        let Some(lots) = inner.get_mut(portfolio) else {
            return Ok(0);
        };
        let before = lots.len();
        lots.retain(|l| {
            !(l.symbol == symbol
                && l.purchase_date == date
                && price_key(l.purchase_price) == price_key(price))
        });
        Ok(before - lots.len())
    }
}
