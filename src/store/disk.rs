use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle};
use std::path::Path;
use tracing::debug;

use super::{Lot, LotStore, price_key};

/// Field separator inside lot keys. Portfolio names and symbols are
/// rejected if they contain it.
const SEP: char = '\u{1f}';

/// fjall-backed store. Two partitions: a portfolio registry and the lots,
/// keyed `portfolio SEP symbol SEP date SEP price SEP n` so listing a
/// portfolio and deleting a specific purchase are both prefix scans.
pub struct DiskStore {
    _keyspace: Keyspace,
    portfolios: PartitionHandle,
    lots: PartitionHandle,
}

impl DiskStore {
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create data directory: {}", path.display()))?;
        let keyspace = fjall::Config::new(path)
            .open()
            .with_context(|| format!("Failed to open data store at {}", path.display()))?;
        let portfolios = keyspace.open_partition("portfolios", PartitionCreateOptions::default())?;
        let lots = keyspace.open_partition("lots", PartitionCreateOptions::default())?;
        Ok(Self {
            _keyspace: keyspace,
            portfolios,
            lots,
        })
    }

    fn lot_prefix(portfolio: &str) -> String {
        format!("{portfolio}{SEP}")
    }

    fn purchase_prefix(portfolio: &str, symbol: &str, date: NaiveDate, price: f64) -> String {
        format!(
            "{portfolio}{SEP}{symbol}{SEP}{date}{SEP}{}{SEP}",
            price_key(price)
        )
    }

    fn matching_keys(&self, prefix: &str) -> Result<Vec<Vec<u8>>> {
        let mut keys = Vec::new();
        for item in self.lots.prefix(prefix) {
            let (key, _) = item?;
            keys.push(key.to_vec());
        }
        Ok(keys)
    }
}

impl LotStore for DiskStore {
    fn create_portfolio(&self, name: &str) -> Result<()> {
        if name.is_empty() || name.contains(SEP) {
            bail!("Invalid portfolio name");
        }
        if self.portfolios.contains_key(name)? {
            bail!("Portfolio '{name}' already exists");
        }
        self.portfolios.insert(name, "")?;
        debug!(portfolio = name, "Created portfolio");
        Ok(())
    }

    fn remove_portfolio(&self, name: &str) -> Result<bool> {
        if !self.portfolios.contains_key(name)? {
            return Ok(false);
        }
        for key in self.matching_keys(&Self::lot_prefix(name))? {
            self.lots.remove(key)?;
        }
        self.portfolios.remove(name)?;
        debug!(portfolio = name, "Removed portfolio and its lots");
        Ok(true)
    }

    fn portfolio_exists(&self, name: &str) -> Result<bool> {
        Ok(self.portfolios.contains_key(name)?)
    }

    fn portfolios(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for item in self.portfolios.iter() {
            let (key, _) = item?;
            names.push(String::from_utf8_lossy(&key).into_owned());
        }
        names.sort();
        Ok(names)
    }

    fn insert_lot(&self, lot: &Lot) -> Result<()> {
        if !self.portfolios.contains_key(&lot.portfolio)? {
            bail!("Portfolio '{}' does not exist", lot.portfolio);
        }
        if lot.symbol.is_empty() || lot.symbol.contains(SEP) {
            bail!("Invalid symbol");
        }

        // Duplicate purchases (same symbol, date and price) get distinct
        // trailing sequence numbers under the shared prefix.
        let prefix = Self::purchase_prefix(
            &lot.portfolio,
            &lot.symbol,
            lot.purchase_date,
            lot.purchase_price,
        );
        let seq = self.matching_keys(&prefix)?.len();
        let key = format!("{prefix}{seq:06}");
        self.lots.insert(key, serde_json::to_vec(lot)?)?;
        debug!(portfolio = %lot.portfolio, symbol = %lot.symbol, "Stored lot");
        Ok(())
    }

    fn list_lots(&self, portfolio: &str) -> Result<Vec<Lot>> {
        let mut lots = Vec::new();
        for item in self.lots.prefix(Self::lot_prefix(portfolio)) {
            let (_, value) = item?;
            lots.push(serde_json::from_slice(&value)?);
        }
        Ok(lots)
    }

    fn delete_lots(
        &self,
        portfolio: &str,
        symbol: &str,
        date: NaiveDate,
        price: f64,
    ) -> Result<usize> {
        let keys = self.matching_keys(&Self::purchase_prefix(portfolio, symbol, date, price))?;
        let removed = keys.len();
        for key in keys {
            self.lots.remove(key)?;
        }
        debug!(portfolio, symbol, removed, "Deleted lots");
        Ok(removed)
    }
}
