//! LMDB implementation of PortfolioStore.

use siglink_store::portfolio::{PortfolioRecord, PortfolioStore};
use siglink_store::StoreError;
use siglink_types::IdentityId;

use crate::environment::{decode, encode};
use crate::{LmdbError, LmdbStore};

impl PortfolioStore for LmdbStore {
    fn get_portfolio(
        &self,
        identity: &IdentityId,
    ) -> Result<Option<PortfolioRecord>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let found = self
            .portfolios_db
            .get(&rtxn, identity.as_str().as_bytes())
            .map_err(LmdbError::from)?;
        match found {
            Some(bytes) => Ok(Some(decode(bytes)?)),
            None => Ok(None),
        }
    }

    fn put_portfolio(&self, record: &PortfolioRecord) -> Result<(), StoreError> {
        let bytes = encode(record)?;
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.portfolios_db
            .put(&mut wtxn, record.identity.as_str().as_bytes(), &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn iter_portfolios(&self) -> Result<Vec<PortfolioRecord>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let iter = self.portfolios_db.iter(&rtxn).map_err(LmdbError::from)?;
        let mut portfolios = Vec::new();
        for result in iter {
            let (_key, bytes) = result.map_err(LmdbError::from)?;
            portfolios.push(decode(bytes)?);
        }
        Ok(portfolios)
    }
}
