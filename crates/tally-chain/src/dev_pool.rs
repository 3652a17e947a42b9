// crates/tally-chain/src/dev_pool.rs
//
// Development pool: receives the dev-team skim of advertising emission.

use tally_core::error::Result;
use tally_core::{Asset, Symbol};

use crate::objects::DevPoolObject;
use crate::service::{expect_credit, DevPool, ServiceBase};

pub type DevPoolService = ServiceBase<DevPool>;

impl ServiceBase<DevPool> {
    /// Create the pool with its genesis balances.
    pub fn create_pool(&self, scr_balance: Asset, sp_balance: Asset) -> Result<DevPoolObject> {
        expect_credit(scr_balance, Symbol::Scr)?;
        expect_credit(sp_balance, Symbol::Sp)?;
        self.create(|| DevPoolObject {
            scr_balance,
            sp_balance,
        })
    }

    /// Credit the liquid balance; returns the new balance.
    pub fn increase_scr_balance(&self, delta: Asset) -> Result<Asset> {
        expect_credit(delta, Symbol::Scr)?;
        self.update(|pool| {
            pool.scr_balance = pool.scr_balance.checked_add(delta)?;
            Ok(pool.scr_balance)
        })
    }

    /// Credit the scorumpower balance; returns the new balance.
    pub fn increase_sp_balance(&self, delta: Asset) -> Result<Asset> {
        expect_credit(delta, Symbol::Sp)?;
        self.update(|pool| {
            pool.sp_balance = pool.sp_balance.checked_add(delta)?;
            Ok(pool.sp_balance)
        })
    }

    /// Credit whichever balance matches the symbol of `delta`.
    pub fn increase_balance(&self, delta: Asset) -> Result<Asset> {
        match delta.symbol {
            Symbol::Scr => self.increase_scr_balance(delta),
            Symbol::Sp => self.increase_sp_balance(delta),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use tally_core::TallyError;

    use crate::objects::LedgerState;
    use crate::service::LedgerDatabase;

    fn pool() -> DevPoolService {
        let svc: DevPoolService = ServiceBase::new(Arc::new(LedgerDatabase::new(LedgerState::default())));
        svc.create_pool(Asset::scr(0), Asset::sp(0)).unwrap();
        svc
    }

    #[test]
    fn test_increase_by_symbol() {
        let svc = pool();
        svc.increase_balance(Asset::scr(5)).unwrap();
        svc.increase_balance(Asset::sp(3)).unwrap();
        let p = svc.get().unwrap();
        assert_eq!(p.scr_balance, Asset::scr(5));
        assert_eq!(p.sp_balance, Asset::sp(3));
    }

    #[test]
    fn test_rejects_wrong_symbol_and_negative() {
        let svc = pool();
        assert!(matches!(
            svc.increase_scr_balance(Asset::sp(1)),
            Err(TallyError::InvalidSymbol { .. })
        ));
        assert!(matches!(
            svc.increase_sp_balance(Asset::sp(-1)),
            Err(TallyError::NegativeDelta(_))
        ));
    }
}
