// crates/tally-chain/src/registration_pool.rs
//
// Registration pool: pays a staged bonus to each newly registered account.

use tally_core::error::{Result, TallyError};
use tally_core::protocol::ONE_HUNDRED_PERCENT;
use tally_core::{Asset, Symbol};

use crate::objects::{RegistrationPoolObject, RegistrationStage};
use crate::service::{expect_credit, RegistrationPool, ServiceBase};

pub type RegistrationPoolService = ServiceBase<RegistrationPool>;

impl RegistrationPoolObject {
    /// Pay out one registration bonus.
    ///
    /// The bonus is `maximum_bonus * stage_percent / 100%`, clamped to the
    /// remaining balance. Every call counts as one registration, even once the
    /// pool is empty.
    pub fn allocate_cash(&mut self) -> Result<Asset> {
        let wanted = self
            .maximum_bonus
            .mul_div(self.current_bonus_percent(), ONE_HUNDRED_PERCENT)?;
        let bonus = wanted.try_min(self.balance)?.try_max(Asset::zero(Symbol::Scr))?;
        self.balance = self.balance.checked_sub(bonus)?;
        self.already_allocated_count = self.already_allocated_count.saturating_add(1);
        Ok(bonus)
    }
}

impl ServiceBase<RegistrationPool> {
    /// Create the pool.
    ///
    /// # Errors
    /// `InvalidState` for a stage with a percent outside `0..=100%`,
    /// `InvalidSymbol`/`NegativeDelta` for malformed supply or bonus.
    pub fn create_pool(
        &self,
        supply: Asset,
        maximum_bonus: Asset,
        schedule: Vec<RegistrationStage>,
    ) -> Result<RegistrationPoolObject> {
        expect_credit(supply, Symbol::Scr)?;
        expect_credit(maximum_bonus, Symbol::Scr)?;
        if let Some(stage) = schedule
            .iter()
            .find(|s| !(0..=ONE_HUNDRED_PERCENT).contains(&s.bonus_percent))
        {
            return Err(TallyError::InvalidState(format!(
                "Registration stage bonus {} out of range",
                stage.bonus_percent
            )));
        }
        self.create(|| RegistrationPoolObject {
            balance: supply,
            maximum_bonus,
            schedule,
            already_allocated_count: 0,
        })
    }

    /// Pay out one registration bonus from the pool.
    pub fn allocate_cash(&self) -> Result<Asset> {
        self.update(|pool| pool.allocate_cash())
    }
}
