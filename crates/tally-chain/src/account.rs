// crates/tally-chain/src/account.rs
//
// Account service: keyed account objects and their registration bonus records.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use tally_core::error::{Result, TallyError};
use tally_core::protocol::REGISTRATION_BONUS_LOCK_BLOCKS;
use tally_core::{AccountName, Asset, Symbol};

use crate::objects::{AccountObject, LedgerState, RegistrationBonusObject};
use crate::service::{
    expect_credit, DynamicGlobalProperty, LedgerDatabase, RegistrationPool, Singleton,
};

/// Service over keyed account objects.
pub struct AccountService {
    db: Arc<LedgerDatabase>,
}

impl AccountService {
    pub(crate) fn new(db: Arc<LedgerDatabase>) -> Self {
        Self { db }
    }

    /// Create an empty account.
    ///
    /// # Errors
    /// `AlreadyExists` if the name is taken.
    pub fn create_account(&self, name: &AccountName, created: DateTime<Utc>) -> Result<AccountObject> {
        let account = self.db.with_write_lock(|state| insert_account(state, name, created))?;
        tracing::info!("Account created: {}", name);
        Ok(account)
    }

    /// Create an account and pay it the current registration bonus as
    /// scorumpower, recording the bonus until it expires.
    ///
    /// Returns the bonus paid (zero once the pool is empty).
    pub fn create_account_with_bonus(
        &self,
        name: &AccountName,
        created: DateTime<Utc>,
        head_block: u64,
    ) -> Result<Asset> {
        let bonus = self.db.with_write_lock(|state| -> Result<Asset> {
            if state.accounts.contains_key(name) {
                return Err(TallyError::AlreadyExists(format!("account {}", name)));
            }

            let mut pool = RegistrationPool::get_in(state)?.clone();
            let bonus = pool.allocate_cash()?.convert_to(Symbol::Sp);

            let mut account = AccountObject::new(name.clone(), created);
            account.scorumpower = account.scorumpower.checked_add(bonus)?;

            let mut dgp = DynamicGlobalProperty::get_in(state)?.clone();
            dgp.total_scorumpower = dgp.total_scorumpower.checked_add(bonus)?;
            dgp.circulating_capital = dgp
                .circulating_capital
                .checked_add(bonus.convert_to(Symbol::Scr))?;

            *RegistrationPool::slot_mut(state) = Some(pool);
            *DynamicGlobalProperty::slot_mut(state) = Some(dgp);
            state.accounts.insert(name.clone(), account);
            if !bonus.is_zero() {
                state.registration_bonuses.insert(
                    name.clone(),
                    RegistrationBonusObject {
                        account: name.clone(),
                        bonus,
                        expires: head_block.saturating_add(REGISTRATION_BONUS_LOCK_BLOCKS),
                    },
                );
            }
            Ok(bonus)
        })?;

        tracing::info!("Account created with registration bonus: {} ({})", name, bonus);
        Ok(bonus)
    }

    pub fn is_exists(&self, name: &AccountName) -> bool {
        self.db.with_read_lock(|state| state.accounts.contains_key(name))
    }

    /// A copy of the named account.
    ///
    /// # Errors
    /// `ObjectNotFound` if no such account exists.
    pub fn get_account(&self, name: &AccountName) -> Result<AccountObject> {
        self.db
            .with_read_lock(|state| get_in(state, name).cloned())
    }

    /// All accounts in name order.
    pub fn accounts(&self) -> Vec<AccountObject> {
        self.db
            .with_read_lock(|state| state.accounts.values().cloned().collect())
    }

    /// Credit the liquid balance; returns the new balance.
    pub fn increase_balance(&self, name: &AccountName, delta: Asset) -> Result<Asset> {
        expect_credit(delta, Symbol::Scr)?;
        self.update(name, |account| {
            account.balance = account.balance.checked_add(delta)?;
            Ok(account.balance)
        })
    }

    /// Debit the liquid balance; returns the new balance.
    ///
    /// # Errors
    /// `NegativeBalance` if the account holds less than `delta`.
    pub fn decrease_balance(&self, name: &AccountName, delta: Asset) -> Result<Asset> {
        expect_credit(delta, Symbol::Scr)?;
        self.update(name, |account| debit(account, delta))
    }

    /// Credit scorumpower; returns the new scorumpower.
    pub fn increase_scorumpower(&self, name: &AccountName, delta: Asset) -> Result<Asset> {
        expect_credit(delta, Symbol::Sp)?;
        self.update(name, |account| {
            account.scorumpower = account.scorumpower.checked_add(delta)?;
            Ok(account.scorumpower)
        })
    }

    /// Credit the liquid balance or scorumpower, whichever matches `delta`.
    pub fn credit(&self, name: &AccountName, delta: Asset) -> Result<Asset> {
        match delta.symbol {
            Symbol::Scr => self.increase_balance(name, delta),
            Symbol::Sp => self.increase_scorumpower(name, delta),
        }
    }

    /// The registration bonus record of an account, if any.
    pub fn registration_bonus(&self, name: &AccountName) -> Option<RegistrationBonusObject> {
        self.db
            .with_read_lock(|state| state.registration_bonuses.get(name).cloned())
    }

    /// Drop the registration bonus record of an account if there is one.
    pub fn remove_if_exist(&self, name: &AccountName) {
        self.db.with_write_lock(|state| {
            state.registration_bonuses.remove(name);
        });
    }

    /// Drop every bonus record expiring at or before `head_block`; returns the
    /// released records.
    pub fn release_expired_bonuses(&self, head_block: u64) -> Vec<RegistrationBonusObject> {
        let released: Vec<RegistrationBonusObject> = self.db.with_write_lock(|state| {
            let expired: Vec<AccountName> = state
                .registration_bonuses
                .values()
                .filter(|b| b.expires <= head_block)
                .map(|b| b.account.clone())
                .collect();
            expired
                .iter()
                .filter_map(|name| state.registration_bonuses.remove(name))
                .collect()
        });
        for bonus in &released {
            tracing::debug!("Registration bonus released: {} ({})", bonus.account, bonus.bonus);
        }
        released
    }

    fn update<R>(
        &self,
        name: &AccountName,
        mutator: impl FnOnce(&mut AccountObject) -> Result<R>,
    ) -> Result<R> {
        self.db.with_write_lock(|state| -> Result<R> {
            let mut next = get_in(state, name)?.clone();
            let out = mutator(&mut next)?;
            state.accounts.insert(name.clone(), next);
            Ok(out)
        })
    }
}

/// Borrow an account from a state the caller already holds a lock on.
pub(crate) fn get_in<'a>(state: &'a LedgerState, name: &AccountName) -> Result<&'a AccountObject> {
    state
        .accounts
        .get(name)
        .ok_or_else(|| TallyError::ObjectNotFound(format!("account {}", name)))
}

pub(crate) fn insert_account(
    state: &mut LedgerState,
    name: &AccountName,
    created: DateTime<Utc>,
) -> Result<AccountObject> {
    if state.accounts.contains_key(name) {
        return Err(TallyError::AlreadyExists(format!("account {}", name)));
    }
    let account = AccountObject::new(name.clone(), created);
    state.accounts.insert(name.clone(), account.clone());
    Ok(account)
}

pub(crate) fn debit(account: &mut AccountObject, delta: Asset) -> Result<Asset> {
    let next = account.balance.checked_sub(delta)?;
    if next.is_negative() {
        return Err(TallyError::NegativeBalance(format!(
            "account {} holds {}, cannot debit {}",
            account.name, account.balance, delta
        )));
    }
    account.balance = next;
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::objects::{DynamicGlobalPropertyObject, RegistrationPoolObject, RegistrationStage};
    use tally_core::{BlockId, ChainProperties, Version};

    fn name(s: &str) -> AccountName {
        AccountName::new(s).unwrap()
    }

    fn service() -> AccountService {
        AccountService::new(Arc::new(LedgerDatabase::new(LedgerState::default())))
    }

    fn service_with_registration(balance: i64, max_bonus: i64) -> AccountService {
        let mut state = LedgerState::default();
        state.registration_pool = Some(RegistrationPoolObject {
            balance: Asset::scr(balance),
            maximum_bonus: Asset::scr(max_bonus),
            schedule: vec![RegistrationStage {
                users: 10,
                bonus_percent: 10_000,
            }],
            already_allocated_count: 0,
        });
        state.dynamic_global_property = Some(DynamicGlobalPropertyObject {
            head_block_id: BlockId::default(),
            head_block_number: 0,
            last_irreversible_block_num: 0,
            current_aslot: 0,
            time: DateTime::<Utc>::UNIX_EPOCH,
            current_witness: name("initdelegate"),
            total_supply: Asset::scr(1_000_000),
            circulating_capital: Asset::scr(0),
            total_scorumpower: Asset::sp(0),
            median_chain_props: ChainProperties::default(),
            majority_version: Version::default(),
        });
        AccountService::new(Arc::new(LedgerDatabase::new(state)))
    }

    #[test]
    fn test_create_and_get() {
        let svc = service();
        svc.create_account(&name("alice"), DateTime::<Utc>::UNIX_EPOCH).unwrap();
        assert!(svc.is_exists(&name("alice")));
        let alice = svc.get_account(&name("alice")).unwrap();
        assert_eq!(alice.balance, Asset::scr(0));
        assert_eq!(alice.scorumpower, Asset::sp(0));
        assert!(matches!(
            svc.create_account(&name("alice"), DateTime::<Utc>::UNIX_EPOCH),
            Err(TallyError::AlreadyExists(_))
        ));
        assert!(matches!(
            svc.get_account(&name("bob")),
            Err(TallyError::ObjectNotFound(_))
        ));
    }

    #[test]
    fn test_credit_routes_by_symbol() {
        let svc = service();
        let alice = name("alice");
        svc.create_account(&alice, DateTime::<Utc>::UNIX_EPOCH).unwrap();
        svc.credit(&alice, Asset::scr(10)).unwrap();
        svc.credit(&alice, Asset::sp(4)).unwrap();
        let account = svc.get_account(&alice).unwrap();
        assert_eq!(account.balance, Asset::scr(10));
        assert_eq!(account.scorumpower, Asset::sp(4));
    }

    #[test]
    fn test_decrease_balance_never_negative() {
        let svc = service();
        let alice = name("alice");
        svc.create_account(&alice, DateTime::<Utc>::UNIX_EPOCH).unwrap();
        svc.increase_balance(&alice, Asset::scr(5)).unwrap();
        assert!(matches!(
            svc.decrease_balance(&alice, Asset::scr(6)),
            Err(TallyError::NegativeBalance(_))
        ));
        assert_eq!(svc.decrease_balance(&alice, Asset::scr(5)).unwrap(), Asset::scr(0));
    }

    #[test]
    fn test_registration_bonus_paid_and_clamped() {
        let svc = service_with_registration(150, 100);
        let alice = name("alice");
        let bob = name("bob");

        assert_eq!(
            svc.create_account_with_bonus(&alice, DateTime::<Utc>::UNIX_EPOCH, 1).unwrap(),
            Asset::sp(100)
        );
        // Only 50 left in the pool.
        assert_eq!(
            svc.create_account_with_bonus(&bob, DateTime::<Utc>::UNIX_EPOCH, 1).unwrap(),
            Asset::sp(50)
        );
        assert_eq!(svc.get_account(&alice).unwrap().scorumpower, Asset::sp(100));
        assert_eq!(svc.registration_bonus(&bob).unwrap().bonus, Asset::sp(50));
    }

    #[test]
    fn test_release_expired_bonuses() {
        let svc = service_with_registration(1_000, 100);
        let alice = name("alice");
        svc.create_account_with_bonus(&alice, DateTime::<Utc>::UNIX_EPOCH, 10).unwrap();

        assert!(svc.release_expired_bonuses(10).is_empty());
        let released = svc.release_expired_bonuses(10 + REGISTRATION_BONUS_LOCK_BLOCKS);
        assert_eq!(released.len(), 1);
        assert!(svc.registration_bonus(&alice).is_none());
        // The scorumpower stays with the account.
        assert_eq!(svc.get_account(&alice).unwrap().scorumpower, Asset::sp(100));
    }

    #[test]
    fn test_remove_if_exist() {
        let svc = service_with_registration(1_000, 100);
        let alice = name("alice");
        svc.remove_if_exist(&alice);
        svc.create_account_with_bonus(&alice, DateTime::<Utc>::UNIX_EPOCH, 10).unwrap();
        svc.remove_if_exist(&alice);
        assert!(svc.registration_bonus(&alice).is_none());
    }
}
