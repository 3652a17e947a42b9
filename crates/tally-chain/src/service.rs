// crates/tally-chain/src/service.rs
//
// Object service base: existence checks, single-instance creation, and the
// transactional update path for singleton ledger objects.
//
// Each singleton kind is a zero-sized tag implementing `Singleton`, which
// selects its slot in `LedgerState`. `ServiceBase<T>` is the one generic
// accessor; kind-specific operations (balancer, dev pool, funds, ...) are
// inherent impls on `ServiceBase<Tag>` in their own modules.
//
// `update` never hands out a reference into shared state: it clones the
// object, applies the mutator to the copy, and commits the copy only if the
// mutator succeeded. A failed mutator leaves the object untouched.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use tally_core::error::{Result, TallyError};
use tally_core::{Asset, Symbol};
use tally_store::ObjectDatabase;

use crate::objects::{
    BudgetObject, ContentRewardFundObject, DevPoolObject, DynamicGlobalPropertyObject,
    HardforkPropertyObject, LedgerState, RegistrationPoolObject, RewardBalancerObject,
};

/// The lock-guarded ledger shared by every service.
pub type LedgerDatabase = ObjectDatabase<LedgerState>;

/// A ledger object kind with exactly one instance once created.
pub trait Singleton: 'static {
    type Object: Clone + fmt::Debug;

    /// Human-readable kind name used in errors and logs.
    const NAME: &'static str;

    fn slot(state: &LedgerState) -> &Option<Self::Object>;

    fn slot_mut(state: &mut LedgerState) -> &mut Option<Self::Object>;

    /// Borrow the instance from a state the caller already holds a lock on.
    fn get_in(state: &LedgerState) -> Result<&Self::Object> {
        Self::slot(state)
            .as_ref()
            .ok_or_else(|| TallyError::ObjectNotFound(Self::NAME.to_string()))
    }
}

macro_rules! singleton {
    ($(#[$doc:meta])* $tag:ident, $object:ty, $field:ident, $name:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy)]
        pub struct $tag;

        impl Singleton for $tag {
            type Object = $object;
            const NAME: &'static str = $name;

            fn slot(state: &LedgerState) -> &Option<$object> {
                &state.$field
            }

            fn slot_mut(state: &mut LedgerState) -> &mut Option<$object> {
                &mut state.$field
            }
        }
    };
}

singleton!(
    /// Chain-wide dynamic properties.
    DynamicGlobalProperty,
    DynamicGlobalPropertyObject,
    dynamic_global_property,
    "dynamic_global_property"
);
singleton!(
    /// Current and scheduled hardfork versions.
    HardforkProperty,
    HardforkPropertyObject,
    hardfork_property,
    "hardfork_property"
);
singleton!(
    /// Balancer feeding SCR content rewards.
    ContentRewardBalancerScr,
    RewardBalancerObject,
    content_reward_balancer_scr,
    "content_reward_balancer_scr"
);
singleton!(
    /// Balancer feeding SP content rewards.
    ContentRewardBalancerSp,
    RewardBalancerObject,
    content_reward_balancer_sp,
    "content_reward_balancer_sp"
);
singleton!(
    ContentRewardFundScr,
    ContentRewardFundObject,
    content_reward_fund_scr,
    "content_reward_fund_scr"
);
singleton!(
    ContentRewardFundSp,
    ContentRewardFundObject,
    content_reward_fund_sp,
    "content_reward_fund_sp"
);
singleton!(
    /// SP fund paying out the FIFA World Cup 2018 bounty.
    FifaWorldCup2018BountyRewardFund,
    ContentRewardFundObject,
    fifa_world_cup_2018_bounty_reward_fund,
    "fifa_world_cup_2018_bounty_reward_fund"
);
singleton!(DevPool, DevPoolObject, dev_pool, "dev_pool");
singleton!(
    RegistrationPool,
    RegistrationPoolObject,
    registration_pool,
    "registration_pool"
);
singleton!(
    /// The SP fund budget created at genesis.
    FundBudget,
    BudgetObject,
    fund_budget,
    "fund_budget"
);

/// Reject credits in the wrong symbol or with a negative amount.
pub(crate) fn expect_credit(delta: Asset, expected: Symbol) -> Result<()> {
    if delta.symbol != expected {
        return Err(TallyError::InvalidSymbol {
            expected,
            actual: delta.symbol,
        });
    }
    if delta.is_negative() {
        return Err(TallyError::NegativeDelta(delta));
    }
    Ok(())
}

/// Generic accessor for one singleton kind.
pub struct ServiceBase<T> {
    db: Arc<LedgerDatabase>,
    _kind: PhantomData<fn() -> T>,
}

impl<T: Singleton> ServiceBase<T> {
    pub(crate) fn new(db: Arc<LedgerDatabase>) -> Self {
        Self {
            db,
            _kind: PhantomData,
        }
    }

    /// A copy of the instance.
    ///
    /// # Errors
    /// `ObjectNotFound` if the singleton has not been created.
    pub fn get(&self) -> Result<T::Object> {
        self.db.with_read_lock(|state| T::get_in(state).cloned())
    }

    /// Whether the singleton has been created.
    pub fn is_exists(&self) -> bool {
        self.db.with_read_lock(|state| T::slot(state).is_some())
    }

    /// Create the one instance of this kind.
    ///
    /// # Errors
    /// `AlreadyExists` if an instance is already present.
    pub fn create(&self, init: impl FnOnce() -> T::Object) -> Result<T::Object> {
        let created = self.db.with_write_lock(|state| {
            let slot = T::slot_mut(state);
            if slot.is_some() {
                return Err(TallyError::AlreadyExists(T::NAME.to_string()));
            }
            let object = init();
            *slot = Some(object.clone());
            Ok(object)
        })?;
        tracing::info!("Created {}: {:?}", T::NAME, created);
        Ok(created)
    }

    /// Apply `mutator` to a copy of the instance and commit the copy.
    ///
    /// The mutator's result is returned. If the mutator fails, nothing is
    /// written.
    ///
    /// # Errors
    /// `ObjectNotFound` if the singleton has not been created, or whatever
    /// error the mutator returns.
    pub fn update<R>(&self, mutator: impl FnOnce(&mut T::Object) -> Result<R>) -> Result<R> {
        self.db.with_write_lock(|state| -> Result<R> {
            let mut next = T::get_in(state)?.clone();
            let out = mutator(&mut next)?;
            *T::slot_mut(state) = Some(next);
            Ok(out)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> ServiceBase<DevPool> {
        ServiceBase::new(Arc::new(LedgerDatabase::new(LedgerState::default())))
    }

    fn empty_pool() -> DevPoolObject {
        DevPoolObject {
            scr_balance: Asset::scr(0),
            sp_balance: Asset::sp(0),
        }
    }

    #[test]
    fn test_get_before_create_fails() {
        let svc = service();
        assert!(!svc.is_exists());
        assert_eq!(
            svc.get().unwrap_err(),
            TallyError::ObjectNotFound("dev_pool".to_string())
        );
    }

    #[test]
    fn test_create_once() {
        let svc = service();
        svc.create(empty_pool).unwrap();
        assert!(svc.is_exists());
        assert!(matches!(
            svc.create(empty_pool),
            Err(TallyError::AlreadyExists(_))
        ));
    }

    #[test]
    fn test_update_visible_to_get() {
        let svc = service();
        svc.create(empty_pool).unwrap();
        svc.update(|pool| {
            pool.scr_balance = Asset::scr(42);
            Ok(())
        })
        .unwrap();
        assert_eq!(svc.get().unwrap().scr_balance, Asset::scr(42));
    }

    #[test]
    fn test_failed_update_writes_nothing() {
        let svc = service();
        svc.create(empty_pool).unwrap();
        let result: Result<()> = svc.update(|pool| {
            pool.scr_balance = Asset::scr(42);
            Err(TallyError::InvalidState("rejected".to_string()))
        });
        assert!(result.is_err());
        assert_eq!(svc.get().unwrap().scr_balance, Asset::scr(0));
    }

    #[test]
    fn test_update_missing_object() {
        let svc = service();
        let result = svc.update(|_| Ok(()));
        assert!(matches!(result, Err(TallyError::ObjectNotFound(_))));
    }
}
