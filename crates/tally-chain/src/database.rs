// crates/tally-chain/src/database.rs
//
// Chain database: the ledger, the registry of object services, and block
// application.
//
// Each block is applied inside one undo session, which holds the ledger's
// writer gate for the whole block. If any step fails (a missing witness
// account, an overflowing balance, an unknown budget), the session is rolled
// back, the ledger is left exactly as it was before the block, and the error
// is returned to the producer.
//
// The read-only accessors here (`with_read_lock`, `snapshot`, head queries,
// `active_reward_sources`) see the last committed ledger only: never a block
// in progress, never a block that was rolled back.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tally_core::error::{Result, TallyError};
use tally_core::{AccountName, BlockId, ChainId, Version};

use crate::account::AccountService;
use crate::budget::BudgetService;
use crate::dev_pool::DevPoolService;
use crate::distribution::{distribute, RewardSource, SourceEmission, VirtualOperation};
use crate::dynamic_global_property::DynamicGlobalPropertyService;
use crate::genesis::{apply_genesis, GenesisConfig};
use crate::hardfork_property::HardforkPropertyService;
use crate::objects::LedgerState;
use crate::registration_pool::RegistrationPoolService;
use crate::reward_balancer::RewardBalancerService;
use crate::reward_fund::RewardFundService;
use crate::service::{
    ContentRewardBalancerScr, ContentRewardBalancerSp, ContentRewardFundScr, ContentRewardFundSp,
    DynamicGlobalProperty, FifaWorldCup2018BountyRewardFund, LedgerDatabase, ServiceBase, Singleton,
};

/// The block being applied, as seen by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockContext {
    pub number: u64,
    pub id: BlockId,
    pub timestamp: DateTime<Utc>,
    /// Producer of the block; receives the witness share of every emission.
    pub witness: AccountName,
    pub aslot: u64,
}

/// Result of applying one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockReport {
    pub number: u64,
    pub id: BlockId,
    pub emissions: Vec<SourceEmission>,
    pub operations: Vec<VirtualOperation>,
    pub released_bonuses: usize,
    pub activated_hardfork: Option<Version>,
}

/// One service per ledger object kind, all sharing the same ledger.
pub struct Services {
    pub(crate) db: Arc<LedgerDatabase>,
    pub dynamic_global_property: DynamicGlobalPropertyService,
    pub hardfork_property: HardforkPropertyService,
    pub reward_balancer_scr: RewardBalancerService<ContentRewardBalancerScr>,
    pub reward_balancer_sp: RewardBalancerService<ContentRewardBalancerSp>,
    pub reward_fund_scr: RewardFundService<ContentRewardFundScr>,
    pub reward_fund_sp: RewardFundService<ContentRewardFundSp>,
    pub reward_fund_bounty: RewardFundService<FifaWorldCup2018BountyRewardFund>,
    pub dev_pool: DevPoolService,
    pub registration_pool: RegistrationPoolService,
    pub budgets: BudgetService,
    pub accounts: AccountService,
}

impl Services {
    fn new(db: Arc<LedgerDatabase>) -> Self {
        Self {
            dynamic_global_property: ServiceBase::new(db.clone()),
            hardfork_property: ServiceBase::new(db.clone()),
            reward_balancer_scr: ServiceBase::new(db.clone()),
            reward_balancer_sp: ServiceBase::new(db.clone()),
            reward_fund_scr: ServiceBase::new(db.clone()),
            reward_fund_sp: ServiceBase::new(db.clone()),
            reward_fund_bounty: ServiceBase::new(db.clone()),
            dev_pool: ServiceBase::new(db.clone()),
            registration_pool: ServiceBase::new(db.clone()),
            budgets: BudgetService::new(db.clone()),
            accounts: AccountService::new(db.clone()),
            db,
        }
    }
}

/// The ledger plus everything needed to apply blocks to it.
pub struct ChainDatabase {
    db: Arc<LedgerDatabase>,
    services: Services,
}

impl ChainDatabase {
    /// Wrap an existing ledger state, e.g. one restored from a checkpoint.
    pub fn from_state(state: LedgerState) -> Self {
        let db = Arc::new(LedgerDatabase::new(state));
        Self {
            services: Services::new(db.clone()),
            db,
        }
    }

    /// Build a fresh ledger from a genesis configuration.
    ///
    /// # Errors
    /// Any validation error of `config`.
    pub fn open_genesis(config: &GenesisConfig) -> Result<Self> {
        let chain = Self::from_state(LedgerState {
            chain_id: config.chain_id(),
            ..LedgerState::default()
        });
        chain
            .db
            .transaction(|| apply_genesis(&chain.services, config))?;
        Ok(chain)
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    /// Run `f` against the last committed ledger.
    ///
    /// Never waits on, or observes, a block being applied.
    pub fn with_read_lock<R>(&self, f: impl FnOnce(&LedgerState) -> R) -> R {
        self.db.with_committed(f)
    }

    /// A copy of the committed ledger, for checkpointing.
    pub fn snapshot(&self) -> LedgerState {
        self.db.snapshot()
    }

    pub fn chain_id(&self) -> ChainId {
        self.with_read_lock(|state| state.chain_id)
    }

    pub fn head_block_num(&self) -> Result<u64> {
        self.with_read_lock(|state| {
            DynamicGlobalProperty::get_in(state).map(|dgp| dgp.head_block_number)
        })
    }

    pub fn head_block_id(&self) -> Result<BlockId> {
        self.with_read_lock(|state| DynamicGlobalProperty::get_in(state).map(|dgp| dgp.head_block_id))
    }

    /// Sources that emit in the next block: the fund budget, every open
    /// advertising budget by ascending id, then each balancer.
    pub fn active_reward_sources(&self) -> Vec<RewardSource> {
        self.with_read_lock(|state| {
            let mut sources = Vec::new();
            if state.fund_budget.is_some() {
                sources.push(RewardSource::FundBudget);
            }
            sources.extend(
                state
                    .advertising_budgets
                    .keys()
                    .map(|&id| RewardSource::AdvertisingBudget(id)),
            );
            if state.content_reward_balancer_scr.is_some() {
                sources.push(RewardSource::ContentRewardBalancerScr);
            }
            if state.content_reward_balancer_sp.is_some() {
                sources.push(RewardSource::ContentRewardBalancerSp);
            }
            sources
        })
    }

    /// Apply `block`, distributing rewards from `sources`.
    ///
    /// All-or-nothing: on error the ledger is restored to its pre-block state.
    /// Other writers wait for the block to finish; committed readers see the
    /// ledger before or after it, nothing in between.
    ///
    /// # Errors
    /// `InvalidState` if `block` does not extend the head; otherwise the first
    /// error raised by any step of the block.
    pub fn apply_block(&self, block: &BlockContext, sources: &[RewardSource]) -> Result<BlockReport> {
        let session = self.db.start_undo_session();
        match self.apply_block_steps(block, sources) {
            Ok(report) => {
                session.commit();
                tracing::debug!(
                    "Applied block {} ({} sources, {} virtual ops)",
                    block.number,
                    report.emissions.len(),
                    report.operations.len()
                );
                Ok(report)
            }
            Err(e) => {
                session.undo();
                tracing::warn!("Block {} rejected, ledger rolled back: {}", block.number, e);
                Err(e)
            }
        }
    }

    fn apply_block_steps(&self, block: &BlockContext, sources: &[RewardSource]) -> Result<BlockReport> {
        let head = self.services.dynamic_global_property.get()?.head_block_number;
        if block.number != head.saturating_add(1) {
            return Err(TallyError::InvalidState(format!(
                "Block {} does not extend head {}",
                block.number, head
            )));
        }

        self.services.dynamic_global_property.record_block(block)?;
        let activated_hardfork = self.services.hardfork_property.activate_due(block.timestamp)?;
        let released_bonuses = self.services.accounts.release_expired_bonuses(block.number).len();
        let distribution = distribute(&self.services, block, sources)?;

        Ok(BlockReport {
            number: block.number,
            id: block.id,
            emissions: distribution.emissions,
            operations: distribution.operations,
            released_bonuses,
            activated_hardfork,
        })
    }
}
