// crates/tally-chain/src/genesis.rs
//
// Genesis configuration and the initial ledger it produces.
//
// Everything the chain will ever emit is allocated here: the genesis accounts,
// the two content reward balancers, the SP fund budget, the registration pool,
// and the dev pool. Their sum (SP counted 1:1 as SCR) must not exceed the
// total supply.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use tally_core::error::{Result, TallyError};
use tally_core::protocol::{BLOCKS_PER_DAY, UNITS_PER_COIN};
use tally_core::{AccountName, Asset, BlockId, ChainId, ChainProperties, Symbol, Version};

use crate::database::Services;
use crate::objects::{AccountObject, DynamicGlobalPropertyObject, RegistrationStage};
use crate::service::expect_credit;

/// An account present from block zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisAccount {
    pub name: AccountName,
    #[serde(default = "zero_scr")]
    pub balance: Asset,
    #[serde(default = "zero_sp")]
    pub scorumpower: Asset,
}

/// Genesis parameters, usually read from the `[genesis]` table of the daemon
/// config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisConfig {
    /// Chain name; the chain id is its SHA-256.
    #[serde(default = "default_chain_name")]
    pub chain_name: String,

    #[serde(default = "default_genesis_time")]
    pub genesis_time: DateTime<Utc>,

    #[serde(default = "default_total_supply")]
    pub total_supply: Asset,

    /// Accounts created at genesis. The first one produces until witnesses
    /// are scheduled.
    #[serde(default = "default_accounts")]
    pub accounts: Vec<GenesisAccount>,

    /// Initial balance of the SCR content reward balancer.
    #[serde(default = "default_rewards_supply")]
    pub rewards_supply: Asset,

    /// Initial balance of the SP content reward balancer.
    #[serde(default = "zero_sp")]
    pub rewards_sp_supply: Asset,

    /// Balance of the SP fund budget.
    #[serde(default = "default_fund_budget_supply")]
    pub fund_budget_supply: Asset,

    /// Blocks over which the fund budget is spread.
    #[serde(default = "default_fund_budget_blocks")]
    pub fund_budget_blocks: u64,

    #[serde(default = "default_registration_supply")]
    pub registration_supply: Asset,

    #[serde(default = "default_registration_maximum_bonus")]
    pub registration_maximum_bonus: Asset,

    #[serde(default = "default_registration_schedule")]
    pub registration_schedule: Vec<RegistrationStage>,

    #[serde(default = "default_dev_pool_supply")]
    pub dev_pool_supply: Asset,

    #[serde(default)]
    pub hardfork_version: Version,

    #[serde(default)]
    pub chain_properties: ChainProperties,
}

fn coins(n: i64, symbol: Symbol) -> Asset {
    Asset::new(n * UNITS_PER_COIN, symbol)
}

fn zero_scr() -> Asset {
    Asset::zero(Symbol::Scr)
}

fn zero_sp() -> Asset {
    Asset::zero(Symbol::Sp)
}

fn default_chain_name() -> String {
    "tally-testnet".to_string()
}

fn default_genesis_time() -> DateTime<Utc> {
    // 2026-01-01T00:00:00Z
    DateTime::<Utc>::UNIX_EPOCH + Duration::days(20_454)
}

fn default_total_supply() -> Asset {
    coins(100_000_000, Symbol::Scr)
}

fn default_accounts() -> Vec<GenesisAccount> {
    match AccountName::new("initdelegate") {
        Ok(name) => vec![GenesisAccount {
            name,
            balance: zero_scr(),
            scorumpower: zero_sp(),
        }],
        Err(_) => Vec::new(),
    }
}

fn default_rewards_supply() -> Asset {
    coins(24_000_000, Symbol::Scr)
}

fn default_fund_budget_supply() -> Asset {
    coins(24_000_000, Symbol::Sp)
}

fn default_fund_budget_blocks() -> u64 {
    2 * 365 * BLOCKS_PER_DAY as u64
}

fn default_registration_supply() -> Asset {
    coins(10_000_000, Symbol::Scr)
}

fn default_registration_maximum_bonus() -> Asset {
    coins(5, Symbol::Scr)
}

fn default_registration_schedule() -> Vec<RegistrationStage> {
    [(100_000, 10_000), (200_000, 7_500), (400_000, 5_000), (800_000, 2_500)]
        .into_iter()
        .map(|(users, bonus_percent)| RegistrationStage { users, bonus_percent })
        .collect()
}

fn default_dev_pool_supply() -> Asset {
    coins(10_000_000, Symbol::Scr)
}

impl Default for GenesisConfig {
    fn default() -> Self {
        Self {
            chain_name: default_chain_name(),
            genesis_time: default_genesis_time(),
            total_supply: default_total_supply(),
            accounts: default_accounts(),
            rewards_supply: default_rewards_supply(),
            rewards_sp_supply: zero_sp(),
            fund_budget_supply: default_fund_budget_supply(),
            fund_budget_blocks: default_fund_budget_blocks(),
            registration_supply: default_registration_supply(),
            registration_maximum_bonus: default_registration_maximum_bonus(),
            registration_schedule: default_registration_schedule(),
            dev_pool_supply: default_dev_pool_supply(),
            hardfork_version: Version::default(),
            chain_properties: ChainProperties::default(),
        }
    }
}

impl GenesisConfig {
    pub fn chain_id(&self) -> ChainId {
        ChainId::from_name(&self.chain_name)
    }

    /// Supply held by genesis accounts, liquid and staked, counted in SCR.
    pub fn circulating_capital(&self) -> Result<Asset> {
        self.accounts.iter().try_fold(zero_scr(), |total, account| {
            total
                .checked_add(account.balance)?
                .checked_add(account.scorumpower.convert_to(Symbol::Scr))
        })
    }

    /// Everything allocated at genesis, counted in SCR.
    pub fn allocated_supply(&self) -> Result<Asset> {
        [
            self.rewards_supply,
            self.rewards_sp_supply.convert_to(Symbol::Scr),
            self.fund_budget_supply.convert_to(Symbol::Scr),
            self.registration_supply,
            self.dev_pool_supply,
        ]
        .into_iter()
        .try_fold(self.circulating_capital()?, |total, supply| total.checked_add(supply))
    }

    /// Check symbols, signs, and that the allocations fit in the total supply.
    ///
    /// # Errors
    /// `InvalidSymbol`/`NegativeDelta` for a malformed amount, `InvalidState`
    /// for an empty account list, an empty fund budget period, duplicate
    /// accounts, or an over-allocated supply.
    pub fn validate(&self) -> Result<()> {
        expect_credit(self.total_supply, Symbol::Scr)?;
        expect_credit(self.rewards_supply, Symbol::Scr)?;
        expect_credit(self.rewards_sp_supply, Symbol::Sp)?;
        expect_credit(self.fund_budget_supply, Symbol::Sp)?;
        expect_credit(self.registration_supply, Symbol::Scr)?;
        expect_credit(self.registration_maximum_bonus, Symbol::Scr)?;
        expect_credit(self.dev_pool_supply, Symbol::Scr)?;
        for account in &self.accounts {
            expect_credit(account.balance, Symbol::Scr)?;
            expect_credit(account.scorumpower, Symbol::Sp)?;
        }

        if self.accounts.is_empty() {
            return Err(TallyError::InvalidState(
                "Genesis needs at least one account".to_string(),
            ));
        }
        let mut names: Vec<&AccountName> = self.accounts.iter().map(|a| &a.name).collect();
        names.sort();
        if names.windows(2).any(|pair| pair[0] == pair[1]) {
            return Err(TallyError::InvalidState(
                "Duplicate genesis account".to_string(),
            ));
        }
        if self.fund_budget_blocks == 0 {
            return Err(TallyError::InvalidState(
                "Fund budget must span at least one block".to_string(),
            ));
        }

        let allocated = self.allocated_supply()?;
        if allocated > self.total_supply {
            return Err(TallyError::InvalidState(format!(
                "Genesis allocates {} of a total supply of {}",
                allocated, self.total_supply
            )));
        }
        Ok(())
    }
}

/// Populate an empty ledger from `config`.
pub(crate) fn apply_genesis(services: &Services, config: &GenesisConfig) -> Result<()> {
    config.validate()?;
    let now = config.genesis_time;

    let producer = config
        .accounts
        .first()
        .map(|a| a.name.clone())
        .ok_or_else(|| TallyError::InvalidState("Genesis needs at least one account".to_string()))?;

    let circulating_capital = config.circulating_capital()?;
    let total_scorumpower = config
        .accounts
        .iter()
        .try_fold(zero_sp(), |total, a| total.checked_add(a.scorumpower))?;

    services.dynamic_global_property.create(|| DynamicGlobalPropertyObject {
        head_block_id: BlockId::default(),
        head_block_number: 0,
        last_irreversible_block_num: 0,
        current_aslot: 0,
        time: now,
        current_witness: producer,
        total_supply: config.total_supply,
        circulating_capital,
        total_scorumpower,
        median_chain_props: config.chain_properties.clone(),
        majority_version: config.hardfork_version,
    })?;
    services
        .hardfork_property
        .create_property(config.hardfork_version, now)?;

    for account in &config.accounts {
        services.db.with_write_lock(|state| {
            let mut object = AccountObject::new(account.name.clone(), now);
            object.balance = account.balance;
            object.scorumpower = account.scorumpower;
            state.accounts.insert(account.name.clone(), object);
        });
    }

    services.reward_balancer_scr.create_balancer(config.rewards_supply)?;
    services.reward_balancer_sp.create_balancer(config.rewards_sp_supply)?;
    services.reward_fund_scr.create_fund(now)?;
    services.reward_fund_sp.create_fund(now)?;
    services.reward_fund_bounty.create_fund(now)?;
    services
        .dev_pool
        .create_pool(config.dev_pool_supply, zero_sp())?;
    services.registration_pool.create_pool(
        config.registration_supply,
        config.registration_maximum_bonus,
        config.registration_schedule.clone(),
    )?;
    services
        .budgets
        .create_fund_budget(config.fund_budget_supply, 0, config.fund_budget_blocks)?;

    tracing::info!(
        "Genesis applied: chain {} with {} accounts, {} allocated of {}",
        config.chain_name,
        config.accounts.len(),
        config.allocated_supply()?,
        config.total_supply
    );
    Ok(())
}
