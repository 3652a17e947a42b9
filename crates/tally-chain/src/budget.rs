// crates/tally-chain/src/budget.rs
//
// Budgets: pools that emit a fixed amount per block until a deadline block,
// then release whatever remains in one go.
//
// The fund budget is a singleton in SP created at genesis. Advertising budgets
// are keyed by id, in SCR, and paid for out of their owner's liquid balance.
// An advertising budget is closed (removed) the block it runs dry; the fund
// budget stays behind with a zero balance.

use std::sync::Arc;

use tally_core::error::{Result, TallyError};
use tally_core::{AccountName, Asset, Symbol};

use crate::account;
use crate::objects::BudgetObject;
use crate::service::{
    expect_credit, DynamicGlobalProperty, FundBudget, LedgerDatabase, ServiceBase, Singleton,
};

impl BudgetObject {
    /// A budget spreading `balance` evenly over the blocks `created..deadline`.
    ///
    /// # Errors
    /// `InvalidState` if `deadline` is not after `created`.
    pub fn new(
        id: u64,
        owner: Option<AccountName>,
        balance: Asset,
        created: u64,
        deadline: u64,
    ) -> Result<Self> {
        if deadline <= created {
            return Err(TallyError::InvalidState(format!(
                "Budget deadline {} must be after block {}",
                deadline, created
            )));
        }
        let length = i64::try_from(deadline - created).map_err(|_| {
            TallyError::ArithmeticOverflow(format!("budget length {}", deadline - created))
        })?;
        let per_block = balance
            .mul_div(1, length)?
            .try_max(Asset::new(1, balance.symbol))?
            .try_min(balance)?;

        Ok(Self {
            id,
            owner,
            balance,
            per_block,
            created,
            deadline,
        })
    }

    /// Take this block's emission.
    ///
    /// At or past the deadline the whole remaining balance is released;
    /// before it, `per_block` clamped to the balance.
    pub fn allocate_cash(&mut self, head_block: u64) -> Result<Asset> {
        let emitted = if head_block >= self.deadline {
            self.balance
        } else {
            self.per_block.try_min(self.balance)?
        };
        self.balance = self.balance.checked_sub(emitted)?;
        Ok(emitted)
    }
}

/// Service over the fund budget and the advertising budgets.
pub struct BudgetService {
    db: Arc<LedgerDatabase>,
    fund_budget: ServiceBase<FundBudget>,
}

impl BudgetService {
    pub(crate) fn new(db: Arc<LedgerDatabase>) -> Self {
        Self {
            fund_budget: ServiceBase::new(db.clone()),
            db,
        }
    }

    /// Create the fund budget.
    ///
    /// # Errors
    /// `AlreadyExists` on re-creation, `InvalidSymbol` unless `balance` is SP.
    pub fn create_fund_budget(&self, balance: Asset, created: u64, deadline: u64) -> Result<BudgetObject> {
        expect_credit(balance, Symbol::Sp)?;
        let budget = BudgetObject::new(0, None, balance, created, deadline)?;
        let budget = self.fund_budget.create(|| budget)?;
        tracing::info!(
            "Fund budget created: {} ({} per block until block {})",
            budget.balance,
            budget.per_block,
            budget.deadline
        );
        Ok(budget)
    }

    /// Open an advertising budget funded from `owner`'s liquid balance.
    ///
    /// # Errors
    /// `InvalidState` for an empty budget or a deadline not after
    /// `head_block`, `ObjectNotFound` for an unknown owner, `NegativeBalance`
    /// if the owner cannot cover `balance`.
    pub fn create_budget(
        &self,
        owner: &AccountName,
        balance: Asset,
        head_block: u64,
        deadline: u64,
    ) -> Result<BudgetObject> {
        expect_credit(balance, Symbol::Scr)?;
        if balance.is_zero() {
            return Err(TallyError::InvalidState("Budget balance must be positive".to_string()));
        }
        let budget = self.db.with_write_lock(|state| -> Result<BudgetObject> {
            let mut payer = account::get_in(state, owner)?.clone();
            account::debit(&mut payer, balance)?;

            let id = state.next_budget_id;
            let budget = BudgetObject::new(id, Some(owner.clone()), balance, head_block, deadline)?;

            // The budget's balance leaves circulation until it is emitted.
            let circulating = DynamicGlobalProperty::slot(state)
                .as_ref()
                .map(|dgp| dgp.circulating_capital.checked_sub(balance))
                .transpose()?;

            if let (Some(dgp), Some(circulating)) =
                (DynamicGlobalProperty::slot_mut(state).as_mut(), circulating)
            {
                dgp.circulating_capital = circulating;
            }
            state.accounts.insert(owner.clone(), payer);
            state.advertising_budgets.insert(id, budget.clone());
            state.next_budget_id = id.saturating_add(1);
            Ok(budget)
        })?;
        tracing::info!(
            "Budget {} opened by {}: {} until block {}",
            budget.id,
            owner,
            budget.balance,
            budget.deadline
        );
        Ok(budget)
    }

    /// A copy of the fund budget.
    pub fn get_fund_budget(&self) -> Result<BudgetObject> {
        self.fund_budget.get()
    }

    pub fn is_fund_budget_exists(&self) -> bool {
        self.fund_budget.is_exists()
    }

    /// A copy of an advertising budget.
    pub fn get_budget(&self, id: u64) -> Result<BudgetObject> {
        self.db.with_read_lock(|state| {
            state
                .advertising_budgets
                .get(&id)
                .cloned()
                .ok_or_else(|| TallyError::ObjectNotFound(format!("budget {}", id)))
        })
    }

    /// Open advertising budgets in ascending id order.
    pub fn get_budgets(&self) -> Vec<BudgetObject> {
        self.db
            .with_read_lock(|state| state.advertising_budgets.values().cloned().collect())
    }

    /// Open advertising budgets of one owner.
    pub fn get_budgets_of(&self, owner: &AccountName) -> Vec<BudgetObject> {
        self.db.with_read_lock(|state| {
            state
                .advertising_budgets
                .values()
                .filter(|b| b.owner.as_ref() == Some(owner))
                .cloned()
                .collect()
        })
    }

    /// Take this block's emission from the fund budget.
    pub fn allocate_fund_budget_cash(&self, head_block: u64) -> Result<Asset> {
        self.fund_budget.update(|budget| budget.allocate_cash(head_block))
    }

    /// Take this block's emission from an advertising budget.
    ///
    /// Returns the emitted amount and, if the budget ran dry and was closed,
    /// its final record.
    pub fn allocate_cash(&self, id: u64, head_block: u64) -> Result<(Asset, Option<BudgetObject>)> {
        let (emitted, closed) = self
            .db
            .with_write_lock(|state| -> Result<(Asset, Option<BudgetObject>)> {
                let mut budget = state
                    .advertising_budgets
                    .get(&id)
                    .cloned()
                    .ok_or_else(|| TallyError::ObjectNotFound(format!("budget {}", id)))?;
                let emitted = budget.allocate_cash(head_block)?;
                if budget.balance.is_zero() {
                    state.advertising_budgets.remove(&id);
                    Ok((emitted, Some(budget)))
                } else {
                    state.advertising_budgets.insert(id, budget);
                    Ok((emitted, None))
                }
            })?;
        if let Some(budget) = &closed {
            tracing::info!("Budget {} closed at block {}", budget.id, head_block);
        }
        Ok((emitted, closed))
    }
}
