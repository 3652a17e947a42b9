// crates/tally-chain/src/dynamic_global_property.rs
//
// Dynamic global properties: the chain-wide snapshot mutated once per block.

use tally_core::error::Result;
use tally_core::protocol::IRREVERSIBLE_BLOCK_DEPTH;
use tally_core::{Asset, Symbol};

use crate::database::BlockContext;
use crate::objects::DynamicGlobalPropertyObject;
use crate::service::{DynamicGlobalProperty, ServiceBase};

pub type DynamicGlobalPropertyService = ServiceBase<DynamicGlobalProperty>;

impl ServiceBase<DynamicGlobalProperty> {
    /// Record `block` as the new head.
    pub fn record_block(&self, block: &BlockContext) -> Result<DynamicGlobalPropertyObject> {
        self.update(|dgp| {
            dgp.head_block_id = block.id;
            dgp.head_block_number = block.number;
            dgp.last_irreversible_block_num = block.number.saturating_sub(IRREVERSIBLE_BLOCK_DEPTH);
            dgp.current_aslot = block.aslot;
            dgp.time = block.timestamp;
            dgp.current_witness = block.witness.clone();
            Ok(dgp.clone())
        })
    }

    /// Count a credit to an account into the circulating totals.
    ///
    /// Scorumpower credits also grow `total_scorumpower`; both symbols are
    /// counted 1:1 into `circulating_capital`.
    pub fn credit_circulating(&self, credited: Asset) -> Result<()> {
        self.update(|dgp| {
            if credited.symbol == Symbol::Sp {
                dgp.total_scorumpower = dgp.total_scorumpower.checked_add(credited)?;
            }
            dgp.circulating_capital = dgp
                .circulating_capital
                .checked_add(credited.convert_to(Symbol::Scr))?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::{DateTime, Duration, Utc};
    use tally_core::{AccountName, BlockId, ChainProperties, Version};

    use crate::objects::LedgerState;
    use crate::service::LedgerDatabase;

    fn service() -> DynamicGlobalPropertyService {
        let svc = ServiceBase::new(Arc::new(LedgerDatabase::new(LedgerState::default())));
        svc.create(|| DynamicGlobalPropertyObject {
            head_block_id: BlockId::default(),
            head_block_number: 0,
            last_irreversible_block_num: 0,
            current_aslot: 0,
            time: DateTime::<Utc>::UNIX_EPOCH,
            current_witness: AccountName::new("initdelegate").unwrap(),
            total_supply: Asset::scr(1_000),
            circulating_capital: Asset::scr(0),
            total_scorumpower: Asset::sp(0),
            median_chain_props: ChainProperties::default(),
            majority_version: Version::default(),
        })
        .unwrap();
        svc
    }

    #[test]
    fn test_record_block() {
        let svc = service();
        let witness = AccountName::new("alice").unwrap();
        let block = BlockContext {
            number: 30,
            id: BlockId::derive(&BlockId::default(), 30, &witness),
            timestamp: DateTime::<Utc>::UNIX_EPOCH + Duration::seconds(90),
            witness: witness.clone(),
            aslot: 31,
        };
        let dgp = svc.record_block(&block).unwrap();
        assert_eq!(dgp.head_block_number, 30);
        assert_eq!(dgp.last_irreversible_block_num, 30 - IRREVERSIBLE_BLOCK_DEPTH);
        assert_eq!(dgp.current_aslot, 31);
        assert_eq!(dgp.current_witness, witness);
        assert_eq!(svc.get().unwrap(), dgp);
    }

    #[test]
    fn test_irreversible_saturates_near_genesis() {
        let svc = service();
        let witness = AccountName::new("alice").unwrap();
        let block = BlockContext {
            number: 3,
            id: BlockId::default(),
            timestamp: DateTime::<Utc>::UNIX_EPOCH,
            witness,
            aslot: 3,
        };
        assert_eq!(svc.record_block(&block).unwrap().last_irreversible_block_num, 0);
    }

    #[test]
    fn test_credit_circulating() {
        let svc = service();
        svc.credit_circulating(Asset::scr(10)).unwrap();
        svc.credit_circulating(Asset::sp(5)).unwrap();
        let dgp = svc.get().unwrap();
        assert_eq!(dgp.circulating_capital, Asset::scr(15));
        assert_eq!(dgp.total_scorumpower, Asset::sp(5));
        assert_eq!(dgp.total_supply, Asset::scr(1_000));
    }
}
