// crates/tally-daemon/src/producer.rs
//
// Block producer for the Tally ledger daemon.
//
// Stands in for the witness schedule and block signing: each slot is assigned
// round-robin to the configured witnesses, timestamps advance by
// BLOCK_INTERVAL_SECS per slot from genesis, and every block distributes
// rewards from all sources active at that height.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use tally_chain::{BlockContext, BlockReport, ChainDatabase};
use tally_core::protocol::BLOCK_INTERVAL_SECS;
use tally_core::{AccountName, BlockId, Result, TallyError};

/// Produces and applies blocks on top of a chain database.
pub struct BlockProducer {
    chain: Arc<ChainDatabase>,
    witnesses: Vec<AccountName>,
    genesis_time: DateTime<Utc>,
}

impl BlockProducer {
    /// Create a producer scheduling `witnesses` round-robin.
    ///
    /// # Errors
    /// `InvalidState` for an empty witness list, an invalid name, or a
    /// witness without an account on the chain.
    pub fn new(
        chain: Arc<ChainDatabase>,
        witnesses: &[String],
        genesis_time: DateTime<Utc>,
    ) -> Result<Self> {
        if witnesses.is_empty() {
            return Err(TallyError::InvalidState("No witnesses configured".to_string()));
        }
        let witnesses = witnesses
            .iter()
            .map(|name| AccountName::new(name))
            .collect::<Result<Vec<_>>>()?;
        for witness in &witnesses {
            if !chain.services().accounts.is_exists(witness) {
                return Err(TallyError::InvalidState(format!(
                    "Witness {} has no account",
                    witness
                )));
            }
        }

        Ok(Self {
            chain,
            witnesses,
            genesis_time,
        })
    }

    /// Witness scheduled for `aslot`.
    pub fn scheduled_witness(&self, aslot: u64) -> &AccountName {
        let index = (aslot % self.witnesses.len() as u64) as usize;
        &self.witnesses[index]
    }

    /// Describe the block extending the current head.
    pub fn next_block(&self) -> Result<BlockContext> {
        let (number, aslot, previous) = self.chain.with_read_lock(|state| {
            state
                .dynamic_global_property
                .as_ref()
                .map(|dgp| (dgp.head_block_number + 1, dgp.current_aslot + 1, dgp.head_block_id))
                .ok_or_else(|| TallyError::ObjectNotFound("dynamic_global_property".to_string()))
        })?;

        let seconds = i64::try_from(aslot.saturating_mul(BLOCK_INTERVAL_SECS))
            .map_err(|_| TallyError::ArithmeticOverflow(format!("slot {}", aslot)))?;
        let witness = self.scheduled_witness(aslot).clone();

        Ok(BlockContext {
            number,
            id: BlockId::derive(&previous, number, &witness),
            timestamp: self.genesis_time + Duration::seconds(seconds),
            witness,
            aslot,
        })
    }

    /// Produce and apply the next block.
    pub fn produce_block(&self) -> Result<BlockReport> {
        let block = self.next_block()?;
        let sources = self.chain.active_reward_sources();
        let report = self.chain.apply_block(&block, &sources)?;

        tracing::info!(
            "Block {} produced by {} ({} sources)",
            report.number,
            block.witness,
            report.emissions.len()
        );
        for op in &report.operations {
            tracing::debug!("Virtual op in block {}: {:?}", report.number, op);
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tally_chain::{GenesisAccount, GenesisConfig};
    use tally_core::Asset;

    fn chain() -> Arc<ChainDatabase> {
        let mut genesis = GenesisConfig::default();
        genesis.accounts.push(GenesisAccount {
            name: AccountName::new("alice").unwrap(),
            balance: Asset::scr(0),
            scorumpower: Asset::sp(0),
        });
        Arc::new(ChainDatabase::open_genesis(&genesis).unwrap())
    }

    fn witnesses() -> Vec<String> {
        vec!["initdelegate".to_string(), "alice".to_string()]
    }

    #[test]
    fn test_round_robin_schedule() {
        let producer = BlockProducer::new(chain(), &witnesses(), DateTime::<Utc>::UNIX_EPOCH).unwrap();
        assert_eq!(producer.scheduled_witness(0).as_str(), "initdelegate");
        assert_eq!(producer.scheduled_witness(1).as_str(), "alice");
        assert_eq!(producer.scheduled_witness(2).as_str(), "initdelegate");
    }

    #[test]
    fn test_unknown_witness_rejected() {
        let result = BlockProducer::new(
            chain(),
            &["carol".to_string()],
            DateTime::<Utc>::UNIX_EPOCH,
        );
        assert!(matches!(result, Err(TallyError::InvalidState(_))));
        assert!(BlockProducer::new(chain(), &[], DateTime::<Utc>::UNIX_EPOCH).is_err());
    }

    #[test]
    fn test_produced_blocks_advance_head() {
        let chain = chain();
        let genesis_time = DateTime::<Utc>::UNIX_EPOCH;
        let producer = BlockProducer::new(chain.clone(), &witnesses(), genesis_time).unwrap();

        let first = producer.next_block().unwrap();
        assert_eq!(first.number, 1);
        assert_eq!(first.witness.as_str(), "alice");
        assert_eq!(first.timestamp, genesis_time + Duration::seconds(3));

        for expected in 1..=4 {
            let report = producer.produce_block().unwrap();
            assert_eq!(report.number, expected);
        }
        assert_eq!(chain.head_block_num().unwrap(), 4);
        assert_ne!(chain.head_block_id().unwrap(), BlockId::default());

        // Both witnesses were paid out of the fund budget.
        let accounts = &chain.services().accounts;
        for name in witnesses() {
            let account = accounts.get_account(&AccountName::new(&name).unwrap()).unwrap();
            assert!(account.scorumpower > Asset::sp(0));
        }
    }
}
