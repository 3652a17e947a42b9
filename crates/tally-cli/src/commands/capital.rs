// crates/tally-cli/src/commands/capital.rs
//
// `tally capital`: supply accounting across every pool.

use tabled::Tabled;

use tally_api::ChainCapitalApiObj;
use tally_core::Result;

use crate::output::{format_json, format_table, OutputFormat};

/// A single pool row for table output.
#[derive(Debug, Tabled)]
struct CapitalRow {
    #[tabled(rename = "Pool")]
    pool: &'static str,
    #[tabled(rename = "Balance")]
    balance: String,
}

fn rows(capital: &ChainCapitalApiObj) -> Vec<CapitalRow> {
    [
        ("total supply", &capital.total_supply),
        ("circulating capital", &capital.circulating_capital),
        ("total scorumpower", &capital.total_scorumpower),
        ("registration pool", &capital.registration_pool_balance),
        ("fund budget", &capital.fund_budget_balance),
        ("reward pool", &capital.reward_pool_balance),
        ("content rewards (SCR)", &capital.content_reward_scr_balance),
        ("content rewards (SP)", &capital.content_reward_sp_balance),
    ]
    .into_iter()
    .map(|(pool, balance)| CapitalRow {
        pool,
        balance: balance.to_string(),
    })
    .collect()
}

pub fn run(data_dir: &str, format: OutputFormat) -> Result<()> {
    let api = super::open_api(data_dir)?;
    let capital = api.get_chain_capital()?;

    match format {
        OutputFormat::Table => println!("{}", format_table(&rows(&capital))),
        OutputFormat::Json => println!("{}", format_json(&capital)),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use tally_core::Asset;

    #[test]
    fn test_one_row_per_pool() {
        let capital = ChainCapitalApiObj {
            total_supply: Asset::scr(100),
            circulating_capital: Asset::scr(40),
            total_scorumpower: Asset::sp(10),
            registration_pool_balance: Asset::scr(10),
            fund_budget_balance: Asset::sp(20),
            reward_pool_balance: Asset::scr(20),
            content_reward_scr_balance: Asset::scr(0),
            content_reward_sp_balance: Asset::sp(0),
        };
        let rows = rows(&capital);
        assert_eq!(rows.len(), 8);
        assert_eq!(rows[0].pool, "total supply");
        assert_eq!(rows[0].balance, Asset::scr(100).to_string());
    }
}
