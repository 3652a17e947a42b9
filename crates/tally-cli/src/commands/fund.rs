// crates/tally-cli/src/commands/fund.rs
//
// `tally fund <name>`: content reward fund balance.

use tally_api::RewardFundType;
use tally_core::Result;

use crate::output::{render, OutputFormat};

pub fn run(data_dir: &str, name: &str, format: OutputFormat) -> Result<()> {
    // Reject unknown names before touching the database.
    let fund: RewardFundType = name.parse()?;
    let api = super::open_api(data_dir)?;
    let object = api.get_reward_fund(fund)?;
    println!("{}", render(format, &object));
    Ok(())
}
