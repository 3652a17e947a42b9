// crates/tally-cli/src/commands/hardfork.rs
//
// `tally hardfork`: next scheduled protocol version.

use tally_core::Result;

use crate::output::{render, OutputFormat};

pub fn run(data_dir: &str, format: OutputFormat) -> Result<()> {
    let api = super::open_api(data_dir)?;
    let hardfork = api.get_next_scheduled_hardfork()?;
    println!("{}", render(format, &hardfork));
    Ok(())
}
