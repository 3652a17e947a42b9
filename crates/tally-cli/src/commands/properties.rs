// crates/tally-cli/src/commands/properties.rs
//
// `tally properties`: dynamic global state and median chain properties.

use tally_core::Result;

use crate::output::{render, OutputFormat};

pub fn run(data_dir: &str, format: OutputFormat) -> Result<()> {
    let api = super::open_api(data_dir)?;
    let props = api.get_chain_properties()?;
    println!("{}", render(format, &props));
    Ok(())
}
