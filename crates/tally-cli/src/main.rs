// crates/tally-cli/src/main.rs
//
// CLI entrypoint for the Tally ledger.
//
// Reads the daemon's last RocksDB checkpoint and answers the chain API
// queries against it: chain properties, chain capital, reward funds, and the
// next scheduled hardfork.

mod commands;
mod output;

use clap::{Parser, Subcommand};
use output::OutputFormat;

/// Tally CLI: inspect the reward ledger.
#[derive(Parser, Debug)]
#[command(name = "tally", version = "0.1.0", about = "Tally ledger command-line interface")]
struct Cli {
    /// Daemon data directory holding the ledger checkpoint.
    #[arg(long, global = true, default_value = "~/.tally/data")]
    data_dir: String,

    /// Output results as JSON instead of tables.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show head block, witness, versions, and median chain properties.
    Properties,
    /// Show supply, circulating capital, and pool balances.
    Capital,
    /// Show a reward fund (reward_fund_scr, reward_fund_sp, or
    /// fifa_world_cup_2018_bounty_reward_fund).
    Fund {
        /// Fund name; "scr" and "sp" are accepted as shorthand.
        name: String,
    },
    /// Show the next scheduled hardfork.
    Hardfork,
}

fn main() {
    let cli = Cli::parse();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Table
    };
    let data_dir = commands::expand_tilde(&cli.data_dir);

    let result = match cli.command {
        Commands::Properties => commands::properties::run(&data_dir, format),
        Commands::Capital => commands::capital::run(&data_dir, format),
        Commands::Fund { name } => commands::fund::run(&data_dir, &name, format),
        Commands::Hardfork => commands::hardfork::run(&data_dir, format),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
