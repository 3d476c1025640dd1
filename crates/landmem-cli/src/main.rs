//! The `landmem` binary.

use std::process;

use clap::Parser;
use landmem_cli::{CliArgs, LandmemCli};

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    let result = match LandmemCli::from_args("landmem", &args) {
        Ok(cli) => cli.run(args).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
