//! `cookbook` entry point.

use std::path::PathBuf;

use clap::Parser;
use cookbook_cli::build_all;
use cookbook_data::read_fork_list;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cookbook")]
#[command(about = "Generate recipe data and sprite sheets for every game fork")]
struct Cli {
    /// Fork list file (RON, JSON or TOML)
    fork_list: PathBuf,

    /// Output directory
    #[arg(short, long, default_value = "public")]
    out: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("cookbook=info".parse()?))
        .init();

    let cli = Cli::parse();

    let forks = read_fork_list(&cli.fork_list)?;
    info!("Read {} forks from {}", forks.len(), cli.fork_list.display());

    build_all(&forks, &cli.out)?;
    Ok(())
}
