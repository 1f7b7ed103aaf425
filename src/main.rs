use clap::Parser;
use env_logger::Env;
use log::info;

use slurmdag::cli::Args;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();
    info!("terve! starting up :)");

    let report = slurmdag::run(&args)?;
    for (i, job_id) in report.chains.iter().enumerate() {
        println!("chain-{i}\t{job_id}");
    }
    for (i, job_id) in report.joins.iter().enumerate() {
        println!("join-{i}\t{job_id}");
    }
    Ok(())
}
