//! Command line arguments

use std::path::PathBuf;

use clap::Parser;

use crate::slurm::job::StartCondition;

/// Submit job chains and their join jobs to SLURM
#[derive(Debug, Clone, Parser)]
#[command(name = "slurmdag", version, long_about = None)]
pub struct Args {
    /// Workflow request (JSON) describing chains and joins
    #[arg(short, long, value_name = "PATH")]
    pub workflow: PathBuf,

    /// sbatch binary used to submit job scripts
    #[arg(long, value_name = "PATH", default_value = "sbatch")]
    pub sbatch: PathBuf,

    /// Directory for job scripts; relative script paths are resolved against it
    #[arg(long, value_name = "DIR")]
    pub job_dir: Option<PathBuf>,

    /// SQLite database recording every submission
    #[arg(long, value_name = "PATH")]
    pub ledger: Option<PathBuf>,

    /// Start condition for joins that don't set their own
    #[arg(long, value_enum, value_name = "CONDITION", default_value = "afterany")]
    pub join_condition: StartCondition,

    /// Write job scripts but don't run sbatch (ledger changes are rolled back)
    #[arg(long)]
    pub dry_run: bool,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    pub verbose: bool,
}
