//! Validate graphs of SLURM batch jobs, render their job scripts and submit them with sbatch,
//! threading each job's SLURM id into the jobs that depend on it.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use log::{info, warn};

use crate::cli::Args;
use crate::db::open::Ledger;
use crate::request::pipeline::{submit_pipeline, PipelineReport};
use crate::request::read::{WorkflowFile, WorkflowRequest};
use crate::slurm::submit::{DryRunRunner, Sbatch, Submitter, SystemRunner};

pub mod cli;
/// Submission ledger stored in SQLite
pub mod db;
/// Job graphs and the submission walk
pub mod dag;
pub mod error;
/// Workflow request files
pub mod request;
/// Job descriptors, job scripts and sbatch
pub mod slurm;

pub use crate::dag::chain::{submit_dag_to_scheduler, submit_dag_with, Submission};
pub use crate::dag::graph::SlurmDag;
pub use crate::error::{DagError, Result};
pub use crate::slurm::job::{
    Dependency, JobDescriptor, ParentJobs, ResourceRequest, SlurmJobId, StartCondition,
};

/// Directory that job scripts are written to
pub struct WorkingDirectory {
    pub path: PathBuf,
}

/// Read the workflow request named on the command line and submit it
pub fn run(args: &Args) -> anyhow::Result<PipelineReport> {
    let mut request = WorkflowFile::new(&args.workflow)?
        .read()
        .with_context(|| format!("Reading workflow request {}", args.workflow.display()))?;

    request.default_join_condition(args.join_condition);

    if let Some(dir) = &args.job_dir {
        if !dir.exists() {
            info!("Creating job directory {}", dir.display());
        }
        fs::create_dir_all(dir)
            .with_context(|| format!("Creating job directory {}", dir.display()))?;
        request.rebase(&WorkingDirectory { path: dir.clone() });
    }

    let ledger = match &args.ledger {
        Some(path) => Some(Ledger::open(path, args.dry_run)?),
        None => None,
    };

    let report = match args.dry_run {
        true => {
            let mut sbatch = Sbatch::new(&args.sbatch, DryRunRunner::default());
            submit(&request, &mut sbatch, ledger.as_ref())
        }
        false => submit(&request, &mut Sbatch::new(&args.sbatch, SystemRunner), ledger.as_ref()),
    };

    // jobs already accepted by SLURM stay recorded even if a later one failed
    if let Some(ledger) = ledger {
        ledger.finish().context("Closing submission ledger")?;
    }

    report.context("Submitting workflow")
}

fn submit<S: Submitter>(
    request: &WorkflowRequest,
    client: &mut S,
    ledger: Option<&Ledger>,
) -> Result<PipelineReport> {
    if request.chains.is_empty() && request.joins.is_empty() {
        warn!("Workflow request has no jobs, nothing to submit");
    }
    submit_pipeline(request, client, |label, submission| match ledger {
        Some(ledger) => ledger.record(label, submission),
        None => Ok(()),
    })
}
