use log::info;

use crate::dag::chain::{check_start_conditions, submit_dag_with, Submission};
use crate::dag::graph::SlurmDag;
use crate::error::Result;
use crate::request::read::WorkflowRequest;
use crate::slurm::job::{Dependency, ParentJobs, SlurmJobId, StartCondition};
use crate::slurm::script::create_job_file;
use crate::slurm::submit::Submitter;

/// SLURM ids handed out while submitting a workflow request
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PipelineReport {
    /// Last job submitted for each chain, in request order
    pub chains: Vec<SlurmJobId>,
    /// One id per join, in request order
    pub joins: Vec<SlurmJobId>,
}

/// Build and validate every chain's graph before anything is submitted
pub fn build_graphs(request: &WorkflowRequest) -> Result<Vec<SlurmDag>> {
    let mut graphs = Vec::with_capacity(request.chains.len());
    for nodes in &request.chains {
        let dag = SlurmDag::new(nodes.clone())?;
        check_start_conditions(&dag)?;
        graphs.push(dag);
    }
    Ok(graphs)
}

/// Submit every chain with no dependency, then each join waiting on all ids collected so far
///
/// A join waits with its own start condition, `afterany` when it has none, and is submitted
/// unconditionally when nothing came before it. Its id joins the pool for later joins.
/// `on_submit` is called with a label (`chain-<n>` or `join-<n>`) for every accepted job.
pub fn submit_pipeline<S, F>(
    request: &WorkflowRequest,
    client: &mut S,
    mut on_submit: F,
) -> Result<PipelineReport>
where
    S: Submitter,
    F: FnMut(&str, &Submission) -> Result<()>,
{
    let graphs = build_graphs(request)?;
    let mut report = PipelineReport::default();

    for (i, dag) in graphs.iter().enumerate() {
        let label = format!("chain-{i}");
        let job_id = submit_dag_with(dag, client, None, |s| on_submit(&label, s))?;
        report.chains.push(job_id);
    }

    let mut collected: Vec<SlurmJobId> = report.chains.clone();
    for (i, join) in request.joins.iter().enumerate() {
        create_job_file(join)?;

        let dependency = if collected.is_empty() {
            None
        } else {
            Some(Dependency {
                parents: ParentJobs::many(collected.clone())?,
                condition: join.start_condition.unwrap_or(StartCondition::AfterAny),
            })
        };
        info!("Submitting join {} after {} job(s)", join.name, collected.len());
        let job_id = client.submit(
            &join.script_path,
            dependency.as_ref().map(|d| &d.parents),
            dependency.as_ref().map(|d| d.condition),
        )?;

        let submission = Submission { node: join, dependency, job_id: job_id.clone() };
        on_submit(&format!("join-{i}"), &submission)?;
        collected.push(job_id.clone());
        report.joins.push(job_id);
    }

    Ok(report)
}
