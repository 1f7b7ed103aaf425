use log::info;

use crate::dag::graph::SlurmDag;
use crate::error::{DagError, Result};
use crate::slurm::job::{Dependency, JobDescriptor, ParentJobs, SlurmJobId};
use crate::slurm::script::create_job_file;
use crate::slurm::submit::Submitter;

/// One job accepted by the scheduler while walking a graph
#[derive(Debug)]
pub struct Submission<'a> {
    pub node: &'a JobDescriptor,
    /// `None` only for a root submitted without an upstream dependency
    pub dependency: Option<Dependency>,
    pub job_id: SlurmJobId,
}

/// Materialize and submit every job in `dag`, returning the SLURM id of the last job submitted
///
/// See [`submit_dag_with`].
pub fn submit_dag_to_scheduler<S: Submitter>(
    dag: &SlurmDag,
    client: &mut S,
    upstream: Option<&Dependency>,
) -> Result<SlurmJobId> {
    submit_dag_with(dag, client, upstream, |_| Ok(()))
}

/// Materialize and submit every job in `dag` in [`SlurmDag::dfs_traversal`] order
///
/// The root waits on `upstream` (or nothing). Every later job waits, with its own start
/// condition, on the job submitted immediately before it in traversal order. For a chain that's
/// its parent; for a branching graph it can be a sibling's descendant instead.
///
/// `on_submit` sees each accepted job before the next one is written. The returned id is the last
/// job in traversal order, which isn't necessarily a leaf of the graph. The first error stops the
/// walk; jobs already submitted are left alone.
pub fn submit_dag_with<S, F>(
    dag: &SlurmDag,
    client: &mut S,
    upstream: Option<&Dependency>,
    mut on_submit: F,
) -> Result<SlurmJobId>
where
    S: Submitter,
    F: FnMut(&Submission) -> Result<()>,
{
    check_start_conditions(dag)?;

    let root = dag.root();
    let job_node_list = dag.dfs_traversal();
    info!("Submitting {} job(s) rooted at {}", job_node_list.len(), root.name);

    let mut parent_job_id: Option<ParentJobs> = upstream.map(|d| d.parents.clone());
    let mut start_condition = upstream.map(|d| d.condition);
    let mut last = None;

    for node in job_node_list {
        if node.id != root.id {
            start_condition = node.start_condition;
        }
        create_job_file(node)?;
        let job_id = client.submit(&node.script_path, parent_job_id.as_ref(), start_condition)?;

        let dependency = match (parent_job_id.take(), start_condition) {
            (Some(parents), Some(condition)) => Some(Dependency { parents, condition }),
            _ => None,
        };
        on_submit(&Submission { node, dependency, job_id: job_id.clone() })?;

        parent_job_id = Some(ParentJobs::Single(job_id.clone()));
        last = Some(job_id);
    }

    last.ok_or_else(|| DagError::InvalidWorkflow("graph has no jobs to submit".to_string()))
}

/// A root carries no start condition and every other job does; every job is reachable
///
/// Checked up front so a bad graph writes and submits nothing.
pub fn check_start_conditions(dag: &SlurmDag) -> Result<()> {
    let unreachable = dag.unreachable();
    if !unreachable.is_empty() {
        let names: Vec<&str> = unreachable.iter().map(|n| n.name.as_str()).collect();
        return Err(DagError::InvalidWorkflow(format!(
            "jobs not reachable from the root: {}",
            names.join(", ")
        )));
    }

    let root = dag.root();
    if let Some(condition) = root.start_condition {
        return Err(DagError::Configuration(format!(
            "root job {} has start condition {condition} but no parent",
            root.name
        )));
    }
    if let Some(node) = dag.nodes().iter().find(|n| !n.is_root() && n.start_condition.is_none()) {
        return Err(DagError::Configuration(format!(
            "job {} has parent {} but no start condition",
            node.name, node.parent_id
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use tempfile::tempdir;

    use super::*;
    use crate::slurm::job::StartCondition;

    /// Hands out ids 10, 11, 12, ... and records what it was asked to do
    #[derive(Default)]
    struct Recorder {
        calls: Vec<(PathBuf, Option<ParentJobs>, Option<StartCondition>)>,
    }

    impl Submitter for Recorder {
        fn submit(
            &mut self,
            script_path: &Path,
            parent: Option<&ParentJobs>,
            condition: Option<StartCondition>,
        ) -> Result<SlurmJobId> {
            self.calls.push((script_path.to_path_buf(), parent.cloned(), condition));
            Ok(SlurmJobId::new((9 + self.calls.len()).to_string()))
        }
    }

    fn single(id: &str) -> Option<ParentJobs> {
        Some(ParentJobs::Single(id.into()))
    }

    #[test]
    fn chain_threads_each_id_into_the_next_job() {
        let dir = tempdir().unwrap();
        let d = dir.path();
        let dag = SlurmDag::new(vec![
            JobDescriptor::root(1, "upright", d.join("1.sh")),
            JobDescriptor::new(2, 1, "align", d.join("2.sh")).after(StartCondition::AfterOk),
            JobDescriptor::new(3, 2, "qc", d.join("3.sh")).after(StartCondition::AfterAny),
        ])
        .unwrap();
        let mut recorder = Recorder::default();

        let last = submit_dag_to_scheduler(&dag, &mut recorder, None).unwrap();

        assert_eq!(last.as_str(), "12");
        assert_eq!(
            recorder.calls,
            vec![
                (d.join("1.sh"), None, None),
                (d.join("2.sh"), single("10"), Some(StartCondition::AfterOk)),
                (d.join("3.sh"), single("11"), Some(StartCondition::AfterAny)),
            ]
        );
        assert!(d.join("3.sh").exists());
    }

    #[test]
    fn root_waits_on_upstream_dependency() {
        let dir = tempdir().unwrap();
        let dag = SlurmDag::new(vec![
            JobDescriptor::root(1, "a", dir.path().join("a.sh")),
            JobDescriptor::new(2, 1, "b", dir.path().join("b.sh")).after(StartCondition::AfterOk),
        ])
        .unwrap();
        let upstream = Dependency::new(SlurmJobId::from("900"), StartCondition::AfterAny);
        let mut recorder = Recorder::default();

        submit_dag_to_scheduler(&dag, &mut recorder, Some(&upstream)).unwrap();

        assert_eq!(recorder.calls[0].1, single("900"));
        assert_eq!(recorder.calls[0].2, Some(StartCondition::AfterAny));
        assert_eq!(recorder.calls[1].1, single("10"));
        assert_eq!(recorder.calls[1].2, Some(StartCondition::AfterOk));
    }

    #[test]
    fn hook_sees_every_submission_in_order() {
        let dir = tempdir().unwrap();
        let dag = SlurmDag::new(vec![
            JobDescriptor::root(1, "a", dir.path().join("a.sh")),
            JobDescriptor::new(2, 1, "b", dir.path().join("b.sh")).after(StartCondition::AfterOk),
        ])
        .unwrap();
        let mut seen = Vec::new();

        submit_dag_with(&dag, &mut Recorder::default(), None, |s| {
            seen.push((
                s.node.name.clone(),
                s.dependency.as_ref().map(Dependency::clause),
                s.job_id.to_string(),
            ));
            Ok(())
        })
        .unwrap();

        assert_eq!(
            seen,
            vec![
                ("a".to_string(), None, "10".to_string()),
                ("b".to_string(), Some("afterok:10".to_string()), "11".to_string()),
            ]
        );
    }

    #[test]
    fn root_with_condition_submits_nothing() {
        let dir = tempdir().unwrap();
        let dag = SlurmDag::new(vec![
            JobDescriptor::root(1, "a", dir.path().join("a.sh")).after(StartCondition::AfterOk),
        ])
        .unwrap();
        let mut recorder = Recorder::default();

        let result = submit_dag_to_scheduler(&dag, &mut recorder, None);

        assert!(matches!(result, Err(DagError::Configuration(_))));
        assert!(recorder.calls.is_empty());
        assert!(!dir.path().join("a.sh").exists());
    }

    #[test]
    fn child_without_condition_submits_nothing() {
        let dir = tempdir().unwrap();
        let dag = SlurmDag::new(vec![
            JobDescriptor::root(1, "a", dir.path().join("a.sh")),
            JobDescriptor::new(2, 1, "b", dir.path().join("b.sh")),
        ])
        .unwrap();
        let mut recorder = Recorder::default();

        let result = submit_dag_to_scheduler(&dag, &mut recorder, None);

        assert!(matches!(result, Err(DagError::Configuration(_))));
        assert!(recorder.calls.is_empty());
    }

    #[test]
    fn unreachable_jobs_submit_nothing() {
        let dir = tempdir().unwrap();
        let dag = SlurmDag::new(vec![
            JobDescriptor::root(1, "a", dir.path().join("a.sh")),
            JobDescriptor::new(2, 3, "b", dir.path().join("b.sh")).after(StartCondition::AfterOk),
            JobDescriptor::new(3, 2, "c", dir.path().join("c.sh")).after(StartCondition::AfterOk),
        ])
        .unwrap();
        let mut recorder = Recorder::default();

        let result = submit_dag_to_scheduler(&dag, &mut recorder, None);

        assert!(matches!(result, Err(DagError::InvalidWorkflow(_))));
        assert!(recorder.calls.is_empty());
    }
}
