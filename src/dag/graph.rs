use std::collections::{HashSet, VecDeque};

use log::{debug, warn};

use crate::error::{DagError, Result};
use crate::slurm::job::{JobDescriptor, ROOT_PARENT_ID};

/// All job descriptors of one workflow instance
///
/// Construction validates the graph: exactly one root, unique ids, and every other node's
/// `parent_id` names a node in the same graph. A `SlurmDag` that exists is valid.
#[derive(Clone, Debug)]
pub struct SlurmDag {
    nodes: Vec<JobDescriptor>,
    root: usize,
}

impl SlurmDag {
    pub fn new(nodes: Vec<JobDescriptor>) -> Result<SlurmDag> {
        let root = validate_slurm_dag(&nodes)?;
        debug!("Validated job graph with {} node(s), root {}", nodes.len(), nodes[root].name);
        Ok(SlurmDag { nodes, root })
    }

    pub fn nodes(&self) -> &[JobDescriptor] {
        &self.nodes
    }

    pub fn root(&self) -> &JobDescriptor {
        &self.nodes[self.root]
    }

    /// Nodes whose parent is `node`, in the order they were supplied
    pub fn children_of(&self, node: &JobDescriptor) -> Vec<&JobDescriptor> {
        self.nodes.iter().filter(|n| n.parent_id == node.id).collect()
    }

    /// Submission order, starting at the root
    ///
    /// Each visited node's children are pushed onto the front of the queue one by one, so they
    /// come out in reverse of their listed order and ahead of anything queued earlier.
    pub fn dfs_traversal(&self) -> Vec<&JobDescriptor> {
        let mut queue = VecDeque::from([self.root()]);
        let mut dfs_nodes = Vec::with_capacity(self.nodes.len());
        while let Some(node) = queue.pop_front() {
            dfs_nodes.push(node);
            for child in self.children_of(node) {
                queue.push_front(child);
            }
        }
        dfs_nodes
    }

    /// Nodes the traversal never reaches, i.e. nodes whose parent chain loops instead of ending
    /// at the root
    pub fn unreachable(&self) -> Vec<&JobDescriptor> {
        let visited: HashSet<i64> = self.dfs_traversal().iter().map(|n| n.id).collect();
        let unreachable: Vec<_> = self.nodes.iter().filter(|n| !visited.contains(&n.id)).collect();
        if !unreachable.is_empty() {
            warn!("{} job(s) can't be reached from root {}", unreachable.len(), self.root().name);
        }
        unreachable
    }
}

/// Check the structural invariants and return the index of the root
fn validate_slurm_dag(nodes: &[JobDescriptor]) -> Result<usize> {
    let roots: Vec<usize> = nodes
        .iter()
        .enumerate()
        .filter(|(_, n)| n.parent_id == ROOT_PARENT_ID)
        .map(|(i, _)| i)
        .collect();
    if roots.len() != 1 {
        return Err(DagError::InvalidWorkflow(format!(
            "expected exactly one root job (parent_id {ROOT_PARENT_ID}), found {}",
            roots.len()
        )));
    }

    let mut node_ids = HashSet::with_capacity(nodes.len());
    for node in nodes {
        if node.id == ROOT_PARENT_ID {
            return Err(DagError::InvalidWorkflow(format!(
                "job {} uses id {ROOT_PARENT_ID}, which marks a root's parent",
                node.name
            )));
        }
        if !node_ids.insert(node.id) {
            return Err(DagError::InvalidWorkflow(format!(
                "job id {} is used more than once",
                node.id
            )));
        }
    }

    let orphaned: Vec<String> = nodes
        .iter()
        .filter(|n| n.parent_id != ROOT_PARENT_ID && !node_ids.contains(&n.parent_id))
        .map(|n| format!("{} (id {}, parent_id {})", n.name, n.id, n.parent_id))
        .collect();
    if !orphaned.is_empty() {
        return Err(DagError::InvalidWorkflow(format!("orphaned jobs: {}", orphaned.join(", "))));
    }

    Ok(roots[0])
}
