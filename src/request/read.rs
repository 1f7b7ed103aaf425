use std::fs;
use std::path::{Path, PathBuf};

use jsonschema::JSONSchema;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DagError, Result};
use crate::request::schema::{load_schema, validate};
use crate::slurm::job::{JobDescriptor, StartCondition};
use crate::WorkingDirectory;

/// A workflow run: independent job chains, then join jobs that wait on everything before them
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct WorkflowRequest {
    /// Each chain is one job graph, submitted with no upstream dependency
    #[serde(default)]
    pub chains: Vec<Vec<JobDescriptor>>,
    /// Submitted in order after all chains, each waiting on every id collected so far
    #[serde(default)]
    pub joins: Vec<JobDescriptor>,
}

impl WorkflowRequest {
    /// Resolve relative script paths against the job directory
    pub fn rebase(&mut self, wd: &WorkingDirectory) {
        let nodes = self.chains.iter_mut().flatten().chain(self.joins.iter_mut());
        for node in nodes {
            if node.script_path.is_relative() {
                node.script_path = wd.path.join(&node.script_path);
            }
        }
    }

    /// Give every join without a start condition `condition`
    pub fn default_join_condition(&mut self, condition: StartCondition) {
        for join in self.joins.iter_mut().filter(|j| j.start_condition.is_none()) {
            join.start_condition = Some(condition);
        }
    }
}

/// A workflow request file on disk, checked against the embedded schema before it's deserialised
pub struct WorkflowFile {
    pub path: PathBuf,
    pub compiled_schema: JSONSchema,
}

impl WorkflowFile {
    pub fn new(path: impl Into<PathBuf>) -> Result<WorkflowFile> {
        Ok(WorkflowFile { path: path.into(), compiled_schema: load_schema()? })
    }

    pub fn read(&self) -> Result<WorkflowRequest> {
        let json: Value = self.parse_untyped_json()?;

        match validate(&self.compiled_schema, &json) {
            Ok(_) => {
                info!("Workflow request is valid");
                self.parse_json(json)
            }
            Err(err) => {
                warn!("Workflow request fails validation");
                Err(err)
            }
        }
    }

    fn read_file(&self) -> Result<String> {
        let path: &Path = self.path.as_path();
        info!("Reading workflow request at {}", path.display());
        fs::read_to_string(path).map_err(|err| {
            warn!("Can't read workflow request at path {}: {}", path.display(), err);
            DagError::Request(format!("can't read {}: {err}", path.display()))
        })
    }

    fn parse_json(&self, value: Value) -> Result<WorkflowRequest> {
        info!("Deserialising valid JSON into typed Rust object");
        serde_json::from_value::<WorkflowRequest>(value).map_err(|err| {
            DagError::Request(format!("can't deserialise {}: {err}", self.path.display()))
        })
    }

    fn parse_untyped_json(&self) -> Result<Value> {
        info!("Parsing JSON into untyped structure");
        let json_string = self.read_file()?;
        serde_json::from_str::<Value>(&json_string)
            .map_err(|err| DagError::Request(format!("{} isn't JSON: {err}", self.path.display())))
    }
}
