use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{DagError, Result};

/// `parent_id` of the single root node in a graph
pub const ROOT_PARENT_ID: i64 = -1;

/// SLURM dependency type used when a job waits on its parent(s)
///
/// "No condition" isn't a variant: descriptors and submissions carry an `Option<StartCondition>`
/// and `None` means the job starts unconditionally.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
pub enum StartCondition {
    /// Start once every parent finished successfully (`run-after-success`)
    #[serde(rename = "afterok", alias = "run-after-success")]
    #[value(name = "afterok", alias = "run-after-success")]
    AfterOk,
    /// Start once every parent finished, whatever the outcome (`run-after-any`)
    #[serde(rename = "afterany", alias = "run-after-any")]
    #[value(name = "afterany", alias = "run-after-any")]
    AfterAny,
}

impl StartCondition {
    /// sbatch token for this condition
    pub fn as_str(&self) -> &'static str {
        match self {
            StartCondition::AfterOk => "afterok",
            StartCondition::AfterAny => "afterany",
        }
    }

    /// Parse the full vocabulary, including `none`
    pub fn parse_optional(s: &str) -> Result<Option<StartCondition>> {
        match s {
            "none" => Ok(None),
            other => other.parse().map(Some),
        }
    }
}

impl fmt::Display for StartCondition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StartCondition {
    type Err = DagError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "afterok" | "run-after-success" => Ok(StartCondition::AfterOk),
            "afterany" | "run-after-any" => Ok(StartCondition::AfterAny),
            other => Err(DagError::Configuration(format!(
                "{other} not in accepted start conditions [afterok, afterany, none]"
            ))),
        }
    }
}

/// Job id assigned by SLURM when a script is accepted
///
/// Opaque: it's only ever handed back to sbatch as a dependency token.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SlurmJobId(String);

impl SlurmJobId {
    pub fn new(id: impl Into<String>) -> Self {
        SlurmJobId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SlurmJobId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SlurmJobId {
    fn from(id: &str) -> Self {
        SlurmJobId::new(id)
    }
}

/// The job(s) a submission waits on
///
/// `Many` is the fan-in case and is never empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParentJobs {
    Single(SlurmJobId),
    Many(Vec<SlurmJobId>),
}

impl ParentJobs {
    /// Fan-in over previously returned ids, order preserved
    pub fn many(ids: Vec<SlurmJobId>) -> Result<ParentJobs> {
        if ids.is_empty() {
            return Err(DagError::Configuration(
                "a fan-in dependency needs at least one parent job id".to_string(),
            ));
        }
        Ok(ParentJobs::Many(ids))
    }

    pub fn ids(&self) -> &[SlurmJobId] {
        match self {
            ParentJobs::Single(id) => std::slice::from_ref(id),
            ParentJobs::Many(ids) => ids,
        }
    }
}

impl From<SlurmJobId> for ParentJobs {
    fn from(id: SlurmJobId) -> Self {
        ParentJobs::Single(id)
    }
}

/// A parent set together with the condition it's waited on with
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dependency {
    pub parents: ParentJobs,
    pub condition: StartCondition,
}

impl Dependency {
    pub fn new(parents: impl Into<ParentJobs>, condition: StartCondition) -> Self {
        Dependency { parents: parents.into(), condition }
    }

    /// `<condition>:<id>[:<id>...]`, the value of sbatch's `--dependency` option
    pub fn clause(&self) -> String {
        let mut clause = self.condition.as_str().to_string();
        for id in self.parents.ids() {
            clause.push(':');
            clause.push_str(id.as_str());
        }
        clause
    }
}

/// `#SBATCH` options for one job, kept in the order they were supplied
///
/// Deserialises from a JSON object; numbers and booleans are stringified.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct ResourceRequest(Vec<(String, String)>);

impl ResourceRequest {
    pub fn new() -> Self {
        ResourceRequest::default()
    }

    /// Set a directive; an existing key keeps its position and takes the new value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ResourceRequest {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut request = ResourceRequest::new();
        for (k, v) in iter {
            request.insert(k, v);
        }
        request
    }
}

impl TryFrom<Map<String, Value>> for ResourceRequest {
    type Error = String;

    fn try_from(map: Map<String, Value>) -> std::result::Result<Self, Self::Error> {
        let mut request = ResourceRequest::new();
        for (key, value) in map {
            let value = match value {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                other => {
                    return Err(format!("resource request {key} must be a scalar, got {other}"));
                }
            };
            request.insert(key, value);
        }
        Ok(request)
    }
}

impl From<ResourceRequest> for Map<String, Value> {
    fn from(request: ResourceRequest) -> Self {
        request.0.into_iter().map(|(k, v)| (k, Value::String(v))).collect()
    }
}

/// One node of a job graph: what to run, with which resources, after which parent
///
/// `id` and `parent_id` are graph-local and unrelated to SLURM job ids.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDescriptor {
    pub id: i64,
    pub parent_id: i64,
    pub name: String,
    #[serde(alias = "job_file")]
    pub script_path: PathBuf,
    #[serde(default, alias = "slurm_kwargs")]
    pub resource_request: ResourceRequest,
    #[serde(default, alias = "slurm_commands")]
    pub commands: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_start_condition")]
    pub start_condition: Option<StartCondition>,
}

/// `null`, a missing field and `"none"` all mean no condition
fn deserialize_start_condition<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<StartCondition>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(token) => StartCondition::parse_optional(&token).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

impl JobDescriptor {
    pub fn new(
        id: i64,
        parent_id: i64,
        name: impl Into<String>,
        script_path: impl AsRef<Path>,
    ) -> Self {
        JobDescriptor {
            id,
            parent_id,
            name: name.into(),
            script_path: script_path.as_ref().to_path_buf(),
            resource_request: ResourceRequest::new(),
            commands: Vec::new(),
            start_condition: None,
        }
    }

    pub fn root(id: i64, name: impl Into<String>, script_path: impl AsRef<Path>) -> Self {
        JobDescriptor::new(id, ROOT_PARENT_ID, name, script_path)
    }

    pub fn resource(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.resource_request.insert(key, value);
        self
    }

    pub fn command(mut self, command: impl Into<String>) -> Self {
        self.commands.push(command.into());
        self
    }

    pub fn after(mut self, condition: StartCondition) -> Self {
        self.start_condition = Some(condition);
        self
    }

    pub fn is_root(&self) -> bool {
        self.parent_id == ROOT_PARENT_ID
    }
}
