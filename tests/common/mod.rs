use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use slurmdag::slurm::submit::{CommandRunner, RunOutput};

/// Stands in for sbatch: replays queued outputs and records every invocation
#[derive(Clone, Default)]
pub struct ScriptedSbatch {
    outputs: Arc<Mutex<VecDeque<RunOutput>>>,
    pub calls: Arc<Mutex<Vec<(PathBuf, Vec<String>)>>>,
}

impl ScriptedSbatch {
    /// Each id is answered with `Submitted batch job <id>\n`
    pub fn accepting(ids: &[&str]) -> Self {
        let runner = ScriptedSbatch::default();
        for id in ids {
            runner.push(true, &format!("Submitted batch job {id}\n"));
        }
        runner
    }

    pub fn push(&self, success: bool, stdout: &str) {
        self.outputs.lock().unwrap().push_back(RunOutput {
            success,
            code: Some(if success { 0 } else { 1 }),
            stdout: stdout.to_string(),
        });
    }

    pub fn args(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().iter().map(|(_, args)| args.clone()).collect()
    }
}

impl CommandRunner for ScriptedSbatch {
    fn run(&mut self, program: &Path, args: &[String]) -> std::io::Result<RunOutput> {
        self.calls.lock().unwrap().push((program.to_path_buf(), args.to_vec()));
        let output = self.outputs.lock().unwrap().pop_front();
        Ok(output.expect("sbatch called more often than expected"))
    }
}

pub fn dependency_clauses(args: &[String]) -> Vec<&str> {
    args.iter().filter(|a| a.starts_with("--dependency=")).map(|a| a.as_str()).collect()
}
