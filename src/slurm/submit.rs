use std::path::{Path, PathBuf};
use std::process::Command;

use log::info;

use crate::error::{DagError, Result};
use crate::slurm::job::{Dependency, ParentJobs, SlurmJobId, StartCondition};

/// sbatch prints this immediately before the new job id
pub const SUBMITTED_MARKER: &str = "Submitted batch job ";

/// What a finished scheduler process left behind
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
}

/// Runs the scheduler binary and waits for it
///
/// Production code uses [`SystemRunner`]; tests and dry runs supply their own so no real process
/// is spawned.
pub trait CommandRunner {
    fn run(&mut self, program: &Path, args: &[String]) -> std::io::Result<RunOutput>;
}

/// Spawns the program as a child process and captures its standard output
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&mut self, program: &Path, args: &[String]) -> std::io::Result<RunOutput> {
        let output = Command::new(program).args(args).output()?;
        Ok(RunOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }
}

/// Accepts every submission without spawning anything, answering with ids 1, 2, 3, ...
#[derive(Clone, Debug, Default)]
pub struct DryRunRunner {
    submitted: u64,
}

impl CommandRunner for DryRunRunner {
    fn run(&mut self, program: &Path, args: &[String]) -> std::io::Result<RunOutput> {
        self.submitted += 1;
        info!("--dry-run set, not running {} {}", program.display(), args.join(" "));
        Ok(RunOutput {
            success: true,
            code: Some(0),
            stdout: format!("{SUBMITTED_MARKER}{}\n", self.submitted),
        })
    }
}

/// Anything that can hand a job script to the scheduler and report the id it was given
pub trait Submitter {
    /// Submit `script_path`, waiting on `parent` with `condition`
    ///
    /// `parent` and `condition` must be both present or both absent.
    fn submit(
        &mut self,
        script_path: &Path,
        parent: Option<&ParentJobs>,
        condition: Option<StartCondition>,
    ) -> Result<SlurmJobId>;
}

/// Submits job scripts with SLURM's `sbatch`
pub struct Sbatch<R = SystemRunner> {
    binary: PathBuf,
    runner: R,
}

impl<R: CommandRunner> Sbatch<R> {
    pub fn new(binary: impl Into<PathBuf>, runner: R) -> Self {
        Sbatch { binary: binary.into(), runner }
    }

    #[cfg(test)]
    pub(crate) fn runner(&self) -> &R {
        &self.runner
    }
}

impl<R: CommandRunner> Submitter for Sbatch<R> {
    fn submit(
        &mut self,
        script_path: &Path,
        parent: Option<&ParentJobs>,
        condition: Option<StartCondition>,
    ) -> Result<SlurmJobId> {
        let arguments = sbatch_args(script_path, parent, condition)?;

        info!("Running sbatch process: {} {}", self.binary.display(), arguments.join(" "));
        let output = self.runner.run(&self.binary, &arguments).map_err(|err| {
            DagError::Submission(format!("failed to execute {}: {err}", self.binary.display()))
        })?;

        if !output.success {
            let status = output
                .code
                .map_or_else(|| "a signal".to_string(), |code| format!("status {code}"));
            return Err(DagError::Submission(format!(
                "{} exited with {status} submitting {}",
                self.binary.display(),
                script_path.display()
            )));
        }

        let job_id = parse_job_id(&output.stdout)?;
        info!("SLURM job id: {job_id}");
        Ok(job_id)
    }
}

/// Build the sbatch argument list: an optional `--dependency=` clause, then the script path
///
/// Fails before anything is run if only one of `parent` and `condition` is given, or if the
/// script path isn't UTF-8.
pub fn sbatch_args(
    script_path: &Path,
    parent: Option<&ParentJobs>,
    condition: Option<StartCondition>,
) -> Result<Vec<String>> {
    let mut arguments = Vec::with_capacity(2);
    match (parent, condition) {
        (Some(parents), Some(condition)) => {
            let dependency = Dependency::new(parents.clone(), condition);
            arguments.push(format!("--dependency={}", dependency.clause()));
        }
        (None, None) => {}
        (parent, condition) => {
            return Err(DagError::Configuration(format!(
                "if parent_job_id ({parent:?}) or start_condition ({condition:?}) is defined, \
                 both must be defined"
            )));
        }
    }
    let script = script_path.to_str().ok_or_else(|| {
        DagError::Configuration(format!("job script path {} isn't UTF-8", script_path.display()))
    })?;
    arguments.push(script.to_string());
    Ok(arguments)
}

/// Extract the job id following [`SUBMITTED_MARKER`] in sbatch's standard output
pub fn parse_job_id(stdout: &str) -> Result<SlurmJobId> {
    let (_, tail) = stdout.rsplit_once(SUBMITTED_MARKER).ok_or_else(|| {
        let marker = SUBMITTED_MARKER.trim_end();
        DagError::Submission(format!("no '{marker}' in sbatch output: {stdout:?}"))
    })?;

    let id = tail.trim_end();
    if id.is_empty() {
        return Err(DagError::Submission(format!("sbatch output has no job id: {stdout:?}")));
    }
    Ok(SlurmJobId::new(id))
}
