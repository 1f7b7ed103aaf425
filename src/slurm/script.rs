use std::fs;
use std::path::Path;

use log::{debug, info};
use serde::Serialize;
use tinytemplate::TinyTemplate;

use crate::error::{DagError, Result};
use crate::slurm::job::JobDescriptor;

/// included job script template
static JOB: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/templates/job.txt"));

/// Rendering context for a job script
#[derive(Serialize)]
struct JobContext<'a> {
    directives: Vec<DirectiveContext<'a>>,
    commands: &'a [String],
}

/// One `#SBATCH key=value` line
#[derive(Serialize)]
struct DirectiveContext<'a> {
    key: &'a str,
    value: &'a str,
}

/// Render the job script: shebang, one `#SBATCH` line per resource request entry, then the
/// commands verbatim, one per line
pub fn render_job_script(node: &JobDescriptor) -> Result<String> {
    let mut tt = TinyTemplate::new();
    // commands are shell, not HTML
    tt.set_default_formatter(&tinytemplate::format_unescaped);
    tt.add_template("job", JOB)
        .map_err(|err| DagError::Configuration(format!("job script template: {err}")))?;

    let context = JobContext {
        directives: node
            .resource_request
            .iter()
            .map(|(key, value)| DirectiveContext { key, value })
            .collect(),
        commands: &node.commands,
    };

    tt.render("job", &context).map_err(|err| {
        DagError::Configuration(format!("can't render job script for {}: {err}", node.name))
    })
}

/// Write the node's job script to its `script_path`
///
/// An existing file is deleted first, never appended to. The parent directory must already exist.
pub fn create_job_file(node: &JobDescriptor) -> Result<()> {
    let path: &Path = &node.script_path;
    let content = render_job_script(node)?;

    if path.exists() {
        debug!("Job script {} already exists, deleting it", path.display());
        fs::remove_file(path).map_err(|err| DagError::io(path, err))?;
    }

    info!("Writing job script for {} to {}", node.name, path.display());
    fs::write(path, content).map_err(|err| DagError::io(path, err))?;
    make_executable(path)
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
        .map_err(|err| DagError::io(path, err))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}
