use chrono::Utc;
use log::info;
use rusqlite::params;

use crate::dag::chain::Submission;
use crate::db::open::Ledger;
use crate::error::Result;

/// One row of the ledger
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmissionRecord {
    pub label: String,
    pub job_id: i64,
    pub name: String,
    pub script_path: String,
    /// sbatch dependency clause, e.g. `afterok:4821`
    pub dependency: Option<String>,
    pub slurm_id: String,
    pub submitted_at: String,
}

impl Ledger {
    pub fn record(&self, label: &str, submission: &Submission) -> Result<()> {
        let node = submission.node;
        let slurm_id = submission.job_id.as_str();
        info!("Updating ledger: {label} job {} has SLURM id {slurm_id}", node.name);
        self.conn.execute(
            "INSERT INTO submission
                 (label, job_id, name, script_path, dependency, slurm_id, submitted_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                label,
                node.id,
                node.name,
                node.script_path.display().to_string(),
                submission.dependency.as_ref().map(|d| d.clause()),
                slurm_id,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Every recorded submission, oldest first
    pub fn submissions(&self) -> Result<Vec<SubmissionRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT label, job_id, name, script_path, dependency, slurm_id, submitted_at
             FROM submission ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(SubmissionRecord {
                label: row.get(0)?,
                job_id: row.get(1)?,
                name: row.get(2)?,
                script_path: row.get(3)?,
                dependency: row.get(4)?,
                slurm_id: row.get(5)?,
                submitted_at: row.get(6)?,
            })
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }
}
