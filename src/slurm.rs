//! Describe SLURM jobs, render their scripts and submit them with sbatch

/// Job descriptors, start conditions and SLURM job ids
pub mod job;

/// Render a job descriptor into a job script on disk
pub mod script;

/// Run sbatch, encode dependencies and parse the returned job id
pub mod submit;
