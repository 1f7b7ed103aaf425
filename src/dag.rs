//! Validate job graphs and submit them to SLURM in dependency order

/// Validated job graph and its traversal order
pub mod graph;

/// Walk a graph, writing and submitting each job with its parent's SLURM id
pub mod chain;
